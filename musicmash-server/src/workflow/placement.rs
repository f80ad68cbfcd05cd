//! Where new track nodes land around the main node
//!
//! `Ring` puts the k-th track node (0-based) at angle k × 45° on a circle of
//! radius 200. There are only eight distinct slots: the ninth node lands
//! exactly on the first one's spot, and so on. `Spiral` keeps the angles but
//! pushes each further lap of eight outwards.

use musicmash_common::model::Position;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const RING_RADIUS: f64 = 200.0;
pub const RING_SLOTS: usize = 8;
/// Extra radius per completed lap in `Spiral` mode
pub const SPIRAL_STEP: f64 = 120.0;

/// Placement policy for new track nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Placement {
    #[default]
    Ring,
    Spiral,
}

impl Placement {
    /// Angle for the `index`-th track node, in degrees (not reduced mod 360)
    pub fn angle_degrees(index: usize) -> f64 {
        index as f64 * (360.0 / RING_SLOTS as f64)
    }

    pub fn radius(self, index: usize) -> f64 {
        match self {
            Placement::Ring => RING_RADIUS,
            Placement::Spiral => RING_RADIUS + (index / RING_SLOTS) as f64 * SPIRAL_STEP,
        }
    }

    /// Position of the `index`-th track node around `center`
    pub fn position(self, center: Position, index: usize) -> Position {
        let angle = Self::angle_degrees(index).to_radians();
        let radius = self.radius(index);
        Position {
            x: center.x + angle.cos() * radius,
            y: center.y + angle.sin() * radius,
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown placement '{0}' (expected 'ring' or 'spiral')")]
pub struct UnknownPlacement(String);

impl FromStr for Placement {
    type Err = UnknownPlacement;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ring" => Ok(Placement::Ring),
            "spiral" => Ok(Placement::Spiral),
            other => Err(UnknownPlacement(other.to_string())),
        }
    }
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Placement::Ring => write!(f, "ring"),
            Placement::Spiral => write!(f, "spiral"),
        }
    }
}
