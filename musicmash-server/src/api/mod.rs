//! HTTP API handlers

pub mod auth;
pub mod health;
pub mod sse;
pub mod tracks;
pub mod workflow;

pub use auth::{callback, login, logout, session_status};
pub use health::health_routes;
pub use sse::event_stream;
pub use tracks::top_tracks;
pub use workflow::{export_workflow, get_workflow, post_command};
