//! # MusicMash Common Library
//!
//! Shared code for the MusicMash service including:
//! - Domain model (tracks, workflow nodes/edges, snapshots)
//! - Event types and the broadcast event bus
//! - Configuration loading
//! - SQLite initialization
//! - Server-Sent Events helpers

pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod model;
pub mod sse;

pub use error::{Error, Result};
