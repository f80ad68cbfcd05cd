//! Database access
//!
//! SQLite via sqlx holds the durable workflow snapshots.

pub mod init;

pub use init::{init_database, init_memory_database};
