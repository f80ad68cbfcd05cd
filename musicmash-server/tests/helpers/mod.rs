//! Test helper modules for musicmash-server integration tests
//!
//! - MockProvider: a local stand-in for the Spotify accounts and Web API hosts
//! - TestApp: the router over an in-memory database, wired to the mock

#![allow(dead_code)]

pub mod mock_provider;
pub mod test_app;

pub use mock_provider::{MockProvider, UNREACHABLE_URL};
pub use test_app::{extract_json, extract_text, token_record, TestApp};
