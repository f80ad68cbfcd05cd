//! Session/Token Manager
//!
//! - `token`: token records and the refresh exchange
//! - `oauth`: the authorization-code login handshake
//! - `session`: server-side sessions keyed by cookie

pub mod oauth;
pub mod session;
pub mod token;

pub use session::{MaybeSession, Session, SessionStore};
pub use token::{TokenErrorTag, TokenRecord, TokenRefresher, TokenState};
