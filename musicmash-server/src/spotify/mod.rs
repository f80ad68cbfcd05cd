//! Track Fetcher: Spotify Web API access and the per-session track list

pub mod client;
pub mod feed;

pub use client::{build_http_client, parse_items, FetchError, SpotifyClient};
pub use feed::TrackFeed;
