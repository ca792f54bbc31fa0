// Feed module.
// Provides the HTTP client and manifest types for the remote image feed.

pub mod client;
pub mod endpoints;
pub mod types;

pub use client::{FeedClient, ImageSource};
pub use endpoints::fetch_manifest;
pub use types::*;
