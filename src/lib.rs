//! suncache keeps a local cache of solar and space-weather imagery.
//!
//! The [`populate`] job syncs timestamped feed images listed in a remote
//! manifest and refreshes a fixed set of resized auxiliary images. The
//! [`server`] module lists the cached JPEGs as JSON over HTTP.

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod feed;
pub mod logging;
pub mod populate;
pub mod server;

pub use config::Config;
pub use error::{Result, SuncacheError};
