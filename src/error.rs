// Error types for suncache.
// Covers manifest and image fetching, decoding, cache directory access and configuration.

use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SuncacheError {
    #[error("Request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: StatusCode },

    #[error("Empty response body from {0}")]
    EmptyBody(String),

    #[error("Failed to parse manifest: {0}")]
    Parse(String),

    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Failed to encode JPEG: {0}")]
    Encode(#[source] image::ImageError),

    #[error("Cache directory not found")]
    DirectoryNotFound(PathBuf),

    #[error("Failed to read cache directory")]
    DirectoryUnreadable(#[source] std::io::Error),

    #[error("Cache directory is locked by another run ({})", .0.display())]
    Locked(PathBuf),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SuncacheError {
    /// Whether this error came from the network transport.
    pub fn is_fetch(&self) -> bool {
        matches!(
            self,
            SuncacheError::Request { .. } | SuncacheError::Status { .. } | SuncacheError::EmptyBody(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, SuncacheError>;
