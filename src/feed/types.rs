// Feed manifest types.
// Defines the manifest entry shape and the lenient per-entry parser.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cache::paths;
use crate::error::{Result, SuncacheError};

/// One image listed in the manifest. Fields other than `url` are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDescriptor {
    /// URL relative to the configured base URL.
    pub url: String,
}

impl ImageDescriptor {
    /// Absolute fetch URL. The base is prepended verbatim.
    pub fn fetch_url(&self, base_url: &str) -> String {
        format!("{}{}", base_url, self.url)
    }

    /// Destination file name: the final path segment of the fetch URL.
    pub fn file_name(&self, base_url: &str) -> Option<String> {
        paths::file_name_from_url(&self.fetch_url(base_url))
    }
}

/// A manifest entry that either describes an image or could not be read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestEntry {
    Image(ImageDescriptor),
    Invalid(String),
}

/// Parsed manifest, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    pub entries: Vec<ManifestEntry>,
}

impl Manifest {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Parse a manifest body. The document must be a JSON array; malformed
/// entries inside it are kept as `Invalid` so the rest can still be processed.
pub fn parse_manifest(body: &[u8]) -> Result<Manifest> {
    let document: Value =
        serde_json::from_slice(body).map_err(|e| SuncacheError::Parse(e.to_string()))?;

    let Value::Array(items) = document else {
        return Err(SuncacheError::Parse("manifest is not a JSON array".into()));
    };

    let entries = items
        .into_iter()
        .map(|item| match serde_json::from_value::<ImageDescriptor>(item) {
            Ok(descriptor) => ManifestEntry::Image(descriptor),
            Err(e) => ManifestEntry::Invalid(e.to_string()),
        })
        .collect();

    Ok(Manifest { entries })
}
