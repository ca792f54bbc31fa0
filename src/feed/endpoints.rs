// Feed endpoint functions.
// Fetches raw bodies and the typed manifest.

use crate::error::{Result, SuncacheError};

use super::client::{FeedClient, ImageSource};
use super::types::{Manifest, parse_manifest};

impl ImageSource for FeedClient {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.get(url).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|source| SuncacheError::Request {
                url: url.to_string(),
                source,
            })?;

        if bytes.is_empty() {
            return Err(SuncacheError::EmptyBody(url.to_string()));
        }

        Ok(bytes.to_vec())
    }
}

/// Fetch and parse the feed manifest.
pub async fn fetch_manifest<S: ImageSource>(source: &S, url: &str) -> Result<Manifest> {
    let body = source.fetch(url).await?;
    parse_manifest(&body)
}
