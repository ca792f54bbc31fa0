// Configuration for the populator and listing server.
// Loaded once at startup from an optional JSON file, then passed by reference.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::cache::paths;
use crate::error::{Result, SuncacheError};

pub const DEFAULT_MANIFEST_URL: &str =
    "https://services.swpc.noaa.gov/products/animations/enlil.json";
pub const DEFAULT_BASE_URL: &str = "https://services.swpc.noaa.gov/";
pub const DEFAULT_FEED_PREFIX: &str = "enlil_";

/// Target size for resized auxiliary images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Default for Dimensions {
    fn default() -> Self {
        Self {
            width: 900,
            height: 900,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// URL returning the JSON feed manifest.
    pub manifest_url: String,
    /// Prefix concatenated with each manifest entry's relative URL.
    pub base_url: String,
    /// Directory holding feed and auxiliary images.
    pub cache_dir: PathBuf,
    /// Filename prefix of the timestamped feed family.
    pub feed_prefix: String,
    /// Output name (without `.jpg`) to source URL. Refreshed on every run.
    pub auxiliary_images: BTreeMap<String, String>,
    pub auxiliary_size: Dimensions,
    pub jpeg_quality: u8,
    pub request_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        let auxiliary_images = BTreeMap::from([
            (
                "lmsal_sun".to_string(),
                "https://suntoday.lmsal.com/sdomedia/SunInTime/2023/07/30/f0131pfssnolines.jpg"
                    .to_string(),
            ),
            (
                "nasa_sdo_sun".to_string(),
                "https://sdo.gsfc.nasa.gov/assets/img/latest/latest_1024_211193171.jpg"
                    .to_string(),
            ),
        ]);

        Self {
            manifest_url: DEFAULT_MANIFEST_URL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            cache_dir: paths::default_cache_dir(),
            feed_prefix: DEFAULT_FEED_PREFIX.to_string(),
            auxiliary_images,
            auxiliary_size: Dimensions::default(),
            jpeg_quality: 75,
            request_timeout_secs: 30,
            user_agent: format!("suncache/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file, or defaults when no file is given.
    /// Missing fields fall back to their defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        if !path.exists() {
            return Err(SuncacheError::Config(format!(
                "config file not found at {}",
                path.display()
            )));
        }

        let contents = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&contents)?;
        Ok(config)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// File names (`<name>.jpg`) reserved for auxiliary images.
    pub fn auxiliary_file_names(&self) -> impl Iterator<Item = String> + '_ {
        self.auxiliary_images
            .keys()
            .map(|name| paths::auxiliary_file_name(name))
    }

    /// Check the configuration for values the populator cannot work with.
    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.manifest_url)
            .map_err(|e| SuncacheError::Config(format!("manifest_url: {}", e)))?;
        Url::parse(&self.base_url)
            .map_err(|e| SuncacheError::Config(format!("base_url: {}", e)))?;

        if self.feed_prefix.is_empty() {
            return Err(SuncacheError::Config("feed_prefix must not be empty".into()));
        }

        if self.auxiliary_size.width == 0 || self.auxiliary_size.height == 0 {
            return Err(SuncacheError::Config(format!(
                "auxiliary_size must be non-zero, got {}x{}",
                self.auxiliary_size.width, self.auxiliary_size.height
            )));
        }

        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(SuncacheError::Config(format!(
                "jpeg_quality must be within 1..=100, got {}",
                self.jpeg_quality
            )));
        }

        if self.request_timeout_secs == 0 {
            return Err(SuncacheError::Config(
                "request_timeout_secs must be greater than zero".into(),
            ));
        }

        for (name, url) in &self.auxiliary_images {
            if name.is_empty()
                || name.starts_with('.')
                || name.contains(['/', '\\'])
            {
                return Err(SuncacheError::Config(format!(
                    "invalid auxiliary image name {:?}",
                    name
                )));
            }
            Url::parse(url).map_err(|e| {
                SuncacheError::Config(format!("auxiliary image {}: {}", name, e))
            })?;
        }

        Ok(())
    }
}
