// Cache path utilities.
// Derives cache file names from fetch URLs and recognizes the feed and auxiliary families.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use directories::ProjectDirs;
use regex::Regex;
use reqwest::Url;

/// Extension shared by every cached image.
pub const IMAGE_EXTENSION: &str = "jpg";

static TIMESTAMP_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{8}T\d{6}").expect("Failed to compile timestamp regex"));

/// Get the platform cache directory (~/.cache/suncache on Linux).
pub fn cache_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "suncache").map(|dirs| dirs.cache_dir().to_path_buf())
}

/// Cache directory used when the configuration does not name one.
pub fn default_cache_dir() -> PathBuf {
    cache_dir().unwrap_or_else(|| PathBuf::from("suncache"))
}

/// File name of an auxiliary image.
pub fn auxiliary_file_name(name: &str) -> String {
    format!("{}.{}", name, IMAGE_EXTENSION)
}

/// Path of an auxiliary image inside the cache directory.
pub fn auxiliary_path(cache_dir: &Path, name: &str) -> PathBuf {
    cache_dir.join(auxiliary_file_name(name))
}

/// Final path segment of a fetch URL, without query or fragment.
/// Returns None when the URL does not parse or ends in a slash.
pub fn file_name_from_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let segment = parsed.path_segments()?.next_back()?;
    if segment.is_empty() {
        return None;
    }
    Some(sanitize_name(segment))
}

/// Extract the first `YYYYMMDDTHHMMSS` timestamp from a file name.
pub fn extract_timestamp(file_name: &str) -> Option<&str> {
    TIMESTAMP_REGEX.find(file_name).map(|m| m.as_str())
}

/// Whether a file name belongs to the timestamped feed family.
pub fn is_feed_file(file_name: &str, prefix: &str) -> bool {
    file_name.starts_with(prefix) && has_image_extension(file_name)
}

/// Whether a file name should appear in the cache listing.
/// Hidden files (lock and temp files) are never listed.
pub fn is_listed_image(file_name: &str) -> bool {
    !file_name.starts_with('.') && has_image_extension(file_name)
}

fn has_image_extension(file_name: &str) -> bool {
    Path::new(file_name)
        .extension()
        .is_some_and(|ext| ext == IMAGE_EXTENSION)
}

/// Sanitize a name for use in filesystem paths.
/// Replaces problematic characters with underscores.
fn sanitize_name(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            _ => c,
        })
        .collect();

    if sanitized.starts_with('.') {
        sanitized.replacen('.', "_", 1)
    } else {
        sanitized
    }
}
