// Cache store for reading and writing cached images.
// Handles atomic writes, directory scans and the known-timestamp index.

use std::collections::HashSet;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::error::{Result, SuncacheError};

use super::paths;

/// Write raw bytes to the cache atomically via a hidden temp file.
pub fn write_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let temp_path = temp_path_for(path);
    let written = (|| -> io::Result<()> {
        let mut file = fs::File::create(&temp_path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        fs::rename(&temp_path, path)
    })();

    if let Err(e) = written {
        let _ = fs::remove_file(&temp_path);
        return Err(e.into());
    }

    Ok(())
}

/// Get the modification time of a cache file.
pub fn modified_at(path: &Path) -> io::Result<SystemTime> {
    fs::metadata(path)?.modified()
}

/// Names of the regular files directly inside `dir`, in enumeration order.
/// Symlinks count when they resolve to a regular file.
pub fn file_names(dir: &Path) -> Result<Vec<String>> {
    if !dir.is_dir() {
        return Err(SuncacheError::DirectoryNotFound(dir.to_path_buf()));
    }

    let entries = fs::read_dir(dir).map_err(SuncacheError::DirectoryUnreadable)?;
    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(SuncacheError::DirectoryUnreadable)?;
        if !entry.path().is_file() {
            continue;
        }
        match entry.file_name().into_string() {
            Ok(name) => names.push(name),
            Err(raw) => tracing::debug!("Skipping non UTF-8 file name {:?}", raw),
        }
    }

    Ok(names)
}

/// Build the set of feed timestamps present in a directory snapshot.
/// Only names in the feed family count; names without a timestamp are ignored.
pub fn known_timestamps<'a, I>(names: I, feed_prefix: &str) -> HashSet<String>
where
    I: IntoIterator<Item = &'a str>,
{
    names
        .into_iter()
        .filter(|name| paths::is_feed_file(name, feed_prefix))
        .filter_map(paths::extract_timestamp)
        .map(str::to_string)
        .collect()
}

/// Scan the cache directory for feed timestamps already cached.
pub fn scan_known_timestamps(dir: &Path, feed_prefix: &str) -> Result<HashSet<String>> {
    let names = file_names(dir)?;
    Ok(known_timestamps(names.iter().map(String::as_str), feed_prefix))
}

/// List the image files served by the listing endpoint.
pub fn list_images(dir: &Path) -> Result<Vec<String>> {
    let mut names = file_names(dir)?;
    names.retain(|name| paths::is_listed_image(name));
    Ok(names)
}

fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.tmp", name))
}
