// Cache populator.
// Syncs missing feed images from the manifest, then refreshes the auxiliary images.

pub mod outcome;
pub mod resize;

use std::collections::HashSet;
use std::fs;

use tracing::{debug, info, warn};

use crate::cache::{self, RunLock, paths};
use crate::config::Config;
use crate::error::Result;
use crate::feed::{ImageSource, ManifestEntry, fetch_manifest};

pub use outcome::{FailureCounts, FailureKind, ItemOutcome, RunSummary, SkipReason};

/// One-shot batch job over a cache directory.
///
/// The run has two phases. Feed images from the manifest are fetched only
/// when their timestamp is not cached yet and are stored byte-for-byte.
/// Auxiliary images are fetched every time, resized and overwritten.
pub struct Populator<'a, S> {
    config: &'a Config,
    source: &'a S,
}

impl<'a, S: ImageSource> Populator<'a, S> {
    pub fn new(config: &'a Config, source: &'a S) -> Self {
        Self { config, source }
    }

    /// Run both phases once.
    ///
    /// Fails only when the manifest cannot be fetched or parsed, or the cache
    /// directory cannot be prepared. Per-item failures are counted in the
    /// returned summary.
    pub async fn run(&self) -> Result<RunSummary> {
        let mut summary = RunSummary::new();
        let cache_dir = &self.config.cache_dir;

        info!("Fetching manifest: {}", self.config.manifest_url);
        let manifest = fetch_manifest(self.source, &self.config.manifest_url).await?;
        info!("Manifest lists {} entries", manifest.len());

        fs::create_dir_all(cache_dir)?;
        let _lock = RunLock::acquire(cache_dir)?;

        let mut known = cache::scan_known_timestamps(cache_dir, &self.config.feed_prefix)?;
        debug!("{} feed timestamps already cached", known.len());

        let reserved: HashSet<String> = self.config.auxiliary_file_names().collect();

        for entry in &manifest.entries {
            let outcome = self.sync_feed_entry(entry, &mut known, &reserved).await;
            summary.record(&outcome);
        }

        for (name, url) in &self.config.auxiliary_images {
            let outcome = self.refresh_auxiliary(name, url).await;
            log_outcome(name, &outcome);
            summary.record(&outcome);
        }

        summary.finish();
        info!(
            successes = summary.successes,
            failures = summary.failures,
            skipped = summary.skipped,
            elapsed_ms = summary.elapsed().map(|d| d.num_milliseconds()),
            "{}",
            summary
        );

        Ok(summary)
    }

    /// Phase one: fetch a manifest entry unless its timestamp is already cached.
    #[allow(clippy::collapsible_if)]
    async fn sync_feed_entry(
        &self,
        entry: &ManifestEntry,
        known: &mut HashSet<String>,
        reserved: &HashSet<String>,
    ) -> ItemOutcome {
        let descriptor = match entry {
            ManifestEntry::Image(descriptor) => descriptor,
            ManifestEntry::Invalid(reason) => {
                let outcome = ItemOutcome::failed(FailureKind::InvalidEntry, reason.clone());
                log_outcome("manifest entry", &outcome);
                return outcome;
            }
        };

        let url = descriptor.fetch_url(&self.config.base_url);
        let Some(file_name) = descriptor.file_name(&self.config.base_url) else {
            let outcome = ItemOutcome::failed(
                FailureKind::InvalidEntry,
                format!("no file name in {}", url),
            );
            log_outcome(&url, &outcome);
            return outcome;
        };

        let timestamp = paths::extract_timestamp(&file_name).map(str::to_string);
        if timestamp.as_ref().is_some_and(|ts| known.contains(ts)) {
            let outcome = ItemOutcome::Skipped(SkipReason::AlreadyCached);
            log_outcome(&file_name, &outcome);
            return outcome;
        }

        if reserved.contains(&file_name) {
            let outcome = ItemOutcome::Skipped(SkipReason::AuxiliaryCollision);
            log_outcome(&file_name, &outcome);
            return outcome;
        }

        info!("Fetching: {}", url);
        let outcome = match self.source.fetch(&url).await {
            Err(e) => ItemOutcome::failed(FailureKind::Fetch, e.to_string()),
            Ok(bytes) => match cache::write_bytes(&self.config.cache_dir.join(&file_name), &bytes)
            {
                Err(e) => ItemOutcome::failed(FailureKind::Write, e.to_string()),
                Ok(()) => {
                    // Only the feed family feeds the dedup index.
                    if let Some(ts) = timestamp {
                        if paths::is_feed_file(&file_name, &self.config.feed_prefix) {
                            known.insert(ts);
                        }
                    }
                    ItemOutcome::Cached
                }
            },
        };

        log_outcome(&file_name, &outcome);
        outcome
    }

    /// Phase two: refetch an auxiliary image and overwrite its resized copy.
    async fn refresh_auxiliary(&self, name: &str, url: &str) -> ItemOutcome {
        info!("Fetching: {}", url);
        let bytes = match self.source.fetch(url).await {
            Ok(bytes) => bytes,
            Err(e) => return ItemOutcome::failed(FailureKind::Fetch, e.to_string()),
        };

        let resized = match resize::decode_resized(&bytes, self.config.auxiliary_size) {
            Ok(resized) => resized,
            Err(e) => return ItemOutcome::failed(FailureKind::Decode, e.to_string()),
        };

        let jpeg = match resize::encode_jpeg(&resized, self.config.jpeg_quality) {
            Ok(jpeg) => jpeg,
            Err(e) => return ItemOutcome::failed(FailureKind::Encode, e.to_string()),
        };

        match cache::write_bytes(&paths::auxiliary_path(&self.config.cache_dir, name), &jpeg) {
            Ok(()) => ItemOutcome::Cached,
            Err(e) => ItemOutcome::failed(FailureKind::Write, e.to_string()),
        }
    }
}

fn log_outcome(item: &str, outcome: &ItemOutcome) {
    match outcome {
        ItemOutcome::Cached => info!("Successfully cached: {}", item),
        ItemOutcome::Skipped(SkipReason::AlreadyCached) => {
            info!("Skipping (already cached): {}", item)
        }
        ItemOutcome::Skipped(SkipReason::AuxiliaryCollision) => {
            warn!("Skipping {}: name is reserved for an auxiliary image", item)
        }
        ItemOutcome::Failed { kind, message } => {
            warn!("Failed ({}) for {}: {}", kind, item, message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Dimensions;
    use crate::error::SuncacheError;
    use image::{GenericImageView, ImageFormat, Rgb, RgbImage};
    use reqwest::StatusCode;
    use std::collections::{BTreeMap, HashMap};
    use std::io::Cursor;
    use std::path::Path;
    use std::sync::Mutex;
    use tempfile::TempDir;

    const MANIFEST_URL: &str = "https://feed.test/products/enlil.json";
    const BASE_URL: &str = "https://feed.test/";
    const AUX_URL: &str = "https://sun.test/latest.jpg";

    /// In-memory source that records every URL it is asked for.
    #[derive(Default)]
    struct FakeSource {
        bodies: Mutex<HashMap<String, Vec<u8>>>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeSource {
        fn serve(&self, url: &str, body: impl Into<Vec<u8>>) {
            self.bodies
                .lock()
                .unwrap()
                .insert(url.to_string(), body.into());
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn calls_to(&self, url: &str) -> usize {
            self.calls().iter().filter(|c| c.as_str() == url).count()
        }

        fn reset_calls(&self) {
            self.calls.lock().unwrap().clear();
        }
    }

    impl ImageSource for FakeSource {
        async fn fetch(&self, url: &str) -> crate::error::Result<Vec<u8>> {
            self.calls.lock().unwrap().push(url.to_string());
            self.bodies
                .lock()
                .unwrap()
                .get(url)
                .cloned()
                .ok_or_else(|| SuncacheError::Status {
                    url: url.to_string(),
                    status: StatusCode::NOT_FOUND,
                })
        }
    }

    fn png(color: [u8; 3]) -> Vec<u8> {
        let img = RgbImage::from_pixel(40, 30, Rgb(color));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    fn test_config(cache_dir: &Path) -> Config {
        Config {
            manifest_url: MANIFEST_URL.into(),
            base_url: BASE_URL.into(),
            cache_dir: cache_dir.to_path_buf(),
            auxiliary_images: BTreeMap::from([("sun_latest".to_string(), AUX_URL.to_string())]),
            auxiliary_size: Dimensions { width: 16, height: 16 },
            ..Config::default()
        }
    }

    fn feed_url(name: &str) -> String {
        format!("{}images/{}", BASE_URL, name)
    }

    fn manifest(names: &[&str]) -> String {
        let entries: Vec<_> = names
            .iter()
            .map(|name| serde_json::json!({ "url": format!("images/{}", name) }))
            .collect();
        serde_json::Value::Array(entries).to_string()
    }

    fn sorted_names(dir: &Path) -> Vec<String> {
        let mut names = cache::file_names(dir).unwrap();
        names.sort();
        names
    }

    fn standard_source(names: &[&str]) -> FakeSource {
        let source = FakeSource::default();
        source.serve(MANIFEST_URL, manifest(names));
        for name in names {
            source.serve(&feed_url(name), format!("raw {}", name));
        }
        source.serve(AUX_URL, png([250, 120, 0]));
        source
    }

    #[tokio::test]
    async fn test_first_run_caches_everything() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(temp_dir.path());
        let names = ["enlil_20240101T000000.jpg", "enlil_20240101T010000.jpg"];
        let source = standard_source(&names);

        let summary = Populator::new(&config, &source).run().await.unwrap();

        assert_eq!(summary.successes, 3);
        assert_eq!(summary.failures, 0);
        assert!(summary.finished_at.is_some());
        assert_eq!(
            sorted_names(temp_dir.path()),
            vec![
                "enlil_20240101T000000.jpg",
                "enlil_20240101T010000.jpg",
                "sun_latest.jpg"
            ]
        );

        // Feed bytes are stored unmodified.
        let raw = fs::read(temp_dir.path().join(names[0])).unwrap();
        assert_eq!(raw, format!("raw {}", names[0]).into_bytes());

        // Auxiliary images are resized.
        let aux = image::open(temp_dir.path().join("sun_latest.jpg")).unwrap();
        assert_eq!(aux.dimensions(), (16, 16));
    }

    #[tokio::test]
    async fn test_rerun_fetches_no_cached_timestamps() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(temp_dir.path());
        let names = ["enlil_20240101T000000.jpg", "enlil_20240101T010000.jpg"];
        let source = standard_source(&names);

        Populator::new(&config, &source).run().await.unwrap();
        let after_first = sorted_names(temp_dir.path());
        source.reset_calls();

        let summary = Populator::new(&config, &source).run().await.unwrap();

        for name in names {
            assert_eq!(source.calls_to(&feed_url(name)), 0);
        }
        assert_eq!(summary.skipped, 2);
        assert_eq!(summary.successes, 1);
        assert_eq!(sorted_names(temp_dir.path()), after_first);
    }

    #[tokio::test]
    async fn test_cached_timestamp_matches_across_file_names() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("enlil_com1_20240101T000000.jpg"),
            b"older variant",
        )
        .unwrap();
        let config = test_config(temp_dir.path());
        let source = standard_source(&["enlil_com2_20240101T000000.jpg"]);

        let summary = Populator::new(&config, &source).run().await.unwrap();

        assert_eq!(source.calls_to(&feed_url("enlil_com2_20240101T000000.jpg")), 0);
        assert_eq!(summary.skipped, 1);
        assert!(!temp_dir.path().join("enlil_com2_20240101T000000.jpg").exists());
    }

    #[tokio::test]
    async fn test_auxiliary_overwritten_every_run() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(temp_dir.path());
        let source = standard_source(&[]);

        Populator::new(&config, &source).run().await.unwrap();
        let first = fs::read(temp_dir.path().join("sun_latest.jpg")).unwrap();

        source.serve(AUX_URL, png([0, 40, 250]));
        Populator::new(&config, &source).run().await.unwrap();
        let second = fs::read(temp_dir.path().join("sun_latest.jpg")).unwrap();

        assert_eq!(source.calls_to(AUX_URL), 2);
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_entry_without_timestamp_is_always_fetched() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(temp_dir.path());
        let source = standard_source(&["enlil_latest.jpg"]);

        Populator::new(&config, &source).run().await.unwrap();
        Populator::new(&config, &source).run().await.unwrap();

        assert_eq!(source.calls_to(&feed_url("enlil_latest.jpg")), 2);
    }

    #[tokio::test]
    async fn test_non_json_manifest_aborts_before_any_side_effect() {
        let temp_dir = TempDir::new().unwrap();
        let cache_dir = temp_dir.path().join("cache");
        let config = test_config(&cache_dir);
        let source = FakeSource::default();
        source.serve(MANIFEST_URL, "<html>502 Bad Gateway</html>");
        source.serve(AUX_URL, png([1, 2, 3]));

        let result = Populator::new(&config, &source).run().await;

        assert!(matches!(result, Err(SuncacheError::Parse(_))));
        assert_eq!(source.calls(), vec![MANIFEST_URL.to_string()]);
        assert!(!cache_dir.exists());
    }

    #[tokio::test]
    async fn test_manifest_fetch_failure_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(temp_dir.path());
        let source = FakeSource::default();

        let result = Populator::new(&config, &source).run().await;

        assert!(result.as_ref().is_err_and(|e| e.is_fetch()));
        assert_eq!(source.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_undecodable_auxiliary_keeps_prior_copy() {
        let temp_dir = TempDir::new().unwrap();
        let prior = temp_dir.path().join("sun_latest.jpg");
        fs::write(&prior, b"previous good copy").unwrap();
        let config = test_config(temp_dir.path());
        let source = standard_source(&[]);
        source.serve(AUX_URL, "<html>not found</html>");

        let summary = Populator::new(&config, &source).run().await.unwrap();

        assert_eq!(summary.failures, 1);
        assert_eq!(summary.failures_by_kind.decode, 1);
        assert_eq!(fs::read(&prior).unwrap(), b"previous good copy");
    }

    #[tokio::test]
    async fn test_undecodable_auxiliary_creates_no_file() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(temp_dir.path());
        let source = standard_source(&[]);
        source.serve(AUX_URL, "garbage");

        Populator::new(&config, &source).run().await.unwrap();

        assert!(!temp_dir.path().join("sun_latest.jpg").exists());
    }

    #[tokio::test]
    async fn test_encode_failure_is_counted_separately() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config {
            auxiliary_size: Dimensions { width: 70_000, height: 1 },
            ..test_config(temp_dir.path())
        };
        let source = standard_source(&[]);

        let summary = Populator::new(&config, &source).run().await.unwrap();

        assert_eq!(summary.failures_by_kind.encode, 1);
        assert_eq!(summary.failures_by_kind.decode, 0);
        assert!(!temp_dir.path().join("sun_latest.jpg").exists());
    }

    #[tokio::test]
    async fn test_feed_fetch_failure_is_counted_and_run_continues() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(temp_dir.path());
        let source = FakeSource::default();
        source.serve(
            MANIFEST_URL,
            manifest(&["enlil_20240101T000000.jpg", "enlil_20240101T010000.jpg"]),
        );
        source.serve(&feed_url("enlil_20240101T010000.jpg"), "second");
        source.serve(AUX_URL, png([9, 9, 9]));

        let summary = Populator::new(&config, &source).run().await.unwrap();

        assert_eq!(summary.failures_by_kind.fetch, 1);
        assert_eq!(summary.successes, 2);
        assert!(!temp_dir.path().join("enlil_20240101T000000.jpg").exists());
        assert!(temp_dir.path().join("enlil_20240101T010000.jpg").exists());
    }

    #[tokio::test]
    async fn test_duplicate_timestamp_in_manifest_fetched_once() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(temp_dir.path());
        let source = standard_source(&[
            "enlil_com1_20240101T000000.jpg",
            "enlil_com2_20240101T000000.jpg",
        ]);

        let summary = Populator::new(&config, &source).run().await.unwrap();

        assert_eq!(source.calls_to(&feed_url("enlil_com1_20240101T000000.jpg")), 1);
        assert_eq!(source.calls_to(&feed_url("enlil_com2_20240101T000000.jpg")), 0);
        assert_eq!(summary.skipped, 1);
    }

    #[tokio::test]
    async fn test_non_feed_file_does_not_hide_feed_timestamp() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(temp_dir.path());
        let names = ["other_20240101T000000.jpg", "enlil_20240101T000000.jpg"];
        let source = standard_source(&names);

        Populator::new(&config, &source).run().await.unwrap();
        Populator::new(&config, &source).run().await.unwrap();

        assert_eq!(source.calls_to(&feed_url("enlil_20240101T000000.jpg")), 1);
        assert_eq!(source.calls_to(&feed_url("other_20240101T000000.jpg")), 2);
        assert_eq!(
            sorted_names(temp_dir.path()),
            vec![
                "enlil_20240101T000000.jpg",
                "other_20240101T000000.jpg",
                "sun_latest.jpg"
            ]
        );
    }

    #[tokio::test]
    async fn test_auxiliary_name_collision_is_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(temp_dir.path());
        let source = standard_source(&["sun_latest.jpg"]);

        let summary = Populator::new(&config, &source).run().await.unwrap();

        assert_eq!(source.calls_to(&feed_url("sun_latest.jpg")), 0);
        assert_eq!(summary.skipped, 1);
        let aux = image::open(temp_dir.path().join("sun_latest.jpg")).unwrap();
        assert_eq!(aux.dimensions(), (16, 16));
    }

    #[tokio::test]
    async fn test_invalid_entries_are_counted() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(temp_dir.path());
        let source = FakeSource::default();
        source.serve(
            MANIFEST_URL,
            r#"[{"href": "x.jpg"}, {"url": "images/"}, {"url": "images/enlil_20240101T000000.jpg"}]"#,
        );
        source.serve(&feed_url("enlil_20240101T000000.jpg"), "ok");
        source.serve(AUX_URL, png([5, 5, 5]));

        let summary = Populator::new(&config, &source).run().await.unwrap();

        assert_eq!(summary.failures_by_kind.invalid_entry, 2);
        assert_eq!(summary.successes, 2);
    }

    #[tokio::test]
    async fn test_locked_cache_dir_aborts_run() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(temp_dir.path());
        let source = standard_source(&["enlil_20240101T000000.jpg"]);
        let _held = RunLock::acquire(temp_dir.path()).unwrap();

        let result = Populator::new(&config, &source).run().await;

        assert!(matches!(result, Err(SuncacheError::Locked(_))));
        assert_eq!(source.calls(), vec![MANIFEST_URL.to_string()]);
    }
}
