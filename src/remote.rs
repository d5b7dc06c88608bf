//! Remote filter list manager: download, cache and hot-swap EasyList-style lists.
//!
//! This module provides `RemoteListManager` which handles:
//! - Downloading list text from a remote URL
//! - Gzip decompression
//! - Local caching with atomic updates
//! - ETag-based conditional requests (304 Not Modified)
//! - Rebuilding and swapping the classifier's active rule set
//!
//! Nothing is swapped until the new list has been fully fetched and decoded,
//! so a failed download leaves the previously active rules in place.

use flate2::read::GzDecoder;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use crate::classifier::{Classifier, RefreshReport};
use crate::error::{Error, Result};
use crate::metadata::UpdateMetadata;
use crate::store::RuleStore;

/// Default EasyList location.
pub const EASYLIST_URL: &str = "https://easylist.to/easylist/easylist.txt";

/// Default HTTP timeout for list downloads.
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// Remote filter list manager.
///
/// # Example
///
/// ```ignore
/// use shieldrule::{Classifier, RemoteListManager, EASYLIST_URL};
/// use std::path::Path;
/// use std::sync::Arc;
///
/// let classifier = Arc::new(Classifier::default());
/// let mut manager = RemoteListManager::new(
///     EASYLIST_URL,
///     Path::new("/tmp/shieldrule-cache"),
///     Arc::clone(&classifier),
/// );
///
/// // Initialize: load from cache or download
/// manager.init()?;
///
/// // Check for updates (returns true if the list changed)
/// if manager.update()? {
///     println!("Filter list updated!");
/// }
/// ```
pub struct RemoteListManager {
    /// Remote URL of the list
    url: String,
    /// Local cache directory
    cache_dir: PathBuf,
    /// Classifier whose active set is replaced on update
    classifier: Arc<Classifier>,
    /// Optional sink for the activated rules
    store: Option<Arc<dyn RuleStore>>,
    /// ETag from last download (for conditional requests)
    etag: Option<String>,
    /// Update interval for periodic checks
    update_interval: Duration,
    agent: ureq::Agent,
}

impl RemoteListManager {
    /// Create a new remote list manager.
    ///
    /// # Arguments
    ///
    /// * `url` - URL to download the list from (plain text or gzip)
    /// * `cache_dir` - Directory to store the cached list and metadata
    /// * `classifier` - Classifier to refresh with each new list
    pub fn new(url: &str, cache_dir: &Path, classifier: Arc<Classifier>) -> Self {
        Self {
            url: url.to_string(),
            cache_dir: cache_dir.to_path_buf(),
            classifier,
            store: None,
            etag: None,
            update_interval: Duration::from_secs(24 * 3600),
            agent: ureq::AgentBuilder::new()
                .timeout(DOWNLOAD_TIMEOUT)
                .user_agent(concat!("shieldrule/", env!("CARGO_PKG_VERSION")))
                .build(),
        }
    }

    /// Set a custom update interval for periodic checks.
    ///
    /// Default is 24 hours.
    pub fn with_update_interval(mut self, interval: Duration) -> Self {
        self.update_interval = interval;
        self
    }

    /// Persist activated rules to `store` after every update.
    pub fn with_store(mut self, store: Arc<dyn RuleStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Get the path to the cached list.
    fn list_path(&self) -> PathBuf {
        self.cache_dir.join("filters.txt")
    }

    /// Get the path for temporary download file.
    fn temp_path(&self) -> PathBuf {
        self.cache_dir.join("filters.txt.tmp")
    }

    /// Get the path to the metadata file.
    fn metadata_path(&self) -> PathBuf {
        self.cache_dir.join("filters.txt.meta")
    }

    /// Initialize the manager: load from cache or download.
    pub fn init(&mut self) -> Result<()> {
        fs::create_dir_all(&self.cache_dir)?;

        if let Ok(meta) = UpdateMetadata::load(self.metadata_path()) {
            self.etag = meta.etag;
        }

        let list_path = self.list_path();
        if list_path.exists() {
            match fs::read_to_string(&list_path) {
                Ok(text) => {
                    let report = self.classifier.refresh(&text);
                    log::info!(
                        "Loaded filter list from cache: {:?} ({} rules)",
                        list_path,
                        report.rules
                    );
                    return Ok(());
                }
                Err(e) => {
                    log::warn!("Failed to read cached filter list, will download: {}", e);
                }
            }
        }

        self.fetch(false)?;
        Ok(())
    }

    /// Check for updates and download if available.
    ///
    /// Returns `true` if the list was updated, `false` on 304 Not Modified.
    pub fn update(&mut self) -> Result<bool> {
        Ok(self.fetch(true)?.is_some())
    }

    /// Whether the update interval has elapsed since the last update.
    pub fn needs_update(&self) -> bool {
        let meta = UpdateMetadata::load(self.metadata_path()).unwrap_or_default();
        meta.needs_update(self.update_interval)
    }

    /// Update only if the update interval has elapsed.
    pub fn update_if_needed(&mut self) -> Result<bool> {
        if self.needs_update() {
            self.update()
        } else {
            Ok(false)
        }
    }

    /// Get the last update time, if the list was ever downloaded.
    pub fn last_updated(&self) -> Option<SystemTime> {
        UpdateMetadata::load(self.metadata_path())
            .ok()
            .and_then(|m| m.last_updated)
    }

    /// Download the list and activate it.
    ///
    /// With `conditional`, the stored ETag is sent and a 304 answer yields
    /// `Ok(None)`.
    fn fetch(&mut self, conditional: bool) -> Result<Option<RefreshReport>> {
        fs::create_dir_all(&self.cache_dir)?;

        let mut request = self.agent.get(&self.url);
        if conditional {
            if let Some(ref etag) = self.etag {
                request = request.set("If-None-Match", etag);
            }
        }

        let response = request.call().map_err(|e| match e {
            ureq::Error::Status(code, _) => Error::Download(format!("HTTP error: {}", code)),
            ureq::Error::Transport(t) => Error::Download(format!("transport error: {}", t)),
        })?;

        if response.status() == 304 {
            log::debug!("Filter list not modified (304)");
            return Ok(None);
        }

        let etag = response.header("ETag").map(str::to_string);

        let mut raw = Vec::new();
        response
            .into_reader()
            .read_to_end(&mut raw)
            .map_err(|e| Error::Download(format!("failed to read response: {}", e)))?;

        let text = decode_body(&raw)?;
        log::info!(
            "Downloaded filter list: {} bytes (transferred {} bytes)",
            text.len(),
            raw.len()
        );

        self.write_cache(&text)?;
        let report = self.activate(&text, etag)?;
        Ok(Some(report))
    }

    /// Write list text to the cache through a temp file and rename.
    fn write_cache(&self, text: &str) -> Result<()> {
        let temp_path = self.temp_path();
        let mut temp_file = fs::File::create(&temp_path)?;
        temp_file.write_all(text.as_bytes())?;
        temp_file.sync_all()?;
        drop(temp_file);

        fs::rename(&temp_path, self.list_path())?;
        Ok(())
    }

    /// Swap the list into the classifier and record the update.
    fn activate(&mut self, text: &str, etag: Option<String>) -> Result<RefreshReport> {
        let report = self.classifier.refresh(text);

        if let Some(ref store) = self.store {
            if let Err(e) = store.store_rules(&self.classifier.active().to_stored()) {
                log::warn!("Failed to persist filter rules: {}", e);
            }
        }

        self.etag = etag;
        UpdateMetadata::now(self.etag.clone(), report.rules, report.skipped)
            .save(self.metadata_path())?;

        Ok(report)
    }

    /// Get the current ETag (if any).
    pub fn etag(&self) -> Option<&str> {
        self.etag.as_deref()
    }

    /// Get the URL being used.
    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Check if data is gzip compressed.
fn is_gzip(data: &[u8]) -> bool {
    data.len() >= 2 && data[0] == 0x1f && data[1] == 0x8b
}

/// Gunzip if needed and decode as UTF-8 text.
fn decode_body(raw: &[u8]) -> Result<String> {
    let bytes = if is_gzip(raw) {
        let mut decoder = GzDecoder::new(raw);
        let mut data = Vec::new();
        decoder
            .read_to_end(&mut data)
            .map_err(|e| Error::Download(format!("gzip decompression failed: {}", e)))?;
        data
    } else {
        raw.to_vec()
    };

    String::from_utf8(bytes).map_err(|e| Error::Download(format!("list is not UTF-8: {}", e)))
}
