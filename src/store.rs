//! Persistence sink for filter rules.
//!
//! The active rule set can be stored after a refresh and loaded again at
//! startup, so the service can classify before the first download finishes.

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::error::Result;
use crate::rule::{FilterRule, RuleOptions};
use crate::PatternType;

/// Persisted shape of one filter rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRule {
    pub raw_pattern: String,
    pub pattern_type: PatternType,
    pub processed_pattern: String,
    #[serde(default)]
    pub options: RuleOptions,
}

impl From<&FilterRule> for StoredRule {
    fn from(rule: &FilterRule) -> Self {
        Self {
            raw_pattern: rule.raw_pattern().to_string(),
            pattern_type: rule.pattern_type(),
            processed_pattern: rule.processed_pattern().to_string(),
            options: rule.options().clone(),
        }
    }
}

/// Storage for the current rule set.
pub trait RuleStore: Send + Sync {
    /// Replace everything stored with `rules`.
    fn store_rules(&self, rules: &[StoredRule]) -> Result<()>;

    /// Load the stored rules. An empty store yields an empty vector.
    fn load_rules(&self) -> Result<Vec<StoredRule>>;
}

/// In-memory store, mainly for tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rules: RwLock<Vec<StoredRule>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl RuleStore for MemoryStore {
    fn store_rules(&self, rules: &[StoredRule]) -> Result<()> {
        *self.rules.write() = rules.to_vec();
        Ok(())
    }

    fn load_rules(&self) -> Result<Vec<StoredRule>> {
        Ok(self.rules.read().clone())
    }
}

/// JSON file store.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Create a store backed by the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Get the backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RuleStore for JsonFileStore {
    fn store_rules(&self, rules: &[StoredRule]) -> Result<()> {
        write_json_atomic(&self.path, &rules)
    }

    fn load_rules(&self) -> Result<Vec<StoredRule>> {
        Ok(read_json(&self.path)?.unwrap_or_default())
    }
}

/// Read a JSON document. Returns `None` if the file doesn't exist.
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    Ok(Some(serde_json::from_str(&content)?))
}

/// Write a JSON document through a temp file and rename.
///
/// Every call writes its own temp file in the target directory, so
/// concurrent writers never share one.
pub(crate) fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let content = serde_json::to_vec_pretty(value)?;
    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(&content)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| e.error)?;
    Ok(())
}
