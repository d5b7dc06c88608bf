//! Bookkeeping for filter list downloads.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::{Duration, SystemTime};

use crate::error::Result;
use crate::store::{read_json, write_json_atomic};

/// What the last successful list update produced, and when.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct UpdateMetadata {
    #[serde(default, with = "system_time_serde")]
    pub last_updated: Option<SystemTime>,
    pub etag: Option<String>,
    /// Rules activated by the update
    #[serde(default)]
    pub rules: usize,
    /// Lines skipped as unparseable
    #[serde(default)]
    pub skipped: usize,
}

mod system_time_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    pub fn serialize<S>(time: &Option<SystemTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        time.map(|t| t.duration_since(UNIX_EPOCH).unwrap_or_default().as_secs())
            .serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<SystemTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs: Option<u64> = Option::deserialize(deserializer)?;
        Ok(secs.map(|s| UNIX_EPOCH + Duration::from_secs(s)))
    }
}

impl UpdateMetadata {
    /// Record an update that happened now.
    pub fn now(etag: Option<String>, rules: usize, skipped: usize) -> Self {
        Self {
            last_updated: Some(SystemTime::now()),
            etag,
            rules,
            skipped,
        }
    }

    /// Load metadata from a file.
    ///
    /// Returns default metadata if the file doesn't exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Ok(read_json(path.as_ref())?.unwrap_or_default())
    }

    /// Save metadata to a file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        write_json_atomic(path.as_ref(), self)
    }

    /// Whether `interval` has elapsed since the last update (or there was none).
    pub fn needs_update(&self, interval: Duration) -> bool {
        match self.last_updated {
            None => true,
            Some(last) => {
                let elapsed = SystemTime::now().duration_since(last).unwrap_or(Duration::MAX);
                elapsed >= interval
            }
        }
    }
}
