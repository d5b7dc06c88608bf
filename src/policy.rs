//! Blocking policy: feature toggles and the manual block list.
//!
//! One `Policy` value owns this state and is shared by handle (`Arc`) between
//! the client listener, which edits it, and the kernel listener, which reads
//! it on every classification.

use ahash::AHashSet;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::domain::canonical_www;
use crate::error::{Error, Result};
use crate::store::{read_json, write_json_atomic};

/// A switchable blocking feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    /// Filter-list (EasyList) blocking
    AdBlock,
    /// Adult-content blocking
    AdultBlock,
}

impl Feature {
    /// Get the wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Feature::AdBlock => "ad_block",
            Feature::AdultBlock => "adult_block",
        }
    }

    /// Parse a feature from its wire name.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "ad_block" => Ok(Feature::AdBlock),
            "adult_block" => Ok(Feature::AdultBlock),
            _ => Err(Error::InvalidSetting(format!("unknown feature: {}", s))),
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// On/off state of a feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Toggle {
    On,
    #[default]
    Off,
}

impl Toggle {
    /// Parse `on`/`off`.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "on" => Ok(Toggle::On),
            "off" => Ok(Toggle::Off),
            _ => Err(Error::InvalidSetting(format!("invalid state: {}", s))),
        }
    }

    /// Get the wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Toggle::On => "on",
            Toggle::Off => "off",
        }
    }

    pub fn is_on(&self) -> bool {
        matches!(self, Toggle::On)
    }
}

/// State of one feature and when it last changed (unix seconds).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FeatureState {
    pub state: Toggle,
    pub last_updated: u64,
}

/// Persisted and wire form of the whole policy.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PolicySnapshot {
    #[serde(default)]
    pub ad_block: FeatureState,
    #[serde(default)]
    pub adult_block: FeatureState,
    /// Manually blocked domains, sorted, in canonical `www.` form
    #[serde(default)]
    pub domains: Vec<String>,
}

#[derive(Debug, Default)]
struct Settings {
    ad_block: FeatureState,
    adult_block: FeatureState,
}

impl Settings {
    fn get(&self, feature: Feature) -> FeatureState {
        match feature {
            Feature::AdBlock => self.ad_block,
            Feature::AdultBlock => self.adult_block,
        }
    }

    fn get_mut(&mut self, feature: Feature) -> &mut FeatureState {
        match feature {
            Feature::AdBlock => &mut self.ad_block,
            Feature::AdultBlock => &mut self.adult_block,
        }
    }
}

/// Feature toggles plus the manual block list.
#[derive(Debug, Default)]
pub struct Policy {
    settings: RwLock<Settings>,
    manual: RwLock<AHashSet<String>>,
    /// Held across snapshot and write so saves land in order
    save_lock: Mutex<()>,
}

impl Policy {
    /// Create a policy with every feature off and no blocked domains.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore a policy from a snapshot. Invalid domains are dropped.
    pub fn from_snapshot(snapshot: PolicySnapshot) -> Self {
        let manual = snapshot
            .domains
            .iter()
            .filter_map(|d| match canonical_www(d) {
                Ok(d) => Some(d),
                Err(e) => {
                    log::warn!("Dropping stored domain: {}", e);
                    None
                }
            })
            .collect();

        Self {
            settings: RwLock::new(Settings {
                ad_block: snapshot.ad_block,
                adult_block: snapshot.adult_block,
            }),
            manual: RwLock::new(manual),
            save_lock: Mutex::new(()),
        }
    }

    /// Load a policy from a JSON file. A missing file yields the default policy.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let snapshot: Option<PolicySnapshot> = read_json(path.as_ref())?;
        Ok(Self::from_snapshot(snapshot.unwrap_or_default()))
    }

    /// Save the policy to a JSON file.
    ///
    /// Concurrent saves are serialized; the file always ends up holding a
    /// snapshot taken after every change that preceded the last save.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let _guard = self.save_lock.lock();
        write_json_atomic(path.as_ref(), &self.snapshot())
    }

    /// Current state of everything.
    pub fn snapshot(&self) -> PolicySnapshot {
        let settings = self.settings.read();
        PolicySnapshot {
            ad_block: settings.ad_block,
            adult_block: settings.adult_block,
            domains: self.blocked_domains(),
        }
    }

    /// Switch a feature on or off.
    pub fn set_feature(&self, feature: Feature, state: Toggle) -> FeatureState {
        let mut settings = self.settings.write();
        let entry = settings.get_mut(feature);
        *entry = FeatureState {
            state,
            last_updated: unix_now(),
        };
        log::info!("{} switched {}", feature, state.as_str());
        *entry
    }

    /// Get the state of a feature.
    pub fn feature(&self, feature: Feature) -> FeatureState {
        self.settings.read().get(feature)
    }

    /// Whether a feature is switched on.
    pub fn is_enabled(&self, feature: Feature) -> bool {
        self.feature(feature).state.is_on()
    }

    /// Add a domain to the manual block list.
    ///
    /// Returns the canonical form that was stored.
    pub fn block_domain(&self, domain: &str) -> Result<String> {
        let canonical = canonical_www(domain)?;
        self.manual.write().insert(canonical.clone());
        Ok(canonical)
    }

    /// Remove a domain from the manual block list.
    ///
    /// Returns `false` if the domain was not on the list.
    pub fn unblock_domain(&self, domain: &str) -> Result<bool> {
        let canonical = canonical_www(domain)?;
        Ok(self.manual.write().remove(&canonical))
    }

    /// Whether a domain is on the manual block list.
    pub fn is_manually_blocked(&self, domain: &str) -> bool {
        match canonical_www(domain) {
            Ok(canonical) => self.manual.read().contains(&canonical),
            Err(_) => false,
        }
    }

    /// All manually blocked domains, sorted.
    pub fn blocked_domains(&self) -> Vec<String> {
        let mut domains: Vec<String> = self.manual.read().iter().cloned().collect();
        domains.sort();
        domains
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
