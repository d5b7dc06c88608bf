//! Shieldrule - adblock-style filter rules for parental control and ad blocking.
//!
//! This crate parses EasyList-style filter rules, classifies domains against
//! them, and wraps the engine in a small policy service that a settings
//! client and a kernel enforcement hook talk to.
//!
//! # Features
//!
//! - **Filter rules**: `||domain^` anchors, `|exact|` matches, `*`/`?`
//!   wildcards, `@@` exceptions and `$option` suffixes
//! - **Exceptions first**: an exception rule always overrides blocking rules
//! - **Atomic refresh**: a new list is built off to the side and swapped in
//! - **Verdict cache**: per-generation cache of classification results
//! - **Remote lists**: download, cache, ETag revalidation and gzip support
//! - **Policy**: feature toggles, manual block list and an adult heuristic
//!
//! # Quick Start
//!
//! ```
//! use shieldrule::{MatchConfig, RuleSet};
//!
//! let lines = ["! comment", "||ads.example.com^", "@@||ok.ads.example.com^"];
//! let (rules, skipped) = RuleSet::build(lines, MatchConfig::default());
//! assert_eq!(skipped, 0);
//!
//! assert!(rules.is_blocked("ads.example.com"));
//! assert!(!rules.is_blocked("ok.ads.example.com"));
//! assert!(!rules.is_blocked("example.org"));
//! ```
//!
//! # Remote Lists
//!
//! ```ignore
//! use shieldrule::{Classifier, RemoteListManager, EASYLIST_URL};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! let classifier = Arc::new(Classifier::default());
//! let mut manager =
//!     RemoteListManager::new(EASYLIST_URL, Path::new("/tmp/shieldrule"), classifier.clone());
//!
//! // Loads the cached list or downloads it
//! manager.init()?;
//! assert!(classifier.is_blocked("doubleclick.net"));
//!
//! // Revalidates with If-None-Match
//! if manager.update()? {
//!     println!("List updated");
//! }
//! ```
//!
//! # Matching Order
//!
//! 1. Exception rules, in list order; the first match allows the domain
//! 2. Blocking rules, in list order; the first match blocks the domain
//! 3. Default allow

pub mod adult;
pub mod classifier;
pub mod config;
pub mod domain;
mod error;
mod global;
pub mod guard;
mod metadata;
mod pattern_type;
pub mod policy;
pub mod protocol;
pub mod remote;
pub mod rule;
pub mod ruleset;
pub mod server;
pub mod store;
mod verdict;

// Re-export core types
pub use error::{Error, ParseError, Result};
pub use pattern_type::PatternType;
pub use rule::{FilterRule, OptionValue, RuleOptions};
pub use verdict::{Reason, Verdict};

// Re-export rule set and classifier types
pub use classifier::{Classifier, ClassifierConfig, RefreshReport};
pub use ruleset::{MatchConfig, RuleSet};

// Re-export global API functions
pub use global::{
    active_rule_set, evaluate, global_classifier, is_blocked, refresh, replace_rule_set,
};

// Re-export domain helpers
pub use domain::{canonical_www, normalize, SuffixMode};

// Re-export policy and service types
pub use config::ServerConfig;
pub use guard::Guard;
pub use policy::{Feature, Policy, PolicySnapshot, Toggle};

// Re-export persistence and remote list management
pub use metadata::UpdateMetadata;
pub use remote::{RemoteListManager, EASYLIST_URL};
pub use store::{JsonFileStore, MemoryStore, RuleStore, StoredRule};
