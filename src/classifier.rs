//! Classifier host: the active RuleSet with atomic refresh and a verdict cache.
//!
//! The active set is published through an `ArcSwap`, so a refresh builds the
//! complete new set off to the side and swaps it in with one pointer store.
//! Every in-flight evaluation works against the snapshot it loaded and sees
//! either the old generation or the new one, never a mix.

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use quick_cache::sync::Cache;
use std::sync::Arc;

use crate::ruleset::{MatchConfig, RuleSet};
use crate::verdict::Verdict;

/// Default cache capacity (number of entries).
const DEFAULT_CACHE_CAPACITY: usize = 10_000;

/// Configuration for the classifier.
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// Matching knobs used for rule sets built by `refresh`.
    pub match_config: MatchConfig,
    /// Maximum number of cached verdicts.
    pub cache_capacity: usize,
    /// Whether to cache verdicts.
    pub cache_enabled: bool,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            match_config: MatchConfig::default(),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            cache_enabled: true,
        }
    }
}

impl ClassifierConfig {
    /// Create a configuration with the specified cache capacity.
    ///
    /// A capacity of zero disables caching.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            cache_capacity: capacity,
            cache_enabled: capacity > 0,
            ..Self::default()
        }
    }

    /// Create a configuration with caching disabled.
    pub fn no_cache() -> Self {
        Self::with_capacity(0)
    }
}

/// Summary of one refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshReport {
    /// Rules in the new active set
    pub rules: usize,
    /// Lines that failed to parse
    pub skipped: usize,
    /// Generation number of the new active set
    pub generation: u64,
}

/// A published rule set tagged with its generation.
struct Active {
    ruleset: Arc<RuleSet>,
    generation: u64,
}

/// Holds the active RuleSet and answers classification requests.
///
/// Safe to share between threads; evaluation never takes a lock.
pub struct Classifier {
    active: ArcSwap<Active>,
    /// Cached verdicts tagged with the generation that produced them.
    cache: Option<Cache<String, (u64, Verdict)>>,
    config: ClassifierConfig,
    /// Next generation to assign. Held across the store so publishes land
    /// in generation order.
    next_generation: Mutex<u64>,
}

impl Classifier {
    /// Create a classifier with an empty rule set (allows everything).
    pub fn new(config: ClassifierConfig) -> Self {
        Self::with_ruleset(RuleSet::new(config.match_config), config)
    }

    /// Create a classifier starting from `ruleset`.
    pub fn with_ruleset(ruleset: RuleSet, config: ClassifierConfig) -> Self {
        let cache = if config.cache_enabled && config.cache_capacity > 0 {
            Some(Cache::new(config.cache_capacity))
        } else {
            None
        };

        Self {
            active: ArcSwap::from_pointee(Active {
                ruleset: Arc::new(ruleset),
                generation: 0,
            }),
            cache,
            config,
            next_generation: Mutex::new(1),
        }
    }

    /// Read-only snapshot of the active rule set.
    pub fn active(&self) -> Arc<RuleSet> {
        self.active.load().ruleset.clone()
    }

    /// Generation of the active rule set (incremented on each swap).
    pub fn generation(&self) -> u64 {
        self.active.load().generation
    }

    /// Get the classifier configuration.
    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Publish `ruleset` as the active set, discarding the previous one.
    ///
    /// Returns the generation assigned to the new set. Concurrent callers
    /// are serialized, so the active set is always the newest generation.
    pub fn replace(&self, ruleset: RuleSet) -> u64 {
        let mut next = self.next_generation.lock();
        let generation = *next;
        *next += 1;

        self.active.store(Arc::new(Active {
            ruleset: Arc::new(ruleset),
            generation,
        }));

        if let Some(ref cache) = self.cache {
            cache.clear();
        }

        generation
    }

    /// Build a new rule set from list text and swap it in.
    ///
    /// Parse failures are logged and counted; they never abort the build.
    pub fn refresh(&self, raw_text: &str) -> RefreshReport {
        self.refresh_lines(raw_text.lines())
    }

    /// Build a new rule set from list lines and swap it in.
    pub fn refresh_lines<I, S>(&self, lines: I) -> RefreshReport
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let (ruleset, skipped) = RuleSet::build(lines, self.config.match_config);
        let rules = ruleset.len();
        let generation = self.replace(ruleset);

        log::info!(
            "Activated filter rules: {} rules, {} skipped (generation {})",
            rules,
            skipped,
            generation
        );

        RefreshReport {
            rules,
            skipped,
            generation,
        }
    }

    /// Classify a domain against the active rule set.
    pub fn evaluate(&self, domain: &str) -> Verdict {
        let active = self.active.load();

        if let Some(ref cache) = self.cache {
            if let Some((generation, verdict)) = cache.get(domain) {
                if generation == active.generation {
                    return verdict;
                }
            }
        }

        let verdict = active.ruleset.evaluate(domain);

        if let Some(ref cache) = self.cache {
            cache.insert(domain.to_string(), (active.generation, verdict.clone()));
        }

        verdict
    }

    /// Whether a domain is blocked by the active rule set. Never fails.
    pub fn is_blocked(&self, domain: &str) -> bool {
        self.evaluate(domain).blocked
    }

    /// Clear the verdict cache.
    pub fn clear_cache(&self) {
        if let Some(ref cache) = self.cache {
            cache.clear();
        }
    }

    /// Number of cached verdicts.
    pub fn cache_len(&self) -> usize {
        self.cache.as_ref().map(|c| c.len()).unwrap_or(0)
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(ClassifierConfig::default())
    }
}
