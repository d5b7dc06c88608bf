//! Process-wide classifier and public convenience API.
//!
//! Callers that do not want to thread a [`Classifier`] handle through their
//! code can use these free functions. They all operate on one lazily
//! created classifier with the default configuration.

use once_cell::sync::Lazy;
use std::sync::Arc;

use crate::classifier::{Classifier, RefreshReport};
use crate::ruleset::RuleSet;
use crate::verdict::Verdict;

/// Global classifier
static GLOBAL_CLASSIFIER: Lazy<Classifier> = Lazy::new(Classifier::default);

/// Get the process-wide classifier.
pub fn global_classifier() -> &'static Classifier {
    &GLOBAL_CLASSIFIER
}

/// Check a domain against the global rule set.
///
/// # Examples
/// ```ignore
/// use shieldrule::{is_blocked, refresh};
///
/// refresh("||ads.example.com^\n");
/// assert!(is_blocked("ads.example.com"));
/// ```
pub fn is_blocked(domain: &str) -> bool {
    GLOBAL_CLASSIFIER.is_blocked(domain)
}

/// Classify a domain against the global rule set, reporting the deciding rule.
pub fn evaluate(domain: &str) -> Verdict {
    GLOBAL_CLASSIFIER.evaluate(domain)
}

/// Rebuild the global rule set from list text and swap it in.
pub fn refresh(raw_text: &str) -> RefreshReport {
    GLOBAL_CLASSIFIER.refresh(raw_text)
}

/// Replace the global rule set with an already built one.
pub fn replace_rule_set(ruleset: RuleSet) -> u64 {
    GLOBAL_CLASSIFIER.replace(ruleset)
}

/// Read-only snapshot of the global rule set.
pub fn active_rule_set() -> Arc<RuleSet> {
    GLOBAL_CLASSIFIER.active()
}
