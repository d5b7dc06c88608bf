//! The block/allow decision served to the enforcement hook.

use std::sync::Arc;

use crate::adult::adult_marker;
use crate::classifier::Classifier;
use crate::domain::normalize;
use crate::policy::{Feature, Policy};
use crate::verdict::{Reason, Verdict};

/// Combines the policy with the filter-rule classifier.
///
/// Checks run in this order and the first decisive one wins:
/// 1. Manual block list
/// 2. Filter rules, while ad blocking is on (exceptions allow here)
/// 3. Adult-content heuristic, while adult blocking is on
/// 4. Default allow
#[derive(Clone)]
pub struct Guard {
    policy: Arc<Policy>,
    classifier: Arc<Classifier>,
}

impl Guard {
    /// Create a guard over shared policy and classifier handles.
    pub fn new(policy: Arc<Policy>, classifier: Arc<Classifier>) -> Self {
        Self { policy, classifier }
    }

    /// Get the policy handle.
    pub fn policy(&self) -> &Arc<Policy> {
        &self.policy
    }

    /// Get the classifier handle.
    pub fn classifier(&self) -> &Arc<Classifier> {
        &self.classifier
    }

    /// Decide whether `domain` is blocked.
    pub fn check(&self, domain: &str) -> Verdict {
        let host = normalize(domain);
        if host.is_empty() {
            return Verdict::allow();
        }

        if self.policy.is_manually_blocked(&host) {
            return Verdict::block(Reason::Manual, None);
        }

        if self.policy.is_enabled(Feature::AdBlock) {
            let verdict = self.classifier.evaluate(&host);
            if verdict.blocked || verdict.reason == Reason::Exception {
                return verdict;
            }
        }

        if self.policy.is_enabled(Feature::AdultBlock) {
            if let Some(marker) = adult_marker(&host) {
                return Verdict::block(Reason::Adult, Some(marker));
            }
        }

        Verdict::allow()
    }

    /// Whether `domain` is blocked.
    pub fn is_blocked(&self, domain: &str) -> bool {
        self.check(domain).blocked
    }
}
