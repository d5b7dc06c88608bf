//! RuleSet construction and the block/allow precedence policy.

mod config;

pub use config::MatchConfig;

use ahash::AHashSet;
use std::io::{BufRead, BufReader, Read};

use crate::rule::FilterRule;
use crate::store::StoredRule;
use crate::verdict::{Reason, Verdict};

/// An immutable collection of filter rules.
///
/// Exceptions and blocking rules live in one vector; the partition is a view
/// computed while evaluating. Evaluation order is:
/// 1. Every exception rule. The first match allows the domain.
/// 2. Every blocking rule. The first match blocks the domain.
/// 3. Default allow.
///
/// Because exceptions are a dedicated first pass, the order rules appeared
/// in the source list never changes a verdict.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<FilterRule>,
    config: MatchConfig,
}

impl RuleSet {
    /// Create an empty RuleSet.
    pub fn new(config: MatchConfig) -> Self {
        Self {
            rules: Vec::new(),
            config,
        }
    }

    /// Create a RuleSet from already parsed rules.
    pub fn from_rules(rules: Vec<FilterRule>, config: MatchConfig) -> Self {
        Self { rules, config }
    }

    /// Build a RuleSet from list lines.
    ///
    /// Blank lines, `!` comments and `[` section headers are filtered out
    /// before parsing and do not count as failures. Lines that fail to parse
    /// are logged and counted in the returned skipped count. Repeated raw
    /// patterns are kept once.
    pub fn build<I, S>(lines: I, config: MatchConfig) -> (Self, usize)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut rules = Vec::new();
        let mut seen = AHashSet::new();
        let mut skipped = 0;

        for line in lines {
            let line = line.as_ref();
            if !is_rule_line(line) {
                continue;
            }

            match FilterRule::parse(line) {
                Ok(rule) => {
                    if seen.insert(rule.raw_pattern().to_string()) {
                        rules.push(rule);
                    }
                }
                Err(e) => {
                    log::warn!("Skipping filter rule {:?}: {}", line, e);
                    skipped += 1;
                }
            }
        }

        (Self::from_rules(rules, config), skipped)
    }

    /// Build a RuleSet from list text read from `reader`.
    ///
    /// Reading stops at the first IO error; rules read until then are kept.
    pub fn from_reader<R: Read>(reader: R, config: MatchConfig) -> (Self, usize) {
        let lines = BufReader::new(reader).lines().map_while(|line| match line {
            Ok(l) => Some(l),
            Err(e) => {
                log::warn!("Stopped reading filter list: {}", e);
                None
            }
        });
        Self::build(lines, config)
    }

    /// Rebuild a RuleSet from persisted rules.
    ///
    /// Rules are re-parsed from `raw_pattern`, which reproduces the stored
    /// type, processed pattern and options exactly.
    pub fn from_stored(stored: &[StoredRule], config: MatchConfig) -> (Self, usize) {
        Self::build(stored.iter().map(|r| r.raw_pattern.as_str()), config)
    }

    /// Persistable form of every rule, in set order.
    pub fn to_stored(&self) -> Vec<StoredRule> {
        self.rules.iter().map(StoredRule::from).collect()
    }

    /// Get the number of rules in this set.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Check if this rule set has no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// All rules, in source order.
    pub fn rules(&self) -> &[FilterRule] {
        &self.rules
    }

    /// Exception rules.
    pub fn exceptions(&self) -> impl Iterator<Item = &FilterRule> {
        self.rules.iter().filter(|r| r.is_exception())
    }

    /// Blocking (non-exception) rules.
    pub fn blocking(&self) -> impl Iterator<Item = &FilterRule> {
        self.rules.iter().filter(|r| !r.is_exception())
    }

    /// Get the matching configuration.
    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Classify a domain, reporting the deciding rule.
    ///
    /// The domain serves as both the URL and the domain of the candidate.
    pub fn evaluate(&self, domain: &str) -> Verdict {
        let mode = self.config.suffix_mode;

        if let Some(rule) = self
            .exceptions()
            .find(|r| r.matches_with(domain, domain, mode))
        {
            return Verdict::excepted(rule.raw_pattern());
        }

        if let Some(rule) = self.blocking().find(|r| r.matches_with(domain, domain, mode)) {
            return Verdict::block(Reason::FilterList, Some(rule.raw_pattern().to_string()));
        }

        Verdict::allow()
    }

    /// Whether a domain is blocked. Never fails.
    pub fn is_blocked(&self, domain: &str) -> bool {
        self.evaluate(domain).blocked
    }
}

/// Whether a list line carries a rule (not blank, comment or section header).
fn is_rule_line(line: &str) -> bool {
    let line = line.trim();
    !(line.is_empty() || line.starts_with('!') || line.starts_with('['))
}
