//! Filter option qualifiers (`$script,domain=example.com`).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Value of a single option qualifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    /// Key present without a value (`script`); serialized as `true`.
    Flag(bool),
    /// `key=value`
    Value(String),
}

impl OptionValue {
    /// Get the string value, if this is a `key=value` option.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            OptionValue::Value(v) => Some(v),
            OptionValue::Flag(_) => None,
        }
    }
}

/// Parsed option qualifiers of one filter rule.
///
/// Stored in a `BTreeMap` so iteration order (and therefore serialization)
/// is stable across parses of the same text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleOptions(BTreeMap<String, OptionValue>);

impl RuleOptions {
    /// Create an empty option set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the text after the first `$` of a pattern.
    ///
    /// Tokens are comma separated. A token with `=` becomes a string value
    /// split at the first `=`; any other non-empty token becomes a flag.
    pub fn parse(text: &str) -> Self {
        let mut options = BTreeMap::new();

        for token in text.split(',') {
            if token.is_empty() {
                continue;
            }
            match token.split_once('=') {
                Some((key, value)) => {
                    options.insert(key.to_string(), OptionValue::Value(value.to_string()));
                }
                None => {
                    options.insert(token.to_string(), OptionValue::Flag(true));
                }
            }
        }

        Self(options)
    }

    /// Look up an option by name.
    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.0.get(key)
    }

    /// Whether an option (flag or value) is present.
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Number of options.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if there are no options.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Allowed domain suffixes from a `domain=a.com|b.com` restriction.
    ///
    /// `None` when the rule carries no `domain` option. A bare `domain` flag
    /// yields an empty list, which no candidate can satisfy.
    pub fn domain_restriction(&self) -> Option<Vec<&str>> {
        match self.0.get("domain")? {
            OptionValue::Value(v) => Some(v.split('|').collect()),
            OptionValue::Flag(_) => Some(Vec::new()),
        }
    }
}
