//! Filter pattern type definitions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// PatternType is decided purely from the raw pattern's prefix/suffix syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternType {
    /// Domain anchor: `||example.com^`
    Domain,
    /// Exact address: `|http://example.com/|`
    Exact,
    /// Anything else: `/banner/*/img`
    Wildcard,
    /// Exception: `@@||example.com^`
    Exception,
}

impl PatternType {
    /// Classify a trimmed pattern.
    ///
    /// Precedence: `@@` over `||` over `|...|`, falling back to wildcard.
    pub fn classify(pattern: &str) -> Self {
        if pattern.starts_with("@@") {
            PatternType::Exception
        } else if pattern.starts_with("||") {
            PatternType::Domain
        } else if pattern.len() > 1 && pattern.starts_with('|') && pattern.ends_with('|') {
            PatternType::Exact
        } else {
            PatternType::Wildcard
        }
    }

    /// Parse a pattern type from its name (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "domain" => Some(PatternType::Domain),
            "exact" => Some(PatternType::Exact),
            "wildcard" => Some(PatternType::Wildcard),
            "exception" => Some(PatternType::Exception),
            _ => None,
        }
    }

    /// Get the canonical string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            PatternType::Domain => "domain",
            PatternType::Exact => "exact",
            PatternType::Wildcard => "wildcard",
            PatternType::Exception => "exception",
        }
    }

    /// Whether rules of this type allow rather than block.
    pub fn is_exception(&self) -> bool {
        matches!(self, PatternType::Exception)
    }
}

impl fmt::Display for PatternType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_precedence() {
        assert_eq!(PatternType::classify("@@||example.com^"), PatternType::Exception);
        assert_eq!(PatternType::classify("@@|http://a/|"), PatternType::Exception);
        assert_eq!(PatternType::classify("||example.com^"), PatternType::Domain);
        // `||x|` starts with `|` and ends with `|` too, but the anchor wins
        assert_eq!(PatternType::classify("||x|"), PatternType::Domain);
        assert_eq!(PatternType::classify("|http://example.com/|"), PatternType::Exact);
        assert_eq!(PatternType::classify("/banner/*/img"), PatternType::Wildcard);
    }

    #[test]
    fn test_single_pipe_is_wildcard() {
        assert_eq!(PatternType::classify("|"), PatternType::Wildcard);
        assert_eq!(PatternType::classify("|http://ads."), PatternType::Wildcard);
    }

    #[test]
    fn test_parse_names() {
        assert_eq!(PatternType::parse("DOMAIN"), Some(PatternType::Domain));
        assert_eq!(PatternType::parse("exact"), Some(PatternType::Exact));
        assert_eq!(PatternType::parse("Wildcard"), Some(PatternType::Wildcard));
        assert_eq!(PatternType::parse("exception"), Some(PatternType::Exception));
        assert_eq!(PatternType::parse("regex"), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(PatternType::Domain.to_string(), "domain");
        assert_eq!(PatternType::Exception.to_string(), "exception");
    }
}
