//! Filter rule parsing and matching.
//!
//! A [`FilterRule`] is one parsed line of an adblock-style list. Only the
//! network-filter subset is understood:
//!
//! - `||example.com^` domain anchor (suffix match on the domain)
//! - `|http://example.com/|` exact address
//! - `/banner/*/img` wildcard (substring search, `*` and `?` wildcards)
//! - `@@...` exception
//! - `$opt,key=value` option qualifiers, of which only `domain=` affects
//!   matching

mod options;
pub mod wildcard;

pub use options::{OptionValue, RuleOptions};

use once_cell::sync::OnceCell;
use regex::Regex;

use crate::domain::{suffix_matches, SuffixMode};
use crate::error::ParseError;
use crate::PatternType;

/// How the processed pattern is compared against a candidate.
#[derive(Debug, Clone)]
enum Matcher {
    Suffix(String),
    Exact(String),
    Wildcard {
        pattern: String,
        regex: OnceCell<Option<Regex>>,
    },
}

impl Matcher {
    fn for_pattern(pattern_type: PatternType, processed: &str) -> Self {
        match pattern_type {
            PatternType::Domain => Matcher::Suffix(processed.to_string()),
            PatternType::Exact => Matcher::Exact(processed.to_string()),
            PatternType::Wildcard => Matcher::Wildcard {
                pattern: processed.to_string(),
                regex: OnceCell::new(),
            },
            // Exceptions match with the shape of their body: `@@||x^` is a
            // domain anchor, `@@|x|` an exact address, anything else wildcard.
            PatternType::Exception => match PatternType::classify(processed) {
                PatternType::Exception => Self::for_pattern(PatternType::Wildcard, processed),
                inner => Self::for_pattern(inner, &strip_markers(inner, processed)),
            },
        }
    }

    fn matches(&self, url: &str, domain: &str, mode: SuffixMode) -> bool {
        match self {
            Matcher::Suffix(suffix) => suffix_matches(domain, suffix, mode),
            Matcher::Exact(exact) => url == exact,
            Matcher::Wildcard { pattern, regex } => regex
                .get_or_init(|| wildcard::compile(pattern))
                .as_ref()
                .map(|re| re.is_match(url))
                .unwrap_or(false),
        }
    }
}

/// One parsed filter line.
///
/// Rules are immutable once parsed. Parsing the same raw text always yields
/// an equal rule.
#[derive(Debug, Clone)]
pub struct FilterRule {
    raw_pattern: String,
    pattern_type: PatternType,
    processed_pattern: String,
    options: RuleOptions,
    matcher: Matcher,
}

impl FilterRule {
    /// Parse one filter line.
    ///
    /// Fails only when the line is empty after trimming; unrecognized syntax
    /// falls back to a wildcard rule.
    ///
    /// # Examples
    /// ```
    /// use shieldrule::{FilterRule, PatternType};
    ///
    /// let rule = FilterRule::parse("||example.com^").unwrap();
    /// assert_eq!(rule.pattern_type(), PatternType::Domain);
    /// assert_eq!(rule.processed_pattern(), "example.com");
    /// assert!(rule.matches("ads.example.com", "ads.example.com"));
    /// ```
    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        let pattern = raw.trim();
        if pattern.is_empty() {
            return Err(ParseError::MalformedPattern);
        }

        let pattern_type = PatternType::classify(pattern);

        let (body, options) = match pattern.split_once('$') {
            Some((body, opts)) => (body, RuleOptions::parse(opts)),
            None => (pattern, RuleOptions::new()),
        };

        let processed_pattern = strip_markers(pattern_type, body);
        let matcher = Matcher::for_pattern(pattern_type, &processed_pattern);

        Ok(Self {
            raw_pattern: raw.to_string(),
            pattern_type,
            processed_pattern,
            options,
            matcher,
        })
    }

    /// Original source text, unmodified.
    pub fn raw_pattern(&self) -> &str {
        &self.raw_pattern
    }

    /// Type decided from the pattern syntax.
    pub fn pattern_type(&self) -> PatternType {
        self.pattern_type
    }

    /// Pattern with anchors, pipes and options removed.
    pub fn processed_pattern(&self) -> &str {
        &self.processed_pattern
    }

    /// Option qualifiers.
    pub fn options(&self) -> &RuleOptions {
        &self.options
    }

    /// Whether this is an exception (allow) rule.
    pub fn is_exception(&self) -> bool {
        self.pattern_type.is_exception()
    }

    /// Match a candidate using plain string suffix comparison.
    pub fn matches(&self, url: &str, domain: &str) -> bool {
        self.matches_with(url, domain, SuffixMode::Plain)
    }

    /// Match a candidate.
    ///
    /// A `domain=` option restricts the rule to candidates whose domain ends
    /// with one of the listed domains; outside of them the rule never
    /// matches. Otherwise dispatch is by pattern type: domain anchors compare
    /// suffixes of `domain`, exact rules compare `url` for equality and
    /// wildcards search `url`.
    pub fn matches_with(&self, url: &str, domain: &str, mode: SuffixMode) -> bool {
        if let Some(allowed) = self.options.domain_restriction() {
            if !allowed.iter().any(|d| suffix_matches(domain, d, mode)) {
                return false;
            }
        }

        self.matcher.matches(url, domain, mode)
    }
}

impl PartialEq for FilterRule {
    fn eq(&self, other: &Self) -> bool {
        self.raw_pattern == other.raw_pattern
            && self.pattern_type == other.pattern_type
            && self.processed_pattern == other.processed_pattern
            && self.options == other.options
    }
}

impl Eq for FilterRule {}

/// Remove the syntax markers of `pattern_type` from an option-free pattern.
fn strip_markers(pattern_type: PatternType, body: &str) -> String {
    match pattern_type {
        PatternType::Exception => body.strip_prefix("@@").unwrap_or(body).to_string(),
        PatternType::Domain => {
            let body = body.strip_prefix("||").unwrap_or(body);
            body.strip_suffix('^').unwrap_or(body).to_string()
        }
        PatternType::Exact => {
            let body = body.strip_prefix('|').unwrap_or(body);
            body.strip_suffix('|').unwrap_or(body).to_string()
        }
        PatternType::Wildcard => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_is_malformed() {
        assert_eq!(FilterRule::parse("").unwrap_err(), ParseError::MalformedPattern);
        assert_eq!(FilterRule::parse("  \t ").unwrap_err(), ParseError::MalformedPattern);
    }

    #[test]
    fn test_parse_domain_anchor() {
        let rule = FilterRule::parse("||example.com^").unwrap();
        assert_eq!(rule.pattern_type(), PatternType::Domain);
        assert_eq!(rule.processed_pattern(), "example.com");
        assert!(rule.options().is_empty());

        // Without a trailing separator only the anchor is removed
        let rule = FilterRule::parse("||example.com").unwrap();
        assert_eq!(rule.processed_pattern(), "example.com");
    }

    #[test]
    fn test_parse_exact() {
        let rule = FilterRule::parse("|http://example.com/|").unwrap();
        assert_eq!(rule.pattern_type(), PatternType::Exact);
        assert_eq!(rule.processed_pattern(), "http://example.com/");
    }

    #[test]
    fn test_parse_exception() {
        let rule = FilterRule::parse("@@||example.com^$script").unwrap();
        assert_eq!(rule.pattern_type(), PatternType::Exception);
        assert_eq!(rule.processed_pattern(), "||example.com^");
        assert!(rule.options().contains("script"));
        assert!(rule.is_exception());
    }

    #[test]
    fn test_parse_wildcard_with_options() {
        let rule = FilterRule::parse("ads.js$domain=foo.com|bar.com").unwrap();
        assert_eq!(rule.pattern_type(), PatternType::Wildcard);
        assert_eq!(rule.processed_pattern(), "ads.js");
        assert_eq!(
            rule.options().get("domain").and_then(|v| v.as_str()),
            Some("foo.com|bar.com")
        );
    }

    #[test]
    fn test_raw_pattern_kept_verbatim() {
        let rule = FilterRule::parse("  ||example.com^  ").unwrap();
        assert_eq!(rule.raw_pattern(), "  ||example.com^  ");
        assert_eq!(rule.processed_pattern(), "example.com");
    }

    #[test]
    fn test_parse_is_idempotent() {
        for raw in [
            "||example.com^",
            "|http://example.com/|",
            "/banner/*/img",
            "@@||good.com^$domain=a.com",
            "ads.js$script,domain=foo.com|bar.com",
        ] {
            let a = FilterRule::parse(raw).unwrap();
            let b = FilterRule::parse(raw).unwrap();
            assert_eq!(a, b);
            assert_eq!(a.processed_pattern(), b.processed_pattern());
            assert_eq!(a.pattern_type(), b.pattern_type());
        }
    }

    #[test]
    fn test_domain_suffix_matching() {
        let rule = FilterRule::parse("||example.com^").unwrap();
        assert!(rule.matches("ads.example.com", "ads.example.com"));
        assert!(rule.matches("example.com", "example.com"));
        assert!(!rule.matches("example.org", "example.org"));
    }

    #[test]
    fn test_domain_suffix_plain_vs_label() {
        let rule = FilterRule::parse("||ple.com^").unwrap();
        assert!(rule.matches("example.com", "example.com"));
        assert!(!rule.matches_with("example.com", "example.com", SuffixMode::Label));
    }

    #[test]
    fn test_exact_matching() {
        let rule = FilterRule::parse("|http://example.com/|").unwrap();
        assert!(rule.matches("http://example.com/", "example.com"));
        assert!(!rule.matches("http://example.com/x", "example.com"));
        assert!(!rule.matches("https://example.com/", "example.com"));
    }

    #[test]
    fn test_wildcard_matching() {
        let rule = FilterRule::parse("/banner/*/img").unwrap();
        assert!(rule.matches("https://x.com/banner/foo/img", "x.com"));
        assert!(!rule.matches("https://x.com/banners", "x.com"));
    }

    #[test]
    fn test_domain_option_restriction() {
        let rule = FilterRule::parse("ads.js$domain=foo.com|bar.com").unwrap();
        let url = "https://cdn.net/ads.js";
        assert!(rule.matches(url, "foo.com"));
        assert!(rule.matches(url, "www.bar.com"));
        assert!(!rule.matches(url, "baz.com"));
    }

    #[test]
    fn test_bare_domain_flag_never_matches() {
        let rule = FilterRule::parse("ads.js$domain").unwrap();
        assert!(!rule.matches("ads.js", "foo.com"));
    }

    #[test]
    fn test_exception_matches_by_body_shape() {
        let rule = FilterRule::parse("@@||good.example.com^").unwrap();
        assert!(rule.matches("good.example.com", "good.example.com"));
        assert!(rule.matches("cdn.good.example.com", "cdn.good.example.com"));
        assert!(!rule.matches("other.com", "other.com"));

        let rule = FilterRule::parse("@@|http://a.com/|").unwrap();
        assert!(rule.matches("http://a.com/", "a.com"));
        assert!(!rule.matches("a.com", "a.com"));

        let rule = FilterRule::parse("@@/track/*").unwrap();
        assert!(rule.matches("https://a.com/track/1", "a.com"));
    }
}
