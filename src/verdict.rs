//! Classification verdict types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a verdict came out the way it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reason {
    /// Nothing matched
    #[default]
    Default,
    /// An exception rule allowed the domain
    Exception,
    /// A blocking filter rule matched
    FilterList,
    /// The domain is on the manual block list
    Manual,
    /// The adult-content heuristic flagged the domain
    Adult,
}

impl Reason {
    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Reason::Default => "default",
            Reason::Exception => "exception",
            Reason::FilterList => "filter_list",
            Reason::Manual => "manual",
            Reason::Adult => "adult",
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of classifying one domain.
///
/// `rule` names the raw pattern that decided the verdict, when there was one.
/// It is diagnostic only.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Verdict {
    pub blocked: bool,
    pub reason: Reason,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule: Option<String>,
}

impl Verdict {
    /// Default allow: no rule matched.
    pub fn allow() -> Self {
        Self::default()
    }

    /// Allowed by an exception rule.
    pub fn excepted(rule: impl Into<String>) -> Self {
        Self {
            blocked: false,
            reason: Reason::Exception,
            rule: Some(rule.into()),
        }
    }

    /// Blocked for `reason`, optionally naming the deciding rule.
    pub fn block(reason: Reason, rule: Option<String>) -> Self {
        Self {
            blocked: true,
            reason,
            rule,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let action = if self.blocked { "BLOCK" } else { "ALLOW" };
        match &self.rule {
            Some(rule) => write!(f, "{} ({}: {})", action, self.reason, rule),
            None => write!(f, "{} ({})", action, self.reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allow_is_default() {
        let v = Verdict::allow();
        assert!(!v.blocked);
        assert_eq!(v.reason, Reason::Default);
        assert!(v.rule.is_none());
    }

    #[test]
    fn test_display() {
        assert_eq!(Verdict::allow().to_string(), "ALLOW (default)");
        assert_eq!(
            Verdict::block(Reason::FilterList, Some("||ads.com^".into())).to_string(),
            "BLOCK (filter_list: ||ads.com^)"
        );
        assert_eq!(
            Verdict::excepted("@@||ok.com^").to_string(),
            "ALLOW (exception: @@||ok.com^)"
        );
    }

    #[test]
    fn test_serialize_skips_missing_rule() {
        let json = serde_json::to_string(&Verdict::block(Reason::Manual, None)).unwrap();
        assert_eq!(json, r#"{"blocked":true,"reason":"manual"}"#);
    }
}
