//! Domain normalization and suffix comparison helpers.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// How a domain suffix is compared against a candidate domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuffixMode {
    /// Plain string suffix: `ple.com` matches `example.com`.
    #[default]
    Plain,
    /// Suffix must start at a label boundary: `ple.com` does not match
    /// `example.com`, `example.com` matches `ads.example.com`.
    Label,
}

impl SuffixMode {
    /// Parse a suffix mode from a string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "plain" => Some(SuffixMode::Plain),
            "label" => Some(SuffixMode::Label),
            _ => None,
        }
    }
}

/// Check whether `domain` ends with `suffix` under the given mode.
pub fn suffix_matches(domain: &str, suffix: &str, mode: SuffixMode) -> bool {
    match mode {
        SuffixMode::Plain => domain.ends_with(suffix),
        SuffixMode::Label => {
            if !domain.ends_with(suffix) {
                return false;
            }
            if domain.len() == suffix.len() || suffix.starts_with('.') {
                return true;
            }
            domain.as_bytes()[domain.len() - suffix.len() - 1] == b'.'
        }
    }
}

/// Normalize a domain as typed by a user or reported by the kernel hook.
///
/// Lowercases, strips an `http://`/`https://` scheme, and drops any path,
/// port or trailing dot.
pub fn normalize(domain: &str) -> String {
    let mut host = domain.trim();

    for scheme in ["http://", "https://"] {
        if host
            .get(..scheme.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
        {
            host = &host[scheme.len()..];
            break;
        }
    }

    if let Some(idx) = host.find(['/', '?', '#']) {
        host = &host[..idx];
    }
    if let Some(idx) = host.rfind(':') {
        if host[idx + 1..].chars().all(|c| c.is_ascii_digit()) {
            host = &host[..idx];
        }
    }

    host.trim_end_matches('.').to_lowercase()
}

/// Canonical form used by the manual block list: normalized with a `www.`
/// prefix added when absent.
pub fn canonical_www(domain: &str) -> Result<String> {
    let host = normalize(domain);
    if host.is_empty() || host.contains(char::is_whitespace) {
        return Err(Error::InvalidDomain(domain.to_string()));
    }

    if host.starts_with("www.") {
        Ok(host)
    } else {
        Ok(format!("www.{}", host))
    }
}
