//! Keyword heuristic for adult-content domains.
//!
//! Consulted by the guard only while adult blocking is switched on. The
//! heuristic looks for strong keywords anywhere in the domain, a few weaker
//! keywords that are screened against known innocent names, and the `.xxx`
//! top-level domain.

use once_cell::sync::Lazy;
use regex::Regex;

/// Keywords that on their own mark a domain as adult content.
const STRONG_KEYWORDS: &[&str] = &[
    "porn", "xvideo", "xnxx", "hentai", "redtube", "youporn", "spankbang", "xhamster",
    "brazzers", "bangbros", "onlyfans", "camgirl", "nsfw",
];

/// Keywords with known innocent uses (Essex, adult education, Mac OS X).
const WEAK_KEYWORDS: &[&str] = &["xxx", "sex", "adult", "escort"];

/// Names containing a weak keyword that are not adult content.
static INNOCENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?x)
        (essex|middlesex|sussex|wessex|sexton)\.
        | adult(education|learning|services)\.
        | macosx\.
    ",
    )
    .expect("static regex")
});

static STRONG: Lazy<Regex> =
    Lazy::new(|| Regex::new(&STRONG_KEYWORDS.join("|")).expect("static regex"));

static WEAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(&WEAK_KEYWORDS.join("|")).expect("static regex"));

/// Return what flagged `domain` as adult content, if anything.
///
/// The result is `".xxx"` for the adult TLD or the matched keyword.
/// `domain` should already be normalized (lowercase, no scheme).
pub fn adult_marker(domain: &str) -> Option<String> {
    if domain.is_empty() {
        return None;
    }

    if domain.ends_with(".xxx") {
        return Some(".xxx".to_string());
    }
    if let Some(m) = STRONG.find(domain) {
        return Some(m.as_str().to_string());
    }
    if INNOCENT.is_match(domain) {
        return None;
    }
    WEAK.find(domain).map(|m| m.as_str().to_string())
}

/// Whether `domain` looks like adult content.
///
/// # Example
/// ```
/// use shieldrule::adult::looks_adult;
///
/// assert!(looks_adult("example.xxx"));
/// assert!(!looks_adult("essex.ac.uk"));
/// ```
pub fn looks_adult(domain: &str) -> bool {
    adult_marker(domain).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strong_keywords() {
        assert_eq!(adult_marker("pornhub.com").as_deref(), Some("porn"));
        assert_eq!(adult_marker("www.xvideos.com").as_deref(), Some("xvideo"));
        assert!(looks_adult("freehentai.net"));
        assert!(looks_adult("xhamster.com"));
    }

    #[test]
    fn test_xxx_tld() {
        assert_eq!(adult_marker("site.xxx").as_deref(), Some(".xxx"));
        assert!(looks_adult("www.anything.xxx"));
    }

    #[test]
    fn test_weak_keywords() {
        assert!(looks_adult("sexvideo.net"));
        assert!(looks_adult("freexxx.net"));
        assert!(looks_adult("adultsite.com"));
    }

    #[test]
    fn test_innocent_names() {
        assert!(!looks_adult("essex.ac.uk"));
        assert!(!looks_adult("middlesex.edu"));
        assert!(!looks_adult("adulteducation.gov"));
        assert!(!looks_adult("macosx.apple.com"));
    }

    #[test]
    fn test_common_sites() {
        for domain in ["google.com", "github.com", "wikipedia.org", "example.com", ""] {
            assert!(!looks_adult(domain), "{} flagged", domain);
        }
    }
}
