//! Wildcard pattern to regex conversion.

use regex::Regex;

/// Translate a wildcard pattern into regex source.
///
/// `*` becomes "any sequence", `?` becomes "any single character" and every
/// other character is matched literally.
pub fn to_regex_source(pattern: &str) -> String {
    let mut source = String::with_capacity(pattern.len() * 2);
    let mut literal = String::new();

    for c in pattern.chars() {
        match c {
            '*' | '?' => {
                source.push_str(&regex::escape(&literal));
                literal.clear();
                source.push_str(if c == '*' { ".*" } else { "." });
            }
            _ => literal.push(c),
        }
    }
    source.push_str(&regex::escape(&literal));

    source
}

/// Compile a wildcard pattern for substring search.
///
/// Returns `None` when the regex engine rejects the result (for example a
/// pattern exceeding the compiled size limit); such a rule never matches.
pub fn compile(pattern: &str) -> Option<Regex> {
    match Regex::new(&to_regex_source(pattern)) {
        Ok(re) => Some(re),
        Err(e) => {
            log::debug!("Wildcard pattern {:?} does not compile: {}", pattern, e);
            None
        }
    }
}
