//! RuleSet configuration types.

use serde::{Deserialize, Serialize};

use crate::domain::SuffixMode;

/// Matching knobs applied to every rule of a RuleSet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MatchConfig {
    /// How domain anchors and `domain=` options compare suffixes
    #[serde(default)]
    pub suffix_mode: SuffixMode,
}

impl MatchConfig {
    /// Create a new MatchConfig.
    pub fn new(suffix_mode: SuffixMode) -> Self {
        Self { suffix_mode }
    }

    /// Label-boundary-aware suffix matching.
    pub fn label_aware() -> Self {
        Self::new(SuffixMode::Label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_plain() {
        assert_eq!(MatchConfig::default().suffix_mode, SuffixMode::Plain);
        assert_eq!(MatchConfig::label_aware().suffix_mode, SuffixMode::Label);
    }
}
