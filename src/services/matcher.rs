//! Keyword matching.
//!
//! Case-insensitive substring tests of the configured keywords against a
//! text fragment, combined according to the match mode.

use crate::models::MatchMode;

/// Pre-lowercased keyword set with its combination policy.
#[derive(Debug, Clone)]
pub struct KeywordMatcher {
    keywords: Vec<String>,
    mode: MatchMode,
}

impl KeywordMatcher {
    /// Create a matcher. An empty keyword list is the caller's problem.
    pub fn new<S: AsRef<str>>(keywords: &[S], mode: MatchMode) -> Self {
        Self {
            keywords: keywords
                .iter()
                .map(|k| k.as_ref().to_lowercase())
                .collect(),
            mode,
        }
    }

    /// Whether `text` satisfies the keyword policy.
    pub fn matches(&self, text: &str) -> bool {
        let text = text.to_lowercase();
        match self.mode {
            MatchMode::Any => self.keywords.iter().any(|k| text.contains(k.as_str())),
            MatchMode::All => self.keywords.iter().all(|k| text.contains(k.as_str())),
        }
    }

    /// Whether `text` contains at least one keyword, ignoring the mode.
    pub fn contains_any(&self, text: &str) -> bool {
        let text = text.to_lowercase();
        self.keywords.iter().any(|k| text.contains(k.as_str()))
    }
}

/// Convenience function for a one-off keyword test.
pub fn matches<S: AsRef<str>>(text: &str, keywords: &[S], mode: MatchMode) -> bool {
    KeywordMatcher::new(keywords, mode).matches(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_any_mode() {
        assert!(matches("only a here", &["a", "b"], MatchMode::Any));
        assert!(!matches("nothing", &["x", "y"], MatchMode::Any));
    }

    #[test]
    fn test_all_mode() {
        assert!(!matches("only a here", &["a", "zz"], MatchMode::All));
        assert!(matches("a and b", &["a", "b"], MatchMode::All));
    }

    #[test]
    fn test_all_mode_requires_every_keyword() {
        let text = "xax";
        assert!(!matches(text, &["a", "b"], MatchMode::All));
        assert!(matches(text, &["a", "b"], MatchMode::Any));
    }

    #[test]
    fn test_case_insensitive() {
        let matcher = KeywordMatcher::new(&["Switch2"], MatchMode::Any);
        assert!(matcher.matches("NEW SWITCH2 BUNDLE"));
        assert!(matcher.contains_any("/products/switch2-multilingual"));
    }

    #[test]
    fn test_japanese_keywords() {
        let matcher = KeywordMatcher::new(&["抽選", "招待販売"], MatchMode::Any);
        assert!(matcher.matches("「Nintendo Switch 2」招待販売について"));
        assert!(!matcher.matches("新着情報"));
    }

    #[test]
    fn test_contains_any_ignores_mode() {
        let matcher = KeywordMatcher::new(&["switch2", "抽選"], MatchMode::All);
        assert!(!matcher.matches("/switch2"));
        assert!(matcher.contains_any("/switch2"));
    }
}
