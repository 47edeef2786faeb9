//! Kid-safety content screening. The core treats moderation as a pluggable
//! validator; the default implementation is a case-insensitive pattern list.

use regex::RegexBuilder;

use crate::error::{MallError, MallResult};

pub trait ContentValidator: Send + Sync {
    /// Ok when the text is acceptable; `Validation` error with a
    /// human-readable reason otherwise.
    fn validate(&self, text: &str) -> MallResult<()>;
}

/// Substring/regex screen over a disallowed-pattern list.
pub struct PatternValidator {
    patterns: Vec<regex::Regex>,
}

impl PatternValidator {
    // Intentionally short starter list; the production list is curated
    // outside this crate and injected via `with_patterns`.
    pub const DEFAULT_PATTERNS: [&'static str; 4] = ["violence", "hate", "abuse", "explicit"];

    pub fn with_patterns<I, S>(patterns: I) -> MallResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut compiled = Vec::new();
        for p in patterns {
            let re = RegexBuilder::new(p.as_ref())
                .case_insensitive(true)
                .build()
                .map_err(|e| MallError::validation("bad_pattern", e.to_string()))?;
            compiled.push(re);
        }
        Ok(Self { patterns: compiled })
    }
}

impl Default for PatternValidator {
    fn default() -> Self {
        // The default list is known-good, so compilation cannot fail.
        Self::with_patterns(Self::DEFAULT_PATTERNS).unwrap_or(Self { patterns: Vec::new() })
    }
}

impl ContentValidator for PatternValidator {
    fn validate(&self, text: &str) -> MallResult<()> {
        for pattern in &self.patterns {
            if pattern.is_match(text) {
                return Err(MallError::validation(
                    "content_moderated",
                    "Content contains inappropriate material. Please use kid-friendly language!",
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_disallowed_words_case_insensitively() {
        let v = PatternValidator::default();
        assert!(v.validate("StarRunner").is_ok());
        assert!(v.validate("violence_kid").is_err());
        assert!(v.validate("HaTeFuL").is_err());
        assert!(v.validate("ExpliciTT").is_err());
    }

    #[test]
    fn custom_patterns_replace_the_default_list() {
        let v = PatternValidator::with_patterns(["dragon"]).unwrap();
        assert!(v.validate("violence").is_ok());
        let err = v.validate("DragonLord").unwrap_err();
        assert!(err.is_validation());
    }
}
