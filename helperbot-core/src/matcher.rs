use crate::error::{ConfigError, CoreError};
use crate::scoring::{KeywordWeights, ScorePolicy};
use regex::{Regex, RegexBuilder};

/// Decides how relevant a post's combined text is.
///
/// A post qualifies when `score(text) >= threshold()`.
pub trait PostMatcher {
    fn score(&self, text: &str) -> i64;

    fn threshold(&self) -> i64;

    /// Detail line written to the run log when a scan finds nothing.
    fn miss_description(&self) -> String;
}

#[derive(Debug, Clone)]
pub struct KeywordMatcher {
    weights: KeywordWeights,
    threshold: i64,
    policy: ScorePolicy,
}

impl KeywordMatcher {
    pub fn new(weights: KeywordWeights, threshold: i64, policy: ScorePolicy) -> Self {
        Self {
            weights,
            threshold,
            policy,
        }
    }
}

impl PostMatcher for KeywordMatcher {
    fn score(&self, text: &str) -> i64 {
        self.weights.score_with(text, self.threshold, self.policy)
    }

    fn threshold(&self) -> i64 {
        self.threshold
    }

    fn miss_description(&self) -> String {
        format!(
            "No posts reached the {} point threshold found.",
            self.threshold
        )
    }
}

/// Case-insensitive regex search; a hit scores 1 against a threshold of 1.
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    pattern: String,
    regex: Regex,
}

impl PatternMatcher {
    pub fn new(pattern: &str) -> Result<Self, CoreError> {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| ConfigError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self {
            pattern: pattern.to_string(),
            regex,
        })
    }
}

impl PostMatcher for PatternMatcher {
    fn score(&self, text: &str) -> i64 {
        i64::from(self.regex.is_match(text))
    }

    fn threshold(&self) -> i64 {
        1
    }

    fn miss_description(&self) -> String {
        format!("No posts matching \"{}\" found.", self.pattern)
    }
}
