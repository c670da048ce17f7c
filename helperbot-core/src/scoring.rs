//! Weighted keyword scoring.
//!
//! A post's relevance is the sum of the weights of every keyword that occurs
//! anywhere in its case-folded text. Matching is plain substring containment,
//! so `"boot"` also hits `"reboot"`.

use crate::error::{ConfigError, CoreError};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// When the running score is compared against the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScorePolicy {
    /// Stop at the first keyword whose cumulative sum reaches the threshold.
    #[default]
    EarlyExit,
    /// Sum every keyword, then compare.
    FullSum,
}

/// Keyword table in the order it was loaded. Keywords are stored lowercase.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeywordWeights {
    entries: Vec<(String, i64)>,
}

/// On-disk shape of the keyword document. The legacy file wraps the table in
/// a `text_values` key.
#[derive(Deserialize)]
#[serde(untagged)]
enum KeywordDocument {
    Wrapped { text_values: IndexMap<String, i64> },
    Bare(IndexMap<String, i64>),
}

impl KeywordWeights {
    pub fn new<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, i64)>,
        K: AsRef<str>,
    {
        Self {
            entries: pairs
                .into_iter()
                .map(|(keyword, weight)| (keyword.as_ref().to_lowercase(), weight))
                .collect(),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, CoreError> {
        let table = match serde_json::from_str::<KeywordDocument>(json)? {
            KeywordDocument::Wrapped { text_values } => text_values,
            KeywordDocument::Bare(table) => table,
        };
        Ok(Self::new(table))
    }

    pub fn load(path: &Path) -> Result<Self, CoreError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.display().to_string(),
            }
            .into());
        }
        let content = std::fs::read_to_string(path)?;
        let weights = Self::from_json_str(&content)?;
        debug!(
            "Loaded {} keyword weights from {}",
            weights.len(),
            path.display()
        );
        Ok(weights)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.entries.iter().map(|(k, w)| (k.as_str(), *w))
    }

    /// Sum of the weights of every keyword contained in `text`, saturating at
    /// the `i64` bounds.
    pub fn score(&self, text: &str) -> i64 {
        let text = text.to_lowercase();
        self.iter()
            .filter(|(keyword, _)| text.contains(keyword))
            .fold(0i64, |total, (_, weight)| total.saturating_add(weight))
    }

    /// Like [`score`](Self::score) but stops after the first keyword at which
    /// the running total is at least `threshold`. The check runs after every
    /// keyword, matched or not.
    pub fn score_until(&self, text: &str, threshold: i64) -> i64 {
        let text = text.to_lowercase();
        let mut total: i64 = 0;
        for (keyword, weight) in self.iter() {
            if text.contains(keyword) {
                total = total.saturating_add(weight);
            }
            if total >= threshold {
                debug!("Threshold {} reached at keyword '{}'", threshold, keyword);
                break;
            }
        }
        total
    }

    pub fn score_with(&self, text: &str, threshold: i64, policy: ScorePolicy) -> i64 {
        match policy {
            ScorePolicy::EarlyExit => self.score_until(text, threshold),
            ScorePolicy::FullSum => self.score(text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kali_weights() -> KeywordWeights {
        KeywordWeights::new([("boot", 4), ("kali", 6)])
    }

    #[test]
    fn test_score_sums_contained_keywords() {
        let weights = kali_weights();
        assert_eq!(weights.score("how do i dual-boot kali and windows?"), 10);
        assert_eq!(weights.score("What's your favorite distro?"), 0);
    }

    #[test]
    fn test_score_is_case_insensitive_on_both_sides() {
        let weights = KeywordWeights::new([("VirtualBox", 3)]);
        assert_eq!(weights.score("Kali in VIRTUALBOX"), 3);
    }

    #[test]
    fn test_substring_matching_ignores_word_boundaries() {
        let weights = KeywordWeights::new([("boot", 4)]);
        assert_eq!(weights.score("my laptop keeps rebooting"), 4);
    }

    #[test]
    fn test_early_exit_stops_at_first_keyword_reaching_threshold() {
        let weights = KeywordWeights::new([("kali", 6), ("boot", 4), ("wifi", 5)]);
        let text = "kali wifi boot";
        assert_eq!(weights.score(text), 15);
        // kali (6) + boot (4) reaches 10 before wifi is considered
        assert_eq!(weights.score_until(text, 10), 10);
    }

    #[test]
    fn test_early_exit_below_threshold_matches_full_sum() {
        let weights = kali_weights();
        assert_eq!(weights.score_until("kali", 10), 6);
        assert_eq!(weights.score("kali"), 6);
    }

    #[test]
    fn test_policies_diverge_with_negative_weights() {
        let weights = KeywordWeights::new([("kali", 10), ("ctf", -5)]);
        let text = "kali ctf writeup";
        assert_eq!(weights.score_with(text, 10, ScorePolicy::EarlyExit), 10);
        assert_eq!(weights.score_with(text, 10, ScorePolicy::FullSum), 5);
    }

    #[test]
    fn test_wrapped_and_bare_documents_keep_order() {
        let wrapped =
            KeywordWeights::from_json_str(r#"{"text_values": {"Zsh": 1, "apt": 2, "Grub": 3}}"#)
                .unwrap();
        let keys: Vec<&str> = wrapped.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["zsh", "apt", "grub"]);

        let bare = KeywordWeights::from_json_str(r#"{"wifi": 5}"#).unwrap();
        assert_eq!(bare.len(), 1);
    }

    #[test]
    fn test_load_missing_file_is_config_error() {
        let path = std::env::temp_dir().join(format!("missing_{}.json", uuid::Uuid::new_v4()));
        let result = KeywordWeights::load(&path);
        assert!(matches!(
            result,
            Err(CoreError::Config(ConfigError::FileNotFound { .. }))
        ));
    }

    #[test]
    fn test_large_weights_saturate() {
        let weights = KeywordWeights::new([("a", i64::MAX), ("b", 1), ("c", i64::MIN)]);
        assert_eq!(weights.score("ab"), i64::MAX);
        assert_eq!(weights.score_until("ab", i64::MAX), i64::MAX);
        assert_eq!(weights.score("abc"), -1);

        let negative = KeywordWeights::new([("x", i64::MIN), ("y", -1)]);
        assert_eq!(negative.score("xy"), i64::MIN);
        assert_eq!(negative.score_until("xy", 10), i64::MIN);
    }
}
