use crate::error::ConfigError;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq)]
pub struct RedditPost {
    pub id: String,
    pub title: String,
    pub selftext: String,
    pub author: String,
    pub subreddit: String,
    pub url: String,
    pub score: i32,
    pub created_utc: i64,
}

impl RedditPost {
    /// Title followed directly by the body, the text every matcher sees.
    pub fn combined_text(&self) -> String {
        let mut text = String::with_capacity(self.title.len() + self.selftext.len());
        text.push_str(&self.title);
        text.push_str(&self.selftext);
        text
    }

    /// Reddit "fullname" used when replying (`t3_` prefix for links).
    pub fn fullname(&self) -> String {
        format!("t3_{}", self.id)
    }
}

/// Sort order of a subreddit listing. Parsed case-insensitively from both
/// the command line and the settings file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedMode {
    Hot,
    New,
}

impl FeedMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedMode::Hot => "hot",
            FeedMode::New => "new",
        }
    }
}

impl fmt::Display for FeedMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeedMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hot" => Ok(FeedMode::Hot),
            "new" => Ok(FeedMode::New),
            other => Err(ConfigError::InvalidValue {
                field: "mode".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

impl<'de> Deserialize<'de> for FeedMode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
