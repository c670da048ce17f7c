//! Typed bot configuration.
//!
//! Settings come from an optional TOML file. Every field has a default, so a
//! missing file yields the stock Kali Linux helper. Reddit credentials are
//! not part of this file; they are read from the environment by the client.

use crate::error::{ConfigError, CoreError};
use crate::scoring::{KeywordWeights, ScorePolicy};
use crate::types::FeedMode;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const DEFAULT_SUBREDDIT: &str = "Kalilinux";
pub const DEFAULT_BATCH_SIZE: u32 = 10;
pub const DEFAULT_THRESHOLD: i64 = 10;
pub const DEFAULT_KEYWORDS_PATH: &str = "text_values.json";
pub const DEFAULT_SEEN_PATH: &str = "config.json";
pub const DEFAULT_LOG_PATH: &str = "log.txt";

/// Largest listing Reddit returns in one request.
pub const MAX_BATCH_SIZE: u32 = 100;

pub const DEFAULT_REPLY_TEMPLATE: &str = r#"
Hello {author},

If you are having a generic Linux or networking issue (configuring adapters, booting, VMs, using various tools, etc.)
you'll have better luck asking a question in one of the following subreddits:

- r/linuxquestions
- r/linux4noobs
- r/techsupport

Check the sidebar for more information. Before posting a question in these subreddits, see if you can make any progress
by Googling the *precise* issues and/or errors you are having. Please consider removing your submission if you believe
it better belongs in another subreddit.

Kali Linux isn't the best choice for learning the basics of GNU/Linux. Other distros are far more beginner friendly
like Pop!_OS (r/pop_os), Linux Mint (r/linuxmint), and Ubuntu (r/Ubuntu).

[ This message was sent automatically, if sent in error, please disregard. PM for feedback :) ]
"#;

/// Where the seen-set lives.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StoreSettings {
    Json { path: PathBuf },
    Sqlite { url: String },
}

impl Default for StoreSettings {
    fn default() -> Self {
        StoreSettings::Json {
            path: PathBuf::from(DEFAULT_SEEN_PATH),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    reddit: RedditSection,
    scan: ScanSection,
    storage: StoreSettings,
    log: LogSection,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RedditSection {
    subreddit: String,
}

impl Default for RedditSection {
    fn default() -> Self {
        Self {
            subreddit: DEFAULT_SUBREDDIT.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct ScanSection {
    mode: FeedMode,
    batch_size: u32,
    threshold: i64,
    score_policy: ScorePolicy,
    keywords_path: PathBuf,
    reply_template: Option<String>,
}

impl Default for ScanSection {
    fn default() -> Self {
        Self {
            mode: FeedMode::New,
            batch_size: DEFAULT_BATCH_SIZE,
            threshold: DEFAULT_THRESHOLD,
            score_policy: ScorePolicy::default(),
            keywords_path: PathBuf::from(DEFAULT_KEYWORDS_PATH),
            reply_template: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct LogSection {
    path: PathBuf,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_LOG_PATH),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BotConfig {
    pub subreddit: String,
    pub mode: FeedMode,
    pub batch_size: u32,
    pub threshold: i64,
    pub score_policy: ScorePolicy,
    pub keyword_weights: KeywordWeights,
    /// Reply body; `{author}` and `{title}` are substituted per post.
    pub reply_template: String,
    pub log_path: PathBuf,
    pub store: StoreSettings,
}

impl BotConfig {
    /// Load settings from `path` (defaults when the file does not exist) and
    /// the keyword table the settings point at.
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let file = Self::read_file(path)?;
        let keyword_weights = KeywordWeights::load(&file.scan.keywords_path)?;
        Self::from_parts(file, keyword_weights)
    }

    /// Like [`BotConfig::load`] but leaves the keyword table empty, for
    /// commands that never score posts.
    pub fn load_settings(path: &Path) -> Result<Self, CoreError> {
        let file = Self::read_file(path)?;
        Self::from_parts(file, KeywordWeights::default())
    }

    fn read_file(path: &Path) -> Result<ConfigFile, CoreError> {
        if !path.exists() {
            debug!("No configuration at {}, using defaults", path.display());
            return Ok(ConfigFile::default());
        }
        let content = std::fs::read_to_string(path)?;
        let file: ConfigFile = toml::from_str(&content).map_err(ConfigError::from)?;
        info!("Loaded configuration from {}", path.display());
        Ok(file)
    }

    /// Parse a TOML document with an already loaded keyword table.
    pub fn from_toml_str(toml: &str, keyword_weights: KeywordWeights) -> Result<Self, CoreError> {
        let file: ConfigFile = toml::from_str(toml).map_err(ConfigError::from)?;
        Self::from_parts(file, keyword_weights)
    }

    fn from_parts(file: ConfigFile, keyword_weights: KeywordWeights) -> Result<Self, CoreError> {
        let config = Self {
            subreddit: file.reddit.subreddit,
            mode: file.scan.mode,
            batch_size: file.scan.batch_size,
            threshold: file.scan.threshold,
            score_policy: file.scan.score_policy,
            keyword_weights,
            reply_template: file
                .scan
                .reply_template
                .unwrap_or_else(|| DEFAULT_REPLY_TEMPLATE.to_string()),
            log_path: file.log.path,
            store: file.storage,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.subreddit.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "reddit.subreddit".to_string(),
                value: self.subreddit.clone(),
            });
        }
        if self.threshold <= 0 {
            return Err(ConfigError::InvalidValue {
                field: "scan.threshold".to_string(),
                value: self.threshold.to_string(),
            });
        }
        if self.batch_size == 0 || self.batch_size > MAX_BATCH_SIZE {
            return Err(ConfigError::InvalidValue {
                field: "scan.batch_size".to_string(),
                value: self.batch_size.to_string(),
            });
        }
        Ok(())
    }
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            subreddit: DEFAULT_SUBREDDIT.to_string(),
            mode: FeedMode::New,
            batch_size: DEFAULT_BATCH_SIZE,
            threshold: DEFAULT_THRESHOLD,
            score_policy: ScorePolicy::default(),
            keyword_weights: KeywordWeights::default(),
            reply_template: DEFAULT_REPLY_TEMPLATE.to_string(),
            log_path: PathBuf::from(DEFAULT_LOG_PATH),
            store: StoreSettings::default(),
        }
    }
}
