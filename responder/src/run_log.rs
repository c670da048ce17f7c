use chrono::Local;
use helperbot_core::CoreError;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::debug;

const TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M:%S";
const RULE: &str = "=========================";

/// One outcome of a scan, as written to the run log.
#[derive(Debug, Clone, PartialEq)]
pub enum RunLogEntry {
    Success { title: String },
    Failure { error: String },
    NoMatch { detail: String },
}

impl RunLogEntry {
    pub fn headline(&self) -> &'static str {
        match self {
            RunLogEntry::Success { .. } => "Bot Action Successful!",
            RunLogEntry::Failure { .. } => "Bot Action Failed!",
            RunLogEntry::NoMatch { .. } => "Bot Didn't Find a Match",
        }
    }

    fn detail(&self) -> String {
        match self {
            RunLogEntry::Success { title } => format!("Script wrote to post: {}", title),
            RunLogEntry::Failure { error } => format!("Error Message: {}", error),
            RunLogEntry::NoMatch { detail } => detail.clone(),
        }
    }

    pub fn render(&self, timestamp: &str) -> String {
        format!(
            "{rule}\n{}\n{}\n{}\n{rule}\n\n",
            self.headline(),
            timestamp,
            self.detail(),
            rule = RULE
        )
    }
}

/// Append-only text log of scan outcomes.
#[derive(Debug, Clone)]
pub struct RunLog {
    path: PathBuf,
}

impl RunLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn record(&self, entry: &RunLogEntry) -> Result<(), CoreError> {
        let timestamp = Local::now().format(TIMESTAMP_FORMAT).to_string();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(entry.render(&timestamp).as_bytes()).await?;
        file.flush().await?;
        debug!("Appended '{}' to {}", entry.headline(), self.path.display());
        Ok(())
    }
}
