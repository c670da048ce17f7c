//! Seen-set persistence.
//!
//! Both backends hold the seen-set as a JSON array under the `Post_IDs`
//! record. The JSON backend keeps it inside a document file alongside any
//! other top-level keys; the SQLite backend keeps it in a key/value table.

#[cfg(test)]
mod tests;

use helperbot_core::{
    CoreError, SeenPostIds, SeenPostStore, StoreError, StoreSettings, SEEN_POSTS_KEY,
};
use serde_json::{Map, Value};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

const CREATE_DOCUMENTS_TABLE: &str = "CREATE TABLE IF NOT EXISTS documents (
    key TEXT PRIMARY KEY NOT NULL,
    value TEXT NOT NULL
)";

#[derive(Debug, Clone)]
pub struct JsonDocumentStore {
    path: PathBuf,
}

impl JsonDocumentStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn corrupt(&self, details: impl Into<String>) -> CoreError {
        StoreError::CorruptDocument {
            path: self.path.display().to_string(),
            details: details.into(),
        }
        .into()
    }

    async fn read_document(&self) -> Result<Option<Map<String, Value>>, CoreError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(document)) => Ok(Some(document)),
            Ok(_) => Err(self.corrupt("document is not a JSON object")),
            Err(e) => Err(self.corrupt(e.to_string())),
        }
    }
}

impl SeenPostStore for JsonDocumentStore {
    async fn load(&self) -> Result<SeenPostIds, CoreError> {
        let Some(document) = self.read_document().await? else {
            debug!("No seen-post document at {}", self.path.display());
            return Ok(SeenPostIds::new());
        };

        let seen = match document.get(SEEN_POSTS_KEY) {
            Some(ids) => serde_json::from_value::<SeenPostIds>(ids.clone()).map_err(|e| {
                self.corrupt(format!("{} is not a list of IDs: {}", SEEN_POSTS_KEY, e))
            })?,
            None => SeenPostIds::new(),
        };
        info!(
            "Loaded {} seen posts from {}",
            seen.len(),
            self.path.display()
        );
        Ok(seen)
    }

    async fn save(&self, seen: &SeenPostIds) -> Result<(), CoreError> {
        let mut document = self.read_document().await?.unwrap_or_default();
        document.insert(SEEN_POSTS_KEY.to_string(), serde_json::to_value(seen)?);

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let content = serde_json::to_string(&Value::Object(document))?;
        tokio::fs::write(&self.path, content).await?;
        debug!("Saved {} seen posts to {}", seen.len(), self.path.display());
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct SqliteDocumentStore {
    pool: SqlitePool,
}

impl SqliteDocumentStore {
    pub async fn connect(url: &str) -> Result<Self, CoreError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| StoreError::ConnectionFailed {
                reason: format!("{}: {}", url, e),
            })?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::ConnectionFailed {
                reason: format!("{}: {}", url, e),
            })?;

        sqlx::query(CREATE_DOCUMENTS_TABLE)
            .execute(&pool)
            .await
            .map_err(StoreError::from)?;

        info!("Connected to seen-post database {}", url);
        Ok(Self { pool })
    }

    pub async fn get_document(&self, key: &str) -> Result<Option<String>, CoreError> {
        let value = sqlx::query_scalar::<_, String>("SELECT value FROM documents WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(StoreError::from)?;
        Ok(value)
    }

    pub async fn put_document(&self, key: &str, value: &str) -> Result<(), CoreError> {
        sqlx::query(
            "INSERT INTO documents (key, value) VALUES (?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(StoreError::from)?;
        Ok(())
    }
}

impl SeenPostStore for SqliteDocumentStore {
    async fn load(&self) -> Result<SeenPostIds, CoreError> {
        let Some(value) = self.get_document(SEEN_POSTS_KEY).await? else {
            return Ok(SeenPostIds::new());
        };
        let seen: SeenPostIds =
            serde_json::from_str(&value).map_err(|e| StoreError::CorruptDocument {
                path: SEEN_POSTS_KEY.to_string(),
                details: e.to_string(),
            })?;
        info!("Loaded {} seen posts from database", seen.len());
        Ok(seen)
    }

    async fn save(&self, seen: &SeenPostIds) -> Result<(), CoreError> {
        let value = serde_json::to_string(seen)?;
        self.put_document(SEEN_POSTS_KEY, &value).await?;
        debug!("Saved {} seen posts to database", seen.len());
        Ok(())
    }
}

/// The store selected by configuration.
#[derive(Debug, Clone)]
pub enum SeenStore {
    Json(JsonDocumentStore),
    Sqlite(SqliteDocumentStore),
}

impl SeenStore {
    pub async fn open(settings: &StoreSettings) -> Result<Self, CoreError> {
        match settings {
            StoreSettings::Json { path } => Ok(SeenStore::Json(JsonDocumentStore::new(path))),
            StoreSettings::Sqlite { url } => {
                Ok(SeenStore::Sqlite(SqliteDocumentStore::connect(url).await?))
            }
        }
    }
}

impl SeenPostStore for SeenStore {
    async fn load(&self) -> Result<SeenPostIds, CoreError> {
        match self {
            SeenStore::Json(store) => store.load().await,
            SeenStore::Sqlite(store) => store.load().await,
        }
    }

    async fn save(&self, seen: &SeenPostIds) -> Result<(), CoreError> {
        match self {
            SeenStore::Json(store) => store.save(seen).await,
            SeenStore::Sqlite(store) => store.save(seen).await,
        }
    }
}
