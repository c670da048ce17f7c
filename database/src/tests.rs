#[cfg(test)]
mod tests {
    use crate::{JsonDocumentStore, SeenStore, SqliteDocumentStore};
    use helperbot_core::{CoreError, SeenPostIds, SeenPostStore, StoreError, StoreSettings};
    use std::env;
    use std::path::PathBuf;

    fn temp_path(extension: &str) -> PathBuf {
        env::temp_dir().join(format!(
            "test_helperbot_{}.{}",
            uuid::Uuid::new_v4(),
            extension
        ))
    }

    async fn setup_test_db() -> SqliteDocumentStore {
        let db_url = format!("sqlite://{}", temp_path("db").display());
        SqliteDocumentStore::connect(&db_url)
            .await
            .expect("Failed to connect to test database")
    }

    fn sample_ids() -> SeenPostIds {
        ["zz9", "a01", "m55"].into_iter().collect()
    }

    #[tokio::test]
    async fn test_missing_json_document_loads_empty() {
        let store = JsonDocumentStore::new(temp_path("json"));
        let seen = store.load().await.expect("Failed to load");
        assert!(seen.is_empty());
    }

    #[tokio::test]
    async fn test_json_round_trip_preserves_order() {
        let store = JsonDocumentStore::new(temp_path("json"));
        let seen = sample_ids();

        store.save(&seen).await.expect("Failed to save");
        let reloaded = store.load().await.expect("Failed to reload");
        assert_eq!(reloaded, seen);
        assert_eq!(reloaded.as_slice()[0], "zz9");
    }

    #[tokio::test]
    async fn test_json_save_keeps_other_keys() {
        let path = temp_path("json");
        tokio::fs::write(&path, r#"{"owner": "kali_helper", "Post_IDs": ["old"]}"#)
            .await
            .unwrap();

        let store = JsonDocumentStore::new(&path);
        let mut seen = store.load().await.unwrap();
        assert!(seen.contains("old"));
        seen.insert("new");
        store.save(&seen).await.unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&tokio::fs::read_to_string(&path).await.unwrap()).unwrap();
        assert_eq!(raw["owner"], "kali_helper");
        assert_eq!(raw["Post_IDs"], serde_json::json!(["old", "new"]));
    }

    #[tokio::test]
    async fn test_json_document_without_key_loads_empty() {
        let path = temp_path("json");
        tokio::fs::write(&path, "{}").await.unwrap();

        let seen = JsonDocumentStore::new(&path).load().await.unwrap();
        assert!(seen.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_json_document_is_reported() {
        let path = temp_path("json");
        tokio::fs::write(&path, r#"{"Post_IDs": 7}"#).await.unwrap();

        let result = JsonDocumentStore::new(&path).load().await;
        assert!(matches!(
            result,
            Err(CoreError::Store(StoreError::CorruptDocument { .. }))
        ));
    }

    #[tokio::test]
    async fn test_sqlite_round_trip() {
        let store = setup_test_db().await;
        assert!(store.load().await.unwrap().is_empty());

        let seen = sample_ids();
        store.save(&seen).await.expect("Failed to save");
        assert_eq!(store.load().await.unwrap(), seen);

        // Saving again overwrites the single record
        let mut grown = seen.clone();
        grown.insert("b77");
        store.save(&grown).await.unwrap();
        assert_eq!(store.load().await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_basic_document_functionality() {
        let store = setup_test_db().await;

        store
            .put_document("test_key", "test_value")
            .await
            .expect("Failed to save document");
        let value = store
            .get_document("test_key")
            .await
            .expect("Failed to get document");
        assert_eq!(value, Some("test_value".to_string()));
        assert_eq!(store.get_document("absent").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_open_selects_backend() {
        let json = SeenStore::open(&StoreSettings::Json {
            path: temp_path("json"),
        })
        .await
        .unwrap();
        assert!(matches!(json, SeenStore::Json(_)));

        let sqlite = SeenStore::open(&StoreSettings::Sqlite {
            url: format!("sqlite://{}", temp_path("db").display()),
        })
        .await
        .unwrap();
        assert!(matches!(sqlite, SeenStore::Sqlite(_)));

        let seen = sample_ids();
        sqlite.save(&seen).await.unwrap();
        assert_eq!(sqlite.load().await.unwrap(), seen);
    }
}
