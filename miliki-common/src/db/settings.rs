//! Settings database access
//!
//! Read/write settings from the settings table (key-value store).
//! All settings are global/system-wide (not user-specific). The storage
//! credential is fetched through an ordered fallback chain of keys.

use crate::error::{Error, Result};
use sqlx::{Pool, Sqlite};
use std::str::FromStr;

/// Generic setting getter
///
/// Returns None if key doesn't exist in database.
/// Parses value from string using FromStr trait.
pub async fn get_setting<T: FromStr>(db: &Pool<Sqlite>, key: &str) -> Result<Option<T>> {
    let value: Option<String> = sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(db)
        .await?;

    match value {
        Some(s) => match s.parse::<T>() {
            Ok(parsed) => Ok(Some(parsed)),
            Err(_) => Err(Error::Config(format!(
                "Failed to parse setting '{}' value: {}",
                key, s
            ))),
        },
        None => Ok(None),
    }
}

/// Generic setting setter
///
/// Inserts or updates setting in database.
pub async fn set_setting<T: ToString>(db: &Pool<Sqlite>, key: &str, value: T) -> Result<()> {
    let value_str = value.to_string();

    sqlx::query(
        r#"
        INSERT INTO settings (key, value)
        VALUES (?, ?)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value
        "#,
    )
    .bind(key)
    .bind(value_str)
    .execute(db)
    .await?;

    Ok(())
}

/// Look up a credential through an ordered list of setting keys.
///
/// Keys are tried in sequence; the first non-empty value wins. Returns a
/// Config error naming every key tried only when all of them miss, so the
/// operator is told exactly what to configure.
pub async fn get_first_setting(db: &Pool<Sqlite>, keys: &[&str]) -> Result<String> {
    for key in keys {
        if let Some(value) = get_setting::<String>(db, key).await? {
            if !value.is_empty() {
                return Ok(value);
            }
        }
    }

    Err(Error::Config(format!(
        "No value configured for any of: {}",
        keys.join(", ")
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup_test_db() -> Pool<Sqlite> {
        let pool = SqlitePoolOptions::new()
            .connect("sqlite::memory:")
            .await
            .unwrap();

        crate::db::init::create_settings_table(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn test_generic_setting_get_set() {
        let db = setup_test_db().await;

        set_setting(&db, "test_int", 42).await.unwrap();
        let value: Option<i32> = get_setting(&db, "test_int").await.unwrap();
        assert_eq!(value, Some(42));

        set_setting(&db, "test_str", "hello".to_string()).await.unwrap();
        let value: Option<String> = get_setting(&db, "test_str").await.unwrap();
        assert_eq!(value, Some("hello".to_string()));

        // Non-existent key should return None
        let value: Option<String> = get_setting(&db, "nonexistent").await.unwrap();
        assert_eq!(value, None);
    }

    #[tokio::test]
    async fn test_setting_update() {
        let db = setup_test_db().await;

        set_setting(&db, "test_key", "value1".to_string()).await.unwrap();
        set_setting(&db, "test_key", "value2".to_string()).await.unwrap();
        let value: Option<String> = get_setting(&db, "test_key").await.unwrap();
        assert_eq!(value, Some("value2".to_string()));
    }

    #[tokio::test]
    async fn fallback_chain_first_hit_wins() {
        let db = setup_test_db().await;

        set_setting(&db, "credential_b", "token-b".to_string()).await.unwrap();

        // First key missing, second key wins
        let value = get_first_setting(&db, &["credential_a", "credential_b"])
            .await
            .unwrap();
        assert_eq!(value, "token-b");

        // Once the first key is present, it takes priority
        set_setting(&db, "credential_a", "token-a".to_string()).await.unwrap();
        let value = get_first_setting(&db, &["credential_a", "credential_b"])
            .await
            .unwrap();
        assert_eq!(value, "token-a");
    }

    #[tokio::test]
    async fn fallback_chain_skips_empty_values() {
        let db = setup_test_db().await;

        set_setting(&db, "credential_a", "".to_string()).await.unwrap();
        set_setting(&db, "credential_b", "token-b".to_string()).await.unwrap();

        let value = get_first_setting(&db, &["credential_a", "credential_b"])
            .await
            .unwrap();
        assert_eq!(value, "token-b");
    }

    #[tokio::test]
    async fn fallback_chain_all_miss_is_config_error() {
        let db = setup_test_db().await;

        let err = get_first_setting(&db, &["missing_a", "missing_b"])
            .await
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("missing_a"));
        assert!(msg.contains("missing_b"));
    }
}
