//! Wallet table access
//!
//! At most one wallet per user: the UNIQUE constraint on user_id turns a
//! duplicate Generate into a data-layer rejection instead of a second row.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use miliki_common::db::WalletRecord;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

type WalletRow = (
    String,        // guid
    String,        // user_id
    String,        // public_key
    String,        // secret_key
    i64,           // is_active
    DateTime<Utc>, // created_at
    DateTime<Utc>, // updated_at
);

fn from_row(row: WalletRow) -> WalletRecord {
    WalletRecord {
        guid: row.0,
        user_id: row.1,
        public_key: row.2,
        secret_key: row.3,
        is_active: row.4 != 0,
        created_at: row.5,
        updated_at: row.6,
    }
}

/// Insert a wallet row for a user.
///
/// A constraint violation (second wallet for the same user) surfaces as
/// an upstream rejection carrying the database message.
pub async fn insert_wallet(
    db: &SqlitePool,
    user_id: &str,
    public_key: &str,
    secret_key: &str,
) -> Result<WalletRecord> {
    let guid = Uuid::new_v4().to_string();
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO wallets (guid, user_id, public_key, secret_key, is_active, created_at, updated_at)
        VALUES (?, ?, ?, ?, 1, ?, ?)
        "#,
    )
    .bind(&guid)
    .bind(user_id)
    .bind(public_key)
    .bind(secret_key)
    .bind(now)
    .bind(now)
    .execute(db)
    .await;

    if let Err(e) = result {
        return Err(Error::Upstream {
            message: format!("Wallet record rejected: {}", e),
            detail: Some(format!("user_id = {}", user_id)),
            hint: Some("A wallet may already exist for this user".to_string()),
        });
    }

    debug!("Created wallet {} for user {}", guid, user_id);

    Ok(WalletRecord {
        guid,
        user_id: user_id.to_string(),
        public_key: public_key.to_string(),
        secret_key: secret_key.to_string(),
        is_active: true,
        created_at: now,
        updated_at: now,
    })
}

/// Look up the single wallet for a user.
///
/// No match is the distinct "no wallet yet" outcome, not an error.
pub async fn find_wallet_for_user(db: &SqlitePool, user_id: &str) -> Result<Option<WalletRecord>> {
    let row = sqlx::query_as::<_, WalletRow>(
        r#"
        SELECT guid, user_id, public_key, secret_key, is_active, created_at, updated_at
        FROM wallets
        WHERE user_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_optional(db)
    .await?;

    Ok(row.map(from_row))
}
