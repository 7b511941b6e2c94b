//! NFT table access
//!
//! Listing order is a hard contract: newest first by created_at, with the
//! guid as a tiebreak so the order stays total for equal timestamps. The
//! listed-only view is a pure projection recomputed on every read.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use miliki_common::db::{NftMetadata, NftRecord};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

type NftRow = (
    String,         // guid
    String,         // title
    String,         // artist
    f64,            // price
    String,         // image_url
    String,         // audio_url
    Option<String>, // owner_id
    i64,            // is_listed
    String,         // metadata JSON
    DateTime<Utc>,  // created_at
);

const NFT_COLUMNS: &str =
    "guid, title, artist, price, image_url, audio_url, owner_id, is_listed, metadata, created_at";

fn from_row(row: NftRow) -> Result<NftRecord> {
    let metadata: NftMetadata = serde_json::from_str(&row.8)
        .map_err(|e| Error::Internal(format!("Invalid metadata JSON for NFT {}: {}", row.0, e)))?;

    Ok(NftRecord {
        guid: row.0,
        title: row.1,
        artist: row.2,
        price: row.3,
        image_url: row.4,
        audio_url: row.5,
        owner_id: row.6,
        is_listed: row.7 != 0,
        metadata,
        created_at: row.9,
    })
}

/// Insert one NFT row. Fields not passed here take their mint-time
/// defaults (price 0, not listed).
pub async fn insert_nft(
    db: &SqlitePool,
    title: &str,
    artist: &str,
    image_url: &str,
    audio_url: &str,
    owner_id: &str,
    metadata: &NftMetadata,
) -> Result<NftRecord> {
    let guid = Uuid::new_v4().to_string();
    let created_at = Utc::now();
    let metadata_json = serde_json::to_string(metadata)
        .map_err(|e| Error::Internal(format!("Failed to encode metadata: {}", e)))?;

    sqlx::query(
        r#"
        INSERT INTO nfts (guid, title, artist, price, image_url, audio_url, owner_id, is_listed, metadata, created_at)
        VALUES (?, ?, ?, 0, ?, ?, ?, 0, ?, ?)
        "#,
    )
    .bind(&guid)
    .bind(title)
    .bind(artist)
    .bind(image_url)
    .bind(audio_url)
    .bind(owner_id)
    .bind(&metadata_json)
    .bind(created_at)
    .execute(db)
    .await?;

    debug!("Inserted NFT {} ({})", guid, title);

    Ok(NftRecord {
        guid,
        title: title.to_string(),
        artist: artist.to_string(),
        price: 0.0,
        image_url: image_url.to_string(),
        audio_url: audio_url.to_string(),
        owner_id: Some(owner_id.to_string()),
        is_listed: false,
        metadata: metadata.clone(),
        created_at,
    })
}

/// All NFTs, newest first
pub async fn list_all(db: &SqlitePool) -> Result<Vec<NftRecord>> {
    let sql = format!(
        "SELECT {} FROM nfts ORDER BY created_at DESC, guid DESC",
        NFT_COLUMNS
    );
    let rows = sqlx::query_as::<_, NftRow>(&sql).fetch_all(db).await?;
    rows.into_iter().map(from_row).collect()
}

/// Only NFTs listed for sale, newest first
pub async fn list_listed(db: &SqlitePool) -> Result<Vec<NftRecord>> {
    let sql = format!(
        "SELECT {} FROM nfts WHERE is_listed = 1 ORDER BY created_at DESC, guid DESC",
        NFT_COLUMNS
    );
    let rows = sqlx::query_as::<_, NftRow>(&sql).fetch_all(db).await?;
    rows.into_iter().map(from_row).collect()
}

/// Fetch one NFT by guid
pub async fn get_nft(db: &SqlitePool, guid: &str) -> Result<NftRecord> {
    let sql = format!("SELECT {} FROM nfts WHERE guid = ?", NFT_COLUMNS);
    let row = sqlx::query_as::<_, NftRow>(&sql)
        .bind(guid)
        .fetch_optional(db)
        .await?;

    match row {
        Some(row) => from_row(row),
        None => Err(Error::NotFound(format!("NFT {}", guid))),
    }
}

/// Mark an NFT as listed for sale, updating price and persisting the
/// royalty percentage and purchase limit into the metadata map.
pub async fn mark_listed(
    db: &SqlitePool,
    guid: &str,
    price: f64,
    royalty_percent: i64,
    purchase_limit: i64,
) -> Result<NftRecord> {
    let mut record = get_nft(db, guid).await?;

    record.price = price;
    record.is_listed = true;
    record.metadata.royalty_percent = Some(royalty_percent);
    record.metadata.purchase_limit = Some(purchase_limit);

    let metadata_json = serde_json::to_string(&record.metadata)
        .map_err(|e| Error::Internal(format!("Failed to encode metadata: {}", e)))?;

    sqlx::query("UPDATE nfts SET price = ?, is_listed = 1, metadata = ? WHERE guid = ?")
        .bind(price)
        .bind(&metadata_json)
        .bind(guid)
        .execute(db)
        .await?;

    debug!("Listed NFT {} at price {}", guid, price);
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup_test_db() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .connect("sqlite::memory:")
            .await
            .unwrap();
        miliki_common::db::init::create_schema(&pool).await.unwrap();

        sqlx::query("INSERT INTO users (guid, email, password_hash, password_salt) VALUES ('u1', 'a@b.c', 'h', 's')")
            .execute(&pool)
            .await
            .unwrap();

        pool
    }

    fn copies_metadata(copies: i64) -> NftMetadata {
        NftMetadata {
            songwriter: Some("writer".to_string()),
            producer: Some("producer".to_string()),
            available_copies: Some(copies),
            total_copies: Some(copies),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn list_all_returns_newest_first() {
        let db = setup_test_db().await;

        let first = insert_nft(&db, "Older", "A", "i1", "a1", "u1", &copies_metadata(1))
            .await
            .unwrap();
        // Force a strictly later timestamp
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = insert_nft(&db, "Newer", "A", "i2", "a2", "u1", &copies_metadata(1))
            .await
            .unwrap();

        let all = list_all(&db).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].guid, second.guid);
        assert_eq!(all[1].guid, first.guid);
    }

    #[tokio::test]
    async fn listed_projection_never_returns_unlisted() {
        let db = setup_test_db().await;

        let unlisted = insert_nft(&db, "Hidden", "A", "i", "a", "u1", &copies_metadata(2))
            .await
            .unwrap();
        let listed = insert_nft(&db, "Public", "A", "i", "a", "u1", &copies_metadata(2))
            .await
            .unwrap();
        mark_listed(&db, &listed.guid, 2.5, 5, 1).await.unwrap();

        let result = list_listed(&db).await.unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].guid, listed.guid);
        assert!(result.iter().all(|n| n.is_listed));
        assert!(!result.iter().any(|n| n.guid == unlisted.guid));
    }

    #[tokio::test]
    async fn insert_defaults_price_zero_and_unlisted() {
        let db = setup_test_db().await;

        let nft = insert_nft(&db, "Song", "Artist", "img", "aud", "u1", &copies_metadata(7))
            .await
            .unwrap();

        let fetched = get_nft(&db, &nft.guid).await.unwrap();
        assert_eq!(fetched.price, 0.0);
        assert!(!fetched.is_listed);
        assert_eq!(fetched.metadata.available_copies, Some(7));
        assert_eq!(
            fetched.metadata.available_copies,
            fetched.metadata.total_copies
        );
    }

    #[tokio::test]
    async fn mark_listed_persists_royalty_and_purchase_limit() {
        let db = setup_test_db().await;

        let nft = insert_nft(&db, "Song", "Artist", "img", "aud", "u1", &copies_metadata(3))
            .await
            .unwrap();
        mark_listed(&db, &nft.guid, 1.8, 10, 2).await.unwrap();

        let fetched = get_nft(&db, &nft.guid).await.unwrap();
        assert!(fetched.is_listed);
        assert_eq!(fetched.price, 1.8);
        assert_eq!(fetched.metadata.royalty_percent, Some(10));
        assert_eq!(fetched.metadata.purchase_limit, Some(2));
        // Copy counts untouched by listing
        assert_eq!(fetched.metadata.available_copies, Some(3));
    }

    #[tokio::test]
    async fn get_nft_missing_is_not_found() {
        let db = setup_test_db().await;
        let err = get_nft(&db, "no-such-guid").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
