//! Mint pipeline
//!
//! Validate locally, resolve the storage credential, upload both files as
//! one batch, then persist the catalog record. Order matters: no network
//! call happens for an invalid draft or a missing credential, and an
//! upload that succeeds but fails to persist logs the orphaned content
//! identifier so the stored bytes can be reclaimed.

pub mod validate;

pub use validate::{validate, MintDraft};

use crate::db::nfts;
use crate::error::{Error, Result};
use crate::storage::{StorageClient, StorageConfig, UploadFile};
use miliki_common::db::settings::get_first_setting;
use miliki_common::db::{NftMetadata, NftRecord};
use sqlx::SqlitePool;
use tracing::{info, warn};

/// Credential keys tried in order for the storage upload token
pub const STORAGE_TOKEN_KEYS: &[&str] = &["storacha_api_token", "web3_storage_token"];

/// Mint a track: validate, upload, persist. The caller supplies the
/// signed-in owner.
pub async fn mint(db: &SqlitePool, owner_id: &str, draft: MintDraft) -> Result<NftRecord> {
    validate(&draft)?;

    let token = get_first_setting(db, STORAGE_TOKEN_KEYS)
        .await
        .map_err(|e| match e {
            miliki_common::Error::Config(msg) => Error::Config(msg),
            other => Error::Common(other),
        })?;

    let config = StorageConfig::from_settings(db).await?;
    let storage = StorageClient::new(config, token);

    // Stored names are derived from the title so gateway URLs are
    // human-readable; the original upload names only contribute extensions
    let audio_name = renamed(&draft.song_title, "audio", &draft.audio_file.name);
    let cover_name = renamed(&draft.song_title, "cover", &draft.cover_art.name);

    let batch = [
        UploadFile {
            name: audio_name.clone(),
            ..draft.audio_file.clone()
        },
        UploadFile {
            name: cover_name.clone(),
            ..draft.cover_art.clone()
        },
    ];

    let receipt = storage.upload_batch(&batch).await?;
    let audio_url = receipt.urls[0].url.clone();
    let image_url = receipt.urls[1].url.clone();

    let metadata = NftMetadata {
        songwriter: Some(draft.song_writer.clone()),
        producer: Some(draft.producer.clone()),
        // Equal at mint time; sales would make them diverge
        available_copies: Some(draft.available_copies),
        total_copies: Some(draft.available_copies),
        ..Default::default()
    };

    let record = match nfts::insert_nft(
        db,
        &draft.song_title,
        &draft.artist_name,
        &image_url,
        &audio_url,
        owner_id,
        &metadata,
    )
    .await
    {
        Ok(record) => record,
        Err(e) => {
            // Uploaded content with no catalog record: log the cid so an
            // operator can reclaim it
            warn!(
                "Minted content orphaned: cid {} uploaded but catalog insert failed: {}",
                receipt.cid, e
            );
            return Err(e);
        }
    };

    info!(
        "Minted NFT {} ({} by {})",
        record.guid, record.title, record.artist
    );

    Ok(record)
}

/// "{title}-{role}.{ext}", keeping the extension of the uploaded file
fn renamed(title: &str, role: &str, original_name: &str) -> String {
    match original_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => {
            format!("{}-{}.{}", title, role, ext)
        }
        _ => format!("{}-{}", title, role),
    }
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

    fn file(name: &str, content_type: &str) -> UploadFile {
        UploadFile {
            name: name.to_string(),
            content_type: content_type.to_string(),
            data: vec![1, 2, 3],
        }
    }

    fn valid_draft() -> MintDraft {
        MintDraft {
            artist_name: "Artist".to_string(),
            song_title: "Song".to_string(),
            song_writer: "Writer".to_string(),
            producer: "Producer".to_string(),
            available_copies: 10,
            audio_file: file("take-3.mp3", "audio/mpeg"),
            cover_art: file("art.png", "image/png"),
        }
    }

    #[test]
    fn renamed_keeps_extension_and_swaps_stem() {
        assert_eq!(renamed("Song", "audio", "take-3.mp3"), "Song-audio.mp3");
        assert_eq!(renamed("Song", "cover", "art.png"), "Song-cover.png");
        assert_eq!(renamed("Song", "audio", "noext"), "Song-audio");
    }

    #[tokio::test]
    async fn invalid_draft_writes_no_rows() {
        let db = setup_test_db().await;

        let draft = MintDraft {
            song_title: String::new(),
            ..valid_draft()
        };

        let err = mint(&db, "u1", draft).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM nfts")
            .fetch_one(&db)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn missing_credential_blocks_before_upload() {
        let db = setup_test_db().await;

        // Neither credential key is configured
        let err = mint(&db, "u1", valid_draft()).await.unwrap_err();
        match err {
            Error::Config(msg) => {
                assert!(msg.contains("storacha_api_token"));
                assert!(msg.contains("web3_storage_token"));
            }
            other => panic!("expected config error, got {:?}", other),
        }

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM nfts")
            .fetch_one(&db)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }
}
