//! NFT catalog
//!
//! Read-side of the marketplace: full and listed-only catalog views, both
//! newest-first, plus the playback queue built over the full catalog.

pub mod player;

pub use player::{Navigation, PlayerQueue};

use crate::db::nfts;
use crate::error::Result;
use miliki_common::db::NftRecord;
use sqlx::SqlitePool;

/// Full catalog, newest first
pub async fn list_catalog(db: &SqlitePool) -> Result<Vec<NftRecord>> {
    nfts::list_all(db).await
}

/// Catalog restricted to tracks currently listed for sale, newest first
pub async fn list_for_sale(db: &SqlitePool) -> Result<Vec<NftRecord>> {
    nfts::list_listed(db).await
}
