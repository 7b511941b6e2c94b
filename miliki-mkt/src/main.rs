//! Marketplace service (miliki-mkt) - Main entry point
//!
//! Hosts the HTTP API for the Miliki music marketplace: session auth,
//! NFT catalog and playback queue, minting with content-addressed
//! storage uploads, and custodial wallet provisioning on the devnet.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::RwLock;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use miliki_mkt::api::{self, AppContext};
use miliki_mkt::catalog::{self, PlayerQueue};
use miliki_mkt::wallet::WalletService;

/// Command-line arguments for miliki-mkt
#[derive(Parser, Debug)]
#[command(name = "miliki-mkt")]
#[command(about = "Marketplace service for Miliki")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "5730", env = "MILIKI_PORT")]
    port: u16,

    /// Data folder holding the database (overrides env/config/default)
    #[arg(short, long, env = "MILIKI_DATA_FOLDER")]
    data_folder: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "miliki_mkt=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    info!("Starting Miliki marketplace on port {}", args.port);

    let data_folder =
        miliki_common::config::resolve_data_folder(args.data_folder.as_deref(), "MILIKI_DATA_FOLDER")
            .context("Failed to resolve data folder")?;
    info!("Data folder: {}", data_folder.display());

    let db_path = data_folder.join("miliki.db");
    let db_pool = miliki_common::db::init_database(&db_path)
        .await
        .context("Failed to initialize database")?;
    info!("Database ready at {}", db_path.display());

    let wallets = Arc::new(
        WalletService::from_settings(db_pool.clone())
            .await
            .context("Failed to initialize wallet service")?,
    );

    // Seed the playback queue with the current catalog
    let mut player = PlayerQueue::new();
    player.set_tracks(
        catalog::list_catalog(&db_pool)
            .await
            .context("Failed to load catalog")?,
    );

    let ctx = AppContext {
        db_pool,
        player: Arc::new(RwLock::new(player)),
        wallets,
    };

    api::run(args.port, ctx).await.context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}
