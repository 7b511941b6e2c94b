//! HTTP server setup and routing
//!
//! Axum router over the marketplace operations: auth, catalog, minting,
//! listing, wallet provisioning, and the playback queue.

use crate::catalog::PlayerQueue;
use crate::error::Result;
use crate::wallet::WalletService;
use axum::{
    routing::{get, post},
    Router,
};
use sqlx::{Pool, Sqlite};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tracing::info;

/// Shared application context passed to all handlers
#[derive(Clone)]
pub struct AppContext {
    pub db_pool: Pool<Sqlite>,
    /// Playback cursor; one queue shared across the service
    pub player: Arc<RwLock<PlayerQueue>>,
    pub wallets: Arc<WalletService>,
}

/// Build the full route table
pub fn create_router(ctx: AppContext) -> Router {
    Router::new()
        // Health endpoint
        .route("/health", get(super::handlers::health))
        // Auth
        .route("/auth/signup", post(super::handlers::sign_up))
        .route("/auth/signin", post(super::handlers::sign_in))
        .route("/auth/signout", post(super::handlers::sign_out))
        .route("/auth/me", get(super::handlers::current_user))
        // Catalog and minting
        .route("/nfts", get(super::handlers::list_nfts))
        .route("/nfts", post(super::handlers::mint_nft))
        .route("/nfts/listed", get(super::handlers::list_listed_nfts))
        .route("/nfts/:guid/list", post(super::handlers::list_for_sale))
        // Custodial wallet
        .route("/wallet", get(super::handlers::load_wallet))
        .route("/wallet/generate", post(super::handlers::generate_wallet))
        // Playback queue
        .route("/player/current", get(super::handlers::player_current))
        .route("/player/select/:index", post(super::handlers::player_select))
        .route("/player/next", post(super::handlers::player_next))
        .route("/player/previous", post(super::handlers::player_previous))
        .route("/player/reset", post(super::handlers::player_reset))
        .route("/player/refresh", post(super::handlers::player_refresh))
        .with_state(ctx)
        // Browser clients load from a different origin during development
        .layer(CorsLayer::permissive())
}

/// Run the HTTP API server until shutdown
pub async fn run(port: u16, ctx: AppContext) -> Result<()> {
    let app = create_router(ctx);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| crate::error::Error::Http(format!("Failed to bind {}: {}", addr, e)))?;

    info!("Marketplace API listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| crate::error::Error::Http(format!("Server error: {}", e)))?;

    Ok(())
}

/// Resolve on SIGINT or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!("Failed to install SIGTERM handler: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
