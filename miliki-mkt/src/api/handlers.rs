//! HTTP request handlers
//!
//! Every failing endpoint returns an ErrorResponse body; validation
//! failures additionally carry per-field messages. Authenticated routes
//! read a bearer token from the Authorization header.

use crate::api::server::AppContext;
use crate::auth;
use crate::catalog::{self, Navigation};
use crate::db::nfts;
use crate::error::{Error, FieldErrors};
use crate::mint::{self, MintDraft};
use crate::storage::UploadFile;
use axum::{
    extract::{Multipart, Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use miliki_common::api::types::{
    CredentialsRequest, CurrentTrackResponse, CurrentUserResponse, ErrorResponse,
    FieldErrorResponse, ListForSaleRequest, NavigationResponse, PlayerStatusResponse,
    SessionResponse, WalletLoadResponse, WalletResponse,
};
use miliki_common::db::NftRecord;
use serde::Serialize;
use tracing::error;

type ApiError = (StatusCode, Json<ErrorResponse>);
type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    module: String,
    version: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    status: String,
}

// ============================================================================
// Error mapping
// ============================================================================

fn error_response(e: Error) -> ApiError {
    match e {
        Error::Validation(errors) => {
            let fields = errors
                .errors
                .into_iter()
                .map(|f| FieldErrorResponse {
                    field: f.field,
                    message: f.message,
                })
                .collect();
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ErrorResponse {
                    error: "Validation failed".to_string(),
                    detail: None,
                    hint: None,
                    fields,
                }),
            )
        }
        Error::Config(msg) => {
            error!("Configuration error: {}", msg);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::message(msg)),
            )
        }
        Error::AuthRequired => (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::message("Authentication required")),
        ),
        Error::Upstream {
            message,
            detail,
            hint,
        } => (
            StatusCode::BAD_GATEWAY,
            Json(ErrorResponse {
                error: message,
                detail,
                hint,
                fields: Vec::new(),
            }),
        ),
        Error::NotFound(what) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::message(format!("Not found: {}", what))),
        ),
        Error::BadRequest(msg) => (StatusCode::BAD_REQUEST, Json(ErrorResponse::message(msg))),
        other => {
            error!("Internal error: {}", other);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::message("Internal server error")),
            )
        }
    }
}

/// Bearer token from the Authorization header, if present
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

// ============================================================================
// Health Endpoint
// ============================================================================

/// GET /health - Health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        module: "marketplace".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============================================================================
// Auth Endpoints
// ============================================================================

/// POST /auth/signup - Register and open a session
pub async fn sign_up(
    State(ctx): State<AppContext>,
    Json(req): Json<CredentialsRequest>,
) -> ApiResult<SessionResponse> {
    auth::sign_up(&ctx.db_pool, &req.email, &req.password)
        .await
        .map_err(error_response)?;
    let session = auth::sign_in(&ctx.db_pool, &req.email, &req.password)
        .await
        .map_err(error_response)?;

    Ok(Json(SessionResponse {
        token: session.token,
        user_id: session.user_id,
        email: req.email,
    }))
}

/// POST /auth/signin
pub async fn sign_in(
    State(ctx): State<AppContext>,
    Json(req): Json<CredentialsRequest>,
) -> ApiResult<SessionResponse> {
    let session = auth::sign_in(&ctx.db_pool, &req.email, &req.password)
        .await
        .map_err(error_response)?;

    Ok(Json(SessionResponse {
        token: session.token,
        user_id: session.user_id,
        email: req.email,
    }))
}

/// POST /auth/signout - Unknown tokens are a no-op
pub async fn sign_out(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
) -> ApiResult<StatusResponse> {
    if let Some(token) = bearer_token(&headers) {
        auth::sign_out(&ctx.db_pool, token)
            .await
            .map_err(error_response)?;
    }
    Ok(Json(StatusResponse {
        status: "signed_out".to_string(),
    }))
}

/// GET /auth/me - The signed-in user, or 401
pub async fn current_user(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
) -> ApiResult<CurrentUserResponse> {
    let user = auth::require_user(&ctx.db_pool, bearer_token(&headers))
        .await
        .map_err(error_response)?;

    Ok(Json(CurrentUserResponse {
        user_id: user.guid,
        email: user.email,
        display_name: user.display_name,
    }))
}

// ============================================================================
// Catalog Endpoints
// ============================================================================

/// GET /nfts - Full catalog, newest first
pub async fn list_nfts(State(ctx): State<AppContext>) -> ApiResult<Vec<NftRecord>> {
    let records = catalog::list_catalog(&ctx.db_pool)
        .await
        .map_err(error_response)?;
    Ok(Json(records))
}

/// GET /nfts/listed - Tracks currently for sale, newest first
pub async fn list_listed_nfts(State(ctx): State<AppContext>) -> ApiResult<Vec<NftRecord>> {
    let records = catalog::list_for_sale(&ctx.db_pool)
        .await
        .map_err(error_response)?;
    Ok(Json(records))
}

/// POST /nfts - Mint a track from a multipart form.
///
/// Text parts: artist_name, song_title, song_writer, producer,
/// available_copies. File parts: audio_file, cover_art.
pub async fn mint_nft(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    multipart: Multipart,
) -> ApiResult<NftRecord> {
    let user = auth::require_user(&ctx.db_pool, bearer_token(&headers))
        .await
        .map_err(error_response)?;

    let draft = read_mint_form(multipart).await.map_err(error_response)?;

    let record = mint::mint(&ctx.db_pool, &user.guid, draft)
        .await
        .map_err(error_response)?;

    Ok(Json(record))
}

/// Assemble a MintDraft from the multipart body. Missing parts become
/// empty values so validation reports them field by field.
async fn read_mint_form(mut multipart: Multipart) -> Result<MintDraft, Error> {
    let mut artist_name = String::new();
    let mut song_title = String::new();
    let mut song_writer = String::new();
    let mut producer = String::new();
    let mut available_copies: i64 = 0;
    let mut audio_file: Option<UploadFile> = None;
    let mut cover_art: Option<UploadFile> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::BadRequest(format!("Malformed multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "artist_name" => artist_name = read_text(field).await?,
            "song_title" => song_title = read_text(field).await?,
            "song_writer" => song_writer = read_text(field).await?,
            "producer" => producer = read_text(field).await?,
            "available_copies" => {
                let text = read_text(field).await?;
                let trimmed = text.trim().to_string();
                available_copies = trimmed.parse().map_err(|_| {
                    let mut errors = FieldErrors::new();
                    errors.push(
                        "available_copies",
                        &format!("Must be a whole number, got '{}'", trimmed),
                    );
                    Error::Validation(errors)
                })?;
            }
            "audio_file" => audio_file = Some(read_file(field).await?),
            "cover_art" => cover_art = Some(read_file(field).await?),
            _ => {}
        }
    }

    Ok(MintDraft {
        artist_name,
        song_title,
        song_writer,
        producer,
        available_copies,
        audio_file: audio_file.unwrap_or_else(missing_file),
        cover_art: cover_art.unwrap_or_else(missing_file),
    })
}

fn missing_file() -> UploadFile {
    UploadFile {
        name: String::new(),
        content_type: String::new(),
        data: Vec::new(),
    }
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, Error> {
    field
        .text()
        .await
        .map_err(|e| Error::BadRequest(format!("Unreadable form field: {}", e)))
}

async fn read_file(field: axum::extract::multipart::Field<'_>) -> Result<UploadFile, Error> {
    let name = field.file_name().unwrap_or_default().to_string();
    let content_type = field.content_type().unwrap_or_default().to_string();
    let data = field
        .bytes()
        .await
        .map_err(|e| Error::BadRequest(format!("Unreadable file upload: {}", e)))?
        .to_vec();

    Ok(UploadFile {
        name,
        content_type,
        data,
    })
}

/// POST /nfts/:guid/list - List an owned track for sale
pub async fn list_for_sale(
    State(ctx): State<AppContext>,
    Path(guid): Path<String>,
    headers: HeaderMap,
    Json(req): Json<ListForSaleRequest>,
) -> ApiResult<NftRecord> {
    let user = auth::require_user(&ctx.db_pool, bearer_token(&headers))
        .await
        .map_err(error_response)?;

    if req.price < 0.0 {
        return Err(error_response(Error::BadRequest(
            "Price must not be negative".to_string(),
        )));
    }
    if !(0..=100).contains(&req.royalty_percent) {
        return Err(error_response(Error::BadRequest(
            "Royalty percentage must be between 0 and 100".to_string(),
        )));
    }
    if req.purchase_limit < 1 {
        return Err(error_response(Error::BadRequest(
            "Purchase limit must be at least 1".to_string(),
        )));
    }

    let record = nfts::get_nft(&ctx.db_pool, &guid)
        .await
        .map_err(error_response)?;
    if record.owner_id.as_deref() != Some(user.guid.as_str()) {
        return Err(error_response(Error::BadRequest(
            "Only the owner can list a track for sale".to_string(),
        )));
    }

    let record = nfts::mark_listed(
        &ctx.db_pool,
        &guid,
        req.price,
        req.royalty_percent,
        req.purchase_limit,
    )
    .await
    .map_err(error_response)?;

    Ok(Json(record))
}

// ============================================================================
// Wallet Endpoints
// ============================================================================

/// GET /wallet - The signed-in user's wallet with a fresh balance, or
/// the distinct "no wallet yet" state
pub async fn load_wallet(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
) -> ApiResult<WalletLoadResponse> {
    let user = auth::require_user(&ctx.db_pool, bearer_token(&headers))
        .await
        .map_err(error_response)?;

    let wallet = ctx
        .wallets
        .load(&user.guid)
        .await
        .map_err(error_response)?;

    Ok(Json(WalletLoadResponse { wallet }))
}

/// POST /wallet/generate - Provision and fund a new custodial wallet
pub async fn generate_wallet(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
) -> ApiResult<WalletResponse> {
    let user = auth::require_user(&ctx.db_pool, bearer_token(&headers))
        .await
        .map_err(error_response)?;

    let wallet = ctx
        .wallets
        .generate(&user.guid)
        .await
        .map_err(error_response)?;

    Ok(Json(wallet))
}

// ============================================================================
// Player Endpoints
// ============================================================================

fn track_response(record: &NftRecord) -> CurrentTrackResponse {
    CurrentTrackResponse {
        guid: record.guid.clone(),
        title: record.title.clone(),
        artist: record.artist.clone(),
        audio_url: record.audio_url.clone(),
        image_url: record.image_url.clone(),
    }
}

/// GET /player/current - Cursor snapshot and the current track
pub async fn player_current(State(ctx): State<AppContext>) -> ApiResult<PlayerStatusResponse> {
    let player = ctx.player.read().await;
    Ok(Json(PlayerStatusResponse {
        cursor: player.cursor(),
        track_count: player.track_count(),
        current: player.current().map(track_response),
    }))
}

/// POST /player/select/:index
pub async fn player_select(
    State(ctx): State<AppContext>,
    Path(index): Path<usize>,
) -> ApiResult<PlayerStatusResponse> {
    let mut player = ctx.player.write().await;
    player.select(index).map_err(error_response)?;

    Ok(Json(PlayerStatusResponse {
        cursor: player.cursor(),
        track_count: player.track_count(),
        current: player.current().map(track_response),
    }))
}

/// POST /player/next - At the last track this reports unavailable
pub async fn player_next(State(ctx): State<AppContext>) -> ApiResult<NavigationResponse> {
    let mut player = ctx.player.write().await;
    let outcome = player.next();
    Ok(Json(navigation_response(outcome, player.cursor())))
}

/// POST /player/previous - At the first track this reports unavailable
pub async fn player_previous(State(ctx): State<AppContext>) -> ApiResult<NavigationResponse> {
    let mut player = ctx.player.write().await;
    let outcome = player.previous();
    Ok(Json(navigation_response(outcome, player.cursor())))
}

fn navigation_response(outcome: Navigation, cursor: Option<usize>) -> NavigationResponse {
    match outcome {
        Navigation::Moved => NavigationResponse {
            moved: true,
            status: "moved".to_string(),
            cursor,
        },
        Navigation::Unavailable => NavigationResponse {
            moved: false,
            status: "unavailable".to_string(),
            cursor,
        },
    }
}

/// POST /player/reset - Clear the selection
pub async fn player_reset(State(ctx): State<AppContext>) -> ApiResult<StatusResponse> {
    ctx.player.write().await.reset();
    Ok(Json(StatusResponse {
        status: "reset".to_string(),
    }))
}

/// POST /player/refresh - Reload the track list from the catalog without
/// moving the cursor
pub async fn player_refresh(State(ctx): State<AppContext>) -> ApiResult<PlayerStatusResponse> {
    let tracks = catalog::list_catalog(&ctx.db_pool)
        .await
        .map_err(error_response)?;

    let mut player = ctx.player.write().await;
    player.set_tracks(tracks);

    Ok(Json(PlayerStatusResponse {
        cursor: player.cursor(),
        track_count: player.track_count(),
        current: player.current().map(track_response),
    }))
}
