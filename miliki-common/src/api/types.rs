//! Shared API request/response types
//!
//! Wire types used by the marketplace service handlers and by clients.

use serde::{Deserialize, Serialize};

// ========================================
// Error Response Types
// ========================================

/// Error payload returned by every failing endpoint.
///
/// `error` is the user-facing message; `detail` and `hint` carry whatever
/// extra context the upstream service provided, when any.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// Per-field validation messages, present only for validation failures
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub fields: Vec<FieldErrorResponse>,
}

impl ErrorResponse {
    pub fn message(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            detail: None,
            hint: None,
            fields: Vec::new(),
        }
    }
}

/// One field-scoped validation message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldErrorResponse {
    pub field: String,
    pub message: String,
}

// ========================================
// Auth Types
// ========================================

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    pub token: String,
    pub user_id: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUserResponse {
    pub user_id: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

// ========================================
// Wallet Types
// ========================================

/// Result of a wallet Generate or a successful Load
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletResponse {
    pub public_key: String,
    /// Balance in whole tokens (smallest unit / units-per-token)
    pub balance_sol: f64,
}

/// Load outcome: "no wallet yet" is a distinct non-error state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletLoadResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wallet: Option<WalletResponse>,
}

// ========================================
// Listing Types
// ========================================

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ListForSaleRequest {
    pub price: f64,
    pub royalty_percent: i64,
    pub purchase_limit: i64,
}

// ========================================
// Player Types
// ========================================

/// Snapshot of the playback cursor and the current track
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerStatusResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<usize>,
    pub track_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<CurrentTrackResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentTrackResponse {
    pub guid: String,
    pub title: String,
    pub artist: String,
    pub audio_url: String,
    pub image_url: String,
}

/// Outcome of a next/previous request: moved, or navigation unavailable
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationResponse {
    pub moved: bool,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<usize>,
}
