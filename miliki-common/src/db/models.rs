//! Database models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Key-value setting row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Setting {
    pub key: String,
    pub value: String,
}

/// Free-form NFT metadata stored as a JSON text column.
///
/// Keys are camelCase on the wire and in the column, matching what
/// marketplace clients expect. `available_copies` and `total_copies` are
/// written equal at mint time; sales are expected to make them diverge,
/// but no decrement logic exists yet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NftMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub songwriter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub producer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_copies: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_copies: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub royalty_percent: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purchase_limit: Option<i64>,
}

/// One minted NFT
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NftRecord {
    pub guid: String,
    pub title: String,
    pub artist: String,
    pub price: f64,
    pub image_url: String,
    pub audio_url: String,
    pub owner_id: Option<String>,
    pub is_listed: bool,
    pub metadata: NftMetadata,
    pub created_at: DateTime<Utc>,
}

/// Custodial wallet row.
///
/// `secret_key` is the JSON encoding of the raw 64 secret bytes, never a
/// binary blob. Balance is intentionally absent: it is re-read from the
/// network on every load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletRecord {
    pub guid: String,
    pub user_id: String,
    pub public_key: String,
    pub secret_key: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Registered user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub guid: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[serde(skip_serializing)]
    pub password_salt: String,
    pub display_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Active sign-in session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_uses_camel_case_keys() {
        let meta = NftMetadata {
            songwriter: Some("J. Writer".to_string()),
            producer: Some("P. Ducer".to_string()),
            available_copies: Some(5),
            total_copies: Some(5),
            ..Default::default()
        };

        let json = serde_json::to_string(&meta).unwrap();
        assert!(json.contains("\"availableCopies\":5"));
        assert!(json.contains("\"totalCopies\":5"));
        assert!(json.contains("\"songwriter\""));
        // Unset fields are omitted entirely
        assert!(!json.contains("royaltyPercent"));
    }

    #[test]
    fn metadata_round_trips() {
        let meta = NftMetadata {
            available_copies: Some(10000),
            total_copies: Some(10000),
            royalty_percent: Some(5),
            purchase_limit: Some(2),
            ..Default::default()
        };

        let json = serde_json::to_string(&meta).unwrap();
        let back: NftMetadata = serde_json::from_str(&json).unwrap();
        assert_eq!(meta, back);
    }
}
