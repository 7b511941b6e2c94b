//! Blockchain JSON-RPC client
//!
//! Thin client over the devnet RPC endpoint: request a test-network
//! airdrop, poll for confirmation, and read a balance in lamports. The
//! confirmation wait is bounded (fixed number of polls at a fixed
//! interval) so a stalled transaction surfaces as an upstream error
//! instead of a hang.

use crate::error::{Error, Result};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info};

/// Smallest-unit-per-token constant for the network
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// RPC endpoint and confirmation-poll configuration
#[derive(Debug, Clone)]
pub struct RpcConfig {
    pub endpoint: String,
    pub confirm_poll_interval: Duration,
    pub confirm_max_polls: u32,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.devnet.solana.com".to_string(),
            confirm_poll_interval: Duration::from_millis(500),
            confirm_max_polls: 60,
        }
    }
}

/// JSON-RPC 2.0 response envelope
#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
    data: Option<Value>,
}

/// Result wrapper used by balance and status queries
#[derive(Debug, Deserialize)]
struct WithContext<T> {
    value: T,
}

#[derive(Debug, Deserialize)]
struct SignatureStatus {
    err: Option<Value>,
    #[serde(rename = "confirmationStatus")]
    confirmation_status: Option<String>,
}

pub struct RpcClient {
    config: RpcConfig,
    client: reqwest::Client,
}

impl RpcClient {
    pub fn new(config: RpcConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        let resp = self
            .client
            .post(&self.config.endpoint)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await?;

        match resp.status() {
            StatusCode::OK => {}
            StatusCode::TOO_MANY_REQUESTS => {
                return Err(Error::Upstream {
                    message: format!("RPC endpoint rate-limited the {} request", method),
                    detail: None,
                    hint: Some("Try again later".to_string()),
                });
            }
            status => {
                let text = resp.text().await.unwrap_or_default();
                return Err(Error::Upstream {
                    message: format!("RPC {} request failed with status {}", method, status),
                    detail: Some(text),
                    hint: None,
                });
            }
        }

        let envelope: RpcResponse<T> = resp.json().await?;

        if let Some(err) = envelope.error {
            return Err(Error::Upstream {
                message: format!("RPC {} rejected: {}", method, err.message),
                detail: err.data.map(|d| d.to_string()),
                hint: Some(format!("RPC error code {}", err.code)),
            });
        }

        envelope
            .result
            .ok_or_else(|| Error::upstream(format!("RPC {} returned no result", method)))
    }

    /// Request a fixed-amount test-network funding transaction.
    /// Returns the transaction signature.
    pub async fn request_airdrop(&self, public_key: &str, lamports: u64) -> Result<String> {
        info!(
            "Requesting airdrop of {} lamports for {}",
            lamports, public_key
        );
        let signature: String = self
            .call("requestAirdrop", json!([public_key, lamports]))
            .await?;
        debug!("Airdrop transaction: {}", signature);
        Ok(signature)
    }

    /// Wait for a transaction to reach confirmed or finalized status.
    ///
    /// Polls at the configured interval up to the configured maximum; a
    /// transaction still unconfirmed after the last poll is an upstream
    /// error, not a wait.
    pub async fn confirm_signature(&self, signature: &str) -> Result<()> {
        for _ in 0..self.config.confirm_max_polls {
            let statuses: WithContext<Vec<Option<SignatureStatus>>> = self
                .call("getSignatureStatuses", json!([[signature]]))
                .await?;

            if let Some(Some(status)) = statuses.value.first() {
                if let Some(err) = &status.err {
                    return Err(Error::Upstream {
                        message: format!("Transaction {} failed on-chain", signature),
                        detail: Some(err.to_string()),
                        hint: None,
                    });
                }
                if matches!(
                    status.confirmation_status.as_deref(),
                    Some("confirmed") | Some("finalized")
                ) {
                    debug!("Transaction {} confirmed", signature);
                    return Ok(());
                }
            }

            tokio::time::sleep(self.config.confirm_poll_interval).await;
        }

        Err(Error::Upstream {
            message: format!(
                "Transaction {} not confirmed after {} polls",
                signature, self.config.confirm_max_polls
            ),
            detail: None,
            hint: Some("The funding transaction may still land later".to_string()),
        })
    }

    /// Read the current balance in lamports
    pub async fn get_balance(&self, public_key: &str) -> Result<u64> {
        let balance: WithContext<u64> = self.call("getBalance", json!([public_key])).await?;
        Ok(balance.value)
    }
}

/// Convert lamports to whole tokens
pub fn lamports_to_sol(lamports: u64) -> f64 {
    lamports as f64 / LAMPORTS_PER_SOL as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lamports_convert_to_whole_tokens() {
        assert_eq!(lamports_to_sol(LAMPORTS_PER_SOL), 1.0);
        assert_eq!(lamports_to_sol(2_500_000_000), 2.5);
        assert_eq!(lamports_to_sol(0), 0.0);
    }

    #[test]
    fn envelope_parses_result() {
        let raw = r#"{"jsonrpc":"2.0","id":1,"result":"5sig"}"#;
        let envelope: RpcResponse<String> = serde_json::from_str(raw).unwrap();
        assert_eq!(envelope.result.as_deref(), Some("5sig"));
        assert!(envelope.error.is_none());
    }

    #[test]
    fn envelope_parses_error() {
        let raw = r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32602,"message":"Invalid param"}}"#;
        let envelope: RpcResponse<String> = serde_json::from_str(raw).unwrap();
        assert!(envelope.result.is_none());
        let err = envelope.error.unwrap();
        assert_eq!(err.code, -32602);
        assert_eq!(err.message, "Invalid param");
    }

    #[test]
    fn balance_result_parses_context_wrapper() {
        let raw = r#"{"context":{"slot":123},"value":1000000000}"#;
        let parsed: WithContext<u64> = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.value, LAMPORTS_PER_SOL);
    }

    #[test]
    fn signature_statuses_parse_null_and_confirmed() {
        let raw = r#"{"context":{"slot":1},"value":[null]}"#;
        let parsed: WithContext<Vec<Option<SignatureStatus>>> = serde_json::from_str(raw).unwrap();
        assert!(parsed.value[0].is_none());

        let raw = r#"{"context":{"slot":1},"value":[{"slot":5,"confirmations":3,"err":null,"confirmationStatus":"confirmed"}]}"#;
        let parsed: WithContext<Vec<Option<SignatureStatus>>> = serde_json::from_str(raw).unwrap();
        let status = parsed.value[0].as_ref().unwrap();
        assert!(status.err.is_none());
        assert_eq!(status.confirmation_status.as_deref(), Some("confirmed"));
    }
}
