//! Wallet provisioning service
//!
//! Generate: keypair, persist, fund, confirm, read balance - strictly in
//! that order. Funding failure after persistence leaves a zero-balance
//! wallet; the record is not rolled back (accepted inconsistency, logged).
//! Load: single-row lookup plus a fresh network balance read.

use crate::db::wallets;
use crate::error::{Error, Result};
use crate::wallet::keypair::WalletKeypair;
use crate::wallet::rpc::{lamports_to_sol, RpcClient, RpcConfig, LAMPORTS_PER_SOL};
use miliki_common::api::types::WalletResponse;
use miliki_common::db::settings::get_setting;
use sqlx::SqlitePool;
use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{info, warn};

/// Wallet provisioning component
pub struct WalletService {
    db: SqlitePool,
    rpc: RpcClient,
    airdrop_lamports: u64,
    /// Users with a Generate currently pending: a second Generate for the
    /// same user is rejected before any keypair is produced, while other
    /// users proceed independently
    in_flight: Mutex<HashSet<String>>,
}

/// Removes the user from the in-flight set on every exit path
struct InFlightGuard<'a> {
    set: &'a Mutex<HashSet<String>>,
    user_id: String,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut set) = self.set.lock() {
            set.remove(&self.user_id);
        }
    }
}

impl WalletService {
    pub fn new(db: SqlitePool, rpc: RpcClient, airdrop_lamports: u64) -> Self {
        Self {
            db,
            rpc,
            airdrop_lamports,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Build the service from database settings
    pub async fn from_settings(db: SqlitePool) -> Result<Self> {
        let endpoint = get_setting::<String>(&db, "rpc_endpoint")
            .await?
            .unwrap_or_else(|| RpcConfig::default().endpoint);
        let airdrop_lamports = get_setting::<u64>(&db, "airdrop_lamports")
            .await?
            .unwrap_or(LAMPORTS_PER_SOL);
        let poll_interval_ms = get_setting::<u64>(&db, "confirm_poll_interval_ms")
            .await?
            .unwrap_or(500);
        let max_polls = get_setting::<u32>(&db, "confirm_max_polls")
            .await?
            .unwrap_or(60);

        let rpc = RpcClient::new(RpcConfig {
            endpoint,
            confirm_poll_interval: Duration::from_millis(poll_interval_ms),
            confirm_max_polls: max_polls,
        });

        Ok(Self::new(db, rpc, airdrop_lamports))
    }

    /// Generate a custodial wallet for a user.
    ///
    /// Persists the keypair, requests a fixed-amount airdrop, awaits
    /// confirmation, and reports the confirmed balance in whole tokens.
    pub async fn generate(&self, user_id: &str) -> Result<WalletResponse> {
        {
            let mut in_flight = self
                .in_flight
                .lock()
                .map_err(|_| Error::Internal("Wallet in-flight set poisoned".to_string()))?;
            if !in_flight.insert(user_id.to_string()) {
                return Err(Error::BadRequest(
                    "Wallet generation is already in progress for this user".to_string(),
                ));
            }
        }
        let _guard = InFlightGuard {
            set: &self.in_flight,
            user_id: user_id.to_string(),
        };

        let keypair = WalletKeypair::generate();
        let public_key = keypair.public_key();
        let secret_key = keypair.secret_key_json()?;

        // Persist first; the in-memory keypair is discarded on failure
        wallets::insert_wallet(&self.db, user_id, &public_key, &secret_key).await?;

        // Funding is best-effort against the faucet. A failure here
        // leaves a persisted wallet with zero confirmed balance; the
        // record stays and the error is surfaced.
        let signature = match self
            .rpc
            .request_airdrop(&public_key, self.airdrop_lamports)
            .await
        {
            Ok(signature) => signature,
            Err(e) => {
                warn!(
                    "Wallet {} persisted but funding failed: {}",
                    public_key, e
                );
                return Err(e);
            }
        };

        self.rpc.confirm_signature(&signature).await?;

        let balance = self.rpc.get_balance(&public_key).await?;
        let balance_sol = lamports_to_sol(balance);

        info!(
            "Provisioned wallet {} for user {} with balance {} SOL",
            public_key, user_id, balance_sol
        );

        Ok(WalletResponse {
            public_key,
            balance_sol,
        })
    }

    /// Load the user's wallet, if any, with a freshly read balance.
    ///
    /// No wallet row is the distinct "no wallet yet" outcome. Balance is
    /// never served from stored state.
    pub async fn load(&self, user_id: &str) -> Result<Option<WalletResponse>> {
        let record = match wallets::find_wallet_for_user(&self.db, user_id).await? {
            Some(record) => record,
            None => return Ok(None),
        };

        let balance = self.rpc.get_balance(&record.public_key).await?;

        Ok(Some(WalletResponse {
            public_key: record.public_key,
            balance_sol: lamports_to_sol(balance),
        }))
    }
}
