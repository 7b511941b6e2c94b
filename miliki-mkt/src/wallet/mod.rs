//! Custodial wallet provisioning
//!
//! Generates a keypair for a signed-in user, persists it, funds it on the
//! devnet faucet, and reconciles the live on-chain balance. Balance is
//! never cached: every load re-reads it from the network.

pub mod keypair;
pub mod provision;
pub mod rpc;

pub use keypair::WalletKeypair;
pub use provision::WalletService;
pub use rpc::{RpcClient, RpcConfig, LAMPORTS_PER_SOL};
