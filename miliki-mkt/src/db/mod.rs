//! Service-specific database access

pub mod nfts;
pub mod wallets;
