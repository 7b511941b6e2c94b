//! Marketplace service library for Miliki
//!
//! Exposes the components behind the HTTP API: session auth, NFT catalog
//! and playback cursor, mint orchestration, wallet provisioning, and the
//! content-storage upload client.

pub mod api;
pub mod auth;
pub mod catalog;
pub mod db;
pub mod error;
pub mod mint;
pub mod storage;
pub mod wallet;

pub use error::{Error, Result};
