//! # Miliki Common Library
//!
//! Shared code for the Miliki marketplace service including:
//! - Database models and schema initialization
//! - Settings (key-value) access with ordered credential lookup
//! - API request/response types
//! - Configuration loading
//! - Common error type

pub mod api;
pub mod config;
pub mod db;
pub mod error;

pub use error::{Error, Result};
