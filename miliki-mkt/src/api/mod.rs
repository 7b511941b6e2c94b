//! HTTP API for the marketplace service

pub mod handlers;
pub mod server;

pub use server::{run, AppContext};
