//! Database layer: schema initialization, models, settings access

pub mod init;
pub mod models;
pub mod settings;

pub use init::init_database;
pub use models::{NftMetadata, NftRecord, Session, Setting, User, WalletRecord};
