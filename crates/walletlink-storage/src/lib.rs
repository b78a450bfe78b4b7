//! WalletLink Storage Layer
//!
//! SQLite-backed key-value persistence for wallet session state.
//! Multi-key writes go through `Database::transaction` so readers never see
//! half of an update.

mod database;
mod error;
mod migrations;

pub use database::{read_setting, remove_setting, write_setting, Database};
pub use error::StorageError;

pub type Result<T> = std::result::Result<T, StorageError>;
