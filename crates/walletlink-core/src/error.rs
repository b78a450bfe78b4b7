//! Core error types

use thiserror::Error;

/// Why the last connect or disconnect attempt did not go cleanly.
///
/// `Display` is the message shown to the user.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    #[error("Wallet provider is not installed. Please install it to connect.")]
    ProviderAbsent,

    #[error("Connection request was rejected by the user.")]
    UserRejected,

    #[error("Connection request already pending. Please check your wallet.")]
    RequestAlreadyPending,

    #[error("{0}")]
    ProviderMessage(String),

    #[error("{0}")]
    RawString(String),

    #[error("An unknown error occurred. Please try again.")]
    Unknown,

    #[error("Could not retrieve accounts. Please try again.")]
    NoAccountsReturned,

    #[error("Failed to disconnect properly. Please disconnect from the wallet extension directly.")]
    RevocationFailed,
}

impl ConnectionError {
    /// Stable identifier for hosts that style errors by category.
    pub fn kind(&self) -> &'static str {
        match self {
            ConnectionError::ProviderAbsent => "provider_absent",
            ConnectionError::UserRejected => "user_rejected",
            ConnectionError::RequestAlreadyPending => "request_already_pending",
            ConnectionError::ProviderMessage(_) => "provider_message",
            ConnectionError::RawString(_) => "raw_string",
            ConnectionError::Unknown => "unknown",
            ConnectionError::NoAccountsReturned => "no_accounts_returned",
            ConnectionError::RevocationFailed => "revocation_failed",
        }
    }
}

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Storage error: {0}")]
    Storage(#[from] walletlink_storage::StorageError),

    #[error("Session error: {0}")]
    Session(#[from] walletlink_session::SessionError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}
