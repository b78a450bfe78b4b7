//! WalletLink Core
//!
//! Connection lifecycle for a single injected wallet provider:
//! connect, disconnect, active-account reconciliation, provider-pushed
//! account changes and error classification. Rendering the connection
//! dialog is left to the host; it only sees `WalletContext`.

mod classifier;
mod config;
mod context;
mod controller;
mod error;
mod listener;

pub use classifier::{classify, REQUEST_PENDING_CODE, USER_REJECTED_CODE};
pub use config::Config;
pub use context::WalletContext;
pub use controller::ConnectionController;
pub use error::{ConnectionError, CoreError};
pub use listener::AccountEventListener;

// Re-export the building blocks hosts wire together
pub use walletlink_provider::{
    AccountsHandler, InMemoryProvider, PermissionRequest, ProviderGateway, RawProviderError,
    Subscription,
};
pub use walletlink_session::{
    AccountId, MemorySessionStore, SessionError, SessionStore, SqliteSessionStore, WalletSession,
};
pub use walletlink_storage::{Database, StorageError};

pub type Result<T> = std::result::Result<T, CoreError>;

/// Initialize logging
///
/// `RUST_LOG` wins over `default_filter`. Safe to call more than once.
pub fn init_logging(default_filter: &str) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = fmt().with_env_filter(filter).with_target(true).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_twice() {
        let config = Config::new(std::path::PathBuf::from("/tmp/walletlink"));
        init_logging(&config.log_filter);
        init_logging("debug");
        tracing::info!("logging initialized");
    }
}
