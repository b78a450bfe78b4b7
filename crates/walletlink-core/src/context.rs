//! Host-facing wallet context
//!
//! The one object a host application holds. It exposes the read-only state
//! the connection dialog renders (`wallets`, `active_wallet`, the current
//! error), the dialog's open flag, and the operations the dialog invokes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use walletlink_provider::ProviderGateway;
use walletlink_session::{AccountId, SessionStore, SqliteSessionStore, WalletSession};
use walletlink_storage::Database;

use crate::config::Config;
use crate::controller::ConnectionController;
use crate::error::ConnectionError;
use crate::listener::AccountEventListener;
use crate::Result;

pub struct WalletContext {
    config: Config,
    controller: ConnectionController,
    listener: AccountEventListener,
    dialog_open: AtomicBool,
}

impl WalletContext {
    /// Open the session database named by `config` and wire everything up.
    pub fn open(config: Config, provider: Arc<dyn ProviderGateway>) -> Result<Self> {
        config.validate()?;

        if let Some(parent) = config.database_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = Database::open(&config.database_path)?;
        let store = Arc::new(SqliteSessionStore::new(db));

        Ok(Self::with_store(config, provider, store))
    }

    pub fn with_store(
        config: Config,
        provider: Arc<dyn ProviderGateway>,
        store: Arc<dyn SessionStore>,
    ) -> Self {
        let controller = ConnectionController::new(Arc::clone(&provider), store);
        let listener = AccountEventListener::new(provider, controller.clone());

        Self {
            config,
            controller,
            listener,
            dialog_open: AtomicBool::new(false),
        }
    }

    /// Restore the persisted session and start listening for provider
    /// account changes.
    pub fn initialize(&self) -> WalletSession {
        let session = self.controller.restore();
        self.listener.start();

        tracing::info!(
            provider_available = self.controller.is_provider_available(),
            "Wallet context initialized"
        );

        session
    }

    // === Read-only state ===

    pub fn wallets(&self) -> Vec<AccountId> {
        self.controller.accounts()
    }

    pub fn active_wallet(&self) -> Option<AccountId> {
        self.controller.active_account()
    }

    pub fn last_error(&self) -> Option<ConnectionError> {
        self.controller.last_error()
    }

    /// The message to show under the dialog, if any.
    pub fn error_message(&self) -> Option<String> {
        self.controller.last_error().map(|e| e.to_string())
    }

    pub fn is_provider_available(&self) -> bool {
        self.controller.is_provider_available()
    }

    pub fn provider_install_url(&self) -> &str {
        &self.config.provider_install_url
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn controller(&self) -> &ConnectionController {
        &self.controller
    }

    // === Dialog ===

    pub fn show_wallet_manage_dialog(&self) {
        self.dialog_open.store(true, Ordering::SeqCst);
    }

    pub fn close_wallet_manage_dialog(&self) {
        self.dialog_open.store(false, Ordering::SeqCst);
    }

    pub fn is_dialog_open(&self) -> bool {
        self.dialog_open.load(Ordering::SeqCst)
    }

    // === Operations invoked by the dialog ===

    pub async fn connect(&self) {
        self.controller.connect().await;
    }

    pub async fn disconnect(&self) {
        self.controller.disconnect().await;
    }

    pub fn select_wallet(&self, account: &str) -> Result<()> {
        Ok(self.controller.select_account(account)?)
    }

    /// Re-check whether a provider is injected and follow it with the
    /// account listener.
    pub fn recheck_provider(&self) -> bool {
        self.listener.recheck()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use walletlink_provider::InMemoryProvider;

    fn temp_config(dir: &tempfile::TempDir) -> Config {
        Config::new(dir.path().join("data"))
    }

    #[tokio::test]
    async fn test_session_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let provider = InMemoryProvider::new(["0xAA", "0xBB"]);

        {
            let context =
                WalletContext::open(temp_config(&dir), Arc::new(provider.clone())).unwrap();
            context.initialize();
            context.connect().await;
            context.select_wallet("0xBB").unwrap();
        }

        let context = WalletContext::open(temp_config(&dir), Arc::new(provider.clone())).unwrap();
        let restored = context.initialize();

        assert_eq!(restored.accounts().to_vec(), vec!["0xAA", "0xBB"]);
        assert_eq!(context.wallets(), vec!["0xAA", "0xBB"]);
        assert_eq!(context.active_wallet().as_deref(), Some("0xBB"));
    }

    #[tokio::test]
    async fn test_disconnect_then_reload_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let provider = InMemoryProvider::new(["0xAA"]);

        {
            let context =
                WalletContext::open(temp_config(&dir), Arc::new(provider.clone())).unwrap();
            context.initialize();
            context.connect().await;
            context.disconnect().await;
        }

        let context = WalletContext::open(temp_config(&dir), Arc::new(provider.clone())).unwrap();
        assert_eq!(context.initialize(), WalletSession::empty());
    }

    #[tokio::test]
    async fn test_dialog_flag_and_errors() {
        let dir = tempfile::tempdir().unwrap();
        let provider = InMemoryProvider::absent();
        let context = WalletContext::open(temp_config(&dir), Arc::new(provider.clone())).unwrap();
        context.initialize();

        assert!(!context.is_dialog_open());
        context.show_wallet_manage_dialog();
        assert!(context.is_dialog_open());

        assert!(!context.is_provider_available());
        assert_eq!(context.provider_install_url(), "https://metamask.io/download/");

        context.connect().await;
        assert_eq!(
            context.error_message().as_deref(),
            Some("Wallet provider is not installed. Please install it to connect.")
        );

        context.close_wallet_manage_dialog();
        assert!(!context.is_dialog_open());
    }

    #[tokio::test]
    async fn test_recheck_provider_starts_listening() {
        let dir = tempfile::tempdir().unwrap();
        let provider = InMemoryProvider::absent();
        let context = WalletContext::open(temp_config(&dir), Arc::new(provider.clone())).unwrap();
        context.initialize();
        assert_eq!(provider.listener_count(), 0);

        provider.set_available(true);
        assert!(context.recheck_provider());
        assert_eq!(provider.listener_count(), 1);

        context.connect().await;
        provider.set_accounts(["0xDD"]);
        assert_eq!(context.active_wallet().as_deref(), Some("0xDD"));
    }

    #[test]
    fn test_select_unknown_wallet_fails() {
        let dir = tempfile::tempdir().unwrap();
        let provider = InMemoryProvider::new(["0xAA"]);
        let context = WalletContext::open(temp_config(&dir), Arc::new(provider)).unwrap();
        context.initialize();

        assert!(matches!(
            context.select_wallet("0xAA"),
            Err(crate::CoreError::Session(_))
        ));
    }
}
