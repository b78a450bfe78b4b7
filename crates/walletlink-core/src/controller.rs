//! Connection controller
//!
//! Owns the in-memory `WalletSession` and writes it through the
//! `SessionStore` on every mutation. Failures are classified and kept as the
//! single current error; nothing escapes `connect` or `disconnect`.

use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use walletlink_provider::{PermissionRequest, ProviderGateway, RawProviderError};
use walletlink_session::{AccountId, SessionStore, WalletSession};

use crate::classifier::classify;
use crate::error::ConnectionError;

struct ControllerState {
    session: WalletSession,
    error: Option<ConnectionError>,
    /// Active account of the last persisted record. Survives the speculative
    /// reset at the start of `connect` until the attempt has an outcome.
    persisted_active: Option<AccountId>,
}

impl ControllerState {
    fn empty() -> Self {
        Self {
            session: WalletSession::empty(),
            error: None,
            persisted_active: None,
        }
    }
}

pub struct ConnectionController {
    provider: Arc<dyn ProviderGateway>,
    store: Arc<dyn SessionStore>,
    state: Arc<RwLock<ControllerState>>,
    connecting: Arc<AtomicBool>,
}

/// Clears the in-flight flag when a connect attempt ends, however it ends.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl ConnectionController {
    pub fn new(provider: Arc<dyn ProviderGateway>, store: Arc<dyn SessionStore>) -> Self {
        Self {
            provider,
            store,
            state: Arc::new(RwLock::new(ControllerState::empty())),
            connecting: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Load the persisted session. Called once at startup.
    pub fn restore(&self) -> WalletSession {
        let session = self.store.load();

        let mut state = self.state.write();
        state.persisted_active = session.active_account().map(str::to_string);
        state.session = session.clone();
        state.error = None;

        tracing::info!(
            count = session.accounts().len(),
            active = ?session.active_account(),
            "Restored wallet session"
        );

        session
    }

    pub fn session(&self) -> WalletSession {
        self.state.read().session.clone()
    }

    pub fn accounts(&self) -> Vec<AccountId> {
        self.state.read().session.accounts().to_vec()
    }

    pub fn active_account(&self) -> Option<AccountId> {
        self.state
            .read()
            .session
            .active_account()
            .map(str::to_string)
    }

    pub fn is_connected(&self) -> bool {
        self.state.read().session.is_connected()
    }

    pub fn is_connecting(&self) -> bool {
        self.connecting.load(Ordering::SeqCst)
    }

    pub fn last_error(&self) -> Option<ConnectionError> {
        self.state.read().error.clone()
    }

    pub fn is_provider_available(&self) -> bool {
        self.provider.is_available()
    }

    /// Ask the provider for accounts and make them the session.
    pub async fn connect(&self) {
        if self.connecting.swap(true, Ordering::SeqCst) {
            tracing::warn!("Connect requested while another request is pending");
            self.state.write().error = Some(ConnectionError::RequestAlreadyPending);
            return;
        }
        let _in_flight = InFlight(&self.connecting);

        {
            // Show "attempting" rather than stale accounts; the persisted
            // record stays as it is until there is an outcome
            let mut state = self.state.write();
            state.error = None;
            state.session.clear();
        }

        if !self.provider.is_available() {
            tracing::warn!("Connect requested but no wallet provider is installed");
            self.state.write().error = Some(ConnectionError::ProviderAbsent);
            return;
        }

        match self.provider.request_accounts().await {
            Ok(accounts) if !accounts.is_empty() => self.apply_connected(accounts),
            Ok(_) => {
                tracing::warn!("Provider authorized the request but returned no accounts");
                self.state.write().error = Some(ConnectionError::NoAccountsReturned);
            }
            Err(raw) => {
                let error = classify(&raw);
                log_classified(&raw, &error);
                self.state.write().error = Some(error);
            }
        }
    }

    fn apply_connected(&self, accounts: Vec<AccountId>) {
        let mut state = self.state.write();
        let hint = state.persisted_active.clone();
        state.session.apply_accounts_with_hint(accounts, hint.as_deref());
        self.persist(&mut state);
        state.error = None;

        tracing::info!(
            count = state.session.accounts().len(),
            active = ?state.session.active_account(),
            "Wallet connected"
        );
    }

    /// Revoke the site's authorization and forget the session.
    ///
    /// The session is cleared even when revocation fails; the user is then
    /// told to disconnect from the extension directly.
    pub async fn disconnect(&self) {
        if !self.provider.is_available() {
            tracing::debug!("Disconnect requested but no wallet provider is installed");
            return;
        }

        let outcome = self
            .provider
            .revoke_permissions(&PermissionRequest::accounts())
            .await;

        let mut state = self.state.write();
        state.session.clear();
        state.persisted_active = None;
        if let Err(e) = self.store.clear() {
            tracing::warn!(error = %e, "Failed to clear persisted wallet session");
        }

        state.error = match outcome {
            Ok(()) => {
                tracing::info!("Wallet disconnected");
                None
            }
            Err(raw) => {
                tracing::warn!(raw = %raw, "Failed to revoke wallet permissions");
                Some(ConnectionError::RevocationFailed)
            }
        };
    }

    /// Reconcile a provider-pushed account set into the session.
    pub fn handle_accounts_changed(&self, accounts: &[AccountId]) {
        let mut state = self.state.write();

        // Mid-connect the session is empty, so fall back to the persisted choice
        let hint = state
            .session
            .active_account()
            .map(str::to_string)
            .or_else(|| state.persisted_active.clone());

        state
            .session
            .apply_accounts_with_hint(accounts.to_vec(), hint.as_deref());
        self.persist(&mut state);
        state.error = None;

        if accounts.is_empty() {
            tracing::info!("Wallet disconnected from the provider");
        } else {
            tracing::info!(
                count = accounts.len(),
                active = ?state.session.active_account(),
                "Wallet accounts changed"
            );
        }
    }

    /// Make one of the authorized accounts the active one.
    pub fn select_account(&self, account: &str) -> walletlink_session::Result<()> {
        let mut state = self.state.write();
        state.session.select(account)?;
        self.persist(&mut state);

        tracing::info!(account = %account, "Selected active wallet");
        Ok(())
    }

    fn persist(&self, state: &mut ControllerState) {
        match self.store.save(&state.session) {
            Ok(()) => {
                state.persisted_active = state.session.active_account().map(str::to_string);
            }
            Err(e) => tracing::warn!(error = %e, "Failed to persist wallet session"),
        }
    }
}

impl Clone for ConnectionController {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            store: Arc::clone(&self.store),
            state: Arc::clone(&self.state),
            connecting: Arc::clone(&self.connecting),
        }
    }
}

fn log_classified(raw: &RawProviderError, error: &ConnectionError) {
    match error {
        ConnectionError::Unknown | ConnectionError::ProviderMessage(_) => {
            tracing::error!(raw = %raw, kind = error.kind(), "connect failed");
        }
        _ => tracing::info!(kind = error.kind(), "connect failed: {}", error),
    }
}
