//! Provider account-change listener
//!
//! Holds at most one `accountsChanged` registration, scoped to the listener's
//! own lifetime. Every notification goes through the controller's
//! reconciliation path in the order the provider emits them.

use parking_lot::Mutex;
use std::sync::Arc;

use walletlink_provider::{AccountsHandler, ProviderGateway, Subscription};

use crate::controller::ConnectionController;

pub struct AccountEventListener {
    provider: Arc<dyn ProviderGateway>,
    controller: ConnectionController,
    subscription: Mutex<Option<Subscription>>,
}

impl AccountEventListener {
    pub fn new(provider: Arc<dyn ProviderGateway>, controller: ConnectionController) -> Self {
        Self {
            provider,
            controller,
            subscription: Mutex::new(None),
        }
    }

    /// Subscribe if the provider is available and no registration exists.
    /// Returns whether the listener is subscribed afterwards.
    pub fn start(&self) -> bool {
        let mut subscription = self.subscription.lock();
        if subscription.is_some() {
            return true;
        }

        if !self.provider.is_available() {
            tracing::debug!("No wallet provider, not listening for account changes");
            return false;
        }

        let controller = self.controller.clone();
        let handler: AccountsHandler = Arc::new(move |accounts: &[String]| {
            controller.handle_accounts_changed(accounts);
        });

        *subscription = Some(self.provider.on_accounts_changed(handler));
        tracing::info!("Listening for wallet account changes");
        true
    }

    /// Remove the registration, if any.
    pub fn stop(&self) {
        let subscription = self.subscription.lock().take();
        if let Some(subscription) = subscription {
            subscription.unsubscribe();
            tracing::info!("Stopped listening for wallet account changes");
        }
    }

    /// Re-evaluate provider presence: subscribe when it appeared, unsubscribe
    /// when it went away. Returns whether the provider is available.
    pub fn recheck(&self) -> bool {
        if self.provider.is_available() {
            self.start();
            true
        } else {
            self.stop();
            false
        }
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.lock().is_some()
    }
}

impl Drop for AccountEventListener {
    fn drop(&mut self) {
        self.stop();
    }
}
