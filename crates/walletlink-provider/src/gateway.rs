//! Provider capability contract

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

use crate::error::RawProviderError;
use crate::permissions::PermissionRequest;

/// Event name the provider uses for account-set changes.
pub const ACCOUNTS_CHANGED_EVENT: &str = "accountsChanged";

/// Callback receiving the provider's new account set, in provider order.
/// An empty slice means the user disconnected from the provider's own UI.
pub type AccountsHandler = Arc<dyn Fn(&[String]) + Send + Sync>;

#[async_trait]
pub trait ProviderGateway: Send + Sync {
    /// Whether an injected provider is present right now. Not cached.
    fn is_available(&self) -> bool;

    /// Ask the provider to authorize this site and return its accounts.
    async fn request_accounts(&self) -> Result<Vec<String>, RawProviderError>;

    /// Ask the provider to forget this site's authorization.
    async fn revoke_permissions(&self, request: &PermissionRequest)
        -> Result<(), RawProviderError>;

    /// Register `handler` for account-set changes until the returned
    /// `Subscription` is unsubscribed or dropped.
    fn on_accounts_changed(&self, handler: AccountsHandler) -> Subscription;
}

/// Capability to remove one handler registration.
///
/// The removal runs exactly once: on `unsubscribe`, or on drop if
/// `unsubscribe` was never called.
pub struct Subscription {
    remove: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new<F>(remove: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            remove: Some(Box::new(remove)),
        }
    }

    pub fn unsubscribe(mut self) {
        self.remove_now();
    }

    fn remove_now(&mut self) {
        if let Some(remove) = self.remove.take() {
            remove();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.remove_now();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("pending", &self.remove.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_unsubscribe_runs_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let subscription = Subscription::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        subscription.unsubscribe();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drop_unsubscribes() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        {
            let _subscription = Subscription::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_debug_reports_pending_removal() {
        let subscription = Subscription::new(|| {});
        assert!(format!("{:?}", subscription).contains("pending: true"));
        subscription.unsubscribe();
    }
}
