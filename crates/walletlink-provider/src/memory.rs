//! In-process wallet provider
//!
//! Behaves like an injected EIP-1193 wallet: it owns a set of accounts,
//! hands them out once the site is authorized, forgets the site on
//! revocation, and pushes `accountsChanged` to registered handlers while the
//! site is authorized. Failures and stalls can be scripted.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use uuid::Uuid;

use crate::error::RawProviderError;
use crate::gateway::{AccountsHandler, ProviderGateway, Subscription, ACCOUNTS_CHANGED_EVENT};
use crate::permissions::{
    PermissionRequest, ACCOUNTS_PERMISSION, REQUEST_ACCOUNTS_METHOD, REVOKE_PERMISSIONS_METHOD,
};

struct Inner {
    available: AtomicBool,
    /// Accounts held by the wallet
    accounts: Mutex<Vec<String>>,
    /// Whether this site currently holds the accounts permission
    authorized: AtomicBool,
    /// Errors returned by upcoming `request_accounts` calls, oldest first
    request_failures: Mutex<VecDeque<RawProviderError>>,
    revoke_failure: Mutex<Option<RawProviderError>>,
    /// `true` while `request_accounts` calls are held open
    hold: watch::Sender<bool>,
    handlers: Mutex<Vec<(Uuid, AccountsHandler)>>,
    request_calls: AtomicUsize,
    revoke_calls: AtomicUsize,
}

#[derive(Clone)]
pub struct InMemoryProvider {
    inner: Arc<Inner>,
}

impl InMemoryProvider {
    /// An available provider holding `accounts`, not yet authorized.
    pub fn new<I, S>(accounts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let (hold, _) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                available: AtomicBool::new(true),
                accounts: Mutex::new(accounts.into_iter().map(Into::into).collect()),
                authorized: AtomicBool::new(false),
                request_failures: Mutex::new(VecDeque::new()),
                revoke_failure: Mutex::new(None),
                hold,
                handlers: Mutex::new(Vec::new()),
                request_calls: AtomicUsize::new(0),
                revoke_calls: AtomicUsize::new(0),
            }),
        }
    }

    /// A host environment without any injected provider.
    pub fn absent() -> Self {
        let provider = Self::new(Vec::<String>::new());
        provider.set_available(false);
        provider
    }

    pub fn set_available(&self, available: bool) {
        self.inner.available.store(available, Ordering::SeqCst);
    }

    pub fn is_authorized(&self) -> bool {
        self.inner.authorized.load(Ordering::SeqCst)
    }

    /// Make the next `request_accounts` call fail with `error`.
    pub fn fail_next_request(&self, error: RawProviderError) {
        self.inner.request_failures.lock().push_back(error);
    }

    /// Make every `revoke_permissions` call fail with `error`, or succeed
    /// again with `None`.
    pub fn fail_revocation(&self, error: Option<RawProviderError>) {
        *self.inner.revoke_failure.lock() = error;
    }

    /// Hold `request_accounts` calls open until `release_requests`.
    pub fn hold_requests(&self) {
        self.inner.hold.send_replace(true);
    }

    pub fn release_requests(&self) {
        self.inner.hold.send_replace(false);
    }

    /// Change the wallet's accounts, as the user would inside the extension.
    /// Handlers are notified only while the site is authorized.
    pub fn set_accounts<I, S>(&self, accounts: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let accounts: Vec<String> = accounts.into_iter().map(Into::into).collect();
        *self.inner.accounts.lock() = accounts.clone();

        if self.is_authorized() {
            self.emit_accounts_changed(&accounts);
        }
    }

    /// Disconnect the site from the extension's own UI.
    pub fn disconnect_site(&self) {
        if self.inner.authorized.swap(false, Ordering::SeqCst) {
            self.emit_accounts_changed(&[]);
        }
    }

    /// Deliver an `accountsChanged` notification to every handler in
    /// registration order.
    pub fn emit_accounts_changed(&self, accounts: &[String]) {
        // Snapshot first so a handler may unsubscribe without deadlocking
        let handlers: Vec<AccountsHandler> = self
            .inner
            .handlers
            .lock()
            .iter()
            .map(|(_, handler)| Arc::clone(handler))
            .collect();

        for handler in handlers {
            handler(accounts);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.inner.handlers.lock().len()
    }

    pub fn request_count(&self) -> usize {
        self.inner.request_calls.load(Ordering::SeqCst)
    }

    pub fn revoke_count(&self) -> usize {
        self.inner.revoke_calls.load(Ordering::SeqCst)
    }

    async fn wait_until_released(&self) {
        let mut rx = self.inner.hold.subscribe();
        loop {
            if !*rx.borrow_and_update() {
                return;
            }
            // The sender lives in `inner`, so the channel cannot close here
            if rx.changed().await.is_err() {
                return;
            }
        }
    }
}

#[async_trait]
impl ProviderGateway for InMemoryProvider {
    fn is_available(&self) -> bool {
        self.inner.available.load(Ordering::SeqCst)
    }

    async fn request_accounts(&self) -> Result<Vec<String>, RawProviderError> {
        self.inner.request_calls.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(method = REQUEST_ACCOUNTS_METHOD, "Provider request");
        self.wait_until_released().await;

        if !self.is_available() {
            return Err(RawProviderError::text("Wallet provider is not available"));
        }

        if let Some(error) = self.inner.request_failures.lock().pop_front() {
            return Err(error);
        }

        self.inner.authorized.store(true, Ordering::SeqCst);
        Ok(self.inner.accounts.lock().clone())
    }

    async fn revoke_permissions(
        &self,
        request: &PermissionRequest,
    ) -> Result<(), RawProviderError> {
        self.inner.revoke_calls.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(
            method = REVOKE_PERMISSIONS_METHOD,
            params = %request.to_params(),
            "Provider request"
        );

        if let Some(error) = self.inner.revoke_failure.lock().clone() {
            return Err(error);
        }

        if request.includes(ACCOUNTS_PERMISSION) {
            self.disconnect_site();
        }
        Ok(())
    }

    fn on_accounts_changed(&self, handler: AccountsHandler) -> Subscription {
        let id = Uuid::new_v4();
        self.inner.handlers.lock().push((id, handler));
        tracing::debug!(event = ACCOUNTS_CHANGED_EVENT, subscription_id = %id, "Registered handler");

        let inner = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = inner.upgrade() {
                inner.handlers.lock().retain(|(registered, _)| *registered != id);
                tracing::debug!(event = ACCOUNTS_CHANGED_EVENT, subscription_id = %id, "Removed handler");
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder() -> (AccountsHandler, Arc<Mutex<Vec<Vec<String>>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let handler: AccountsHandler = Arc::new(move |accounts: &[String]| {
            sink.lock().push(accounts.to_vec());
        });
        (handler, seen)
    }

    #[tokio::test]
    async fn test_request_accounts_authorizes() {
        let provider = InMemoryProvider::new(["0xAA", "0xBB"]);
        assert!(!provider.is_authorized());

        let accounts = provider.request_accounts().await.unwrap();
        assert_eq!(accounts, vec!["0xAA", "0xBB"]);
        assert!(provider.is_authorized());
        assert_eq!(provider.request_count(), 1);
    }

    #[tokio::test]
    async fn test_scripted_failure_is_consumed_once() {
        let provider = InMemoryProvider::new(["0xAA"]);
        provider.fail_next_request(RawProviderError::rpc(4001, "rejected"));

        let err = provider.request_accounts().await.unwrap_err();
        assert_eq!(err, RawProviderError::rpc(4001, "rejected"));
        assert!(provider.request_accounts().await.is_ok());
    }

    #[tokio::test]
    async fn test_revocation_notifies_and_can_fail() {
        let provider = InMemoryProvider::new(["0xAA"]);
        let (handler, seen) = recorder();
        let _subscription = provider.on_accounts_changed(handler);

        provider.request_accounts().await.unwrap();
        provider
            .revoke_permissions(&PermissionRequest::accounts())
            .await
            .unwrap();
        assert!(!provider.is_authorized());
        assert_eq!(*seen.lock(), vec![Vec::<String>::new()]);

        provider.fail_revocation(Some(RawProviderError::text("unsupported")));
        assert!(provider
            .revoke_permissions(&PermissionRequest::accounts())
            .await
            .is_err());
        assert_eq!(provider.revoke_count(), 2);
    }

    #[tokio::test]
    async fn test_set_accounts_only_notifies_when_authorized() {
        let provider = InMemoryProvider::new(["0xAA"]);
        let (handler, seen) = recorder();
        let _subscription = provider.on_accounts_changed(handler);

        provider.set_accounts(["0xBB"]);
        assert!(seen.lock().is_empty());

        provider.request_accounts().await.unwrap();
        provider.set_accounts(["0xCC", "0xDD"]);
        assert_eq!(*seen.lock(), vec![vec!["0xCC".to_string(), "0xDD".to_string()]]);
    }

    #[test]
    fn test_unsubscribe_removes_handler() {
        let provider = InMemoryProvider::new(["0xAA"]);
        let (handler, seen) = recorder();

        let subscription = provider.on_accounts_changed(handler);
        assert_eq!(provider.listener_count(), 1);

        subscription.unsubscribe();
        assert_eq!(provider.listener_count(), 0);

        provider.emit_accounts_changed(&["0xAA".to_string()]);
        assert!(seen.lock().is_empty());
    }

    #[tokio::test]
    async fn test_held_request_waits_for_release() {
        let provider = InMemoryProvider::new(["0xAA"]);
        provider.hold_requests();

        let pending = tokio::spawn({
            let provider = provider.clone();
            async move { provider.request_accounts().await }
        });

        tokio::task::yield_now().await;
        assert!(!pending.is_finished());

        provider.release_requests();
        let accounts = pending.await.unwrap().unwrap();
        assert_eq!(accounts, vec!["0xAA"]);
    }

    #[test]
    fn test_absent_provider() {
        let provider = InMemoryProvider::absent();
        assert!(!provider.is_available());
    }
}
