//! Wallet session data structure

use serde::{Deserialize, Serialize};

use crate::error::SessionError;
use crate::Result;

/// Opaque account identifier as handed out by the wallet provider.
pub type AccountId = String;

/// Authorized accounts and the active selection.
///
/// Fields are private so the active account can only change through methods
/// that keep it inside `accounts`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletSession {
    /// Accounts in provider order
    accounts: Vec<AccountId>,
    /// Currently selected account, always an element of `accounts`
    active_account: Option<AccountId>,
}

impl WalletSession {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a session from possibly inconsistent parts.
    ///
    /// An active account that is not in `accounts` is dropped rather than
    /// replaced, so restoring a record never invents a selection.
    pub fn from_parts(accounts: Vec<AccountId>, active_account: Option<AccountId>) -> Self {
        let active_account = active_account.filter(|a| accounts.contains(a));
        Self {
            accounts,
            active_account,
        }
    }

    pub fn accounts(&self) -> &[AccountId] {
        &self.accounts
    }

    pub fn active_account(&self) -> Option<&str> {
        self.active_account.as_deref()
    }

    pub fn is_connected(&self) -> bool {
        !self.accounts.is_empty()
    }

    pub fn contains(&self, account: &str) -> bool {
        self.accounts.iter().any(|a| a == account)
    }

    /// Replace the account set, reconciling against `previous`, the
    /// selection the caller considers current.
    pub fn apply_accounts_with_hint(&mut self, accounts: Vec<AccountId>, previous: Option<&str>) {
        self.active_account = reconcile_active(&accounts, previous);
        self.accounts = accounts;
    }

    /// Make `account` the active one. It must already be authorized.
    pub fn select(&mut self, account: &str) -> Result<()> {
        if !self.contains(account) {
            return Err(SessionError::UnknownAccount(account.to_string()));
        }
        self.active_account = Some(account.to_string());
        Ok(())
    }

    pub fn clear(&mut self) {
        self.accounts.clear();
        self.active_account = None;
    }
}

/// Pick the active account for a new account set.
///
/// The previous selection survives if it is still authorized, otherwise the
/// first account wins. An empty set has no active account.
pub fn reconcile_active(accounts: &[AccountId], previous: Option<&str>) -> Option<AccountId> {
    previous
        .and_then(|prev| accounts.iter().find(|a| a.as_str() == prev))
        .or_else(|| accounts.first())
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(list: &[&str]) -> Vec<AccountId> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_session() {
        let session = WalletSession::empty();
        assert!(session.accounts().is_empty());
        assert_eq!(session.active_account(), None);
        assert!(!session.is_connected());
    }

    #[test]
    fn test_reconcile_keeps_previous_when_present() {
        let accounts = ids(&["0xAA", "0xBB"]);
        assert_eq!(
            reconcile_active(&accounts, Some("0xBB")).as_deref(),
            Some("0xBB")
        );
    }

    #[test]
    fn test_reconcile_falls_back_to_first() {
        let accounts = ids(&["0xCC", "0xDD"]);
        assert_eq!(
            reconcile_active(&accounts, Some("0xBB")).as_deref(),
            Some("0xCC")
        );
        assert_eq!(reconcile_active(&accounts, None).as_deref(), Some("0xCC"));
    }

    #[test]
    fn test_reconcile_empty_has_no_active() {
        assert_eq!(reconcile_active(&[], Some("0xAA")), None);
        assert_eq!(reconcile_active(&[], None), None);
    }

    #[test]
    fn test_account_change_sequence() {
        let mut session = WalletSession::from_parts(ids(&["0xAA", "0xBB"]), Some("0xBB".into()));

        session.apply_accounts_with_hint(ids(&["0xAA", "0xBB"]), Some("0xBB"));
        assert_eq!(session.active_account(), Some("0xBB"));

        session.apply_accounts_with_hint(ids(&["0xCC"]), Some("0xBB"));
        assert_eq!(session.active_account(), Some("0xCC"));
        assert_eq!(session.accounts(), ids(&["0xCC"]).as_slice());

        session.apply_accounts_with_hint(Vec::new(), Some("0xCC"));
        assert_eq!(session.active_account(), None);
        assert!(!session.is_connected());
    }

    #[test]
    fn test_from_parts_drops_foreign_active() {
        let session = WalletSession::from_parts(ids(&["0xAA"]), Some("0xZZ".into()));
        assert_eq!(session.accounts(), ids(&["0xAA"]).as_slice());
        assert_eq!(session.active_account(), None);

        let session = WalletSession::from_parts(Vec::new(), Some("0xAA".into()));
        assert_eq!(session.active_account(), None);
    }

    #[test]
    fn test_select() {
        let mut session = WalletSession::from_parts(ids(&["0xAA", "0xBB"]), Some("0xAA".into()));

        session.select("0xBB").unwrap();
        assert_eq!(session.active_account(), Some("0xBB"));

        let err = session.select("0xZZ").unwrap_err();
        assert!(matches!(err, SessionError::UnknownAccount(ref id) if id == "0xZZ"));
        assert_eq!(session.active_account(), Some("0xBB"));
    }

    #[test]
    fn test_hint_is_used_over_current_selection() {
        let mut session = WalletSession::empty();
        session.apply_accounts_with_hint(ids(&["0xAA", "0xBB"]), Some("0xBB"));
        assert_eq!(session.active_account(), Some("0xBB"));
    }
}
