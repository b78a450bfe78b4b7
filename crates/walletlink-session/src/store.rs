//! Session persistence
//!
//! The persisted record is two independently keyed entries:
//! `wallets` holds the JSON array of accounts and `activeWallet` holds the
//! active account as a plain string (absent when none is active).

use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use walletlink_storage::{read_setting, remove_setting, write_setting, Database};

use crate::session::{AccountId, WalletSession};
use crate::Result;

pub const ACCOUNTS_KEY: &str = "wallets";
pub const ACTIVE_ACCOUNT_KEY: &str = "activeWallet";

/// Durable home of the wallet session.
///
/// `load` never fails: a missing or unreadable record is the empty session.
pub trait SessionStore: Send + Sync {
    fn load(&self) -> WalletSession;

    /// Overwrite the persisted record with `session`.
    fn save(&self, session: &WalletSession) -> Result<()>;

    /// Remove the persisted record.
    fn clear(&self) -> Result<()>;
}

/// `SessionStore` backed by the SQLite settings table.
pub struct SqliteSessionStore {
    db: Database,
}

impl SqliteSessionStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn read_record(&self) -> Result<(Option<String>, Option<String>)> {
        Ok(self.db.with_connection(|conn| {
            Ok((
                read_setting(conn, ACCOUNTS_KEY)?,
                read_setting(conn, ACTIVE_ACCOUNT_KEY)?,
            ))
        })?)
    }
}

impl SessionStore for SqliteSessionStore {
    fn load(&self) -> WalletSession {
        let (accounts_json, active) = match self.read_record() {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read persisted wallet session");
                return WalletSession::empty();
            }
        };

        let accounts: Vec<AccountId> = match accounts_json {
            Some(json) => match serde_json::from_str(&json) {
                Ok(accounts) => accounts,
                Err(e) => {
                    tracing::warn!(error = %e, "Persisted account list is malformed, ignoring");
                    return WalletSession::empty();
                }
            },
            None => Vec::new(),
        };

        let active = active.filter(|a| !a.is_empty());
        let session = WalletSession::from_parts(accounts, active.clone());

        if active.is_some() && session.active_account().is_none() {
            tracing::warn!(
                account = ?active,
                "Persisted active account is not among persisted accounts, dropping it"
            );
        }

        tracing::debug!(
            count = session.accounts().len(),
            active = ?session.active_account(),
            "Loaded wallet session"
        );

        session
    }

    fn save(&self, session: &WalletSession) -> Result<()> {
        let accounts_json = serde_json::to_string(session.accounts())?;

        // Accounts first, then the active account, in one transaction
        self.db.transaction(|conn| {
            write_setting(conn, ACCOUNTS_KEY, &accounts_json)?;
            match session.active_account() {
                Some(active) => write_setting(conn, ACTIVE_ACCOUNT_KEY, active)?,
                None => remove_setting(conn, ACTIVE_ACCOUNT_KEY)?,
            }
            Ok(())
        })?;

        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.db.transaction(|conn| {
            remove_setting(conn, ACTIVE_ACCOUNT_KEY)?;
            remove_setting(conn, ACCOUNTS_KEY)?;
            Ok(())
        })?;

        Ok(())
    }
}

impl Clone for SqliteSessionStore {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
        }
    }
}

/// In-process `SessionStore` for hosts without durable storage.
#[derive(Default)]
pub struct MemorySessionStore {
    record: Mutex<Option<WalletSession>>,
    saves: AtomicUsize,
    clears: AtomicUsize,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with an existing persisted record.
    pub fn with_session(session: WalletSession) -> Self {
        Self {
            record: Mutex::new(Some(session)),
            ..Self::default()
        }
    }

    /// The raw persisted record, `None` when nothing has been written.
    pub fn record(&self) -> Option<WalletSession> {
        self.record.lock().clone()
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn clear_count(&self) -> usize {
        self.clears.load(Ordering::SeqCst)
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> WalletSession {
        self.record.lock().clone().unwrap_or_default()
    }

    fn save(&self, session: &WalletSession) -> Result<()> {
        *self.record.lock() = Some(session.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.record.lock() = None;
        self.clears.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
