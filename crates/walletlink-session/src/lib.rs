//! WalletLink Session Management
//!
//! - A `WalletSession` is the ordered set of authorized accounts plus at most
//!   one active account drawn from that set
//! - Every mutation is written through a `SessionStore`
//! - The persisted record is read once at startup

mod error;
mod session;
mod store;

pub use error::SessionError;
pub use session::{reconcile_active, AccountId, WalletSession};
pub use store::{
    MemorySessionStore, SessionStore, SqliteSessionStore, ACCOUNTS_KEY, ACTIVE_ACCOUNT_KEY,
};

pub type Result<T> = std::result::Result<T, SessionError>;
