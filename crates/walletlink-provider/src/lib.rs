//! WalletLink Provider Boundary
//!
//! The injected wallet (browser extension or equivalent) is reached only
//! through `ProviderGateway`:
//! - presence check
//! - account authorization request
//! - permission revocation
//! - account-change subscription with an explicit unsubscribe capability
//!
//! Errors from the provider are passed through untouched as
//! `RawProviderError`; turning them into something a user can read is the
//! caller's job.

mod error;
mod gateway;
mod memory;
mod permissions;

pub use error::RawProviderError;
pub use gateway::{AccountsHandler, ProviderGateway, Subscription, ACCOUNTS_CHANGED_EVENT};
pub use memory::InMemoryProvider;
pub use permissions::{
    PermissionRequest, ACCOUNTS_PERMISSION, REQUEST_ACCOUNTS_METHOD, REVOKE_PERMISSIONS_METHOD,
};
