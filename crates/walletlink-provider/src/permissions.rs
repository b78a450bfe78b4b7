//! Permission descriptors and wire names
//!
//! Revocation is keyed by capability name with an (empty) caveat object,
//! e.g. `{ "eth_accounts": {} }`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub const REQUEST_ACCOUNTS_METHOD: &str = "eth_requestAccounts";
pub const REVOKE_PERMISSIONS_METHOD: &str = "wallet_revokePermissions";
pub const ACCOUNTS_PERMISSION: &str = "eth_accounts";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionRequest {
    capabilities: BTreeMap<String, Map<String, Value>>,
}

impl PermissionRequest {
    /// The account-access permission a connect call grants.
    pub fn accounts() -> Self {
        Self::default().with_capability(ACCOUNTS_PERMISSION)
    }

    pub fn with_capability(mut self, name: impl Into<String>) -> Self {
        self.capabilities.insert(name.into(), Map::new());
        self
    }

    pub fn includes(&self, name: &str) -> bool {
        self.capabilities.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }

    /// JSON-RPC params for `wallet_revokePermissions`.
    pub fn to_params(&self) -> Value {
        Value::Array(vec![Value::Object(
            self.capabilities
                .iter()
                .map(|(name, caveats)| (name.clone(), Value::Object(caveats.clone())))
                .collect(),
        )])
    }
}
