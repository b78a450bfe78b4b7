//! Raw provider errors

use serde_json::{json, Value};
use thiserror::Error;

/// Whatever the provider rejected with, kept as loosely typed JSON.
///
/// Providers reject with nested objects (`{ info: { error: { code, message } } }`),
/// bare strings, or nothing useful at all. No shape is assumed here.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("provider error: {0}")]
pub struct RawProviderError(pub Value);

impl RawProviderError {
    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    /// Structured JSON-RPC style rejection.
    pub fn rpc(code: i64, message: impl Into<String>) -> Self {
        Self(json!({
            "info": {
                "error": {
                    "code": code,
                    "message": message.into(),
                }
            }
        }))
    }

    /// Rejection carrying only a plain string.
    pub fn text(message: impl Into<String>) -> Self {
        Self(Value::String(message.into()))
    }

    /// Rejection with no value at all.
    pub fn undefined() -> Self {
        Self(Value::Null)
    }

    pub fn value(&self) -> &Value {
        &self.0
    }
}

impl From<Value> for RawProviderError {
    fn from(value: Value) -> Self {
        Self(value)
    }
}
