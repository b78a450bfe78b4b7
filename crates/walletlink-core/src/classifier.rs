//! Provider error classification
//!
//! Total over any JSON value: malformed or partial shapes end up as
//! `RawString` or `Unknown`, never as a second failure.

use serde_json::Value;

use walletlink_provider::RawProviderError;

use crate::error::ConnectionError;

/// EIP-1193: user rejected the request.
pub const USER_REJECTED_CODE: i64 = 4001;
/// EIP-1193: a request of the same kind is already pending.
pub const REQUEST_PENDING_CODE: i64 = -32002;

pub fn classify(error: &RawProviderError) -> ConnectionError {
    let value = error.value();
    match value {
        Value::String(text) => ConnectionError::RawString(text.clone()),
        Value::Object(_) => classify_structured(value),
        _ => ConnectionError::Unknown,
    }
}

fn classify_structured(value: &Value) -> ConnectionError {
    let nested = value.pointer("/info/error").filter(|e| e.is_object());

    let code = nested
        .and_then(|e| e.get("code"))
        .or_else(|| value.get("code"))
        .and_then(as_code);

    match code {
        Some(USER_REJECTED_CODE) => return ConnectionError::UserRejected,
        Some(REQUEST_PENDING_CODE) => return ConnectionError::RequestAlreadyPending,
        _ => {}
    }

    let message = nested
        .and_then(|e| non_empty_str(e.get("message")))
        .or_else(|| non_empty_str(value.get("message")));

    match message {
        Some(message) => ConnectionError::ProviderMessage(message.to_string()),
        None => ConnectionError::Unknown,
    }
}

fn as_code(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.fract() == 0.0)
            .map(|f| f as i64)
    })
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}
