// ABOUTME: Shared helpers for log redaction and JSON patching
// ABOUTME: Used by the auth flow (code previews) and the cache (optimistic merges)

use serde_json::Value;

/// Number of characters of an authorization code that may appear in logs
const CODE_PREVIEW_LEN: usize = 10;

/// Shorten a one-time code for logging
pub fn code_preview(code: &str) -> String {
    let prefix: String = code.chars().take(CODE_PREVIEW_LEN).collect();
    format!("{}...", prefix)
}

/// Shallow-merge `patch` into `target`, returning the merged value.
///
/// Only object fields are merged; any non-object `target` or `patch` leaves
/// `target` unchanged.
pub fn merge_object(target: &Value, patch: &Value) -> Value {
    match (target, patch) {
        (Value::Object(base), Value::Object(changes)) => {
            let mut merged = base.clone();
            for (key, value) in changes {
                merged.insert(key.clone(), value.clone());
            }
            Value::Object(merged)
        }
        _ => target.clone(),
    }
}
