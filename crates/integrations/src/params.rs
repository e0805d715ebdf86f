//! Helpers for pulling fields out of schema-shaped argument objects.

use crate::ExecutorError;

/// Check that every name in `required` is present (and not null).
///
/// The error message lists the missing names in schema order.
pub fn require(
    args: &serde_json::Value,
    action: &str,
    required: &[&str],
) -> Result<(), ExecutorError> {
    let missing: Vec<String> = required
        .iter()
        .filter(|name| args.get(**name).is_none_or(serde_json::Value::is_null))
        .map(|name| (*name).to_string())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ExecutorError::missing(action, missing))
    }
}

/// A required string field. Call after [`require`]; missing fields become a
/// downstream-style error rather than a panic.
pub fn str_field<'a>(args: &'a serde_json::Value, name: &str) -> Result<&'a str, ExecutorError> {
    args.get(name)
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| ExecutorError::invalid(format!("Parameter '{name}' must be a string")))
}

/// An optional string field; null and absent are both `None`.
#[must_use]
pub fn opt_str_field<'a>(args: &'a serde_json::Value, name: &str) -> Option<&'a str> {
    args.get(name).and_then(serde_json::Value::as_str)
}

/// An integer field that tolerates being sent as a JSON string.
pub fn int_field(args: &serde_json::Value, name: &str) -> Result<i64, ExecutorError> {
    let value = args
        .get(name)
        .ok_or_else(|| ExecutorError::invalid(format!("Parameter '{name}' must be an integer")))?;
    value
        .as_i64()
        .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
        .ok_or_else(|| ExecutorError::invalid(format!("Parameter '{name}' must be an integer")))
}
