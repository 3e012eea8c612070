//! Group rewriting for JSON manifests.
//!
//! The manifest is decoded into a generic map, its `apiVersion` is re-grouped
//! and the whole document is encoded again. Everything other than
//! `apiVersion` survives structurally; key order is not preserved.

use serde_json::{Map, Value};

use crate::rewrite::group_version::GroupVersion;
use crate::rewrite::RewriteError;

/// Top-level field carrying the group-version identifier.
pub const API_VERSION_FIELD: &str = "apiVersion";

/// Rewrite the group of the manifest's `apiVersion` to `target_group`.
///
/// An empty `target_group` yields the bare version. Manifests without
/// `apiVersion` are re-encoded unchanged.
pub fn rewrite_group(target_group: &str, input: &[u8]) -> Result<Vec<u8>, RewriteError> {
    let mut manifest = decode_manifest(input)?;

    if let Some(value) = manifest.get_mut(API_VERSION_FIELD) {
        let api_version = value.as_str().ok_or_else(|| {
            RewriteError::GroupFormat(format!("{} is not a string: {}", API_VERSION_FIELD, value))
        })?;
        let gv = api_version.parse::<GroupVersion>()?.with_group(target_group);
        *value = Value::String(gv.to_string());
    }

    serde_json::to_vec(&manifest).map_err(RewriteError::Encode)
}

fn decode_manifest(input: &[u8]) -> Result<Map<String, Value>, RewriteError> {
    match serde_json::from_slice::<Value>(input).map_err(RewriteError::Decode)? {
        Value::Object(map) => Ok(map),
        other => Err(RewriteError::NotAnObject(json_type_name(&other))),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
