//! Merge-only helpers for subscription metadata.
//!
//! Metadata is an open JSON object recording provenance (who triggered a
//! change, when, why, links to neighbouring terms). Transitions only ever
//! merge keys in; existing keys from earlier transitions survive.

use serde_json::{Map, Value};

/// Merge `patch` into `target`.
///
/// `target` is coerced to an object if it holds anything else (legacy rows
/// may carry `null`). Keys in `patch` overwrite same-named keys in `target`;
/// no key is ever removed. Non-object patches are ignored.
pub fn merge(target: &mut Value, patch: Value) {
    let Value::Object(patch) = patch else {
        return;
    };

    if !target.is_object() {
        *target = Value::Object(Map::new());
    }

    if let Value::Object(existing) = target {
        for (key, value) in patch {
            existing.insert(key, value);
        }
    }
}
