//! Settings deep-merge.
//!
//! Layer-ordered merge semantics:
//! - Objects: merge by key (recursive)
//! - Arrays: concatenate, then deduplicate keeping first occurrence
//! - Null overlay: keep the existing value
//! - Everything else (scalars, type mismatches): overlay wins outright

use serde_json::Value;

/// Deep merge two JSON values; `overlay` takes precedence.
///
/// Arrays concatenate rather than replace so that permission lists and
/// similar accumulate across layers, with earlier layers' entries kept in
/// front. A scalar/object/array shape conflict is resolved by taking the
/// overlay's value whole — no partial reconciliation across the type
/// boundary.
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                let merged = if let Some(base_value) = base_map.remove(&key) {
                    deep_merge(base_value, overlay_value)
                } else {
                    overlay_value
                };
                base_map.insert(key, merged);
            }
            Value::Object(base_map)
        }

        (Value::Array(base_items), Value::Array(overlay_items)) => {
            let mut merged = Vec::with_capacity(base_items.len() + overlay_items.len());
            for item in base_items.into_iter().chain(overlay_items) {
                if !merged.contains(&item) {
                    merged.push(item);
                }
            }
            Value::Array(merged)
        }

        // An explicit null contributes nothing.
        (base, Value::Null) => base,

        (_, overlay) => overlay,
    }
}

/// Fold an ordered sequence of layer documents through [`deep_merge`].
/// Returns `None` when no layer contributed a document.
pub fn merge_layers<I: IntoIterator<Item = Value>>(layers: I) -> Option<Value> {
    layers.into_iter().fold(None, |acc, doc| {
        Some(match acc {
            Some(acc) => deep_merge(acc, doc),
            None => doc,
        })
    })
}
