//! Model structure sanitizer.
//!
//! Framework architecture dumps (e.g. Keras `to_json()`) are full of `null`
//! placeholders and empty config blocks. Before a dump is stored on an
//! [`AIModel`](crate::card::AIModel) it is pruned down to the values that
//! actually carry information.

use serde_json::{Map, Value};

/// Recursively drop `null` values and containers that end up empty.
///
/// Pruning is transitive: an object whose entries are all `null` becomes
/// empty and is then removed from its parent. Scalars (including `0`,
/// `false` and `""`) are kept. Key order and element order of survivors are
/// preserved. Only nested values are pruned, so a top-level `null` or `{}`
/// comes back as-is.
pub fn sanitize(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(sanitize_object(map)),
        Value::Array(items) => Value::Array(items.iter().filter_map(prune).collect()),
        scalar => scalar.clone(),
    }
}

/// In-place flavour of [`sanitize`] for owned dumps.
pub fn sanitize_owned(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter_map(|(k, v)| prune_owned(v).map(|v| (k, v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().filter_map(prune_owned).collect()),
        scalar => scalar,
    }
}

fn sanitize_object(map: &Map<String, Value>) -> Map<String, Value> {
    map.iter()
        .filter_map(|(k, v)| prune(v).map(|v| (k.clone(), v)))
        .collect()
}

/// Sanitized value, or `None` if it should be dropped from its parent.
fn prune(value: &Value) -> Option<Value> {
    if value.is_null() {
        return None;
    }
    let cleaned = sanitize(value);
    (!is_empty_container(&cleaned)).then_some(cleaned)
}

fn prune_owned(value: Value) -> Option<Value> {
    if value.is_null() {
        return None;
    }
    let cleaned = sanitize_owned(value);
    (!is_empty_container(&cleaned)).then_some(cleaned)
}

fn is_empty_container(value: &Value) -> bool {
    match value {
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}
