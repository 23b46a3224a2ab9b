//! Deep merge of caller overrides onto a template body.

use serde_json::Value;

use crate::TemplateBody;

/// Merge `overrides` onto `base`, returning a new body.
///
/// - both mappings: merged key by key, recursively
/// - anything else, including two sequences or a type mismatch: the
///   override value replaces the base value
///
/// Keys only in `base` are kept; keys only in `overrides` are appended.
pub fn merge(base: &TemplateBody, overrides: &TemplateBody) -> TemplateBody {
    let mut merged = base.clone();

    for (key, value) in overrides {
        let combined = match merged.get(key) {
            Some(existing) => merge_value(existing, value),
            None => value.clone(),
        };
        merged.insert(key.clone(), combined);
    }

    merged
}

/// Merge two values with the same rules as [`merge`].
pub fn merge_value(base: &Value, overrides: &Value) -> Value {
    match (base, overrides) {
        (Value::Object(base), Value::Object(overrides)) => Value::Object(merge(base, overrides)),
        (_, other) => other.clone(),
    }
}
