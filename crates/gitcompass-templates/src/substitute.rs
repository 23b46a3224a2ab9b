//! Placeholder substitution.
//!
//! Any string scalar may contain `{identifier}` tokens. Substitution walks
//! mappings (values only, never keys) and sequences, replacing each token
//! whose identifier has a value. Tokens without a value are left in place
//! so a partially filled template still renders and the gap stays visible.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde_json::{Map, Value};

use crate::TemplateBody;

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_.\-]*)\}").unwrap())
}

/// Values available to placeholders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Values {
    variables: HashMap<String, String>,
}

impl Values {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.variables.insert(key.into(), value.into());
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&String> {
        self.variables.get(key)
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Merge another set of values in; entries in `other` win.
    pub fn extend(&mut self, other: Values) {
        self.variables.extend(other.variables);
    }

    /// Build from a JSON object. Strings are used as-is, other scalars are
    /// stringified, `null` becomes the empty string and nested structures
    /// are rendered as compact JSON.
    pub fn from_json(map: &Map<String, Value>) -> Self {
        map.iter()
            .map(|(key, value)| (key.clone(), scalar_to_string(value)))
            .collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Values {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            variables: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

impl From<HashMap<String, String>> for Values {
    fn from(variables: HashMap<String, String>) -> Self {
        Self { variables }
    }
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        nested => nested.to_string(),
    }
}

/// Substitute placeholders in a template body, producing a new body.
pub fn substitute(body: &TemplateBody, values: &Values) -> TemplateBody {
    body.iter()
        .map(|(key, value)| (key.clone(), substitute_value(value, values)))
        .collect()
}

/// Substitute placeholders anywhere inside a value.
pub fn substitute_value(value: &Value, values: &Values) -> Value {
    match value {
        Value::String(s) => Value::String(substitute_str(s, values)),
        Value::Array(items) => Value::Array(items.iter().map(|item| substitute_value(item, values)).collect()),
        Value::Object(map) => Value::Object(substitute(map, values)),
        scalar => scalar.clone(),
    }
}

/// Substitute placeholders in one string. Replacement text is never
/// rescanned, so a value containing `{x}` is inserted literally.
pub fn substitute_str(input: &str, values: &Values) -> String {
    placeholder_pattern()
        .replace_all(input, |caps: &Captures| match values.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Distinct placeholder names in a body, in first-seen order.
pub fn placeholders(body: &TemplateBody) -> Vec<String> {
    let mut found = Vec::new();
    for value in body.values() {
        collect(value, &mut found);
    }
    found
}

/// Placeholders in a body that `values` does not cover.
pub fn unresolved(body: &TemplateBody, values: &Values) -> Vec<String> {
    placeholders(body)
        .into_iter()
        .filter(|name| values.get(name).is_none())
        .collect()
}

fn collect(value: &Value, found: &mut Vec<String>) {
    match value {
        Value::String(s) => {
            for caps in placeholder_pattern().captures_iter(s) {
                let name = &caps[1];
                if !found.iter().any(|existing| existing == name) {
                    found.push(name.to_string());
                }
            }
        }
        Value::Array(items) => items.iter().for_each(|item| collect(item, found)),
        Value::Object(map) => map.values().for_each(|item| collect(item, found)),
        _ => {}
    }
}
