//! Template file parsing.

use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::error::{Result, TemplateError};
use crate::format::TemplateFormat;
use crate::TemplateBody;

/// Parse a template file, choosing the deserializer from its extension.
pub fn parse(path: &Path) -> Result<TemplateBody> {
    let format = TemplateFormat::from_path(path).ok_or_else(|| TemplateError::UnsupportedFormat {
        path: path.to_path_buf(),
    })?;

    let content = std::fs::read_to_string(path).map_err(|e| TemplateError::io(path, e))?;
    let body = parse_str(&content, format, path)?;

    debug!(path = %path.display(), %format, keys = body.len(), "parsed template");
    Ok(body)
}

/// Parse template text. `path` is only used for error reporting.
pub fn parse_str(content: &str, format: TemplateFormat, path: &Path) -> Result<TemplateBody> {
    let value: Value = match format {
        TemplateFormat::Yaml => yaml_to_json(content, path)?,
        TemplateFormat::Json => serde_json::from_str(content).map_err(|e| {
            let line = Some(e.line()).filter(|line| *line > 0);
            TemplateError::malformed(path, line, e.to_string())
        })?,
    };

    match value {
        Value::Object(body) => Ok(body),
        other => Err(TemplateError::malformed(
            path,
            None,
            format!("top level must be a mapping, found {}", kind_of(&other)),
        )),
    }
}

fn yaml_to_json(content: &str, path: &Path) -> Result<Value> {
    let raw: serde_yaml::Value = serde_yaml::from_str(content)
        .map_err(|e| TemplateError::malformed(path, e.location().map(|l| l.line()), e.to_string()))?;

    // JSON has no NaN or infinity; converting would turn them into null
    if let Some(f) = non_finite(&raw) {
        return Err(TemplateError::malformed(
            path,
            None,
            format!("non-finite number {f} cannot be represented"),
        ));
    }

    serde_yaml::from_value(raw).map_err(|e| TemplateError::malformed(path, None, e.to_string()))
}

fn non_finite(value: &serde_yaml::Value) -> Option<f64> {
    match value {
        serde_yaml::Value::Number(n) => n.as_f64().filter(|f| !f.is_finite()),
        serde_yaml::Value::Sequence(items) => items.iter().find_map(non_finite),
        serde_yaml::Value::Mapping(map) => map.values().find_map(non_finite),
        serde_yaml::Value::Tagged(tagged) => non_finite(&tagged.value),
        _ => None,
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "an empty document",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}
