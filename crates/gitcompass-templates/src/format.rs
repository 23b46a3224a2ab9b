//! On-disk serialization formats.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde_json::Value;

use crate::error::{Result, TemplateError};
use crate::TemplateBody;

/// Serialization format of a template file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TemplateFormat {
    #[default]
    Yaml,
    Json,
}

/// Extensions tried inside a location, highest priority first. A directory
/// holding both `name.yaml` and `name.json` always resolves to the YAML file.
pub const LOOKUP_EXTENSIONS: [(&str, TemplateFormat); 3] = [
    ("yaml", TemplateFormat::Yaml),
    ("yml", TemplateFormat::Yaml),
    ("json", TemplateFormat::Json),
];

impl TemplateFormat {
    /// Detect the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        LOOKUP_EXTENSIONS
            .iter()
            .find(|(candidate, _)| *candidate == ext)
            .map(|(_, format)| *format)
    }

    /// Canonical extension used when writing.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Yaml => "yaml",
            Self::Json => "json",
        }
    }

    /// Serialize a body in this format.
    pub fn serialize(&self, body: &TemplateBody) -> Result<String> {
        let value = Value::Object(body.clone());
        match self {
            Self::Yaml => serde_yaml::to_string(&value).map_err(|e| TemplateError::Serialize {
                message: e.to_string(),
            }),
            Self::Json => serde_json::to_string_pretty(&value)
                .map(|mut json| {
                    json.push('\n');
                    json
                })
                .map_err(|e| TemplateError::Serialize {
                    message: e.to_string(),
                }),
        }
    }
}

impl fmt::Display for TemplateFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for TemplateFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "yaml" | "yml" => Ok(Self::Yaml),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown template format '{other}' (expected yaml or json)")),
        }
    }
}
