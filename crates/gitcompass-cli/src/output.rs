//! Output formatting utilities for CLI commands.

use std::collections::BTreeMap;
use std::path::PathBuf;

use gitcompass_templates::{LocatedTemplate, TemplateBody, TemplateFormat};
use serde::Serialize;

use crate::cli::{CommandContext, OutputFormat};
use crate::error::CliError;

/// Trait for types that can be formatted for output
pub trait FormattedOutput {
    fn format_text(&self) -> String;
    fn format_json(&self) -> Result<String, serde_json::Error>;
}

/// Print formatted output to stdout
pub fn print_output<T>(ctx: &CommandContext, value: &T) -> Result<(), CliError>
where
    T: FormattedOutput + Serialize,
{
    let output = match ctx.format {
        OutputFormat::Text => value.format_text(),
        OutputFormat::Json => value
            .format_json()
            .map_err(|e| CliError::Other(anyhow::anyhow!("JSON serialization failed: {}", e)))?,
    };

    println!("{}", output);
    Ok(())
}

/// Print a template body in the requested serialization.
pub fn print_body(body: &TemplateBody, format: TemplateFormat) -> Result<(), CliError> {
    let rendered = format.serialize(body)?;
    print!("{rendered}");
    Ok(())
}

/// Helper for success status outputs
#[derive(Debug, Serialize)]
pub struct StatusOutput {
    pub status: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl StatusOutput {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
            path: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }
}

impl FormattedOutput for StatusOutput {
    fn format_text(&self) -> String {
        let line = format!("✓ {}", self.message);
        match &self.path {
            Some(path) => format!("{line}\n  {}", path.display()),
            None => line,
        }
    }

    fn format_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Template names grouped by category.
#[derive(Debug, Serialize)]
pub struct TemplateListOutput {
    pub templates: BTreeMap<String, Vec<String>>,
}

impl FormattedOutput for TemplateListOutput {
    fn format_text(&self) -> String {
        if self.templates.values().all(Vec::is_empty) {
            return "No templates found".to_string();
        }

        let mut lines = Vec::new();
        for (category, names) in &self.templates {
            lines.push(format!("{category}:"));
            if names.is_empty() {
                lines.push("  (none)".to_string());
            }
            lines.extend(names.iter().map(|name| format!("  {name}")));
        }
        lines.join("\n")
    }

    fn format_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.templates)
    }
}

/// Where a template was found.
#[derive(Debug, Serialize)]
pub struct LocationOutput {
    pub category: String,
    pub name: String,
    pub path: PathBuf,
    pub location: String,
    pub format: String,
}

impl From<&LocatedTemplate> for LocationOutput {
    fn from(located: &LocatedTemplate) -> Self {
        Self {
            category: located.category.to_string(),
            name: located.name.clone(),
            path: located.path.clone(),
            location: located.location.to_string(),
            format: located.format.to_string(),
        }
    }
}

impl FormattedOutput for LocationOutput {
    fn format_text(&self) -> String {
        format!("{} ({}, {})", self.path.display(), self.location, self.format)
    }

    fn format_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
