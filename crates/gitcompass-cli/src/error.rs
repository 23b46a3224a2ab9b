//! CLI error handling and formatting.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use gitcompass_config::ConfigError;
use gitcompass_templates::TemplateError;
use serde_json::json;
use thiserror::Error;

/// CLI error type with rich context
#[derive(Debug, Error)]
pub enum CliError {
    #[error("{message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        hint: Option<String>,
    },

    #[error("{message}")]
    Io {
        message: String,
        #[source]
        source: io::Error,
        path: Option<PathBuf>,
    },

    #[error("{message}")]
    Validation {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("{message}")]
    NotFound {
        message: String,
        resource_type: String,
        resource_name: String,
        suggestions: Vec<String>,
    },

    #[error("{message}")]
    User {
        message: String,
        hint: Option<String>,
    },

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl CliError {
    /// Get the error code for this error
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config { .. } => "E001",
            Self::Io { .. } => "E002",
            Self::Validation { .. } => "E004",
            Self::NotFound { .. } => "E005",
            Self::User { .. } => "E010",
            Self::Other(_) => "E999",
        }
    }

    /// Numeric process exit status
    pub fn exit_status(&self) -> u8 {
        match self {
            Self::Config { .. } => 2,
            Self::Io { .. } => 3,
            Self::Validation { .. } => 5,
            Self::NotFound { .. } => 6,
            Self::User { .. } => 1,
            Self::Other(_) => 1,
        }
    }

    /// Get the exit code for this error
    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from(self.exit_status())
    }

    /// Get hint for this error if available
    pub fn hint(&self) -> Option<&str> {
        match self {
            Self::Config { hint, .. } => hint.as_deref(),
            Self::User { hint, .. } => hint.as_deref(),
            Self::NotFound { suggestions, .. } if !suggestions.is_empty() => {
                Some("See available templates below")
            }
            _ => None,
        }
    }

    /// Get suggestions for this error
    pub fn suggestions(&self) -> &[String] {
        match self {
            Self::NotFound { suggestions, .. } => suggestions,
            _ => &[],
        }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
            hint: None,
        }
    }

    /// Create an IO error with path
    pub fn io_with_path(message: impl Into<String>, source: io::Error, path: impl Into<PathBuf>) -> Self {
        Self::Io {
            message: message.into(),
            source,
            path: Some(path.into()),
        }
    }

    /// Create a not found error
    pub fn not_found(resource_type: impl Into<String>, resource_name: impl Into<String>) -> Self {
        let resource_type = resource_type.into();
        let resource_name = resource_name.into();
        Self::NotFound {
            message: format!("{resource_type} not found: {resource_name}"),
            resource_type,
            resource_name,
            suggestions: vec![],
        }
    }

    /// Attach suggestions to a not found error; other errors are unchanged.
    pub fn with_suggestions(self, names: Vec<String>) -> Self {
        match self {
            Self::NotFound {
                message,
                resource_type,
                resource_name,
                ..
            } => Self::NotFound {
                message,
                resource_type,
                resource_name,
                suggestions: names,
            },
            other => other,
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            source: None,
        }
    }

    /// Create a user error with hint
    pub fn user_with_hint(message: impl Into<String>, hint: impl Into<String>) -> Self {
        Self::User {
            message: message.into(),
            hint: Some(hint.into()),
        }
    }

    /// Human readable report for stderr.
    pub fn render(&self) -> String {
        let mut output = format!("error[{}]: {self}", self.code());

        if let Some(hint) = self.hint() {
            output.push_str(&format!("\n  hint: {hint}"));
        }
        for suggestion in self.suggestions() {
            output.push_str(&format!("\n    - {suggestion}"));
        }

        output
    }

    /// Machine readable report for `--format json`.
    pub fn render_json(&self) -> String {
        let value = json!({
            "success": false,
            "error": {
                "code": self.code(),
                "message": self.to_string(),
                "hint": self.hint(),
                "suggestions": self.suggestions(),
            }
        });
        serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string())
    }
}

// Conversion implementations
impl From<io::Error> for CliError {
    fn from(err: io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
            source: err,
            path: None,
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        Self::Validation {
            message: format!("Invalid JSON: {err}"),
            source: Some(Box::new(err)),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        Self::Config {
            message: format!("Configuration error: {err}"),
            source: Some(Box::new(err)),
            hint: Some("Check .gitcompass/config.yaml or the file passed with --config".to_string()),
        }
    }
}

impl From<TemplateError> for CliError {
    fn from(err: TemplateError) -> Self {
        match err {
            TemplateError::NotFound { category, name } => Self::not_found(format!("{category} template"), name),
            TemplateError::Io { path, source } => {
                Self::io_with_path(format!("I/O error on {}: {source}", path.display()), source, path)
            }
            TemplateError::AlreadyExists { path } => Self::user_with_hint(
                format!("template already exists: {}", path.display()),
                "Pass --force to overwrite it",
            ),
            TemplateError::LocationUnavailable { .. } => Self::Config {
                message: err.to_string(),
                hint: Some("Set templates.user_dir in the configuration".to_string()),
                source: Some(Box::new(err)),
            },
            TemplateError::Serialize { .. } => Self::Other(anyhow::Error::new(err)),
            TemplateError::Malformed { .. }
            | TemplateError::ReadOnlyLocation { .. }
            | TemplateError::UnsupportedFormat { .. }
            | TemplateError::InvalidName { .. } => Self::Validation {
                message: err.to_string(),
                source: Some(Box::new(err)),
            },
        }
    }
}
