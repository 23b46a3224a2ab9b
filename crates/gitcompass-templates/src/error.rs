//! Template engine errors.

use std::path::PathBuf;

use thiserror::Error;

use crate::location::LocationKind;

/// Result alias for template operations.
pub type Result<T> = std::result::Result<T, TemplateError>;

/// Errors that can occur during template operations
#[derive(Debug, Error)]
pub enum TemplateError {
    /// No search location contains the template
    #[error("template '{name}' of type '{category}' not found")]
    NotFound { category: String, name: String },

    /// File exists but is not a valid template
    #[error("malformed template {}{}: {message}", path.display(), line.map(|l| format!(" (line {l})")).unwrap_or_default())]
    Malformed {
        path: PathBuf,
        line: Option<usize>,
        message: String,
    },

    /// Target file already exists and overwrite was not requested
    #[error("template already exists: {path}")]
    AlreadyExists { path: PathBuf },

    /// Attempted to write into a read-only location
    #[error("{location} templates are read-only")]
    ReadOnlyLocation { location: LocationKind },

    /// Location is not part of the search path (e.g. no home directory)
    #[error("no {location} template directory is configured")]
    LocationUnavailable { location: LocationKind },

    /// Extension is neither YAML nor JSON
    #[error("unsupported template format: {path}")]
    UnsupportedFormat { path: PathBuf },

    /// Template or category name cannot be used as a file name
    #[error("invalid template name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    /// Filesystem failure
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Body could not be serialized
    #[error("failed to serialize template: {message}")]
    Serialize { message: String },
}

impl TemplateError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn malformed(path: impl Into<PathBuf>, line: Option<usize>, message: impl Into<String>) -> Self {
        Self::Malformed {
            path: path.into(),
            line,
            message: message.into(),
        }
    }

    /// Whether this error means the template simply does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
