//! Configuration types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Environment variable pointing at the packaged template directory.
pub const BUILTIN_TEMPLATES_ENV: &str = "GITCOMPASS_BUILTIN_TEMPLATES";

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitCompassConfig {
    /// Template search and storage configuration.
    pub templates: TemplatesConfig,
    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Template locations and defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplatesConfig {
    /// Project-local template root, relative to the project directory.
    pub project_dir: PathBuf,
    /// User-global template root (`~/.gitcompass/templates` when unset).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_dir: Option<PathBuf>,
    /// Packaged template root (resolved from the environment when unset).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub builtin_dir: Option<PathBuf>,
    /// Format used when writing new templates (`yaml` or `json`).
    pub default_format: String,
    /// Template to fall back to, per category, when a requested one is missing.
    pub fallbacks: BTreeMap<String, String>,
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        let mut fallbacks = BTreeMap::new();
        fallbacks.insert("project".to_string(), "basic".to_string());

        Self {
            project_dir: PathBuf::from(".gitcompass/templates"),
            user_dir: None,
            builtin_dir: None,
            default_format: "yaml".to_string(),
            fallbacks,
        }
    }
}

impl TemplatesConfig {
    /// Project-local template root for the given project directory.
    pub fn project_root(&self, project_dir: &Path) -> PathBuf {
        if self.project_dir.is_absolute() {
            self.project_dir.clone()
        } else {
            project_dir.join(&self.project_dir)
        }
    }

    /// User-global template root, if a home directory can be determined.
    pub fn user_root(&self) -> Option<PathBuf> {
        self.user_dir
            .clone()
            .or_else(|| dirs::home_dir().map(|home| home.join(".gitcompass").join("templates")))
    }

    /// Packaged template root.
    ///
    /// Resolution order: the configured `builtin_dir`, then
    /// `GITCOMPASS_BUILTIN_TEMPLATES`, then a `templates` directory next to
    /// the running executable.
    pub fn builtin_root(&self) -> Option<PathBuf> {
        if let Some(dir) = &self.builtin_dir {
            return Some(dir.clone());
        }

        if let Some(dir) = std::env::var_os(BUILTIN_TEMPLATES_ENV) {
            return Some(PathBuf::from(dir));
        }

        std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|dir| dir.join("templates")))
    }

    /// Fallback template name for a category.
    pub fn fallback_for(&self, category: &str) -> Option<&str> {
        self.fallbacks.get(category).map(String::as_str)
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Minimum level (`trace`, `debug`, `info`, `warn`, `error`).
    pub level: String,
    /// Output format.
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::default(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable multi-line format.
    #[default]
    Pretty,
    /// Compact single-line format.
    Compact,
    /// JSON structured format.
    Json,
}

impl LogFormat {
    /// Parse from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pretty" => Some(Self::Pretty),
            "compact" => Some(Self::Compact),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Log levels accepted in `logging.level`.
pub const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];
