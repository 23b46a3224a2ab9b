//! Configuration file loading and parsing.

use crate::types::{GitCompassConfig, LOG_LEVELS};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Config loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("failed to read config: {source}")]
    ReadError {
        #[from]
        source: std::io::Error,
    },

    #[error("invalid YAML at line {}: {message}", line.map(|l| l.to_string()).unwrap_or_else(|| "unknown".to_string()))]
    ParseError { line: Option<usize>, message: String },

    #[error("validation error: {message}")]
    ValidationError { message: String },

    #[error("environment variable not found: {var}")]
    EnvVarNotFound { var: String },
}

/// Configuration loader.
pub struct ConfigLoader {
    base_path: PathBuf,
}

impl ConfigLoader {
    /// Relative location of the config file inside a project.
    pub const CONFIG_FILE: &'static str = ".gitcompass/config.yaml";

    /// Create a loader for the given project directory.
    pub fn new(project_dir: impl AsRef<Path>) -> Self {
        Self {
            base_path: project_dir.as_ref().to_path_buf(),
        }
    }

    /// Project directory this loader resolves paths against.
    pub fn project_dir(&self) -> &Path {
        &self.base_path
    }

    /// Load configuration from `.gitcompass/config.yaml`.
    ///
    /// A missing file yields the default configuration.
    pub fn load(&self) -> Result<GitCompassConfig, ConfigError> {
        let config_path = self.base_path.join(Self::CONFIG_FILE);

        if !config_path.exists() {
            debug!(path = %config_path.display(), "no config file, using defaults");
            return Ok(GitCompassConfig::default());
        }

        self.load_file(&config_path)
    }

    /// Load configuration from an explicit file, which must exist.
    pub fn load_file(&self, path: &Path) -> Result<GitCompassConfig, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let contents = std::fs::read_to_string(path)?;
        let expanded = self.expand_env_vars(&contents)?;

        // An empty file deserializes to `null`, which means "all defaults".
        let config: GitCompassConfig = if expanded.trim().is_empty() {
            GitCompassConfig::default()
        } else {
            serde_yaml::from_str(&expanded).map_err(|e| ConfigError::ParseError {
                line: e.location().map(|l| l.line()),
                message: e.to_string(),
            })?
        };

        self.validate(&config)?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Expand environment variables in the form `${VAR}` or `${VAR:-default}`.
    fn expand_env_vars(&self, content: &str) -> Result<String, ConfigError> {
        let mut result = content.to_string();
        let re = regex::Regex::new(r"\$\{([^}:]+)(?::-([^}]*))?\}").unwrap();

        for cap in re.captures_iter(content) {
            let full_match = cap.get(0).unwrap().as_str();
            let var_name = &cap[1];
            let default = cap.get(2).map(|m| m.as_str());

            let value = match std::env::var(var_name) {
                Ok(v) => v,
                Err(_) => match default {
                    Some(d) => d.to_string(),
                    None => {
                        return Err(ConfigError::EnvVarNotFound {
                            var: var_name.to_string(),
                        })
                    }
                },
            };

            result = result.replace(full_match, &value);
        }

        Ok(result)
    }

    /// Validate configuration values.
    fn validate(&self, config: &GitCompassConfig) -> Result<(), ConfigError> {
        let format = config.templates.default_format.to_lowercase();
        if format != "yaml" && format != "json" {
            return Err(ConfigError::ValidationError {
                message: format!(
                    "templates.default_format must be 'yaml' or 'json', got '{}'",
                    config.templates.default_format
                ),
            });
        }

        for (category, name) in &config.templates.fallbacks {
            if name.trim().is_empty() {
                return Err(ConfigError::ValidationError {
                    message: format!("templates.fallbacks.{category} must not be empty"),
                });
            }
        }

        let level = config.logging.level.to_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::ValidationError {
                message: format!(
                    "logging.level must be one of {}, got '{}'",
                    LOG_LEVELS.join(", "),
                    config.logging.level
                ),
            });
        }

        Ok(())
    }

    /// Save configuration to file.
    pub fn save(&self, config: &GitCompassConfig) -> Result<PathBuf, ConfigError> {
        let config_path = self.base_path.join(Self::CONFIG_FILE);
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let yaml = serde_yaml::to_string(config).map_err(|e| ConfigError::ParseError {
            line: None,
            message: e.to_string(),
        })?;

        std::fs::write(&config_path, yaml)?;
        Ok(config_path)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new(std::env::current_dir().unwrap_or_default())
    }
}
