//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};
use gitcompass_config::{ConfigLoader, GitCompassConfig};
use gitcompass_templates::{TemplateFormat, TemplateStore};

use crate::commands::TemplatesCommand;
use crate::error::CliError;

/// GitCompass - GitHub project scaffolding from templates
///
/// Manage GitHub issue, project and roadmap templates from the command line.
#[derive(Debug, Parser)]
#[command(
    name = "gitcompass",
    author,
    version,
    about,
    long_about = None,
    propagate_version = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Increase verbosity level (-v, -vv, -vvv)
    #[arg(
        short,
        long,
        action = ArgAction::Count,
        global = true,
        help = "Increase verbosity level"
    )]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(
        short,
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Suppress non-error output"
    )]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(
        short,
        long,
        global = true,
        env = "GITCOMPASS_CONFIG",
        value_hint = ValueHint::FilePath,
        help = "Path to configuration file"
    )]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        global = true,
        default_value = "text",
        value_enum,
        help = "Output format (text, json)"
    )]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Available subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage issue, project and roadmap templates
    #[command(visible_alias = "t")]
    Templates(TemplatesCommand),
}

impl Cli {
    /// Load configuration from `--config` or the project's default location
    pub fn load_config(&self) -> Result<(PathBuf, GitCompassConfig), CliError> {
        let project_dir = std::env::current_dir()?;
        let loader = ConfigLoader::new(&project_dir);

        let config = match &self.config {
            Some(path) => loader.load_file(path)?,
            None => loader.load()?,
        };

        Ok((project_dir, config))
    }

    /// Execute the selected command
    pub fn execute(self, project_dir: PathBuf, config: GitCompassConfig) -> Result<(), CliError> {
        let ctx = CommandContext::new(project_dir, config, self.format, self.verbose)?;

        match self.command {
            Command::Templates(cmd) => cmd.execute(&ctx),
        }
    }
}

/// Context passed to all commands
#[derive(Debug)]
pub struct CommandContext {
    pub config: GitCompassConfig,
    pub project_dir: PathBuf,
    pub format: OutputFormat,
    pub verbose: u8,
    pub store: TemplateStore,
}

impl CommandContext {
    pub fn new(
        project_dir: PathBuf,
        config: GitCompassConfig,
        format: OutputFormat,
        verbose: u8,
    ) -> Result<Self, CliError> {
        // Validated by the loader, but a default-constructed config skips it
        config
            .templates
            .default_format
            .parse::<TemplateFormat>()
            .map_err(CliError::config)?;

        let store = TemplateStore::from_config(&config.templates, &project_dir);
        Ok(Self {
            config,
            project_dir,
            format,
            verbose,
            store,
        })
    }

    /// Format for new template files when `--as` is not given.
    pub fn file_format(&self) -> TemplateFormat {
        self.config.templates.default_format.parse().unwrap_or_default()
    }

    /// Format for printing a template body when `--as` is not given.
    pub fn print_format(&self) -> TemplateFormat {
        match self.format {
            OutputFormat::Json => TemplateFormat::Json,
            OutputFormat::Text => self.file_format(),
        }
    }
}
