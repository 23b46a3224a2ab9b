//! GitCompass CLI
//!
//! Main entry point for the `gitcompass` binary.

use std::io::{self, IsTerminal};
use std::process::ExitCode;

use clap::Parser;
use gitcompass_cli::cli::{Cli, OutputFormat};
use gitcompass_cli::CliError;
use gitcompass_config::{GitCompassConfig, LogFormat, LoggingConfig};

/// Filter directives, e.g. `GITCOMPASS_LOG=gitcompass_templates=debug`
const LOG_ENV: &str = "GITCOMPASS_LOG";
/// `pretty`, `compact` or `json`
const LOG_FORMAT_ENV: &str = "GITCOMPASS_LOG_FORMAT";

fn main() -> ExitCode {
    let cli = Cli::parse();
    let format = cli.format;

    // Logging settings live in the config, so load it before the subscriber
    let loaded = cli.load_config();
    let logging = match &loaded {
        Ok((_, config)) => config.logging.clone(),
        Err(_) => GitCompassConfig::default().logging,
    };
    init_tracing(&cli, &logging);

    let result = loaded.and_then(|(project_dir, config)| cli.execute(project_dir, config));
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => report(&e, format),
    }
}

fn report(error: &CliError, format: OutputFormat) -> ExitCode {
    match format {
        OutputFormat::Json => eprintln!("{}", error.render_json()),
        OutputFormat::Text => eprintln!("{}", error.render()),
    }
    tracing::debug!(code = error.code(), "command failed: {error:?}");
    error.exit_code()
}

fn init_tracing(cli: &Cli, logging: &LoggingConfig) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = match std::env::var(LOG_ENV) {
        Ok(directives) if !directives.trim().is_empty() => EnvFilter::new(directives),
        _ => match cli.verbose {
            0 if cli.quiet => EnvFilter::new("error"),
            0 => EnvFilter::new(&logging.level),
            1 => EnvFilter::new("info"),
            2 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        },
    };

    let format = std::env::var(LOG_FORMAT_ENV)
        .ok()
        .and_then(|value| LogFormat::parse(&value))
        .unwrap_or(logging.format);
    let ansi = io::stderr().is_terminal();

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Pretty => registry
            .with(
                fmt::layer()
                    .with_writer(io::stderr)
                    .with_ansi(ansi)
                    .with_target(cli.verbose >= 2),
            )
            .init(),
        LogFormat::Compact => registry
            .with(fmt::layer().compact().with_writer(io::stderr).with_ansi(ansi))
            .init(),
        LogFormat::Json => registry.with(fmt::layer().json().with_writer(io::stderr)).init(),
    }
}
