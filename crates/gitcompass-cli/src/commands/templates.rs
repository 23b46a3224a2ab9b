//! Templates command implementation.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, Parser, Subcommand, ValueHint};
use gitcompass_templates::{
    parse, CreateOptions, LocationKind, Template, TemplateBody, TemplateCategory,
    TemplateError, TemplateFormat, Values,
};
use serde_json::Value;
use tracing::{debug, warn};

use crate::cli::CommandContext;
use crate::error::CliError;
use crate::output::{print_body, print_output, LocationOutput, StatusOutput, TemplateListOutput};

/// Manage issue, project and roadmap templates
#[derive(Debug, Parser)]
pub struct TemplatesCommand {
    #[command(subcommand)]
    pub action: TemplatesAction,
}

#[derive(Debug, Subcommand)]
pub enum TemplatesAction {
    /// List available templates
    #[command(visible_alias = "ls")]
    List {
        /// Only list templates of this type
        #[arg(short = 't', long = "type")]
        category: Option<TemplateCategory>,
    },

    /// Show a raw template
    Show {
        /// Template name
        name: String,

        /// Template type (issue, project, roadmap or a custom type)
        category: TemplateCategory,

        /// Print as yaml or json
        #[arg(long = "as", id = "as_format")]
        format: Option<TemplateFormat>,

        /// Print where the template was found instead of its content
        #[arg(long)]
        path: bool,
    },

    /// Resolve a template with values and overrides
    Apply {
        name: String,

        category: TemplateCategory,

        #[command(flatten)]
        inputs: ResolveInputs,

        /// Print as yaml or json
        #[arg(long = "as", id = "as_format")]
        format: Option<TemplateFormat>,
    },

    /// Create a new template
    Create {
        name: String,

        category: TemplateCategory,

        /// Import the template content from a YAML or JSON file
        #[arg(long, value_hint = ValueHint::FilePath)]
        from_file: Option<PathBuf>,

        /// Description stored in the template
        #[arg(short, long)]
        description: Option<String>,

        /// Write to the user-global templates instead of the project
        #[arg(short, long)]
        global: bool,

        /// Overwrite an existing template
        #[arg(short, long)]
        force: bool,

        /// File format of the new template
        #[arg(long = "as", id = "as_format")]
        format: Option<TemplateFormat>,
    },

    /// Write a resolved template to a file
    Export {
        name: String,

        category: TemplateCategory,

        /// Destination file; `.json` writes JSON, anything else YAML
        #[arg(value_hint = ValueHint::FilePath)]
        output: PathBuf,

        #[command(flatten)]
        inputs: ResolveInputs,
    },
}

/// Values and overrides shared by `apply` and `export`.
#[derive(Debug, Default, Args)]
pub struct ResolveInputs {
    /// Placeholder values as a JSON object or a YAML/JSON file
    #[arg(long)]
    pub values: Option<String>,

    /// Single placeholder value, repeatable
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub set: Vec<(String, String)>,

    /// Overrides merged onto the template, as a JSON object or a YAML/JSON file
    #[arg(long)]
    pub overrides: Option<String>,
}

impl ResolveInputs {
    /// `--values` first, then each `--set` in order.
    pub fn values(&self) -> Result<Values, CliError> {
        let mut values = match &self.values {
            Some(raw) => Values::from_json(&read_mapping("--values", raw)?),
            None => Values::new(),
        };
        for (key, value) in &self.set {
            values.set(key.clone(), value.clone());
        }
        Ok(values)
    }

    pub fn overrides(&self) -> Result<TemplateBody, CliError> {
        match &self.overrides {
            Some(raw) => read_mapping("--overrides", raw),
            None => Ok(TemplateBody::new()),
        }
    }
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim().to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{raw}'")),
    }
}

/// Accept either an existing YAML/JSON file or an inline JSON object.
fn read_mapping(flag: &str, raw: &str) -> Result<TemplateBody, CliError> {
    let path = Path::new(raw);
    if path.is_file() {
        debug!(flag, path = %path.display(), "reading mapping from file");
        return Ok(parse(path)?);
    }

    match serde_json::from_str::<Value>(raw)? {
        Value::Object(map) => Ok(map),
        _ => Err(CliError::validation(format!("{flag} must be a JSON object or a file path"))),
    }
}

impl TemplatesCommand {
    pub fn execute(&self, ctx: &CommandContext) -> Result<(), CliError> {
        match &self.action {
            TemplatesAction::List { category } => list(ctx, category.as_ref()),
            TemplatesAction::Show {
                name,
                category,
                format,
                path,
            } => show(ctx, category, name, *format, *path),
            TemplatesAction::Apply {
                name,
                category,
                inputs,
                format,
            } => apply(ctx, category, name, inputs, *format),
            TemplatesAction::Create {
                name,
                category,
                from_file,
                description,
                global,
                force,
                format,
            } => {
                let location = if *global {
                    LocationKind::UserGlobal
                } else {
                    LocationKind::ProjectLocal
                };
                let mut options = CreateOptions::new(format.unwrap_or_else(|| ctx.file_format())).overwrite(*force);
                if let Some(description) = description {
                    options = options.with_description(description.clone());
                }
                create(ctx, category, name, from_file.as_deref(), location, &options)
            }
            TemplatesAction::Export {
                name,
                category,
                output,
                inputs,
            } => export(ctx, category, name, output, inputs),
        }
    }
}

fn list(ctx: &CommandContext, category: Option<&TemplateCategory>) -> Result<(), CliError> {
    let templates: BTreeMap<String, Vec<String>> = match category {
        Some(category) => BTreeMap::from([(category.to_string(), ctx.store.list(category))]),
        None => ctx
            .store
            .list_all()
            .into_iter()
            .map(|(category, names)| (category.to_string(), names))
            .collect(),
    };

    print_output(ctx, &TemplateListOutput { templates })
}

fn show(
    ctx: &CommandContext,
    category: &TemplateCategory,
    name: &str,
    format: Option<TemplateFormat>,
    path_only: bool,
) -> Result<(), CliError> {
    if path_only {
        let located = ctx.store.locate(category, name).map_err(|e| not_found(ctx, category, e))?;
        return print_output(ctx, &LocationOutput::from(&located));
    }

    let template = ctx.store.load(category, name).map_err(|e| not_found(ctx, category, e))?;
    print_body(&template.body, format.unwrap_or_else(|| ctx.print_format()))
}

fn apply(
    ctx: &CommandContext,
    category: &TemplateCategory,
    name: &str,
    inputs: &ResolveInputs,
    format: Option<TemplateFormat>,
) -> Result<(), CliError> {
    let resolved = resolve(ctx, category, name, inputs)?;
    print_body(&resolved, format.unwrap_or_else(|| ctx.print_format()))
}

fn create(
    ctx: &CommandContext,
    category: &TemplateCategory,
    name: &str,
    from_file: Option<&Path>,
    location: LocationKind,
    options: &CreateOptions,
) -> Result<(), CliError> {
    let path = match from_file {
        Some(source) => ctx.store.import(source, category, name, location, options)?,
        None => {
            let mut body = TemplateBody::new();
            body.insert("name".to_string(), Value::String(name.to_string()));
            ctx.store.create(category, name, body, location, options)?
        }
    };

    print_output(
        ctx,
        &StatusOutput::success(format!("Created {category} template '{name}' ({location})")).with_path(path),
    )
}

fn export(
    ctx: &CommandContext,
    category: &TemplateCategory,
    name: &str,
    output: &Path,
    inputs: &ResolveInputs,
) -> Result<(), CliError> {
    let template = load_or_fallback(ctx, category, name)?;
    let values = inputs.values()?;
    let overrides = inputs.overrides()?;
    warn_unresolved(&template, &values, &overrides);

    ctx.store.export(category, &template.name, output, &values, &overrides)?;

    print_output(
        ctx,
        &StatusOutput::success(format!("Exported {category} template '{}'", template.name)).with_path(output),
    )
}

fn resolve(
    ctx: &CommandContext,
    category: &TemplateCategory,
    name: &str,
    inputs: &ResolveInputs,
) -> Result<TemplateBody, CliError> {
    let template = load_or_fallback(ctx, category, name)?;
    let values = inputs.values()?;
    let overrides = inputs.overrides()?;
    warn_unresolved(&template, &values, &overrides);

    Ok(template.resolve(&values, &overrides))
}

/// Load `name`, or the configured fallback for the category when it is missing.
fn load_or_fallback(ctx: &CommandContext, category: &TemplateCategory, name: &str) -> Result<Arc<Template>, CliError> {
    match ctx.store.load(category, name) {
        Ok(template) => Ok(template),
        Err(err) if err.is_not_found() => {
            let fallback = ctx
                .config
                .templates
                .fallback_for(category.as_str())
                .filter(|fallback| *fallback != name);

            match fallback {
                Some(fallback) => {
                    warn!("{category} template '{name}' not found, using fallback '{fallback}'");
                    ctx.store.load(category, fallback).map_err(|e| not_found(ctx, category, e))
                }
                None => Err(not_found(ctx, category, err)),
            }
        }
        Err(err) => Err(err.into()),
    }
}

fn warn_unresolved(template: &Template, values: &Values, overrides: &TemplateBody) {
    let missing = template.unresolved(values, overrides);
    if !missing.is_empty() {
        warn!(
            "unresolved placeholders in {} template '{}': {}",
            template.category,
            template.name,
            missing.join(", ")
        );
    }
}

/// Convert a store error, listing the category's templates when it is a miss.
fn not_found(ctx: &CommandContext, category: &TemplateCategory, err: TemplateError) -> CliError {
    let suggestions = if err.is_not_found() {
        ctx.store.list(category)
    } else {
        Vec::new()
    };
    CliError::from(err).with_suggestions(suggestions)
}
