//! CLI-side configuration resolution.
//!
//! Loads the shared config file (or the one named by `--config`), then
//! layers the global flags on top.

use std::path::PathBuf;
use std::time::Duration;

use clap::ValueEnum;

use shoremap_config::Config;
use shoremap_core::{AppConfig, RecipeTable};

use crate::cli::{ColorMode, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

/// Everything a command needs after flags and file are merged.
pub struct Resolved {
    pub config: Config,
    pub app: AppConfig,
    pub recipes: RecipeTable,
    pub format: OutputFormat,
    pub color: bool,
    pub quiet: bool,
}

/// Config file in effect: `--config` or the platform default.
pub fn config_path(global: &GlobalOpts) -> PathBuf {
    global
        .config
        .clone()
        .unwrap_or_else(shoremap_config::config_path)
}

/// Load the file at [`config_path`] layered under the environment.
pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    Ok(shoremap_config::load_config_from(&config_path(global))?)
}

/// Load, apply flag overrides and validate.
pub fn resolve(global: &GlobalOpts) -> Result<Resolved, CliError> {
    let mut config = load(global)?;
    if let Some(ref url) = global.api_url {
        config.api.url.clone_from(url);
    }
    if let Some(secs) = global.timeout {
        config.api.timeout = Duration::from_secs(secs);
    }

    let app = config.to_app_config()?;
    let recipes = config.recipe_table();
    let format = output_format(global, &config)?;
    let color = output::should_color(color_mode(global, &config)?);
    Ok(Resolved {
        config,
        app,
        recipes,
        format,
        color,
        quiet: global.quiet,
    })
}

/// `--output`, else `defaults.output`.
pub fn output_format(global: &GlobalOpts, config: &Config) -> Result<OutputFormat, CliError> {
    match global.output {
        Some(format) => Ok(format),
        None => parse_default("defaults.output", &config.defaults.output),
    }
}

/// `--color`, else `defaults.color`.
pub fn color_mode(global: &GlobalOpts, config: &Config) -> Result<ColorMode, CliError> {
    match global.color {
        Some(mode) => Ok(mode),
        None => parse_default("defaults.color", &config.defaults.color),
    }
}

fn parse_default<T: ValueEnum>(field: &str, value: &str) -> Result<T, CliError> {
    T::from_str(value, true).map_err(|reason| CliError::Validation {
        field: field.into(),
        reason,
    })
}
