// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use clap::{Args, ValueEnum};
use pulse::{Category, OutputFormat, PulseConfig, load_config};

/// Environment variable naming the default configuration file.
pub const CONFIG_ENV: &str = "PULSE_CONFIG";

/// Configuration file plus a store override, shared by the read-only commands.
#[derive(Args, Debug, Clone, Default)]
pub struct StoreArgs {
    /// YAML configuration file (defaults to $PULSE_CONFIG)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// DuckDB store file, overriding the configuration
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,
}

/// Result format for query commands
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum FormatChoice {
    #[default]
    Table,
    Csv,
    Count,
}

impl From<FormatChoice> for OutputFormat {
    fn from(choice: FormatChoice) -> Self {
        match choice {
            FormatChoice::Table => OutputFormat::Table,
            FormatChoice::Csv => OutputFormat::Csv,
            FormatChoice::Count => OutputFormat::Count,
        }
    }
}

/// Get the config path with an optional override, falling back to PULSE_CONFIG
pub fn config_path_with_override(override_path: Option<&Path>) -> Option<PathBuf> {
    override_path
        .map(Path::to_path_buf)
        .or_else(|| env::var(CONFIG_ENV).ok().map(PathBuf::from))
}

pub fn load_optional_config(path: Option<&Path>) -> Result<Option<PulseConfig>> {
    match config_path_with_override(path) {
        Some(path) => {
            let config = load_config(&path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?;
            Ok(Some(config))
        }
        None => Ok(None),
    }
}

/// Resolve the store to query: `--store` wins, then the configuration.
pub fn resolve_store(args: &StoreArgs) -> Result<PathBuf> {
    if let Some(store) = &args.store {
        return Ok(store.clone());
    }
    load_optional_config(args.config.as_deref())?
        .map(|config| config.target_store)
        .ok_or_else(|| anyhow!("No store given: pass --store or a configuration file"))
}

/// Merge command-line overrides into the (optional) configuration file.
pub fn resolve_build_config(
    args: &StoreArgs,
    source: Option<PathBuf>,
    only: &[Category],
    workers: Option<usize>,
) -> Result<PulseConfig> {
    let base = load_optional_config(args.config.as_deref())?;

    let mut config = match (base, source, args.store.clone()) {
        (Some(mut config), source, store) => {
            if let Some(source) = source {
                config.source_root = source;
            }
            if let Some(store) = store {
                config.target_store = store;
            }
            config
        }
        (None, Some(source), Some(store)) => PulseConfig::new(source, store),
        (None, _, _) => {
            return Err(anyhow!(
                "Without a configuration file both --source and --store are required"
            ));
        }
    };

    if !only.is_empty() {
        config.categories = Some(only.to_vec());
    }
    if workers.is_some() {
        config.workers = workers;
    }
    Ok(config)
}
