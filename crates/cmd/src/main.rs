// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use pulse::Category;

use cmd::commands::*;
use cmd::common::{FormatChoice, StoreArgs, resolve_build_config, resolve_store};

/// Pulse loads quarterly payments JSON into DuckDB tables and runs the
/// standard aggregate queries over them.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "pulse")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    store: StoreArgs,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write an example configuration file
    Init {
        #[arg(default_value = "pulse.yaml")]
        config_path: PathBuf,
    },

    /// Walk the source tree and replace every category table
    Build {
        /// Dataset root, overriding the configuration
        #[arg(long)]
        source: Option<PathBuf>,

        /// Build only these categories (repeatable)
        #[arg(long, value_parser = parse_category, num_args = 1..)]
        only: Vec<Category>,

        /// Extraction threads, overriding the configuration
        #[arg(long)]
        workers: Option<usize>,
    },

    /// List the named queries
    Queries,

    /// Run a named query
    Query {
        name: String,

        #[arg(short, long, value_enum, default_value_t)]
        format: FormatChoice,

        /// Write the result to this CSV file instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Run ad hoc SQL against the store
    Sql {
        sql: String,

        #[arg(short, long, value_enum, default_value_t)]
        format: FormatChoice,

        /// Write the result to this CSV file instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Row counts of the materialized tables
    Tables,

    /// Stored state slugs with their display names
    States,
}

fn parse_category(s: &str) -> Result<Category, String> {
    s.parse::<Category>().map_err(|e| e.to_string())
}

fn main() -> ExitCode {
    diagnostics::init_diagnostics();

    match main_result() {
        Ok(code) => code,
        Err(err) => {
            let _ = writeln!(std::io::stderr().lock(), "Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn main_result() -> Result<ExitCode> {
    let cli = Cli::parse();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Init { config_path } => init_command(&config_path, &mut out)?,
        Commands::Build {
            source,
            only,
            workers,
        } => {
            let config = resolve_build_config(&cli.store, source, &only, workers)?;
            let report = build_command(&config, &mut out)?;
            if report.all_failed() {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Queries => queries_command(&mut out)?,
        Commands::Query { name, format, out: csv } => {
            let store = resolve_store(&cli.store)?;
            query_command(&store, &name, format.into(), csv.as_deref(), &mut out)?;
        }
        Commands::Sql { sql, format, out: csv } => {
            let store = resolve_store(&cli.store)?;
            sql_command(&store, &sql, format.into(), csv.as_deref(), &mut out)?;
        }
        Commands::Tables => tables_command(&resolve_store(&cli.store)?, &mut out)?,
        Commands::States => states_command(&resolve_store(&cli.store)?, &mut out)?,
    }

    Ok(ExitCode::SUCCESS)
}
