// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use diagnostics::*;

/// Write an example configuration file for a new build.
pub fn init_command(config_path: &Path, out: &mut impl Write) -> Result<()> {
    pulse::create_example_config(config_path).with_context(|| {
        format!(
            "Failed to create configuration file: {}",
            config_path.display()
        )
    })?;

    let shown = config_path.display().to_string();
    info!("Created example configuration file: {shown}", shown);

    writeln!(out, "Created example configuration file: {shown}")?;
    writeln!(out)?;
    writeln!(out, "Edit the configuration file before building:")?;
    writeln!(out, "  - source_root: checkout of the pulse dataset (holds aggregated/, top/, map/)")?;
    writeln!(out, "  - target_store: DuckDB file that receives the tables")?;
    writeln!(out, "  - parquet_dir: optional folder for Parquet snapshots")?;
    writeln!(out)?;
    writeln!(out, "Then run: pulse build -c {shown}")?;
    Ok(())
}
