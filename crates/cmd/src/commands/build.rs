// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use std::io::Write;

use anyhow::{Context, Result};
use pulse::{BuildReport, PulseConfig};

/// Run the ingestion and print one line per category.
///
/// Returns the report so the caller can decide the exit status.
pub fn build_command(config: &PulseConfig, out: &mut impl Write) -> Result<BuildReport> {
    let report = pulse::run(config).with_context(|| {
        format!(
            "Build into {} failed before any category ran",
            config.target_store.display()
        )
    })?;
    write_report(&report, out)?;
    Ok(report)
}

fn write_report(report: &BuildReport, out: &mut impl Write) -> Result<()> {
    writeln!(
        out,
        "{:<24} {:>7} {:>9} {:>8} {:>6}  {}",
        "table", "files", "rows", "skipped", "empty", "outcome"
    )?;
    for category in &report.categories {
        writeln!(
            out,
            "{:<24} {:>7} {:>9} {:>8} {:>6}  {}",
            category.table,
            category.files,
            category.rows,
            category.skipped,
            category.empty,
            category.outcome
        )?;
    }
    writeln!(out, "Total rows: {}", report.total_rows())?;
    Ok(())
}
