// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use diagnostics::*;
use pulse::query::{self, QueryRef};
use pulse::OutputFormat;

/// List the named query catalog.
pub fn queries_command(out: &mut impl Write) -> Result<()> {
    for named in query::catalog() {
        writeln!(out, "{:<34} {}", named.name, named.title)?;
    }
    Ok(())
}

/// Execute a catalog query by name.
pub fn query_command(
    store: &Path,
    name: &str,
    format: OutputFormat,
    csv_out: Option<&Path>,
    out: &mut impl Write,
) -> Result<()> {
    debug!("query_command called with name: {name}", name);
    run(store, QueryRef::Named(name), format, csv_out, out)
        .with_context(|| format!("Query {name} failed"))
}

/// Execute operator-supplied SQL against the store.
pub fn sql_command(
    store: &Path,
    sql: &str,
    format: OutputFormat,
    csv_out: Option<&Path>,
    out: &mut impl Write,
) -> Result<()> {
    debug!("sql_command called with sql: {sql}", sql);
    run(store, QueryRef::Sql(sql), format, csv_out, out).context("SQL query failed")
}

fn run(
    store: &Path,
    query: QueryRef<'_>,
    format: OutputFormat,
    csv_out: Option<&Path>,
    out: &mut impl Write,
) -> Result<()> {
    match csv_out {
        Some(path) => {
            let written = query::export_csv(store, query, path)?;
            writeln!(out, "Wrote {}", written.display())?;
        }
        None => query::render(store, query, format, out)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queries_lists_catalog() {
        let mut out = Vec::new();
        queries_command(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), query::catalog().len());
        assert!(text.contains("engagement_ratio"));
    }

    #[test]
    fn test_unknown_query() {
        let tmp = tempfile::tempdir().unwrap();
        let err = query_command(
            &tmp.path().join("none.duckdb"),
            "no_such_query",
            OutputFormat::Table,
            None,
            &mut Vec::new(),
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("Unknown query"));
    }
}
