// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use std::io::Write;
use std::path::Path;

use anyhow::Result;

/// Print the row count of every category table.
pub fn tables_command(store: &Path, out: &mut impl Write) -> Result<()> {
    for (table, rows) in pulse::query::table_counts(store)? {
        match rows {
            Some(rows) => writeln!(out, "{table:<24} {rows:>9}")?,
            None => writeln!(out, "{table:<24} {:>9}", "-")?,
        }
    }
    Ok(())
}
