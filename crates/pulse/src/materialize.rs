// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Commit one category's rows as a table, with empty-input protection.

use crate::error::Result;
use crate::snapshot;
use crate::store::Store;
use crate::table::TableRow;
use diagnostics::*;
use std::path::PathBuf;

/// What happened to the target table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Materialized {
    /// The table now holds exactly `rows` rows.
    Committed { rows: usize },
    /// No input rows; the table was left as it was (`None` if it never existed).
    KeptPrevious { existing: Option<u64> },
}

pub struct Materializer<'a> {
    store: &'a mut Store,
    parquet_dir: Option<PathBuf>,
}

impl<'a> Materializer<'a> {
    pub fn new(store: &'a mut Store) -> Self {
        Self {
            store,
            parquet_dir: None,
        }
    }

    /// Also publish `<dir>/<table>.parquet` for every committed table.
    pub fn with_parquet_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.parquet_dir = dir;
        self
    }

    /// Replace table `R::TABLE` with `rows`.
    ///
    /// An empty slice never truncates an existing table.
    pub fn materialize<R: TableRow>(&mut self, rows: &[R]) -> Result<Materialized> {
        let table = R::TABLE;

        if rows.is_empty() {
            let existing = self.store.row_count(table)?;
            let kept = existing.map(|n| n.to_string()).unwrap_or_else(|| "none".to_string());
            warn!(
                "No records for {table}; keeping previous table (rows: {kept})",
                table,
                kept
            );
            return Ok(Materialized::KeptPrevious { existing });
        }

        let batch = R::to_batch(rows)?;

        let staged = match &self.parquet_dir {
            Some(dir) => Some(snapshot::stage(dir, table, &batch)?),
            None => None,
        };

        let written = match self.store.replace_table(table, &batch) {
            Ok(written) => written,
            Err(err) => {
                if let Some(staged) = staged {
                    staged.discard();
                }
                return Err(err);
            }
        };

        // The table is committed at this point; a snapshot failure does not undo it.
        if let Some(staged) = staged {
            if let Err(err) = staged.publish() {
                let err = err.to_string();
                error!("Committed {table} but its snapshot failed: {err}", table, err: err.as_str());
            }
        }

        info!("Committed {table} with {written} rows", table, written);
        Ok(Materialized::Committed { rows: written })
    }
}
