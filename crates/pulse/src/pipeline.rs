// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Batch ingestion: walk, extract in parallel, materialize per category.
//!
//! Categories are independent. A failure in one (missing folder, store
//! error) is recorded in its report and the next category still runs.

use crate::config::{PulseConfig, validate_config};
use crate::error::{PulseError, Result};
use crate::extract::{
    Extracted, Extractor, InsuranceExtractor, MapUserExtractor, TopTransactionExtractor,
    TransactionExtractor, UserExtractor,
};
use crate::materialize::{Materialized, Materializer};
use crate::models::Category;
use crate::store::Store;
use crate::walker::{SourceFile, walk_category};
use diagnostics::*;
use rayon::ThreadPool;
use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use serde_json::Value;
use std::fmt;

/// Final state of one category's table after a build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Committed,
    /// Zero rows were extracted; the previous table was left in place.
    KeptPrevious,
    Failed(String),
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Committed => f.write_str("committed"),
            Outcome::KeptPrevious => f.write_str("kept previous"),
            Outcome::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

/// Per-category counters reported at the end of a build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryReport {
    pub category: Category,
    pub table: &'static str,
    /// Files seen by the walker, including ones later skipped.
    pub files: usize,
    pub rows: usize,
    /// Malformed paths and unparseable documents.
    pub skipped: usize,
    /// Documents without a `data` object.
    pub empty: usize,
    pub outcome: Outcome,
}

impl CategoryReport {
    fn new(category: Category) -> Self {
        Self {
            category,
            table: category.table_name(),
            files: 0,
            rows: 0,
            skipped: 0,
            empty: 0,
            outcome: Outcome::Committed,
        }
    }

    pub fn failed(&self) -> bool {
        matches!(self.outcome, Outcome::Failed(_))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub categories: Vec<CategoryReport>,
}

impl BuildReport {
    /// True when every requested category failed (and at least one was requested).
    pub fn all_failed(&self) -> bool {
        !self.categories.is_empty() && self.categories.iter().all(CategoryReport::failed)
    }

    pub fn total_rows(&self) -> usize {
        self.categories.iter().map(|c| c.rows).sum()
    }

    pub fn get(&self, category: Category) -> Option<&CategoryReport> {
        self.categories.iter().find(|c| c.category == category)
    }
}

enum FileOutcome<R> {
    Rows(Vec<R>),
    Empty,
    Skipped,
}

/// Run a full build as described by `config`.
///
/// Only setup problems (invalid configuration, unopenable store, thread
/// pool) are returned as errors; category failures land in the report.
pub fn run(config: &PulseConfig) -> Result<BuildReport> {
    validate_config(config)?;

    let workers = config.workers();
    let pool = ThreadPoolBuilder::new().num_threads(workers).build()?;
    let mut store = Store::open(&config.target_store)?;
    let mut materializer =
        Materializer::new(&mut store).with_parquet_dir(config.parquet_dir.clone());

    let source = config.source_root.display().to_string();
    info!("Building from {source} with {workers} workers", source, workers);

    let mut report = BuildReport::default();
    for category in config.categories() {
        let outcome = match category {
            Category::Transaction => ingest(&TransactionExtractor, config, &pool, &mut materializer),
            Category::User => ingest(&UserExtractor, config, &pool, &mut materializer),
            Category::Insurance => ingest(&InsuranceExtractor, config, &pool, &mut materializer),
            Category::TopTransaction => {
                ingest(&TopTransactionExtractor, config, &pool, &mut materializer)
            }
            Category::MapUser => ingest(&MapUserExtractor, config, &pool, &mut materializer),
        };

        let name = category.name();
        let summary = match outcome {
            Ok(summary) => summary,
            Err((mut summary, err)) => {
                let reason = err.to_string();
                error!("Category {name} failed: {reason}", name, reason);
                summary.outcome = Outcome::Failed(reason);
                summary
            }
        };

        let rows = summary.rows;
        let skipped = summary.skipped;
        let empty = summary.empty;
        info!(
            "Category {name}: {rows} rows, {skipped} skipped, {empty} empty",
            name,
            rows,
            skipped,
            empty
        );
        report.categories.push(summary);
    }

    Ok(report)
}

/// Walk, extract and materialize one category.
///
/// On failure the counters gathered so far are returned with the error.
fn ingest<E: Extractor>(
    extractor: &E,
    config: &PulseConfig,
    pool: &ThreadPool,
    materializer: &mut Materializer<'_>,
) -> std::result::Result<CategoryReport, (CategoryReport, PulseError)> {
    let mut report = CategoryReport::new(extractor.category());

    let walker = match walk_category(&config.source_root, extractor.category()) {
        Ok(walker) => walker,
        Err(err) => return Err((report, err)),
    };

    let mut sources = Vec::new();
    for item in walker {
        report.files += 1;
        match item {
            Ok(source) => sources.push(source),
            Err(err) => {
                report.skipped += 1;
                let err = err.to_string();
                warn!("Skipping file: {err}", err: err.as_str());
            }
        }
    }

    let outcomes: Vec<FileOutcome<E::Row>> = pool.install(|| {
        sources
            .par_iter()
            .map(|source| process_file(extractor, source))
            .collect()
    });

    let mut rows = Vec::new();
    for outcome in outcomes {
        match outcome {
            FileOutcome::Rows(mut extracted) => rows.append(&mut extracted),
            FileOutcome::Empty => report.empty += 1,
            FileOutcome::Skipped => report.skipped += 1,
        }
    }
    report.rows = rows.len();

    match materializer.materialize(&rows) {
        Ok(Materialized::Committed { .. }) => report.outcome = Outcome::Committed,
        Ok(Materialized::KeptPrevious { .. }) => report.outcome = Outcome::KeptPrevious,
        Err(err) => return Err((report, err)),
    }
    Ok(report)
}

fn process_file<E: Extractor>(extractor: &E, source: &SourceFile) -> FileOutcome<E::Row> {
    match read_and_extract(extractor, source) {
        Ok(Extracted::Rows(rows)) => FileOutcome::Rows(rows),
        Ok(Extracted::NoData) => {
            let shown = source.path.display().to_string();
            debug!("No data in {shown}", shown);
            FileOutcome::Empty
        }
        Err(err) => {
            let err = err.to_string();
            warn!("Skipping file: {err}", err: err.as_str());
            FileOutcome::Skipped
        }
    }
}

fn read_and_extract<E: Extractor>(
    extractor: &E,
    source: &SourceFile,
) -> Result<Extracted<E::Row>> {
    let bytes = std::fs::read(&source.path).map_err(|e| PulseError::io(&source.path, e))?;
    let document: Value = serde_json::from_slice(&bytes)
        .map_err(|e| PulseError::document_parse(&source.path, e.to_string()))?;
    extractor.extract_document(&document, &source.key, &source.path)
}
