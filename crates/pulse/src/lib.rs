// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! ETL over PhonePe Pulse style quarterly JSON documents.
//!
//! Source documents live at `<category folder>/<state>/<year>/<quarter>.json`.
//! A build walks each category folder, extracts flat rows from every
//! document, and replaces one DuckDB table per category. The [`query`]
//! module reads those tables through a catalog of named aggregates.

pub mod config;
pub mod error;
pub mod extract;
pub mod geo;
pub mod materialize;
pub mod models;
pub mod pipeline;
pub mod query;
pub mod snapshot;
pub mod store;
pub mod table;
pub mod walker;

pub use config::{PulseConfig, create_example_config, load_config};
pub use error::{PulseError, Result};
pub use extract::{Extracted, Extractor};
pub use models::{Category, PathKey};
pub use pipeline::{BuildReport, CategoryReport, Outcome, run};
pub use query::{NamedQuery, OutputFormat, QueryRef};
pub use store::Store;
pub use table::TableRow;
