// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Fixed table schemas and row-to-Arrow conversion.
//!
//! Column names and order here are the contract the query layer relies on.

use crate::error::Result;
use crate::models::{InsuranceRow, MapUserRow, PathKey, TopTransactionRow, TransactionRow, UserRow};
use arrow_array::builder::{Float64Builder, Int32Builder, Int64Builder, StringBuilder};
use arrow_array::{ArrayRef, RecordBatch};
use arrow_schema::{DataType, Field, Schema, SchemaRef};
use diagnostics::*;
use std::sync::Arc;

/// A flat record type that materializes into one named table.
pub trait TableRow: Sized {
    /// Name of the table in the target store.
    const TABLE: &'static str;

    fn schema() -> SchemaRef;

    /// Assemble rows into one batch following [`TableRow::schema`].
    fn to_batch(rows: &[Self]) -> Result<RecordBatch>;
}

fn text(name: &str) -> Field {
    Field::new(name, DataType::Utf8, false)
}

fn integer(name: &str) -> Field {
    Field::new(name, DataType::Int32, false)
}

fn count(name: &str) -> Field {
    Field::new(name, DataType::Int64, true)
}

fn amount(name: &str) -> Field {
    Field::new(name, DataType::Float64, true)
}

/// Builders for the `state, year, quarter` prefix most tables share.
struct KeyColumns {
    state: StringBuilder,
    year: Int32Builder,
    quarter: Int32Builder,
}

impl KeyColumns {
    fn with_capacity(rows: usize) -> Self {
        Self {
            state: StringBuilder::with_capacity(rows, rows * 16),
            year: Int32Builder::with_capacity(rows),
            quarter: Int32Builder::with_capacity(rows),
        }
    }

    fn append(&mut self, key: &PathKey) {
        self.state.append_value(&key.state);
        self.year.append_value(key.year);
        self.quarter.append_value(key.quarter);
    }
}

fn finish(schema: SchemaRef, columns: Vec<ArrayRef>) -> Result<RecordBatch> {
    let batch = RecordBatch::try_new(schema, columns)?;
    let rows = batch.num_rows();
    let columns = batch.num_columns();
    debug!("Assembled batch with {rows} rows and {columns} columns", rows, columns);
    Ok(batch)
}

impl TableRow for TransactionRow {
    const TABLE: &'static str = "aggregated_transaction";

    fn schema() -> SchemaRef {
        Arc::new(Schema::new(vec![
            text("state"),
            integer("year"),
            integer("quarter"),
            text("category"),
            text("type"),
            count("count"),
            amount("amount"),
        ]))
    }

    fn to_batch(rows: &[Self]) -> Result<RecordBatch> {
        let mut key = KeyColumns::with_capacity(rows.len());
        let mut category = StringBuilder::new();
        let mut kind = StringBuilder::new();
        let mut counts = Int64Builder::with_capacity(rows.len());
        let mut amounts = Float64Builder::with_capacity(rows.len());

        for row in rows {
            key.append(&row.key);
            category.append_value(&row.category);
            kind.append_value(&row.instrument_type);
            counts.append_value(row.count);
            amounts.append_value(row.amount);
        }

        finish(
            Self::schema(),
            vec![
                Arc::new(key.state.finish()),
                Arc::new(key.year.finish()),
                Arc::new(key.quarter.finish()),
                Arc::new(category.finish()),
                Arc::new(kind.finish()),
                Arc::new(counts.finish()),
                Arc::new(amounts.finish()),
            ],
        )
    }
}

impl TableRow for InsuranceRow {
    const TABLE: &'static str = "aggregated_insurance";

    fn schema() -> SchemaRef {
        Arc::new(Schema::new(vec![
            text("state"),
            integer("year"),
            integer("quarter"),
            text("category"),
            count("count"),
            amount("amount"),
        ]))
    }

    fn to_batch(rows: &[Self]) -> Result<RecordBatch> {
        let mut key = KeyColumns::with_capacity(rows.len());
        let mut category = StringBuilder::new();
        let mut counts = Int64Builder::with_capacity(rows.len());
        let mut amounts = Float64Builder::with_capacity(rows.len());

        for row in rows {
            key.append(&row.key);
            category.append_value(&row.category);
            counts.append_value(row.count);
            amounts.append_value(row.amount);
        }

        finish(
            Self::schema(),
            vec![
                Arc::new(key.state.finish()),
                Arc::new(key.year.finish()),
                Arc::new(key.quarter.finish()),
                Arc::new(category.finish()),
                Arc::new(counts.finish()),
                Arc::new(amounts.finish()),
            ],
        )
    }
}

impl TableRow for UserRow {
    const TABLE: &'static str = "aggregated_user";

    fn schema() -> SchemaRef {
        Arc::new(Schema::new(vec![
            text("state"),
            integer("year"),
            integer("quarter"),
            text("brand"),
            count("count"),
            amount("percentage"),
            count("registeredUsers"),
            count("appOpens"),
        ]))
    }

    fn to_batch(rows: &[Self]) -> Result<RecordBatch> {
        let mut key = KeyColumns::with_capacity(rows.len());
        let mut brand = StringBuilder::new();
        let mut counts = Int64Builder::with_capacity(rows.len());
        let mut percentage = Float64Builder::with_capacity(rows.len());
        let mut registered = Int64Builder::with_capacity(rows.len());
        let mut opens = Int64Builder::with_capacity(rows.len());

        for row in rows {
            key.append(&row.key);
            brand.append_value(&row.brand);
            counts.append_option(row.count);
            percentage.append_option(row.percentage);
            registered.append_option(row.registered_users);
            opens.append_option(row.app_opens);
        }

        finish(
            Self::schema(),
            vec![
                Arc::new(key.state.finish()),
                Arc::new(key.year.finish()),
                Arc::new(key.quarter.finish()),
                Arc::new(brand.finish()),
                Arc::new(counts.finish()),
                Arc::new(percentage.finish()),
                Arc::new(registered.finish()),
                Arc::new(opens.finish()),
            ],
        )
    }
}

impl TableRow for TopTransactionRow {
    const TABLE: &'static str = "top_transaction";

    fn schema() -> SchemaRef {
        Arc::new(Schema::new(vec![
            text("state"),
            text("level"),
            text("entityName"),
            integer("year"),
            integer("quarter"),
            amount("amount"),
            count("count"),
        ]))
    }

    fn to_batch(rows: &[Self]) -> Result<RecordBatch> {
        let mut key = KeyColumns::with_capacity(rows.len());
        let mut level = StringBuilder::new();
        let mut entity = StringBuilder::new();
        let mut amounts = Float64Builder::with_capacity(rows.len());
        let mut counts = Int64Builder::with_capacity(rows.len());

        for row in rows {
            key.append(&row.key);
            level.append_value(&row.level);
            entity.append_value(&row.entity_name);
            amounts.append_value(row.amount);
            counts.append_value(row.count);
        }

        // Leaderboard order: state, level, entity before the time columns.
        finish(
            Self::schema(),
            vec![
                Arc::new(key.state.finish()),
                Arc::new(level.finish()),
                Arc::new(entity.finish()),
                Arc::new(key.year.finish()),
                Arc::new(key.quarter.finish()),
                Arc::new(amounts.finish()),
                Arc::new(counts.finish()),
            ],
        )
    }
}

impl TableRow for MapUserRow {
    const TABLE: &'static str = "map_user";

    fn schema() -> SchemaRef {
        Arc::new(Schema::new(vec![
            text("state"),
            text("district"),
            integer("year"),
            integer("quarter"),
            count("registeredUsers"),
            count("appOpens"),
        ]))
    }

    fn to_batch(rows: &[Self]) -> Result<RecordBatch> {
        let mut key = KeyColumns::with_capacity(rows.len());
        let mut district = StringBuilder::new();
        let mut registered = Int64Builder::with_capacity(rows.len());
        let mut opens = Int64Builder::with_capacity(rows.len());

        for row in rows {
            key.append(&row.key);
            district.append_value(&row.district);
            registered.append_value(row.registered_users);
            opens.append_value(row.app_opens);
        }

        finish(
            Self::schema(),
            vec![
                Arc::new(key.state.finish()),
                Arc::new(district.finish()),
                Arc::new(key.year.finish()),
                Arc::new(key.quarter.finish()),
                Arc::new(registered.finish()),
                Arc::new(opens.finish()),
            ],
        )
    }
}
