// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Schema-specific extractors.
//!
//! Each dataset category has its own nested JSON layout under the top-level
//! `data` object. An [`Extractor`] turns that object plus the path key into
//! flat rows. Defaults for missing keys:
//!
//! - absent or `null` lists and objects contribute zero rows
//! - missing counts and amounts become `0`
//! - missing names become [`UNKNOWN_NAME`]
//! - list elements that are not objects are ignored
//!
//! A value of the wrong JSON type where a list or object is expected is a
//! [`PulseError::DocumentParse`] for the whole file.

use crate::error::{PulseError, Result};
use crate::models::{
    Category, InsuranceRow, MapUserRow, PathKey, TOTAL_INSTRUMENT, TopTransactionRow,
    TransactionRow, UNKNOWN_NAME, UserRow,
};
use crate::table::TableRow;
use serde_json::{Map, Value};
use std::path::Path;

/// Leaderboard lists in a top-transaction document, in output order.
const TOP_LEVELS: [&str; 2] = ["districts", "pincodes"];

/// Result of extracting one document.
#[derive(Debug, Clone, PartialEq)]
pub enum Extracted<R> {
    /// The document had a `data` object; rows may still be empty.
    Rows(Vec<R>),
    /// The document has no `data` key, or `data` is null.
    NoData,
}

/// Capability shared by every category: document + path key -> rows.
pub trait Extractor: Sync {
    type Row: TableRow + Send;

    fn category(&self) -> Category;

    /// Extract rows from the `data` object of one document.
    fn extract(&self, data: &Map<String, Value>, key: &PathKey, path: &Path)
    -> Result<Vec<Self::Row>>;

    /// Validate the document envelope and extract its rows.
    fn extract_document(
        &self,
        document: &Value,
        key: &PathKey,
        path: &Path,
    ) -> Result<Extracted<Self::Row>> {
        let Some(top) = document.as_object() else {
            return Err(PulseError::document_parse(
                path,
                format!("top-level value is {}, expected an object", kind(document)),
            ));
        };

        match top.get("data") {
            None | Some(Value::Null) => Ok(Extracted::NoData),
            Some(Value::Object(data)) => Ok(Extracted::Rows(self.extract(data, key, path)?)),
            Some(other) => Err(PulseError::document_parse(
                path,
                format!("'data' is {}, expected an object", kind(other)),
            )),
        }
    }
}

/// `data.transactionData[].paymentInstruments[]`, one row per instrument.
#[derive(Debug, Default, Clone, Copy)]
pub struct TransactionExtractor;

impl Extractor for TransactionExtractor {
    type Row = TransactionRow;

    fn category(&self) -> Category {
        Category::Transaction
    }

    fn extract(&self, data: &Map<String, Value>, key: &PathKey, path: &Path) -> Result<Vec<TransactionRow>> {
        let mut rows = Vec::new();
        for entry in objects(list_field(data, "transactionData", path)?) {
            let category = text_field(entry, "name");
            for instrument in objects(list_field(entry, "paymentInstruments", path)?) {
                rows.push(TransactionRow {
                    key: key.clone(),
                    category: category.clone(),
                    instrument_type: text_field(instrument, "type"),
                    count: count_field(instrument, "count"),
                    amount: amount_field(instrument, "amount"),
                });
            }
        }
        Ok(rows)
    }
}

/// Same traversal as transactions, keeping only the TOTAL instrument.
#[derive(Debug, Default, Clone, Copy)]
pub struct InsuranceExtractor;

impl Extractor for InsuranceExtractor {
    type Row = InsuranceRow;

    fn category(&self) -> Category {
        Category::Insurance
    }

    fn extract(&self, data: &Map<String, Value>, key: &PathKey, path: &Path) -> Result<Vec<InsuranceRow>> {
        let mut rows = Vec::new();
        for entry in objects(list_field(data, "transactionData", path)?) {
            let total = objects(list_field(entry, "paymentInstruments", path)?)
                .find(|i| i.get("type").and_then(Value::as_str) == Some(TOTAL_INSTRUMENT));

            if let Some(total) = total {
                rows.push(InsuranceRow {
                    key: key.clone(),
                    category: text_field(entry, "name"),
                    count: count_field(total, "count"),
                    amount: amount_field(total, "amount"),
                });
            }
        }
        Ok(rows)
    }
}

/// Device rows from `data.usersByDevice` plus one totals row from
/// `data.aggregated`. The two halves are independent.
#[derive(Debug, Default, Clone, Copy)]
pub struct UserExtractor;

impl Extractor for UserExtractor {
    type Row = UserRow;

    fn category(&self) -> Category {
        Category::User
    }

    fn extract(&self, data: &Map<String, Value>, key: &PathKey, path: &Path) -> Result<Vec<UserRow>> {
        let mut rows: Vec<UserRow> = objects(list_field(data, "usersByDevice", path)?)
            .map(|device| {
                UserRow::device(
                    key.clone(),
                    text_field(device, "brand"),
                    count_field(device, "count"),
                    amount_field(device, "percentage"),
                )
            })
            .collect();

        if let Some(aggregated) = object_field(data, "aggregated", path)? {
            rows.push(UserRow::totals(
                key.clone(),
                count_field(aggregated, "registeredUsers"),
                count_field(aggregated, "appOpens"),
            ));
        }
        Ok(rows)
    }
}

/// District and pincode leaderboards from `data.districts`/`data.pincodes`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TopTransactionExtractor;

impl Extractor for TopTransactionExtractor {
    type Row = TopTransactionRow;

    fn category(&self) -> Category {
        Category::TopTransaction
    }

    fn extract(&self, data: &Map<String, Value>, key: &PathKey, path: &Path) -> Result<Vec<TopTransactionRow>> {
        let mut rows = Vec::new();
        for level in TOP_LEVELS {
            for entry in objects(list_field(data, level, path)?) {
                let metric = object_field(entry, "metric", path)?;
                rows.push(TopTransactionRow {
                    key: key.clone(),
                    level: level.to_string(),
                    entity_name: text_field(entry, "entityName"),
                    amount: metric.map_or(0.0, |m| amount_field(m, "amount")),
                    count: metric.map_or(0, |m| count_field(m, "count")),
                });
            }
        }
        Ok(rows)
    }
}

/// District map from `data.hoverData`, keyed by district name.
#[derive(Debug, Default, Clone, Copy)]
pub struct MapUserExtractor;

impl Extractor for MapUserExtractor {
    type Row = MapUserRow;

    fn category(&self) -> Category {
        Category::MapUser
    }

    fn extract(&self, data: &Map<String, Value>, key: &PathKey, path: &Path) -> Result<Vec<MapUserRow>> {
        let Some(hover) = object_field(data, "hoverData", path)? else {
            return Ok(Vec::new());
        };

        Ok(hover
            .iter()
            .filter_map(|(district, value)| value.as_object().map(|v| (district, v)))
            .map(|(district, value)| MapUserRow {
                key: key.clone(),
                district: district.clone(),
                registered_users: count_field(value, "registeredUsers"),
                app_opens: count_field(value, "appOpens"),
            })
            .collect())
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

/// List under `name`; absent or null is empty.
fn list_field<'a>(obj: &'a Map<String, Value>, name: &str, path: &Path) -> Result<&'a [Value]> {
    match obj.get(name) {
        None | Some(Value::Null) => Ok(&[]),
        Some(Value::Array(items)) => Ok(items.as_slice()),
        Some(other) => Err(PulseError::document_parse(
            path,
            format!("'{name}' is {}, expected a list", kind(other)),
        )),
    }
}

/// Object under `name`; absent or null is `None`.
fn object_field<'a>(
    obj: &'a Map<String, Value>,
    name: &str,
    path: &Path,
) -> Result<Option<&'a Map<String, Value>>> {
    match obj.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(inner)) => Ok(Some(inner)),
        Some(other) => Err(PulseError::document_parse(
            path,
            format!("'{name}' is {}, expected an object", kind(other)),
        )),
    }
}

fn objects(items: &[Value]) -> impl Iterator<Item = &Map<String, Value>> {
    items.iter().filter_map(Value::as_object)
}

fn text_field(obj: &Map<String, Value>, name: &str) -> String {
    match obj.get(name) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => UNKNOWN_NAME.to_string(),
    }
}

fn count_field(obj: &Map<String, Value>, name: &str) -> i64 {
    match obj.get(name) {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.round() as i64))
            .unwrap_or(0),
        _ => 0,
    }
}

fn amount_field(obj: &Map<String, Value>, name: &str) -> f64 {
    obj.get(name).and_then(Value::as_f64).unwrap_or(0.0)
}
