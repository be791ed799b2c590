// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::error::PulseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Brand value that marks the per-document totals row in `aggregated_user`.
pub const TOTAL_BRAND: &str = "TOTAL";

/// Payment instrument type kept by the insurance extractor.
pub const TOTAL_INSTRUMENT: &str = "TOTAL";

/// Substituted for missing category, instrument, brand and entity names.
pub const UNKNOWN_NAME: &str = "Unknown";

/// Dataset kinds, one per source folder and one per materialized table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Transaction,
    User,
    Insurance,
    TopTransaction,
    MapUser,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Transaction,
        Category::User,
        Category::Insurance,
        Category::TopTransaction,
        Category::MapUser,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Category::Transaction => "transaction",
            Category::User => "user",
            Category::Insurance => "insurance",
            Category::TopTransaction => "top_transaction",
            Category::MapUser => "map_user",
        }
    }

    pub fn table_name(&self) -> &'static str {
        match self {
            Category::Transaction => "aggregated_transaction",
            Category::User => "aggregated_user",
            Category::Insurance => "aggregated_insurance",
            Category::TopTransaction => "top_transaction",
            Category::MapUser => "map_user",
        }
    }

    /// Folder segments between the source root and the per-state folders.
    fn folder(&self) -> &'static [&'static str] {
        match self {
            Category::Transaction => &["aggregated", "transaction", "country", "india", "state"],
            Category::User => &["aggregated", "user", "country", "india", "state"],
            Category::Insurance => &["aggregated", "insurance", "country", "india", "state"],
            Category::TopTransaction => &["top", "transaction", "country", "india", "state"],
            Category::MapUser => &["map", "user", "hover", "country", "india", "state"],
        }
    }

    /// Directory holding `<state>/<year>/<quarter>.json` for this category.
    pub fn state_root(&self, source_root: &Path) -> PathBuf {
        self.folder()
            .iter()
            .fold(source_root.to_path_buf(), |path, segment| path.join(segment))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Category {
    type Err = PulseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        Category::ALL
            .into_iter()
            .find(|c| c.name() == wanted || c.table_name() == wanted)
            .ok_or_else(|| PulseError::UnknownCategory(s.to_string()))
    }
}

/// Partition key recovered from `<state>/<year>/<quarter>.json`.
///
/// The state is the folder slug exactly as stored on disk.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PathKey {
    pub state: String,
    pub year: i32,
    pub quarter: i32,
}

/// Row of `aggregated_transaction`: one per category and payment instrument.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRow {
    pub key: PathKey,
    pub category: String,
    pub instrument_type: String,
    pub count: i64,
    pub amount: f64,
}

/// Row of `aggregated_insurance`: the TOTAL instrument of one category.
#[derive(Debug, Clone, PartialEq)]
pub struct InsuranceRow {
    pub key: PathKey,
    pub category: String,
    pub count: i64,
    pub amount: f64,
}

/// Row of `aggregated_user`.
///
/// Device rows fill `count`/`percentage`; the totals row has brand
/// [`TOTAL_BRAND`] and fills `registered_users`/`app_opens`.
#[derive(Debug, Clone, PartialEq)]
pub struct UserRow {
    pub key: PathKey,
    pub brand: String,
    pub count: Option<i64>,
    pub percentage: Option<f64>,
    pub registered_users: Option<i64>,
    pub app_opens: Option<i64>,
}

impl UserRow {
    pub fn device(key: PathKey, brand: String, count: i64, percentage: f64) -> Self {
        Self {
            key,
            brand,
            count: Some(count),
            percentage: Some(percentage),
            registered_users: None,
            app_opens: None,
        }
    }

    pub fn totals(key: PathKey, registered_users: i64, app_opens: i64) -> Self {
        Self {
            key,
            brand: TOTAL_BRAND.to_string(),
            count: None,
            percentage: None,
            registered_users: Some(registered_users),
            app_opens: Some(app_opens),
        }
    }

    pub fn is_totals(&self) -> bool {
        self.brand == TOTAL_BRAND
    }
}

/// Row of `top_transaction`: one leaderboard entry (district or pincode).
#[derive(Debug, Clone, PartialEq)]
pub struct TopTransactionRow {
    pub key: PathKey,
    pub level: String,
    pub entity_name: String,
    pub amount: f64,
    pub count: i64,
}

/// Row of `map_user`: registered users and app opens of one district.
#[derive(Debug, Clone, PartialEq)]
pub struct MapUserRow {
    pub key: PathKey,
    pub district: String,
    pub registered_users: i64,
    pub app_opens: i64,
}
