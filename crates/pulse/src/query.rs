// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Read-only query layer over the materialized tables.
//!
//! Every call opens its own short-lived read-only connection.

use crate::error::{PulseError, Result};
use crate::geo;
use crate::models::Category;
use crate::store::{QueryBatch, Store};
use diagnostics::*;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// An aggregate query with a stable name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamedQuery {
    pub name: &'static str,
    pub title: &'static str,
    pub sql: &'static str,
}

const CATALOG: &[NamedQuery] = &[
    // Transactions
    NamedQuery {
        name: "top_states_by_amount",
        title: "Top 10 states by transaction amount",
        sql: "SELECT state, SUM(amount) AS total_amount
FROM aggregated_transaction
GROUP BY state
ORDER BY total_amount DESC, state
LIMIT 10",
    },
    NamedQuery {
        name: "yearly_transaction_amount",
        title: "Transaction amount per year",
        sql: "SELECT year, SUM(amount) AS yearly_amount
FROM aggregated_transaction
GROUP BY year
ORDER BY year",
    },
    NamedQuery {
        name: "karnataka_quarterly_amount",
        title: "Quarterly transaction amount in Karnataka",
        sql: "SELECT state, year, quarter, SUM(amount) AS total_amount
FROM aggregated_transaction
WHERE state = 'karnataka'
GROUP BY state, year, quarter
ORDER BY year, quarter",
    },
    NamedQuery {
        name: "transaction_categories",
        title: "Count and amount per transaction category",
        sql: "SELECT category, SUM(\"count\") AS total_count, SUM(amount) AS total_amount
FROM aggregated_transaction
GROUP BY category
ORDER BY total_amount DESC, category",
    },
    NamedQuery {
        name: "latest_year_categories",
        title: "Transaction amount per category in the latest year",
        sql: "SELECT category, SUM(amount) AS total_amount
FROM aggregated_transaction
WHERE year = (SELECT MAX(year) FROM aggregated_transaction)
GROUP BY category
ORDER BY total_amount DESC, category",
    },
    // Devices and users
    NamedQuery {
        name: "top_device_brands",
        title: "Top 10 device brands by users",
        sql: "SELECT brand, SUM(\"count\") AS total_users
FROM aggregated_user
WHERE brand != 'TOTAL'
GROUP BY brand
ORDER BY total_users DESC, brand
LIMIT 10",
    },
    NamedQuery {
        name: "yearly_app_opens",
        title: "App opens per year",
        sql: "SELECT year, SUM(\"appOpens\") AS total_app_opens
FROM aggregated_user
WHERE brand = 'TOTAL'
GROUP BY year
ORDER BY year",
    },
    NamedQuery {
        name: "top_state_brand_share",
        title: "Device market share in the top state (latest device year)",
        sql: "WITH valid_year AS (
    SELECT MAX(year) AS yr
    FROM aggregated_user
    WHERE brand != 'TOTAL'
),
top_state AS (
    SELECT state
    FROM aggregated_user
    WHERE brand = 'TOTAL'
    GROUP BY state
    ORDER BY SUM(\"registeredUsers\") DESC, state
    LIMIT 1
)
SELECT au.state, au.brand, SUM(au.\"count\") AS total_users,
       ROUND(SUM(au.\"count\") * 100.0 / SUM(SUM(au.\"count\")) OVER (), 2) AS market_share_percent
FROM aggregated_user au
JOIN top_state ts ON au.state = ts.state
JOIN valid_year vy ON au.year = vy.yr
WHERE au.brand != 'TOTAL'
GROUP BY au.state, au.brand
ORDER BY total_users DESC, au.brand",
    },
    NamedQuery {
        name: "latest_year_top_states_by_users",
        title: "Top 5 states by registered users (latest year)",
        sql: "SELECT state, SUM(\"registeredUsers\") AS total_users
FROM aggregated_user
WHERE brand = 'TOTAL'
  AND year = (SELECT MAX(year) FROM aggregated_user)
GROUP BY state
ORDER BY total_users DESC, state
LIMIT 5",
    },
    NamedQuery {
        name: "xiaomi_quarterly_users",
        title: "Xiaomi users per quarter",
        sql: "SELECT year, quarter, SUM(\"count\") AS xiaomi_users
FROM aggregated_user
WHERE brand = 'Xiaomi'
GROUP BY year, quarter
ORDER BY year, quarter",
    },
    // Insurance
    NamedQuery {
        name: "top_states_by_insurance",
        title: "Top 10 states by insurance amount",
        sql: "SELECT state, SUM(amount) AS total_insurance_amount
FROM aggregated_insurance
GROUP BY state
ORDER BY total_insurance_amount DESC, state
LIMIT 10",
    },
    NamedQuery {
        name: "yearly_insurance_amount",
        title: "Insurance amount per year",
        sql: "SELECT year, SUM(amount) AS yearly_insurance_amount
FROM aggregated_insurance
GROUP BY year
ORDER BY year",
    },
    NamedQuery {
        name: "top_insurance_state_quarterly",
        title: "Quarterly insurance amount in the top state",
        sql: "WITH top_state AS (
    SELECT state
    FROM aggregated_insurance
    GROUP BY state
    ORDER BY SUM(amount) DESC, state
    LIMIT 1
)
SELECT ai.state, ai.year, ai.quarter, SUM(ai.amount) AS quarterly_amount
FROM aggregated_insurance ai
JOIN top_state ts ON ai.state = ts.state
GROUP BY ai.state, ai.year, ai.quarter
ORDER BY ai.year, ai.quarter",
    },
    NamedQuery {
        name: "insurance_growth",
        title: "Top 5 states by insurance growth between their lowest and highest year",
        sql: "WITH yearly_state_amount AS (
    SELECT state, year, SUM(amount) AS yearly_amount
    FROM aggregated_insurance
    GROUP BY state, year
),
state_growth AS (
    SELECT state,
           MIN(yearly_amount) AS start_amount,
           MAX(yearly_amount) AS end_amount,
           ROUND((MAX(yearly_amount) - MIN(yearly_amount)) / MIN(yearly_amount) * 100, 2) AS growth_percent
    FROM yearly_state_amount
    GROUP BY state
    HAVING MIN(yearly_amount) > 0
)
SELECT state, growth_percent
FROM state_growth
ORDER BY growth_percent DESC, state
LIMIT 5",
    },
    NamedQuery {
        name: "insurance_penetration",
        title: "Insurance amount as a share of transaction amount",
        sql: "WITH insurance AS (
    SELECT state, SUM(amount) AS insurance_amount
    FROM aggregated_insurance
    GROUP BY state
),
transactions AS (
    SELECT state, SUM(amount) AS total_amount
    FROM aggregated_transaction
    GROUP BY state
)
SELECT t.state, insurance_amount, total_amount,
       ROUND(insurance_amount / NULLIF(total_amount, 0) * 100, 2) AS penetration_percent
FROM transactions t
LEFT JOIN insurance i ON t.state = i.state
ORDER BY penetration_percent DESC NULLS LAST, t.state
LIMIT 10",
    },
    // Engagement
    NamedQuery {
        name: "yearly_registered_users",
        title: "Registered users per year",
        sql: "SELECT year, SUM(\"registeredUsers\") AS yearly_users
FROM aggregated_user
WHERE brand = 'TOTAL'
GROUP BY year
ORDER BY year",
    },
    NamedQuery {
        name: "top_state_quarterly_app_opens",
        title: "Quarterly app opens in the state with most registered users",
        sql: "WITH top_state AS (
    SELECT state
    FROM aggregated_user
    WHERE brand = 'TOTAL'
    GROUP BY state
    ORDER BY SUM(\"registeredUsers\") DESC, state
    LIMIT 1
)
SELECT au.state, au.year, au.quarter, SUM(au.\"appOpens\") AS total_app_opens
FROM aggregated_user au
JOIN top_state ts ON au.state = ts.state
WHERE au.brand = 'TOTAL'
GROUP BY au.state, au.year, au.quarter
ORDER BY au.year, au.quarter",
    },
    NamedQuery {
        name: "top_districts_by_users",
        title: "Top 10 districts by registered users (latest year)",
        sql: "SELECT district, year, SUM(\"registeredUsers\") AS total_users
FROM map_user
WHERE year = (SELECT MAX(year) FROM map_user)
GROUP BY district, year
ORDER BY total_users DESC, district
LIMIT 10",
    },
    NamedQuery {
        name: "engagement_ratio",
        title: "App opens per registered user by state (latest year)",
        sql: "SELECT state,
       SUM(\"registeredUsers\") AS total_registered_users,
       SUM(\"appOpens\") AS total_app_opens,
       ROUND(SUM(\"appOpens\") / NULLIF(SUM(\"registeredUsers\"), 0), 2) AS engagement_ratio
FROM aggregated_user
WHERE brand = 'TOTAL'
  AND year = (SELECT MAX(year) FROM aggregated_user)
GROUP BY state
ORDER BY engagement_ratio DESC NULLS LAST, state
LIMIT 10",
    },
    // Geography
    NamedQuery {
        name: "latest_year_top_states",
        title: "Top 10 states by transaction amount (latest year)",
        sql: "SELECT state, SUM(amount) AS total_amount
FROM aggregated_transaction
WHERE year = (SELECT MAX(year) FROM aggregated_transaction)
GROUP BY state
ORDER BY total_amount DESC, state
LIMIT 10",
    },
    NamedQuery {
        name: "top_districts_by_amount",
        title: "Top 10 districts by transaction amount (latest year)",
        sql: "SELECT \"entityName\" AS district, SUM(amount) AS total_amount
FROM top_transaction
WHERE level = 'districts'
  AND year = (SELECT MAX(year) FROM top_transaction)
GROUP BY \"entityName\"
ORDER BY total_amount DESC, district
LIMIT 10",
    },
    NamedQuery {
        name: "top_pincodes_by_amount",
        title: "Top 10 pincodes by transaction amount (latest year)",
        sql: "SELECT \"entityName\" AS pincode, SUM(amount) AS total_amount
FROM top_transaction
WHERE level = 'pincodes'
  AND year = (SELECT MAX(year) FROM top_transaction)
GROUP BY \"entityName\"
ORDER BY total_amount DESC, pincode
LIMIT 10",
    },
    NamedQuery {
        name: "state_growth_2022_2023",
        title: "Fastest growing states by transaction amount, 2022 to 2023",
        sql: "WITH yearly_data AS (
    SELECT state, year, SUM(amount) AS total_amount
    FROM aggregated_transaction
    WHERE year IN (2022, 2023)
    GROUP BY state, year
),
pivoted AS (
    SELECT state,
           SUM(CASE WHEN year = 2022 THEN total_amount ELSE 0 END) AS amt_2022,
           SUM(CASE WHEN year = 2023 THEN total_amount ELSE 0 END) AS amt_2023
    FROM yearly_data
    GROUP BY state
)
SELECT state,
       ROUND(amt_2022 / 10000000, 2) AS amount_2022_cr,
       ROUND(amt_2023 / 10000000, 2) AS amount_2023_cr,
       ROUND((amt_2023 - amt_2022) * 100.0 / NULLIF(amt_2022, 0), 2) AS growth_percent
FROM pivoted
ORDER BY growth_percent DESC NULLS LAST, state
LIMIT 10",
    },
    NamedQuery {
        name: "state_contribution",
        title: "State share of national transaction amount (latest year)",
        sql: "WITH total AS (
    SELECT SUM(amount) AS national_total
    FROM aggregated_transaction
    WHERE year = (SELECT MAX(year) FROM aggregated_transaction)
)
SELECT state, SUM(amount) AS state_total,
       ROUND(SUM(amount) * 100.0 / NULLIF((SELECT national_total FROM total), 0), 2) AS contribution_percent
FROM aggregated_transaction
WHERE year = (SELECT MAX(year) FROM aggregated_transaction)
GROUP BY state
ORDER BY state_total DESC, state
LIMIT 10",
    },
];

/// All named queries, in display order.
pub fn catalog() -> &'static [NamedQuery] {
    CATALOG
}

pub fn find(name: &str) -> Result<&'static NamedQuery> {
    CATALOG
        .iter()
        .find(|q| q.name == name)
        .ok_or_else(|| PulseError::UnknownQuery(name.to_string()))
}

/// Either a catalog entry or operator-supplied SQL.
#[derive(Debug, Clone, Copy)]
pub enum QueryRef<'a> {
    Named(&'a str),
    Sql(&'a str),
}

impl<'a> QueryRef<'a> {
    pub fn sql(&self) -> Result<&'a str> {
        match *self {
            QueryRef::Named(name) => Ok(find(name)?.sql),
            QueryRef::Sql(sql) => Ok(sql),
        }
    }
}

/// Execute a named query.
pub fn run(store_path: &Path, name: &str) -> Result<Vec<QueryBatch>> {
    let query = find(name)?;
    debug!("Running query {name}", name);
    run_sql(store_path, query.sql)
}

/// Execute ad hoc SQL on a read-only connection.
pub fn run_sql(store_path: &Path, sql: &str) -> Result<Vec<QueryBatch>> {
    let store = Store::open_read_only(store_path)?;
    store.query_arrow(sql)
}

/// Write the query result to `out` as CSV with a header row.
pub fn export_csv(store_path: &Path, query: QueryRef<'_>, out: &Path) -> Result<PathBuf> {
    let sql = query.sql()?;
    let store = Store::open_read_only(store_path)?;
    let written = store.copy_to_csv(sql, out)?;
    let shown = written.display().to_string();
    info!("Exported query result to {shown}", shown);
    Ok(written)
}

/// How the CLI prints query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Csv,
    Count,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "table" => Ok(OutputFormat::Table),
            "csv" => Ok(OutputFormat::Csv),
            "count" => Ok(OutputFormat::Count),
            other => Err(format!(
                "Unsupported output format: {other}. Use 'table', 'csv', or 'count'."
            )),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OutputFormat::Table => "table",
            OutputFormat::Csv => "csv",
            OutputFormat::Count => "count",
        })
    }
}

/// Run `query` and write its result to `out` in `format`.
pub fn render<W: Write>(
    store_path: &Path,
    query: QueryRef<'_>,
    format: OutputFormat,
    out: &mut W,
) -> Result<()> {
    let sql = query.sql()?;
    let output = |e: std::io::Error| PulseError::io("<output>", e);

    match format {
        OutputFormat::Table => {
            let batches = run_sql(store_path, sql)?;
            if batches.iter().all(|b| b.num_rows() == 0) {
                writeln!(out, "No results found.").map_err(output)?;
                return Ok(());
            }
            let formatted = duckdb::arrow::util::pretty::pretty_format_batches(&batches)
                .map_err(|e| PulseError::Render(e.to_string()))?;
            writeln!(out, "{formatted}").map_err(output)?;
        }
        OutputFormat::Csv => {
            let scratch = tempfile::tempdir().map_err(|e| PulseError::io("<tempdir>", e))?;
            let path = export_csv(store_path, QueryRef::Sql(sql), &scratch.path().join("result.csv"))?;
            let mut file = std::fs::File::open(&path).map_err(|e| PulseError::io(&path, e))?;
            std::io::copy(&mut file, out).map_err(output)?;
        }
        OutputFormat::Count => {
            let rows: usize = run_sql(store_path, sql)?.iter().map(|b| b.num_rows()).sum();
            writeln!(out, "{rows}").map_err(output)?;
        }
    }
    Ok(())
}

/// Row count of every category table; `None` for tables never built.
pub fn table_counts(store_path: &Path) -> Result<Vec<(&'static str, Option<u64>)>> {
    let store = Store::open_read_only(store_path)?;
    Category::ALL
        .into_iter()
        .map(|c| Ok((c.table_name(), store.row_count(c.table_name())?)))
        .collect()
}

/// A stored state slug and its geography name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateName {
    pub slug: String,
    pub display: String,
}

/// Distinct state slugs across all built tables, sorted.
pub fn states(store_path: &Path) -> Result<Vec<StateName>> {
    let store = Store::open_read_only(store_path)?;

    let mut selects = Vec::new();
    for category in Category::ALL {
        let table = category.table_name();
        if store.table_exists(table)? {
            selects.push(format!("SELECT state FROM {table}"));
        }
    }
    if selects.is_empty() {
        return Ok(Vec::new());
    }

    let sql = format!(
        "SELECT DISTINCT state FROM ({}) ORDER BY state",
        selects.join(" UNION ALL ")
    );
    let slugs = store.query_strings(&sql)?;
    Ok(slugs
        .into_iter()
        .map(|slug| StateName {
            display: geo::display_name(&slug),
            slug,
        })
        .collect())
}
