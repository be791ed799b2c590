// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! The query catalog against a store built from the fixture tree.

mod common;

use anyhow::Result;
use common::*;
use pulse::query::{self, QueryRef};
use pulse::{OutputFormat, PulseConfig, PulseError};
use std::path::PathBuf;
use tempfile::{TempDir, tempdir};

fn built_store() -> Result<(TempDir, PathBuf)> {
    let tmp = tempdir()?;
    let src = tmp.path().join("data");
    write_full_tree(&src);
    let config = PulseConfig::new(&src, tmp.path().join("pulse.duckdb"));
    pulse::run(&config)?;
    Ok((tmp, config.target_store))
}

#[test]
fn test_every_named_query_runs() -> Result<()> {
    let (_tmp, store) = built_store()?;
    for named in query::catalog() {
        let batches = query::run(&store, named.name)?;
        let rows: usize = batches.iter().map(|b| b.num_rows()).sum();
        assert!(rows > 0, "{} returned no rows", named.name);
    }
    Ok(())
}

#[test]
fn test_top_states_order() -> Result<()> {
    let (_tmp, store) = built_store()?;
    let mut out = Vec::new();
    query::render(
        &store,
        QueryRef::Named("top_states_by_amount"),
        OutputFormat::Csv,
        &mut out,
    )?;
    let text = String::from_utf8(out)?;
    let states: Vec<&str> = text
        .lines()
        .skip(1)
        .filter_map(|line| line.split(',').next())
        .collect();
    // Fixture amounts grow with the state's position in STATES.
    assert_eq!(states, ["pondicherry", "andaman-&-nicobar-islands", "karnataka"]);
    Ok(())
}

#[test]
fn test_count_format() -> Result<()> {
    let (_tmp, store) = built_store()?;
    let mut out = Vec::new();
    query::render(
        &store,
        QueryRef::Sql("SELECT DISTINCT year FROM map_user"),
        OutputFormat::Count,
        &mut out,
    )?;
    assert_eq!(String::from_utf8(out)?, "2\n");
    Ok(())
}

#[test]
fn test_table_format_and_empty_result() -> Result<()> {
    let (_tmp, store) = built_store()?;

    let mut out = Vec::new();
    query::render(
        &store,
        QueryRef::Named("yearly_registered_users"),
        OutputFormat::Table,
        &mut out,
    )?;
    let text = String::from_utf8(out)?;
    assert!(text.contains("yearly_users"));
    assert!(text.contains("2023"));

    let mut out = Vec::new();
    query::render(
        &store,
        QueryRef::Sql("SELECT * FROM map_user WHERE year = 1999"),
        OutputFormat::Table,
        &mut out,
    )?;
    assert_eq!(String::from_utf8(out)?, "No results found.\n");
    Ok(())
}

#[test]
fn test_export_csv_header_matches_columns() -> Result<()> {
    let (tmp, store) = built_store()?;
    let out = tmp.path().join("exports").join("engagement.csv");
    query::export_csv(&store, QueryRef::Named("engagement_ratio"), &out)?;

    let text = std::fs::read_to_string(&out)?;
    assert_eq!(
        text.lines().next(),
        Some("state,total_registered_users,total_app_opens,engagement_ratio")
    );
    assert_eq!(text.lines().count(), 4);
    Ok(())
}

#[test]
fn test_read_only_connection() -> Result<()> {
    let (_tmp, store) = built_store()?;
    let err = query::run_sql(&store, "DROP TABLE map_user").unwrap_err();
    assert!(matches!(err, PulseError::Store(_)));
    assert!(query::table_counts(&store)?.iter().all(|(_, rows)| rows.is_some()));
    Ok(())
}

#[test]
fn test_states_use_display_names() -> Result<()> {
    let (_tmp, store) = built_store()?;
    let states = query::states(&store)?;
    let pairs: Vec<(&str, &str)> = states
        .iter()
        .map(|s| (s.slug.as_str(), s.display.as_str()))
        .collect();
    assert_eq!(
        pairs,
        [
            ("andaman-&-nicobar-islands", "Andaman and Nicobar"),
            ("karnataka", "Karnataka"),
            ("pondicherry", "Puducherry"),
        ]
    );
    Ok(())
}

#[test]
fn test_unknown_query_name() {
    let err = query::run(&PathBuf::from("unused.duckdb"), "missing").unwrap_err();
    assert!(matches!(err, PulseError::UnknownQuery(_)));
}
