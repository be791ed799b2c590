// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::error::{PulseError, Result};
use crate::models::Category;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Where to read source documents and where to materialize tables.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PulseConfig {
    /// Root of the dataset checkout (the folder holding `aggregated/`, `top/`, `map/`).
    pub source_root: PathBuf,
    /// DuckDB file receiving the tables.
    pub target_store: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parquet_dir: Option<PathBuf>,
    /// Size of the extraction thread pool; defaults to available parallelism.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,
    /// Categories to build; defaults to all of them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<Category>>,
}

impl PulseConfig {
    pub fn new(source_root: impl Into<PathBuf>, target_store: impl Into<PathBuf>) -> Self {
        Self {
            source_root: source_root.into(),
            target_store: target_store.into(),
            parquet_dir: None,
            workers: None,
            categories: None,
        }
    }

    pub fn workers(&self) -> usize {
        self.workers.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }

    /// Requested categories in canonical order, without duplicates.
    pub fn categories(&self) -> Vec<Category> {
        match &self.categories {
            None => Category::ALL.to_vec(),
            Some(wanted) => Category::ALL
                .into_iter()
                .filter(|c| wanted.contains(c))
                .collect(),
        }
    }
}

/// Load configuration from a YAML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<PulseConfig> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| PulseError::io(path, e))?;
    let config: PulseConfig = serde_yaml_ng::from_str(&content)?;
    validate_config(&config)?;
    Ok(config)
}

/// Validate configuration
pub fn validate_config(config: &PulseConfig) -> Result<()> {
    if config.source_root.as_os_str().is_empty() {
        return Err(PulseError::configuration("source_root cannot be empty"));
    }

    if config.target_store.as_os_str().is_empty() {
        return Err(PulseError::configuration("target_store cannot be empty"));
    }

    if config.workers == Some(0) {
        return Err(PulseError::configuration("workers must be greater than 0"));
    }

    if config.categories.as_ref().is_some_and(|c| c.is_empty()) {
        return Err(PulseError::configuration(
            "categories, when given, must name at least one category",
        ));
    }

    Ok(())
}

/// Write a starter configuration file. Refuses to overwrite an existing one.
pub fn create_example_config<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();
    if path.exists() {
        return Err(PulseError::configuration(format!(
            "{} already exists",
            path.display()
        )));
    }

    let example = PulseConfig {
        source_root: PathBuf::from("pulse/data"),
        target_store: PathBuf::from("pulse.duckdb"),
        parquet_dir: Some(PathBuf::from("snapshots")),
        workers: Some(4),
        categories: Some(Category::ALL.to_vec()),
    };

    let yaml = serde_yaml_ng::to_string(&example)?;
    std::fs::write(path, yaml).map_err(|e| PulseError::io(path, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_example_config_loads() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("pulse.yaml");
        create_example_config(&path).unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.workers(), 4);
        assert_eq!(config.categories(), Category::ALL.to_vec());

        assert!(create_example_config(&path).is_err());
    }

    #[test]
    fn test_minimal_yaml() {
        let config: PulseConfig =
            serde_yaml_ng::from_str("source_root: data\ntarget_store: out.duckdb\n").unwrap();
        validate_config(&config).unwrap();
        assert_eq!(config.parquet_dir, None);
        assert!(config.workers() >= 1);
        assert_eq!(config.categories().len(), 5);
    }

    #[test]
    fn test_category_filter_is_canonical() {
        let yaml = "source_root: d\ntarget_store: s\ncategories: [map_user, transaction, map_user]\n";
        let config: PulseConfig = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(
            config.categories(),
            vec![Category::Transaction, Category::MapUser]
        );
    }

    #[test]
    fn test_validation_rejects() {
        let mut config = PulseConfig::new("data", "store.duckdb");
        config.workers = Some(0);
        assert!(validate_config(&config).is_err());

        let mut config = PulseConfig::new("data", "store.duckdb");
        config.categories = Some(vec![]);
        assert!(validate_config(&config).is_err());

        let config = PulseConfig::new("", "store.duckdb");
        assert!(matches!(
            validate_config(&config),
            Err(PulseError::Configuration { .. })
        ));
    }

    #[test]
    fn test_unknown_category_in_yaml() {
        let yaml = "source_root: d\ntarget_store: s\ncategories: [bogus]\n";
        assert!(serde_yaml_ng::from_str::<PulseConfig>(yaml).is_err());
    }
}
