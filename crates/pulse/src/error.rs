// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

// Error types for ingestion, materialization and queries
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum PulseError {
    /// A required directory or setting is missing. Fatal to one category.
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// The file path does not encode `<state>/<year>/<quarter>.json`.
    #[error("Malformed path {path}: {reason}")]
    MalformedPath { path: PathBuf, reason: String },

    /// The file content is not JSON, or not the expected shape.
    #[error("Cannot parse document {path}: {reason}")]
    DocumentParse { path: PathBuf, reason: String },

    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    #[error("Unknown query: {0}")]
    UnknownQuery(String),

    #[error("Store error: {0}")]
    Store(#[from] duckdb::Error),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow_schema::ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot render results: {0}")]
    Render(String),

    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl PulseError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn malformed_path(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::MalformedPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn document_parse(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::DocumentParse {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, PulseError>;
