// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Parquet snapshots of materialized tables.
//!
//! A snapshot is written next to its final name and renamed into place only
//! after the store commit succeeds, so a reader never sees a snapshot that
//! disagrees with the store.

use crate::error::{PulseError, Result};
use arrow_array::RecordBatch;
use diagnostics::*;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, ZstdLevel};
use parquet::file::properties::WriterProperties;
use std::fs::File;
use std::path::{Path, PathBuf};

const ZSTD_LEVEL: i32 = 6;

/// A snapshot written to a temporary name, waiting for [`StagedSnapshot::publish`].
#[derive(Debug)]
pub struct StagedSnapshot {
    staged: PathBuf,
    target: PathBuf,
}

impl StagedSnapshot {
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Move the snapshot to `<dir>/<table>.parquet`, replacing any older one.
    ///
    /// The staged file is removed if the rename fails.
    pub fn publish(self) -> Result<PathBuf> {
        if let Err(err) = std::fs::rename(&self.staged, &self.target) {
            let err = PulseError::io(&self.target, err);
            self.discard();
            return Err(err);
        }
        let shown = self.target.display().to_string();
        debug!("Published snapshot {shown}", shown);
        Ok(self.target)
    }

    /// Remove the staged file without touching the published snapshot.
    pub fn discard(self) {
        if let Err(err) = std::fs::remove_file(&self.staged) {
            let shown = self.staged.display().to_string();
            let err = err.to_string();
            warn!("Could not remove staged snapshot {shown}: {err}", shown, err: err.as_str());
        }
    }
}

/// Write `batch` as `<dir>/<table>.parquet.tmp`.
///
/// A partially written file is removed before the error is returned.
pub fn stage(dir: &Path, table: &str, batch: &RecordBatch) -> Result<StagedSnapshot> {
    std::fs::create_dir_all(dir).map_err(|e| PulseError::io(dir, e))?;

    let snapshot = StagedSnapshot {
        staged: dir.join(format!("{table}.parquet.tmp")),
        target: dir.join(format!("{table}.parquet")),
    };

    let file = File::create(&snapshot.staged).map_err(|e| PulseError::io(&snapshot.staged, e))?;
    if let Err(err) = write_parquet(file, batch) {
        snapshot.discard();
        return Err(err);
    }

    let rows = batch.num_rows();
    debug!("Staged {table} snapshot with {rows} rows", table, rows);
    Ok(snapshot)
}

fn write_parquet(file: File, batch: &RecordBatch) -> Result<()> {
    let props = WriterProperties::builder()
        .set_compression(Compression::ZSTD(ZstdLevel::try_new(ZSTD_LEVEL)?))
        .build();

    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))?;
    writer.write(batch)?;
    writer.close()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow_array::types::Int32Type;
    use arrow_array::{Array, Int32Array, Int64Array, RunArray, StringArray};
    use arrow_schema::{DataType, Field, Schema};
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn counts(values: Vec<i64>) -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![Field::new("count", DataType::Int64, false)]));
        RecordBatch::try_new(schema, vec![Arc::new(Int64Array::from(values))]).unwrap()
    }

    fn read_rows(path: &Path) -> usize {
        let reader = ParquetRecordBatchReaderBuilder::try_new(File::open(path).unwrap())
            .unwrap()
            .build()
            .unwrap();
        reader.map(|b| b.unwrap().num_rows()).sum()
    }

    #[test]
    fn test_stage_then_publish() {
        let tmp = tempdir().unwrap();
        let staged = stage(tmp.path(), "map_user", &counts(vec![1, 2, 3])).unwrap();
        assert!(!staged.target().exists());

        let published = staged.publish().unwrap();
        assert_eq!(published, tmp.path().join("map_user.parquet"));
        assert_eq!(read_rows(&published), 3);
        assert!(!tmp.path().join("map_user.parquet.tmp").exists());
    }

    #[test]
    fn test_discard_keeps_previous() {
        let tmp = tempdir().unwrap();
        stage(tmp.path(), "t", &counts(vec![1])).unwrap().publish().unwrap();

        stage(tmp.path(), "t", &counts(vec![1, 2, 3, 4])).unwrap().discard();
        assert_eq!(read_rows(&tmp.path().join("t.parquet")), 1);
        assert!(!tmp.path().join("t.parquet.tmp").exists());
    }

    #[test]
    fn test_failed_write_leaves_no_staged_file() {
        let tmp = tempdir().unwrap();
        let run_ends = Int32Array::from(vec![2, 5]);
        let values = StringArray::from(vec!["a", "b"]);
        let column = RunArray::<Int32Type>::try_new(&run_ends, &values).unwrap();
        let schema = Arc::new(Schema::new(vec![Field::new(
            "encoded",
            column.data_type().clone(),
            false,
        )]));
        let batch = RecordBatch::try_new(schema, vec![Arc::new(column)]).unwrap();

        assert!(stage(tmp.path(), "encoded", &batch).is_err());
        assert!(!tmp.path().join("encoded.parquet.tmp").exists());
        assert!(!tmp.path().join("encoded.parquet").exists());
    }

    #[test]
    fn test_failed_publish_removes_staged_file() {
        let tmp = tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join("t.parquet/inner")).unwrap();

        let staged = stage(tmp.path(), "t", &counts(vec![1, 2])).unwrap();
        assert!(staged.publish().is_err());
        assert!(!tmp.path().join("t.parquet.tmp").exists());
        assert!(tmp.path().join("t.parquet").is_dir());
    }
}
