// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Enumerates `<state>/<year>/<quarter>.json` files under a category folder
//! and recovers the partition key from the path.

use crate::error::{PulseError, Result};
use crate::models::{Category, PathKey};
use diagnostics::*;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Number of path segments below the category folder: state, year, quarter file.
const KEY_DEPTH: usize = 3;

/// One source document and the key recovered from its location.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub key: PathKey,
}

impl PathKey {
    /// Parse the three trailing segments `<state>/<year>/<quarter>.json`.
    pub fn from_path(path: &Path) -> Result<Self> {
        let mut segments = path
            .components()
            .rev()
            .map(|c| c.as_os_str().to_string_lossy().into_owned());

        let (Some(file), Some(year), Some(state)) =
            (segments.next(), segments.next(), segments.next())
        else {
            return Err(PulseError::malformed_path(
                path,
                "expected <state>/<year>/<quarter>.json",
            ));
        };

        let quarter = file
            .strip_suffix(".json")
            .ok_or_else(|| PulseError::malformed_path(path, "not a .json file"))?;

        if state.is_empty() || state == "/" {
            return Err(PulseError::malformed_path(path, "empty state segment"));
        }

        let year: i32 = year
            .parse()
            .map_err(|_| PulseError::malformed_path(path, format!("year '{year}' is not numeric")))?;

        let quarter: i32 = quarter.parse().map_err(|_| {
            PulseError::malformed_path(path, format!("quarter '{quarter}' is not numeric"))
        })?;

        if !(1..=4).contains(&quarter) {
            return Err(PulseError::malformed_path(
                path,
                format!("quarter {quarter} is outside 1..=4"),
            ));
        }

        Ok(PathKey {
            state,
            year,
            quarter,
        })
    }
}

/// Lazy iterator over the documents of one category.
///
/// Items are per-file results: a malformed path or an unreadable directory
/// entry yields an `Err` for that item and iteration continues.
pub struct CategoryWalker {
    root: PathBuf,
    entries: walkdir::IntoIter,
}

impl CategoryWalker {
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Iterator for CategoryWalker {
    type Item = Result<SourceFile>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.entries.next()? {
                Ok(entry) => entry,
                Err(err) => {
                    let path = err
                        .path()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| self.root.clone());
                    return Some(Err(PulseError::io(path, err.into())));
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }
            if entry.path().extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }

            let path = entry.into_path();
            return Some(PathKey::from_path(&path).map(|key| SourceFile { path, key }));
        }
    }
}

/// Start walking the state folder of `category` under `source_root`.
///
/// Fails with a configuration error when the folder does not exist, so a
/// missing checkout is never reported as an empty dataset.
pub fn walk_category(source_root: &Path, category: Category) -> Result<CategoryWalker> {
    let root = category.state_root(source_root);
    if !root.is_dir() {
        let shown = root.display().to_string();
        return Err(PulseError::configuration(format!(
            "source folder for {category} not found: {shown}"
        )));
    }

    let shown = root.display().to_string();
    debug!("Walking {category_name} documents under {shown}", category_name: category.name(), shown);

    let entries = WalkDir::new(&root)
        .min_depth(KEY_DEPTH)
        .max_depth(KEY_DEPTH)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter();

    Ok(CategoryWalker { root, entries })
}
