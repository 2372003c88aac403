//! Tab-separated utterance manifest parsing.
//!
//! A manifest is a TSV file with a header row and at least the columns
//! `client_id` (original group identifier), `path` (audio path relative to
//! the manifest's directory) and `sentence` (reference transcript). Column
//! order is free; no validation beyond column presence is performed.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use fedsim_common::ClientId;
use tracing::info;

use crate::dataset::PartitionedDataset;
use crate::error::DataError;
use crate::partition::GroupPartition;

/// Required manifest column: original group identifier.
const COL_GROUP: &str = "client_id";
/// Required manifest column: relative audio path.
const COL_PATH: &str = "path";
/// Required manifest column: reference transcript.
const COL_SENTENCE: &str = "sentence";

/// One manifest row: a labeled utterance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance {
    /// Original group identifier (e.g. speaker id).
    pub group: String,
    /// Audio path, relative to the manifest's base directory.
    pub path: PathBuf,
    /// Reference transcript.
    pub transcript: String,
}

/// A fully loaded dataset manifest.
#[derive(Debug, Clone)]
pub struct Manifest {
    rows: Vec<Utterance>,
    base_dir: PathBuf,
}

impl Manifest {
    /// Loads a manifest from a TSV file.
    ///
    /// The manifest's parent directory becomes the base directory for
    /// resolving relative audio paths.
    ///
    /// # Errors
    /// - [`DataError::ManifestRead`] when the file cannot be read,
    /// - [`DataError::MissingColumn`] when a required column is absent,
    /// - [`DataError::MalformedRow`] when a data row has too few fields.
    pub fn load(path: &Path) -> Result<Self, DataError> {
        let contents = fs::read_to_string(path).map_err(|source| DataError::ManifestRead {
            path: path.to_path_buf(),
            source,
        })?;

        let mut lines = contents.lines();
        let header = lines.next().ok_or_else(|| DataError::MissingColumn {
            path: path.to_path_buf(),
            column: COL_GROUP,
        })?;
        let columns: Vec<&str> = header.split('\t').collect();

        let find = |column: &'static str| {
            columns
                .iter()
                .position(|c| *c == column)
                .ok_or_else(|| DataError::MissingColumn {
                    path: path.to_path_buf(),
                    column,
                })
        };
        let group_idx = find(COL_GROUP)?;
        let path_idx = find(COL_PATH)?;
        let sentence_idx = find(COL_SENTENCE)?;
        let width = group_idx.max(path_idx).max(sentence_idx);

        let mut rows = Vec::new();
        for (offset, line) in lines.enumerate() {
            if line.is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() <= width {
                return Err(DataError::MalformedRow {
                    path: path.to_path_buf(),
                    // header is line 1, first data row is line 2
                    line: offset + 2,
                });
            }
            rows.push(Utterance {
                group: fields[group_idx].to_string(),
                path: PathBuf::from(fields[path_idx]),
                transcript: fields[sentence_idx].to_string(),
            });
        }

        let base_dir = path.parent().unwrap_or_else(|| Path::new(".")).to_path_buf();
        info!(manifest = %path.display(), rows = rows.len(), "loaded dataset manifest");

        Ok(Self { rows, base_dir })
    }

    /// Builds a manifest from in-memory rows (used by fixtures and tests).
    pub fn from_rows(rows: Vec<Utterance>, base_dir: PathBuf) -> Self {
        Self { rows, base_dir }
    }

    /// Returns all rows in manifest order.
    pub fn rows(&self) -> &[Utterance] {
        &self.rows
    }

    /// Returns the number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the manifest holds no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the base directory for resolving relative audio paths.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Returns the sorted, deduplicated list of original group identifiers.
    pub fn unique_groups(&self) -> Vec<String> {
        let set: BTreeSet<&str> = self.rows.iter().map(|r| r.group.as_str()).collect();
        set.into_iter().map(String::from).collect()
    }

    /// Filters the manifest down to the partition assigned to `client`.
    ///
    /// Rows keep their manifest order; the assignment itself is the
    /// contiguous slice of the sorted unique group list computed by
    /// [`GroupPartition::assign`].
    pub fn partition(&self, client: ClientId, num_clients: usize) -> PartitionedDataset {
        let groups = self.unique_groups();
        let partition = GroupPartition::assign(&groups, client, num_clients);
        let rows: Vec<Utterance> = self
            .rows
            .iter()
            .filter(|r| partition.contains(&r.group))
            .cloned()
            .collect();

        info!(
            client = %client,
            groups = partition.len(),
            samples = rows.len(),
            "assigned dataset partition"
        );

        PartitionedDataset::new(rows, self.base_dir.clone(), partition)
    }
}
