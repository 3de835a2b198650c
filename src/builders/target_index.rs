use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::builders::extractor::{open_line_records, open_raw_lines, tokens_in_line};
use crate::core::error::CompareResult;

/// Which values a [`TargetIndex`] holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    /// 12-digit tokens found anywhere in a line.
    Tokens,
    /// Whole non-empty lines, newline stripped.
    Lines,
}

/// A read-only membership set built from one or more target files.
///
/// There is no way to insert once construction returns, so one index can be
/// shared by reference across every worker of a pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetIndex {
    values: HashSet<String>,
}

impl TargetIndex {
    pub fn contains(&self, value: &str) -> bool {
        self.values.contains(value)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Scans a single file. A read failure fails the whole file.
    pub fn from_file(path: &Path, kind: IndexKind) -> CompareResult<Self> {
        let mut values = HashSet::new();
        match kind {
            IndexKind::Tokens => {
                for line in open_raw_lines(path)? {
                    let (_, line) = line?;
                    values.extend(tokens_in_line(&line).map(str::to_string));
                }
            }
            IndexKind::Lines => {
                for record in open_line_records(path)? {
                    values.insert(record?.content);
                }
            }
        }
        debug!(path = %path.display(), values = values.len(), "indexed target file");
        Ok(Self { values })
    }

    /// Builds the union over `files`. Unreadable files are logged and
    /// skipped; the union of the remaining files is still returned.
    pub fn from_files(files: &[PathBuf], kind: IndexKind) -> Self {
        let mut values = HashSet::new();
        for path in files {
            match Self::from_file(path, kind) {
                Ok(index) => values.extend(index.values),
                Err(e) => warn!("cannot read {}: {e}", path.display()),
            }
        }
        Self { values }
    }

    pub fn union<'a>(indices: impl IntoIterator<Item = &'a TargetIndex>) -> Self {
        let mut values = HashSet::new();
        for index in indices {
            values.extend(index.values.iter().cloned());
        }
        Self { values }
    }
}

impl<S: Into<String>> FromIterator<S> for TargetIndex {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// One target file's index, or the reason it could not be read.
#[derive(Debug)]
pub struct TargetEntry {
    pub name: String,
    pub path: PathBuf,
    pub index: Result<TargetIndex, String>,
}

/// Per-file indices for a target folder together with their union.
///
/// Each target file is read exactly once; the union only merges the
/// entries that were readable.
#[derive(Debug)]
pub struct TargetSet {
    entries: Vec<TargetEntry>,
    union: TargetIndex,
}

impl TargetSet {
    pub fn build(files: &[PathBuf], kind: IndexKind) -> Self {
        let entries: Vec<TargetEntry> = files
            .iter()
            .map(|path| {
                let index = TargetIndex::from_file(path, kind).map_err(|e| {
                    warn!("cannot read {}: {e}", path.display());
                    e.to_string()
                });
                TargetEntry {
                    name: file_name(path),
                    path: path.clone(),
                    index,
                }
            })
            .collect();
        let union = TargetIndex::union(entries.iter().filter_map(|e| e.index.as_ref().ok()));
        Self { entries, union }
    }

    pub fn entries(&self) -> &[TargetEntry] {
        &self.entries
    }

    pub fn union(&self) -> &TargetIndex {
        &self.union
    }
}

pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
