use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use crate::builders::extractor::{LineRecord, TokenRecord};
use crate::builders::target_index::TargetIndex;
use crate::core::error::CompareResult;

/// Whether a token of the source was seen in the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Found,
    NotFound,
}

impl fmt::Display for Presence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Presence::Found => write!(f, "FOUND"),
            Presence::NotFound => write!(f, "NOT_FOUND"),
        }
    }
}

/// A source token and its classification against a target index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedToken {
    pub record: TokenRecord,
    pub presence: Presence,
}

/// Classifies each distinct token. Input order is kept, which is ascending
/// by value when the records come from the extractor.
pub fn classify_tokens(records: Vec<TokenRecord>, index: &TargetIndex) -> Vec<ClassifiedToken> {
    records
        .into_iter()
        .map(|record| {
            let presence = if index.contains(&record.value) {
                Presence::Found
            } else {
                Presence::NotFound
            };
            ClassifiedToken { record, presence }
        })
        .collect()
}

/// Returns the source lines whose content is absent from `index`, in file
/// order. Repeated lines are reported once per physical line.
pub fn missing_lines<'a>(records: &'a [LineRecord], index: &TargetIndex) -> Vec<&'a LineRecord> {
    records
        .iter()
        .filter(|record| !index.contains(&record.content))
        .collect()
}

/// The side of an alignment that holds an unmatched line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Source,
    Target,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Source => write!(f, "source"),
            Side::Target => write!(f, "target"),
        }
    }
}

/// A single difference found by [`align_sequences`].
///
/// `position` is the 1-based index among non-empty lines, which is what the
/// two sides are aligned on; the records keep their original line numbers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffRecord {
    Mismatch {
        position: usize,
        source: LineRecord,
        target: LineRecord,
    },
    Extra {
        position: usize,
        side: Side,
        line: LineRecord,
    },
}

/// Walks both non-empty-line sequences in lockstep and reports every
/// position where they differ.
///
/// There is no resynchronisation: one inserted line shifts every later
/// comparison by one position. Equal positions produce no output. The walk
/// ends once both sides are exhausted; the first read error stops it.
pub fn align_sequences<S, T>(source: S, target: T) -> CompareResult<Vec<DiffRecord>>
where
    S: IntoIterator<Item = CompareResult<LineRecord>>,
    T: IntoIterator<Item = CompareResult<LineRecord>>,
{
    let mut source = source.into_iter();
    let mut target = target.into_iter();
    let mut diffs = Vec::new();
    let mut position = 0;

    loop {
        let left = source.next().transpose()?;
        let right = target.next().transpose()?;
        position += 1;

        match (left, right) {
            (None, None) => break,
            (Some(source), Some(target)) => {
                if source.content != target.content {
                    diffs.push(DiffRecord::Mismatch {
                        position,
                        source,
                        target,
                    });
                }
            }
            (Some(line), None) => diffs.push(DiffRecord::Extra {
                position,
                side: Side::Source,
                line,
            }),
            (None, Some(line)) => diffs.push(DiffRecord::Extra {
                position,
                side: Side::Target,
                line,
            }),
        }
    }

    Ok(diffs)
}

/// What one per-source task hands back to the aggregator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComparisonResult {
    pub source_name: String,
    /// Missing token values (ascending) or missing line contents (file order).
    pub missing_values: Vec<String>,
    /// Per-target totals; unreadable targets have no entry.
    pub counts: BTreeMap<String, usize>,
    pub total_missing: usize,
    /// Report files written for this source.
    pub artifacts: Vec<PathBuf>,
}

impl ComparisonResult {
    /// The zero result recorded when the source itself could not be read.
    pub fn empty(source_name: impl Into<String>, artifacts: Vec<PathBuf>) -> Self {
        Self {
            source_name: source_name.into(),
            artifacts,
            ..Self::default()
        }
    }
}
