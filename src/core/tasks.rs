use anyhow::Result;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::builders::comparator::{
    align_sequences, classify_tokens, missing_lines, ComparisonResult, DiffRecord, Presence,
};
use crate::builders::extractor::{extract_line_records, extract_token_records, open_line_records};
use crate::builders::reporter::{
    self, render_count, render_diff_report, render_missing_ids_report,
    render_missing_lines_report, render_per_target_report, render_presence_report,
    render_source_error, suffix, ReportHeader, ReportWriter, TargetOutcome,
};
use crate::builders::target_index::{file_name, TargetIndex, TargetSet};
use crate::core::config::DiffTargets;

/// The work done for one source file inside the worker pool.
///
/// Implementations only read shared state; everything they write goes to
/// files named after their own source.
pub trait SourceTask: Sync {
    fn process(&self, source: &Path) -> Result<ComparisonResult>;
}

fn header(source: &Path, source_name: &str, target_label: &str) -> ReportHeader {
    ReportHeader {
        source_path: source.to_path_buf(),
        source_name: source_name.to_string(),
        target_label: target_label.to_string(),
        generated_at: reporter::timestamp(),
    }
}

/// Records an unreadable source as an error artifact and a zero result.
fn source_failed(
    writer: &ReportWriter,
    source: &Path,
    source_name: String,
    error_suffix: &str,
    reason: String,
) -> Result<ComparisonResult> {
    warn!("cannot read source {}: {reason}", source.display());
    let content = render_source_error(source, &reason);
    let path = writer.write(&source_name, error_suffix, &content)?;
    Ok(ComparisonResult::empty(source_name, vec![path]))
}

/// Checks every 12-digit ID of a source against the target folder union.
pub struct IdPresenceTask<'a> {
    pub index: &'a TargetIndex,
    pub writer: &'a ReportWriter,
    pub target_label: String,
}

impl SourceTask for IdPresenceTask<'_> {
    fn process(&self, source: &Path) -> Result<ComparisonResult> {
        let source_name = file_name(source);
        let records = match extract_token_records(source) {
            Ok(records) => records,
            Err(e) => {
                return source_failed(
                    self.writer,
                    source,
                    source_name,
                    suffix::IDS_ERROR,
                    e.to_string(),
                );
            }
        };

        let classified = classify_tokens(records, self.index);
        let header = header(source, &source_name, &self.target_label);
        let missing_values: Vec<String> = classified
            .iter()
            .filter(|t| t.presence == Presence::NotFound)
            .map(|t| t.record.value.clone())
            .collect();
        let total_missing = missing_values.len();

        let artifacts = vec![
            self.writer.write(
                &source_name,
                suffix::IDS_PRESENCE,
                &render_presence_report(&header, &classified),
            )?,
            self.writer.write(
                &source_name,
                suffix::IDS_MISSING,
                &render_missing_ids_report(&header, &classified),
            )?,
            self.writer.write(&source_name, suffix::IDS_COUNT, &render_count(total_missing))?,
        ];
        debug!(
            source = %source_name,
            ids = classified.len(),
            missing = total_missing,
            "checked ids"
        );

        Ok(ComparisonResult {
            counts: BTreeMap::from([(self.target_label.clone(), total_missing)]),
            source_name,
            missing_values,
            total_missing,
            artifacts,
        })
    }
}

/// Lists source lines absent from the target folder, with a per-target count.
pub struct MissingLineTask<'a> {
    pub targets: &'a TargetSet,
    pub writer: &'a ReportWriter,
    pub target_label: String,
}

impl SourceTask for MissingLineTask<'_> {
    fn process(&self, source: &Path) -> Result<ComparisonResult> {
        let source_name = file_name(source);
        let records = match extract_line_records(source) {
            Ok(records) => records,
            Err(e) => {
                return source_failed(
                    self.writer,
                    source,
                    source_name,
                    suffix::LINES_ERROR,
                    e.to_string(),
                );
            }
        };

        let missing = missing_lines(&records, self.targets.union());
        let mut counts = BTreeMap::new();
        let per_target: Vec<(String, TargetOutcome<usize>)> = self
            .targets
            .entries()
            .iter()
            .map(|entry| {
                let outcome = match &entry.index {
                    Ok(index) => {
                        let count = missing_lines(&records, index).len();
                        counts.insert(entry.name.clone(), count);
                        TargetOutcome::Compared(count)
                    }
                    Err(reason) => TargetOutcome::Unreadable(reason.clone()),
                };
                (entry.name.clone(), outcome)
            })
            .collect();

        let header = header(source, &source_name, &self.target_label);
        let total_missing = missing.len();
        let artifacts = vec![
            self.writer.write(
                &source_name,
                suffix::LINES_MISSING,
                &render_missing_lines_report(&header, &missing),
            )?,
            self.writer.write(&source_name, suffix::LINES_COUNT, &render_count(total_missing))?,
            self.writer.write(
                &source_name,
                suffix::LINES_BY_TARGET,
                &render_per_target_report(&header, &per_target),
            )?,
        ];

        Ok(ComparisonResult {
            missing_values: missing.iter().map(|r| r.content.clone()).collect(),
            source_name,
            counts,
            total_missing,
            artifacts,
        })
    }
}

/// Aligns a source against one or more target files position by position.
pub struct SequenceDiffTask<'a> {
    pub targets: &'a [PathBuf],
    pub scope: DiffTargets,
    pub writer: &'a ReportWriter,
    pub target_label: String,
}

impl SequenceDiffTask<'_> {
    fn selected_targets(&self, source_name: &str) -> Vec<(String, Option<&Path>)> {
        match self.scope {
            DiffTargets::All => self
                .targets
                .iter()
                .map(|t| (file_name(t), Some(t.as_path())))
                .collect(),
            DiffTargets::SameName => {
                let counterpart = self
                    .targets
                    .iter()
                    .find(|t| file_name(t) == source_name)
                    .map(PathBuf::as_path);
                vec![(source_name.to_string(), counterpart)]
            }
        }
    }
}

impl SourceTask for SequenceDiffTask<'_> {
    fn process(&self, source: &Path) -> Result<ComparisonResult> {
        let source_name = file_name(source);
        let records = match extract_line_records(source) {
            Ok(records) => records,
            Err(e) => {
                return source_failed(
                    self.writer,
                    source,
                    source_name,
                    suffix::DIFF_ERROR,
                    e.to_string(),
                );
            }
        };

        let mut counts = BTreeMap::new();
        let mut sections: Vec<(String, TargetOutcome<Vec<DiffRecord>>)> = Vec::new();
        for (name, target) in self.selected_targets(&source_name) {
            let Some(target) = target else {
                warn!("no counterpart for {source_name} in {}", self.target_label);
                sections.push((name, TargetOutcome::NoCounterpart));
                continue;
            };
            let aligned = open_line_records(target)
                .and_then(|stream| align_sequences(records.iter().cloned().map(Ok), stream));
            let outcome = match aligned {
                Ok(diffs) => {
                    counts.insert(name.clone(), diffs.len());
                    TargetOutcome::Compared(diffs)
                }
                Err(e) => {
                    warn!("cannot read target {}: {e}", target.display());
                    TargetOutcome::Unreadable(e.to_string())
                }
            };
            sections.push((name, outcome));
        }

        let header = header(source, &source_name, &self.target_label);
        let total_missing = counts.values().sum();
        let artifacts = vec![
            self.writer.write(
                &source_name,
                suffix::DIFF,
                &render_diff_report(&header, &sections),
            )?,
            self.writer.write(&source_name, suffix::DIFF_COUNT, &render_count(total_missing))?,
        ];

        Ok(ComparisonResult {
            source_name,
            missing_values: Vec::new(),
            counts,
            total_missing,
            artifacts,
        })
    }
}
