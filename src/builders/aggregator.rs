use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::builders::comparator::ComparisonResult;
use crate::builders::reporter::write_file;
use crate::core::config::{ComparisonKind, Pass};

/// File-name prefix and column labels of a comparison kind's summaries.
struct SummaryLayout {
    prefix: &'static str,
    title: &'static str,
    column: &'static str,
    sum_label: &'static str,
}

fn layout(kind: ComparisonKind) -> SummaryLayout {
    match kind {
        ComparisonKind::Ids => SummaryLayout {
            prefix: "ids_presence",
            title: "IDs presence summary",
            column: "TOTAL_MISSING_UNIQUE",
            sum_label: "SUM_OF_PER_SOURCE_MISSING_COUNTS",
        },
        ComparisonKind::Lines => SummaryLayout {
            prefix: "lines_missing",
            title: "Missing lines summary",
            column: "TOTAL_MISSING_LINES",
            sum_label: "SUM_OF_PER_SOURCE_MISSING_COUNTS",
        },
        ComparisonKind::Diff => SummaryLayout {
            prefix: "sequence_diff",
            title: "Sequence diff summary",
            column: "TOTAL_DIFFERENCES",
            sum_label: "SUM_OF_PER_SOURCE_DIFFERENCES",
        },
    }
}

/// Totals for one pass, derived from all of its per-source results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassSummary {
    pub pass_label: String,
    pub kind: ComparisonKind,
    /// Sorted by source name.
    pub per_source_counts: Vec<(String, usize)>,
    pub grand_total: usize,
    /// Distinct missing values across sources; only filled for `ids`.
    pub union_of_missing: BTreeSet<String>,
}

impl PassSummary {
    pub fn from_results(pass: Pass, kind: ComparisonKind, results: &[ComparisonResult]) -> Self {
        let mut per_source_counts: Vec<(String, usize)> = results
            .iter()
            .map(|r| (r.source_name.clone(), r.total_missing))
            .collect();
        per_source_counts.sort();

        let grand_total = per_source_counts.iter().map(|(_, n)| n).sum();
        let union_of_missing = match kind {
            ComparisonKind::Ids => results
                .iter()
                .flat_map(|r| r.missing_values.iter().cloned())
                .collect(),
            ComparisonKind::Lines | ComparisonKind::Diff => BTreeSet::new(),
        };

        Self {
            pass_label: pass.label().to_string(),
            kind,
            per_source_counts,
            grand_total,
            union_of_missing,
        }
    }

    pub fn file_name(&self) -> String {
        summary_file_name(self.kind, &self.pass_label)
    }

    pub fn render(&self, generated_at: &str) -> String {
        let layout = layout(self.kind);
        let mut out = String::new();
        out.push_str(&format!("# {} - pass: {}\n", layout.title, self.pass_label));
        out.push_str(&format!("# Run timestamp: {generated_at}\n\n"));

        if self.per_source_counts.is_empty() {
            out.push_str("# No results (no source or target files?)\n");
            return out;
        }

        out.push_str(&format!("SOURCE_FILE,{}\n", layout.column));
        for (source, count) in &self.per_source_counts {
            out.push_str(&format!("{source},{count}\n"));
        }
        out.push('\n');
        out.push_str(&format!("{},{}\n", layout.sum_label, self.grand_total));

        if self.kind == ComparisonKind::Ids {
            out.push_str(&format!(
                "UNIQUE_MISSING_IDS_ACROSS_ALL_SOURCES,{}\n",
                self.union_of_missing.len()
            ));
            out.push('\n');
            if !self.union_of_missing.is_empty() {
                out.push_str("# List of unique missing IDs across all sources (one per line):\n");
                for value in &self.union_of_missing {
                    out.push_str(value);
                    out.push('\n');
                }
            }
        }
        out
    }

    pub fn write(&self, output_dir: &Path, generated_at: &str) -> Result<PathBuf> {
        let path = output_dir.join(self.file_name());
        write_file(&path, &self.render(generated_at))?;
        Ok(path)
    }
}

pub fn summary_file_name(kind: ComparisonKind, pass_label: &str) -> String {
    format!("{}_summary.{pass_label}.summary.txt", layout(kind).prefix)
}

pub fn master_file_name(kind: ComparisonKind) -> String {
    format!("{}_master_summary.txt", layout(kind).prefix)
}

/// Concatenates the given pass summaries byte for byte into the master file.
pub fn write_master_summary(
    output_dir: &Path,
    kind: ComparisonKind,
    summaries: &[PathBuf],
) -> Result<PathBuf> {
    let mut combined = String::new();
    for path in summaries {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read summary {}", path.display()))?;
        combined.push_str(&content);
    }
    let master = output_dir.join(master_file_name(kind));
    write_file(&master, &combined)?;
    Ok(master)
}
