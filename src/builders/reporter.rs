use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::builders::comparator::{ClassifiedToken, DiffRecord, Presence};
use crate::builders::extractor::LineRecord;

/// Longest part of a source line kept in an occurrence snippet.
const SNIPPET_LIMIT: usize = 120;

/// Header timestamp in local time.
pub fn timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Suffixes appended to the source file name for each report kind.
pub mod suffix {
    pub const IDS_PRESENCE: &str = "ids_presence.txt";
    pub const IDS_MISSING: &str = "ids_missing.txt";
    pub const IDS_COUNT: &str = "ids_missing.count.txt";
    pub const IDS_ERROR: &str = "ids_error.txt";
    pub const LINES_MISSING: &str = "lines_missing.txt";
    pub const LINES_COUNT: &str = "lines_missing.count.txt";
    pub const LINES_BY_TARGET: &str = "lines_by_target.txt";
    pub const LINES_ERROR: &str = "lines_error.txt";
    pub const DIFF: &str = "diff.txt";
    pub const DIFF_COUNT: &str = "diff.count.txt";
    pub const DIFF_ERROR: &str = "diff_error.txt";
}

/// Identity lines shared by every per-source report.
#[derive(Debug, Clone)]
pub struct ReportHeader {
    pub source_path: PathBuf,
    pub source_name: String,
    pub target_label: String,
    pub generated_at: String,
}

/// Outcome of one target inside a multi-target report.
#[derive(Debug)]
pub enum TargetOutcome<T> {
    Compared(T),
    Unreadable(String),
    /// No target file matched the source, only used by same-name diffs.
    NoCounterpart,
}

/// Writes one pass's per-source reports into the output directory.
///
/// File names are `<source>.<target_tag>.<suffix>`. Sources are unique
/// within a folder and each pass gets its own tag, so neither concurrent
/// tasks nor the two passes of a `BOTH` run share a path.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    output_dir: PathBuf,
    target_tag: String,
}

impl ReportWriter {
    pub fn new(output_dir: impl Into<PathBuf>, target_tag: impl Into<String>) -> Self {
        Self {
            output_dir: output_dir.into(),
            target_tag: target_tag.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn path_for(&self, source_name: &str, suffix: &str) -> PathBuf {
        self.output_dir
            .join(format!("{source_name}.{}.{suffix}", self.target_tag))
    }

    pub fn write(&self, source_name: &str, suffix: &str, content: &str) -> Result<PathBuf> {
        let path = self.path_for(source_name, suffix);
        write_file(&path, content)?;
        Ok(path)
    }
}

pub fn write_file(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content).with_context(|| format!("Failed to write report {}", path.display()))
}

fn snippet(line: &str) -> String {
    let cut: String = if line.chars().count() > SNIPPET_LIMIT {
        let head: String = line.chars().take(SNIPPET_LIMIT).collect();
        format!("{head}...")
    } else {
        line.to_string()
    };
    cut.replace(',', " ")
}

fn push_header(out: &mut String, header: &ReportHeader, target_caption: &str) {
    out.push_str(&format!("# Source file: {}\n", header.source_path.display()));
    out.push_str(&format!("# {target_caption}: {}\n", header.target_label));
}

pub fn render_presence_report(header: &ReportHeader, tokens: &[ClassifiedToken]) -> String {
    let mut out = String::new();
    out.push_str("# ID presence report\n");
    push_header(&mut out, header, "Target folder (union)");
    out.push_str(&format!("# Run timestamp: {}\n\n", header.generated_at));

    if tokens.is_empty() {
        out.push_str("# NOTE: No 12-digit IDs found in source file.\n");
        return out;
    }

    out.push_str("ID,STATUS,occurrences\n");
    for token in tokens {
        let occurrences: Vec<String> = token
            .record
            .occurrences
            .iter()
            .map(|o| format!("{}:{}", o.line_number, snippet(&o.raw_line)))
            .collect();
        out.push_str(&format!(
            "{},{},\"{}\"\n",
            token.record.value,
            token.presence,
            occurrences.join(" | ")
        ));
    }
    out
}

pub fn render_missing_ids_report(header: &ReportHeader, tokens: &[ClassifiedToken]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "# Missing IDs from source: {} (not present in {})\n",
        header.source_name, header.target_label
    ));
    out.push_str(&format!("# Run timestamp: {}\n\n", header.generated_at));

    let missing: Vec<&ClassifiedToken> = tokens
        .iter()
        .filter(|t| t.presence == Presence::NotFound)
        .collect();
    if missing.is_empty() {
        out.push_str("# (none) - all IDs present in target folder union.\n");
        return out;
    }

    for token in missing {
        let lines: Vec<String> = token
            .record
            .occurrences
            .iter()
            .map(|o| o.line_number.to_string())
            .collect();
        out.push_str(&token.record.value);
        if !lines.is_empty() {
            out.push_str("  # src_lines: ");
            out.push_str(&lines.join("; "));
        }
        out.push('\n');
    }
    out
}

pub fn render_missing_lines_report(header: &ReportHeader, missing: &[&LineRecord]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "# Missing lines from source: {} (not present in {})\n",
        header.source_name, header.target_label
    ));
    out.push_str(&format!("# Source file: {}\n", header.source_path.display()));
    out.push_str(&format!("# Run timestamp: {}\n\n", header.generated_at));

    if missing.is_empty() {
        out.push_str("# (none) - every line is present in the target folder.\n");
        return out;
    }

    for record in missing {
        out.push_str(&format!(
            "line {}: {}\n",
            record.original_line_number, record.content
        ));
    }
    out
}

pub fn render_per_target_report(
    header: &ReportHeader,
    targets: &[(String, TargetOutcome<usize>)],
) -> String {
    let mut out = String::new();
    out.push_str("# Missing lines per target file\n");
    push_header(&mut out, header, "Target folder");
    out.push_str(&format!("# Run timestamp: {}\n\n", header.generated_at));

    out.push_str("TARGET_FILE,MISSING_LINES\n");
    let mut total = 0;
    for (name, outcome) in targets {
        match outcome {
            TargetOutcome::Compared(count) => {
                total += count;
                out.push_str(&format!("{name},{count}\n"));
            }
            TargetOutcome::Unreadable(reason) => {
                out.push_str(&format!("# ERROR reading target {name}: {reason}\n"));
            }
            TargetOutcome::NoCounterpart => {}
        }
    }
    out.push_str(&format!("\nTOTAL_ACROSS_TARGETS,{total}\n"));
    out
}

pub fn render_diff_report(
    header: &ReportHeader,
    targets: &[(String, TargetOutcome<Vec<DiffRecord>>)],
) -> String {
    let mut out = String::new();
    out.push_str("# Sequence diff report\n");
    push_header(&mut out, header, "Target folder");
    out.push_str(&format!("# Run timestamp: {}\n", header.generated_at));
    out.push_str("# Non-empty lines are compared by position without realignment.\n");

    if targets.is_empty() {
        out.push_str("\n# NOTE: No target files to compare against.\n");
        return out;
    }

    for (name, outcome) in targets {
        out.push_str(&format!("\n=== Target: {name} ===\n"));
        match outcome {
            TargetOutcome::Compared(diffs) if diffs.is_empty() => {
                out.push_str("# identical\n");
            }
            TargetOutcome::Compared(diffs) => {
                for diff in diffs {
                    render_diff_record(&mut out, diff);
                }
                out.push_str(&format!("# {} difference(s)\n", diffs.len()));
            }
            TargetOutcome::Unreadable(reason) => {
                out.push_str(&format!("# ERROR reading target {name}: {reason}\n"));
            }
            TargetOutcome::NoCounterpart => {
                out.push_str("# NOTE: No file with this name in the target folder.\n");
            }
        }
    }
    out
}

fn render_diff_record(out: &mut String, diff: &DiffRecord) {
    match diff {
        DiffRecord::Mismatch {
            position,
            source,
            target,
        } => {
            out.push_str(&format!("MISMATCH position {position}\n"));
            out.push_str(&format!(
                "  source line {}: {}\n",
                source.original_line_number, source.content
            ));
            out.push_str(&format!(
                "  target line {}: {}\n",
                target.original_line_number, target.content
            ));
        }
        DiffRecord::Extra {
            position,
            side,
            line,
        } => {
            out.push_str(&format!(
                "EXTRA {side} position {position} line {}: {}\n",
                line.original_line_number, line.content
            ));
        }
    }
}

pub fn render_count(count: usize) -> String {
    format!("{count}\n")
}

pub fn render_source_error(source_path: &Path, reason: &str) -> String {
    format!("ERROR reading source file {}: {reason}\n", source_path.display())
}
