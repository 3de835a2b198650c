use anyhow::{Context, Result};
use rayon::prelude::*;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::builders::aggregator::{write_master_summary, PassSummary};
use crate::builders::comparator::ComparisonResult;
use crate::builders::reporter::{self, ReportWriter};
use crate::builders::target_index::{file_name, IndexKind, TargetIndex, TargetSet};
use crate::core::config::{CompareConfig, ComparisonKind, Mode, Pass};
use crate::core::error::CompareResult;
use crate::core::tasks::{IdPresenceTask, MissingLineTask, SequenceDiffTask, SourceTask};
use crate::utils::gather_files;

/// Everything one pass produced.
#[derive(Debug)]
pub struct PassOutcome {
    pub pass: Pass,
    pub summary: PassSummary,
    pub summary_path: PathBuf,
    /// Sorted by source name.
    pub results: Vec<ComparisonResult>,
}

/// The artifacts of a whole run, in the order they were written.
#[derive(Debug, Default)]
pub struct RunReport {
    pub passes: Vec<PassOutcome>,
    pub master_summary: Option<PathBuf>,
}

impl RunReport {
    pub fn summary_paths(&self) -> Vec<PathBuf> {
        self.passes.iter().map(|p| p.summary_path.clone()).collect()
    }

    pub fn per_source_artifacts(&self) -> usize {
        self.passes
            .iter()
            .flat_map(|p| &p.results)
            .map(|r| r.artifacts.len())
            .sum()
    }
}

pub struct CompareEngine {
    config: CompareConfig,
}

impl CompareEngine {
    /// Creates the output directory; failing to do so stops the run.
    pub fn new(config: CompareConfig) -> Result<Self> {
        fs::create_dir_all(&config.output_dir).with_context(|| {
            format!("Failed to create output directory {}", config.output_dir.display())
        })?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &CompareConfig {
        &self.config
    }

    /// Runs every pass the configured mode asks for.
    ///
    /// A bad mode stops before any pass runs. A pass that fails is logged and
    /// skipped while the remaining passes still run.
    pub fn run(&self) -> Result<RunReport> {
        let mut report = RunReport::default();
        let mode = match self.config.parsed_mode() {
            Ok(mode) => mode,
            Err(e) => {
                error!("{e}");
                return Ok(report);
            }
        };

        for pass in mode.passes() {
            match self.run_pass(pass) {
                Ok(outcome) => report.passes.push(outcome),
                Err(e) => error!("skipping pass {pass}: {e:#}"),
            }
        }

        if mode == Mode::Both && report.passes.len() == 2 {
            let master = write_master_summary(
                &self.config.output_dir,
                self.config.comparison,
                &report.summary_paths(),
            )?;
            println!("Master summary written: {}", master.display());
            report.master_summary = Some(master);
        }

        Ok(report)
    }

    /// Runs one direction: builds the target structure once, fans out one
    /// task per source file, then writes the pass summary.
    pub fn run_pass(&self, pass: Pass) -> Result<PassOutcome> {
        let (source_folder, target_folder) = pass.folders(&self.config);
        println!(
            "Running {pass}: {} -> {}",
            source_folder.display(),
            target_folder.display()
        );

        let extension = self.config.extension_filter();
        let source_files = gather_files(source_folder, &extension)?;
        let target_files = gather_files(target_folder, &extension)?;

        let results = if source_files.is_empty() {
            warn!("No .{extension} files found in source folder: {}", source_folder.display());
            Vec::new()
        } else if target_files.is_empty() {
            warn!("No .{extension} files found in target folder: {}", target_folder.display());
            Vec::new()
        } else {
            let writer = ReportWriter::new(
                &self.config.output_dir,
                report_tag(pass, source_folder, target_folder),
            );
            self.compare_files(&source_files, &target_files, target_folder, &writer)?
        };

        let summary = PassSummary::from_results(pass, self.config.comparison, &results);
        let summary_path = summary.write(&self.config.output_dir, &reporter::timestamp())?;
        println!("Summary for {pass} written: {}", summary_path.display());

        Ok(PassOutcome {
            pass,
            summary,
            summary_path,
            results,
        })
    }

    fn compare_files(
        &self,
        source_files: &[PathBuf],
        target_files: &[PathBuf],
        target_folder: &Path,
        writer: &ReportWriter,
    ) -> Result<Vec<ComparisonResult>> {
        let target_label = folder_label(target_folder, "target");
        let workers = self.config.workers;

        let results = match self.config.comparison {
            ComparisonKind::Ids => {
                println!(
                    "Building union of IDs from target folder: {} (this may take a while)...",
                    target_folder.display()
                );
                let index = TargetIndex::from_files(target_files, IndexKind::Tokens);
                println!("Done. Found {} unique 12-digit IDs in target folder.", index.len());
                let task = IdPresenceTask {
                    index: &index,
                    writer,
                    target_label,
                };
                fan_out(source_files, workers, &task)?
            }
            ComparisonKind::Lines => {
                let targets = TargetSet::build(target_files, IndexKind::Lines);
                info!(
                    targets = targets.entries().len(),
                    unique_lines = targets.union().len(),
                    "indexed target folder"
                );
                let task = MissingLineTask {
                    targets: &targets,
                    writer,
                    target_label,
                };
                fan_out(source_files, workers, &task)?
            }
            ComparisonKind::Diff => {
                let task = SequenceDiffTask {
                    targets: target_files,
                    scope: self.config.diff_targets,
                    writer,
                    target_label,
                };
                fan_out(source_files, workers, &task)?
            }
        };
        Ok(results)
    }
}

/// Submits one task per source file to a fixed-size pool and waits for all
/// of them. A failed or panicking task is logged with its file name and
/// dropped; its siblings are unaffected.
pub fn fan_out<T: SourceTask>(
    sources: &[PathBuf],
    workers: usize,
    task: &T,
) -> CompareResult<Vec<ComparisonResult>> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .build()?;

    let mut results: Vec<ComparisonResult> = pool.install(|| {
        sources
            .par_iter()
            .filter_map(|source| {
                match panic::catch_unwind(AssertUnwindSafe(|| task.process(source))) {
                    Ok(Ok(result)) => Some(result),
                    Ok(Err(e)) => {
                        error!("Error processing source file {}: {e:#}", source.display());
                        None
                    }
                    Err(_) => {
                        error!("Task for source file {} panicked", source.display());
                        None
                    }
                }
            })
            .collect()
    });

    results.sort_by(|a, b| a.source_name.cmp(&b.source_name));
    Ok(results)
}

fn folder_label(folder: &Path, fallback: &str) -> String {
    match folder.file_name() {
        Some(_) => file_name(folder),
        None => fallback.to_string(),
    }
}

/// Tag placed in per-source report names so the two passes never share a
/// file. Falls back to the pass label when both folders carry the same name.
fn report_tag(pass: Pass, source_folder: &Path, target_folder: &Path) -> String {
    let target = folder_label(target_folder, "target");
    if folder_label(source_folder, "source") == target {
        format!("{target}.{pass}")
    } else {
        target
    }
}
