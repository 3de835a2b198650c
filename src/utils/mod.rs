use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::config::{ConfigManager, ConfigProvider, RunOverrides};
use crate::core::engine::CompareEngine;
use crate::core::error::{CompareError, CompareResult};

/// Returns the regular files of `folder` whose extension matches
/// `extension` case-insensitively, sorted by path. Subdirectories are not
/// descended into.
pub fn gather_files(folder: &Path, extension: &str) -> CompareResult<Vec<PathBuf>> {
    if !folder.is_dir() {
        return Err(CompareError::MissingFolder(folder.to_path_buf()));
    }

    let entries = fs::read_dir(folder).map_err(|e| CompareError::file_read(folder, e))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| CompareError::file_read(folder, e))?.path();
        let matches = path
            .extension()
            .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case(extension));
        if matches && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

pub fn initialize_config(config_manager: &ConfigManager) -> Result<()> {
    config_manager.initialize()?;
    println!(
        "✓ Configuration ready at {}",
        config_manager.get_config_path().display()
    );
    println!("Edit folder_a, folder_b and output_dir, then run 'folder-compare run'");
    Ok(())
}

pub fn validate_config(config_manager: &ConfigManager) -> Result<()> {
    config_manager.validate_config()
}

pub fn run_comparison(config_manager: &ConfigManager, overrides: RunOverrides) -> Result<()> {
    let config = config_manager.load_config()?.with_overrides(overrides);
    let engine = CompareEngine::new(config)?;
    let report = engine.run()?;

    println!("\n📁 Output files:");
    for path in report.summary_paths() {
        println!("  - {}", path.display());
    }
    if let Some(master) = &report.master_summary {
        println!("  - {}", master.display());
    }
    println!(
        "  + {} per-source report file(s) in {}",
        report.per_source_artifacts(),
        engine.config().output_dir.display()
    );
    Ok(())
}
