use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::builders::validator::{ConfigValidator, StandardValidator};
use crate::core::error::CompareError;

pub const DEFAULT_CONFIG_FILE: &str = "folder-compare.toml";
pub const DEFAULT_WORKERS: usize = 4;

/// Which directions to run. Parsed case-insensitively from the config string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    AToB,
    BToA,
    Both,
}

impl FromStr for Mode {
    type Err = CompareError;

    fn from_str(raw: &str) -> std::result::Result<Self, Self::Err> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "A_TO_B" => Ok(Mode::AToB),
            "B_TO_A" => Ok(Mode::BToA),
            "BOTH" => Ok(Mode::Both),
            _ => Err(CompareError::InvalidMode(raw.to_string())),
        }
    }
}

impl Mode {
    /// The passes this mode expands to, in execution order.
    pub fn passes(self) -> Vec<Pass> {
        match self {
            Mode::AToB => vec![Pass::AToB],
            Mode::BToA => vec![Pass::BToA],
            Mode::Both => vec![Pass::AToB, Pass::BToA],
        }
    }
}

/// One directional comparison run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Pass {
    AToB,
    BToA,
}

impl Pass {
    pub fn label(self) -> &'static str {
        match self {
            Pass::AToB => "A_to_B",
            Pass::BToA => "B_to_A",
        }
    }

    /// Returns `(source, target)` folders for this direction.
    pub fn folders(self, config: &CompareConfig) -> (&Path, &Path) {
        match self {
            Pass::AToB => (config.folder_a.as_path(), config.folder_b.as_path()),
            Pass::BToA => (config.folder_b.as_path(), config.folder_a.as_path()),
        }
    }
}

impl fmt::Display for Pass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Selects which comparison algorithm and report family a run produces.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonKind {
    /// 12-digit identifier presence against the target folder union.
    Ids,
    /// Missing non-empty lines against the target folder, with per-target counts.
    Lines,
    /// Position-by-position alignment of non-empty lines.
    Diff,
}

impl FromStr for ComparisonKind {
    type Err = String;

    fn from_str(raw: &str) -> std::result::Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "ids" => Ok(ComparisonKind::Ids),
            "lines" => Ok(ComparisonKind::Lines),
            "diff" => Ok(ComparisonKind::Diff),
            other => Err(format!(
                "unknown comparison '{other}' (expected ids, lines or diff)"
            )),
        }
    }
}

impl fmt::Display for ComparisonKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComparisonKind::Ids => write!(f, "ids"),
            ComparisonKind::Lines => write!(f, "lines"),
            ComparisonKind::Diff => write!(f, "diff"),
        }
    }
}

/// Which target files a source is aligned against in `diff` mode.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DiffTargets {
    /// The target file carrying the same file name as the source.
    #[default]
    SameName,
    /// Every target file, in folder listing order.
    All,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct CompareConfig {
    pub folder_a: PathBuf,
    pub folder_b: PathBuf,
    pub output_dir: PathBuf,
    /// Kept as a string so an unknown value surfaces as a configuration
    /// error when the run starts instead of a parse failure.
    pub mode: String,
    pub workers: usize,
    pub comparison: ComparisonKind,
    pub extension: String,
    pub diff_targets: DiffTargets,
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            folder_a: PathBuf::from("folder_a"),
            folder_b: PathBuf::from("folder_b"),
            output_dir: PathBuf::from("output"),
            mode: "A_to_B".to_string(),
            workers: DEFAULT_WORKERS,
            comparison: ComparisonKind::Ids,
            extension: "txt".to_string(),
            diff_targets: DiffTargets::SameName,
        }
    }
}

/// Values supplied on the command line that take precedence over the file.
#[derive(Debug, Default, Clone)]
pub struct RunOverrides {
    pub mode: Option<String>,
    pub workers: Option<usize>,
    pub comparison: Option<ComparisonKind>,
}

impl CompareConfig {
    pub fn with_overrides(mut self, overrides: RunOverrides) -> Self {
        if let Some(mode) = overrides.mode {
            self.mode = mode;
        }
        if let Some(workers) = overrides.workers {
            self.workers = workers;
        }
        if let Some(comparison) = overrides.comparison {
            self.comparison = comparison;
        }
        self
    }

    pub fn parsed_mode(&self) -> std::result::Result<Mode, CompareError> {
        self.mode.parse()
    }

    /// The extension filter, lowercased and without a leading dot.
    pub fn extension_filter(&self) -> String {
        self.extension
            .trim()
            .trim_start_matches('.')
            .to_ascii_lowercase()
    }
}

pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Uses `folder-compare.toml` in the current working directory.
    pub fn new() -> Result<Self> {
        let current_dir = std::env::current_dir().context("Failed to resolve working directory")?;
        Ok(Self::new_at(current_dir.join(DEFAULT_CONFIG_FILE)))
    }

    pub fn new_at(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
        }
    }

    pub fn initialize(&self) -> Result<()> {
        if self.config_path.exists() {
            return Ok(());
        }

        let default_config = CompareConfig::default();
        self.save_config(&default_config)?;
        Ok(())
    }

    pub fn validate_config(&self) -> Result<()> {
        let config = self.load_config()?;
        let validator = StandardValidator::new();
        let issues = validator.validate_config(&config)?;

        if issues.is_empty() {
            println!("✓ Configuration is valid.");
            Ok(())
        } else {
            println!("⚠️  Found issues in configuration:");
            for issue in issues {
                println!("  - {issue}");
            }
            anyhow::bail!("Configuration validation failed.");
        }
    }
}

pub trait ConfigProvider {
    fn load_config(&self) -> Result<CompareConfig>;
    fn save_config(&self, config: &CompareConfig) -> Result<()>;
    fn get_config_path(&self) -> &Path;
}

impl ConfigProvider for ConfigManager {
    fn load_config(&self) -> Result<CompareConfig> {
        if !self.config_path.exists() {
            return Ok(CompareConfig::default());
        }

        let content = fs::read_to_string(&self.config_path).with_context(|| {
            format!("Failed to read config file {}", self.config_path.display())
        })?;

        toml::from_str(&content).context("Failed to parse config file")
    }

    fn save_config(&self, config: &CompareConfig) -> Result<()> {
        let content = toml::to_string_pretty(config).context("Failed to serialize config")?;

        if let Some(parent) = self.config_path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
        fs::write(&self.config_path, content).context("Failed to write config file")?;

        Ok(())
    }

    fn get_config_path(&self) -> &Path {
        &self.config_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_mode_parsing_is_case_insensitive() {
        assert_eq!("a_to_b".parse::<Mode>().unwrap(), Mode::AToB);
        assert_eq!(" B_TO_A ".parse::<Mode>().unwrap(), Mode::BToA);
        assert_eq!("Both".parse::<Mode>().unwrap(), Mode::Both);
        assert!(matches!(
            "sideways".parse::<Mode>(),
            Err(CompareError::InvalidMode(_))
        ));
    }

    #[test]
    fn test_both_mode_runs_forward_pass_first() {
        assert_eq!(Mode::Both.passes(), vec![Pass::AToB, Pass::BToA]);
        assert_eq!(Pass::BToA.label(), "B_to_A");
    }

    #[test]
    fn test_pass_swaps_folders() {
        let config = CompareConfig::default();
        let (source, target) = Pass::BToA.folders(&config);
        assert_eq!(source, Path::new("folder_b"));
        assert_eq!(target, Path::new("folder_a"));
    }

    #[test]
    fn test_initialize_writes_defaults_once() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("cfg.toml");
        let manager = ConfigManager::new_at(&path);
        manager.initialize().unwrap();
        assert!(path.exists());

        let mut config = manager.load_config().unwrap();
        assert_eq!(config.workers, DEFAULT_WORKERS);
        assert_eq!(config.comparison, ComparisonKind::Ids);

        config.workers = 9;
        manager.save_config(&config).unwrap();
        manager.initialize().unwrap();
        assert_eq!(manager.load_config().unwrap().workers, 9);
    }

    #[test]
    fn test_partial_file_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cfg.toml");
        fs::write(&path, "mode = \"BOTH\"\ncomparison = \"diff\"\n").unwrap();

        let config = ConfigManager::new_at(&path).load_config().unwrap();
        assert_eq!(config.parsed_mode().unwrap(), Mode::Both);
        assert_eq!(config.comparison, ComparisonKind::Diff);
        assert_eq!(config.diff_targets, DiffTargets::SameName);
        assert_eq!(config.extension, "txt");
    }

    #[test]
    fn test_overrides_take_precedence() {
        let config = CompareConfig::default().with_overrides(RunOverrides {
            mode: Some("b_to_a".to_string()),
            workers: Some(2),
            comparison: Some(ComparisonKind::Lines),
        });
        assert_eq!(config.parsed_mode().unwrap(), Mode::BToA);
        assert_eq!(config.workers, 2);
        assert_eq!(config.comparison, ComparisonKind::Lines);
    }

    #[test]
    fn test_extension_filter_normalization() {
        let config = CompareConfig {
            extension: " .TXT".to_string(),
            ..CompareConfig::default()
        };
        assert_eq!(config.extension_filter(), "txt");
    }
}
