use anyhow::Result;
use std::path::Path;

use crate::core::config::CompareConfig;

/// The `ConfigValidator` trait checks a run configuration before any work
/// starts and returns a list of human-readable issues.
pub trait ConfigValidator {
    /// Performs a full validation of the `CompareConfig`.
    ///
    /// # Returns
    /// A `Result<Vec<String>>` with one entry per issue; empty when the
    /// configuration can be run as-is.
    fn validate_config(&self, config: &CompareConfig) -> Result<Vec<String>>;

    /// Validates one of the two input folders.
    fn validate_folder(&self, label: &str, folder: &Path) -> Vec<String>;
}

/// The standard checks performed by the `validate` command.
pub struct StandardValidator;

impl StandardValidator {
    pub fn new() -> Self {
        Self
    }
}

impl Default for StandardValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigValidator for StandardValidator {
    fn validate_config(&self, config: &CompareConfig) -> Result<Vec<String>> {
        let mut issues = Vec::new();

        if let Err(e) = config.parsed_mode() {
            issues.push(e.to_string());
        }
        if config.workers == 0 {
            issues.push("workers must be at least 1".to_string());
        }
        if config.extension_filter().is_empty() {
            issues.push("extension filter cannot be empty".to_string());
        }

        issues.extend(self.validate_folder("folder_a", &config.folder_a));
        issues.extend(self.validate_folder("folder_b", &config.folder_b));

        if config.folder_a == config.folder_b {
            issues.push("folder_a and folder_b point to the same directory".to_string());
        }

        Ok(issues)
    }

    fn validate_folder(&self, label: &str, folder: &Path) -> Vec<String> {
        let mut issues = Vec::new();
        if !folder.exists() {
            issues.push(format!("{label} not found: {}", folder.display()));
        } else if !folder.is_dir() {
            issues.push(format!("{label} is not a directory: {}", folder.display()));
        }
        issues
    }
}
