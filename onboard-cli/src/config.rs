//! Configuration module
//!
//! Resolves where the board lives and which classification rules apply.

use anyhow::{Context, Result};
use onboard_core::{Board, ClassificationRules, DocumentStore};
use std::fs;
use std::path::PathBuf;

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Path of the board document
    pub store_path: PathBuf,
    /// Optional rules file; the built-in rules apply when absent
    pub rules_path: Option<PathBuf>,
}

impl Config {
    pub fn store(&self) -> DocumentStore {
        DocumentStore::new(&self.store_path)
    }

    /// Open the board, creating nothing until the first write
    ///
    /// # Errors
    /// Returns an error if the document exists but cannot be read or parsed.
    pub fn open_board(&self) -> Result<Board> {
        Board::open(self.store())
            .with_context(|| format!("Failed to open board at {}", self.store_path.display()))
    }

    /// Load the classification rules
    ///
    /// # Returns
    /// The rules file's table when `rules_path` is set, the built-in table otherwise
    ///
    /// # Errors
    /// Returns an error if the rules file cannot be read or is not valid rules JSON.
    pub fn rules(&self) -> Result<ClassificationRules> {
        let Some(path) = &self.rules_path else {
            return Ok(ClassificationRules::default());
        };

        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read rules file {}", path.display()))?;
        let rules = ClassificationRules::from_json(&text)
            .with_context(|| format!("Invalid rules file {}", path.display()))?;
        tracing::debug!(path = %path.display(), rules = rules.rules.len(), "Loaded classification rules");
        Ok(rules)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use onboard_core::Stage;
    use tempfile::TempDir;

    #[test]
    fn test_default_rules_without_file() {
        let config = Config {
            store_path: PathBuf::from("onboard.json"),
            rules_path: None,
        };

        assert_eq!(config.rules().unwrap(), ClassificationRules::default());
    }

    #[test]
    fn test_rules_file_overrides_keywords() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rules.json");
        fs::write(
            &path,
            r#"{ "rules": [ { "stage": "Production", "keywords": ["live"] } ], "fallback": "Planned" }"#,
        )
        .unwrap();
        let config = Config {
            store_path: dir.path().join("onboard.json"),
            rules_path: Some(path),
        };

        let rules = config.rules().unwrap();

        assert_eq!(rules.classify("Live since May"), Stage::Production);
        assert_eq!(rules.classify("completed"), Stage::Planned);
    }

    #[test]
    fn test_unreadable_rules_file_is_an_error() {
        let config = Config {
            store_path: PathBuf::from("onboard.json"),
            rules_path: Some(PathBuf::from("/nonexistent/rules.json")),
        };

        assert!(config.rules().is_err());
    }
}
