//! Tabular dataset configuration

use serde::{Deserialize, Serialize};

/// Column mapping for the labeled news dataset
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DatasetConfig {
    /// Header of the title column
    #[serde(default = "default_title_column")]
    pub title_column: String,

    /// Candidate headers for the article body; the first present one wins
    #[serde(default = "default_text_columns")]
    pub text_columns: Vec<String>,

    /// Header of the label column
    #[serde(default = "default_label_column")]
    pub label_column: String,

    /// Optional headers used as the source identifier (e.g. "source", "url")
    #[serde(default = "default_source_columns")]
    pub source_columns: Vec<String>,

    /// Skip rows with missing fields instead of failing the build
    #[serde(default)]
    pub skip_incomplete: bool,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            title_column: default_title_column(),
            text_columns: default_text_columns(),
            label_column: default_label_column(),
            source_columns: default_source_columns(),
            skip_incomplete: false,
        }
    }
}

impl crate::validation::Validate for DatasetConfig {
    fn validate(&self) -> crate::error::Result<()> {
        use crate::error::ConfigError;
        use crate::validation::validate_non_empty;

        validate_non_empty("dataset.title_column", &self.title_column)?;
        validate_non_empty("dataset.label_column", &self.label_column)?;

        if self.text_columns.iter().all(|c| c.trim().is_empty()) {
            return Err(ConfigError::ValidationError {
                field: "dataset.text_columns".to_string(),
                message: "at least one body column name is required".to_string(),
            });
        }

        Ok(())
    }
}

fn default_title_column() -> String {
    "title".to_string()
}

fn default_text_columns() -> Vec<String> {
    vec!["text".to_string(), "body".to_string()]
}

fn default_label_column() -> String {
    "label".to_string()
}

fn default_source_columns() -> Vec<String> {
    vec!["source".to_string(), "url".to_string()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::Validate;

    #[test]
    fn test_default_is_valid() {
        assert!(DatasetConfig::default().validate().is_ok());
    }

    #[test]
    fn test_blank_text_columns_invalid() {
        let config = DatasetConfig {
            text_columns: vec![" ".to_string()],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
