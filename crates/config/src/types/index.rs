//! Vector index configuration

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Where the index lives and how it compares vectors
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IndexConfig {
    /// Directory holding the persisted index files
    #[serde(default = "default_dir")]
    pub dir: PathBuf,

    /// Fixed file prefix of the persisted index
    #[serde(default = "default_index_name")]
    pub index_name: String,

    /// Similarity metric used at build and query time
    #[serde(default)]
    pub metric: DistanceMetric,
}

/// Supported distance metrics
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    /// Cosine similarity
    #[default]
    Cosine,
    /// Euclidean distance, scored as 1 / (1 + d)
    L2,
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DistanceMetric::Cosine => write!(f, "cosine"),
            DistanceMetric::L2 => write!(f, "l2"),
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            dir: default_dir(),
            index_name: default_index_name(),
            metric: DistanceMetric::default(),
        }
    }
}

impl crate::validation::Validate for IndexConfig {
    fn validate(&self) -> crate::error::Result<()> {
        use crate::error::ConfigError;

        crate::validation::validate_non_empty("index.index_name", &self.index_name)?;

        if self
            .index_name
            .chars()
            .any(|c| c == '/' || c == '\\' || c == '.')
        {
            return Err(ConfigError::ValidationError {
                field: "index.index_name".to_string(),
                message: format!(
                    "'{}' must be a plain file prefix without '/', '\\' or '.'",
                    self.index_name
                ),
            });
        }

        Ok(())
    }
}

fn default_dir() -> PathBuf {
    PathBuf::from("./index")
}

fn default_index_name() -> String {
    "index".to_string()
}
