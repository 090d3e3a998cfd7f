//! Error taxonomy shared by every defraud crate

use defraud_config::ConfigError;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DefraudError>;

/// How an external service call failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderFailure {
    Timeout,
    Unavailable,
    MalformedResponse,
}

impl fmt::Display for ProviderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderFailure::Timeout => write!(f, "timeout"),
            ProviderFailure::Unavailable => write!(f, "unavailable"),
            ProviderFailure::MalformedResponse => write!(f, "malformed response"),
        }
    }
}

#[derive(Debug, Error)]
pub enum DefraudError {
    #[error("Malformed record {record}: {message}")]
    Ingestion { record: String, message: String },

    #[error("Empty corpus: {0}")]
    EmptyCorpus(String),

    #[error("Vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Index not found or corrupt at {}: {reason}", .path.display())]
    IndexNotFound { path: PathBuf, reason: String },

    #[error("Tool '{tool}' failed ({failure}): {message}")]
    ToolInvocation {
        tool: String,
        failure: ProviderFailure,
        message: String,
    },

    #[error("Could not parse reasoning output: {0}")]
    AgentParse(String),

    #[error("No final answer after {0} iterations")]
    AgentExhausted(usize),

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("Query cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DefraudError {
    /// Stable name of the error kind, used in structured failure responses
    pub fn kind(&self) -> &'static str {
        match self {
            DefraudError::Ingestion { .. } => "IngestionError",
            DefraudError::EmptyCorpus(_) => "EmptyCorpusError",
            DefraudError::DimensionMismatch { .. } => "DimensionMismatchError",
            DefraudError::IndexNotFound { .. } => "IndexNotFoundError",
            DefraudError::ToolInvocation { .. } => "ToolInvocationError",
            DefraudError::AgentParse(_) => "AgentParseError",
            DefraudError::AgentExhausted(_) => "AgentExhaustedError",
            DefraudError::Configuration(_) => "ConfigurationError",
            DefraudError::Cancelled => "Cancelled",
            DefraudError::Io(_) => "IoError",
        }
    }

    pub fn tool(
        tool: impl Into<String>,
        failure: ProviderFailure,
        message: impl Into<String>,
    ) -> Self {
        DefraudError::ToolInvocation {
            tool: tool.into(),
            failure,
            message: message.into(),
        }
    }

    pub fn ingestion(record: impl fmt::Display, message: impl Into<String>) -> Self {
        DefraudError::Ingestion {
            record: record.to_string(),
            message: message.into(),
        }
    }

    pub fn index_not_found(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        DefraudError::IndexNotFound {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Configuration problem that is not tied to a config field parser
    pub fn config(field: impl Into<String>, message: impl Into<String>) -> Self {
        DefraudError::Configuration(ConfigError::ValidationError {
            field: field.into(),
            message: message.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names() {
        assert_eq!(DefraudError::EmptyCorpus("x".into()).kind(), "EmptyCorpusError");
        assert_eq!(
            DefraudError::tool("search", ProviderFailure::Timeout, "slow").kind(),
            "ToolInvocationError"
        );
        assert_eq!(DefraudError::AgentExhausted(3).kind(), "AgentExhaustedError");
    }

    #[test]
    fn test_config_error_converts() {
        let err: DefraudError = ConfigError::MissingCredential {
            var: "SERPAPI_API_KEY".into(),
            needed_for: "web search".into(),
        }
        .into();
        assert_eq!(err.kind(), "ConfigurationError");
        assert!(err.to_string().contains("SERPAPI_API_KEY"));
    }

    #[test]
    fn test_tool_display_names_failure() {
        let err = DefraudError::tool("web_search", ProviderFailure::Unavailable, "dns");
        assert_eq!(
            err.to_string(),
            "Tool 'web_search' failed (unavailable): dns"
        );
    }
}
