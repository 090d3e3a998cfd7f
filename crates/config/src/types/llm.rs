//! LLM configuration

use serde::{Deserialize, Serialize};

/// LLM (Large Language Model) configuration
///
/// Shared by the answer synthesizer and the agent's reasoning step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LlmConfig {
    /// Chat provider
    #[serde(default)]
    pub provider: LlmProvider,

    /// Model name
    ///
    /// Examples: "gemma3:1b" (Ollama), "gpt-4o-mini" (OpenAI)
    #[serde(default = "default_model")]
    pub model: String,

    /// Maximum tokens for LLM responses
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Optional API base URL override
    ///
    /// Use this to point to alternative OpenAI-compatible endpoints.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,

    /// Per-call timeout (seconds)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Environment variable holding the API key for the `openai` provider
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

/// Chat provider options
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// Local Ollama server
    #[default]
    Ollama,
    /// OpenAI-compatible chat completions API
    #[serde(rename = "openai")]
    OpenAI,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::default(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            api_base: None,
            timeout_secs: default_timeout(),
            api_key_env: default_api_key_env(),
        }
    }
}

impl crate::validation::Validate for LlmConfig {
    fn validate(&self) -> crate::error::Result<()> {
        use crate::error::ConfigError;
        use crate::validation::{validate_non_empty, validate_url};

        if self.model.is_empty() {
            return Err(ConfigError::ValidationError {
                field: "llm.model".to_string(),
                message: "Model name cannot be empty".to_string(),
            });
        }

        if self.max_tokens == 0 {
            return Err(ConfigError::ValidationError {
                field: "llm.max_tokens".to_string(),
                message: "max_tokens must be > 0".to_string(),
            });
        }

        if self.timeout_secs == 0 {
            return Err(ConfigError::ValidationError {
                field: "llm.timeout_secs".to_string(),
                message: "timeout_secs must be > 0".to_string(),
            });
        }

        validate_url("llm.api_base", self.api_base.as_deref())?;

        if self.provider == LlmProvider::OpenAI {
            validate_non_empty("llm.api_key_env", &self.api_key_env)?;
        }

        Ok(())
    }
}

fn default_model() -> String {
    "gemma3:1b".to_string()
}

fn default_max_tokens() -> u32 {
    800
}

fn default_timeout() -> u64 {
    60
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::Validate;

    #[test]
    fn test_default_is_valid() {
        let config = LlmConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_model_invalid() {
        let config = LlmConfig {
            model: String::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_max_tokens_invalid() {
        let config = LlmConfig {
            max_tokens: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_api_base() {
        let config = LlmConfig {
            api_base: Some("not-a-url".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_valid_api_base() {
        let config = LlmConfig {
            provider: LlmProvider::OpenAI,
            api_base: Some("https://api.openai.com/v1".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }
}
