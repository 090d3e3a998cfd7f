//! Agent loop configuration

use serde::{Deserialize, Serialize};

/// Agent loop limits and budgets
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AgentConfig {
    /// Max reasoning iterations before giving up
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Corrective retries allowed when a reasoning step cannot be parsed
    ///
    /// Retries do not count as iterations.
    #[serde(default = "default_max_parse_retries")]
    pub max_parse_retries: usize,

    /// Timeout per tool invocation (seconds)
    #[serde(default = "default_step_timeout")]
    pub step_timeout_secs: u64,

    /// Observations longer than this are truncated before entering the scratchpad
    #[serde(default = "default_max_observation_chars")]
    pub max_observation_chars: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            max_parse_retries: default_max_parse_retries(),
            step_timeout_secs: default_step_timeout(),
            max_observation_chars: default_max_observation_chars(),
        }
    }
}

impl crate::validation::Validate for AgentConfig {
    fn validate(&self) -> crate::error::Result<()> {
        use crate::validation::validate_positive;

        validate_positive("agent.max_iterations", self.max_iterations, 0)?;
        validate_positive(
            "agent.max_observation_chars",
            self.max_observation_chars,
            0,
        )?;

        if self.step_timeout_secs == 0 {
            return Err(crate::error::ConfigError::ValidationError {
                field: "agent.step_timeout_secs".to_string(),
                message: "step_timeout_secs must be > 0".to_string(),
            });
        }

        Ok(())
    }
}

fn default_max_iterations() -> usize {
    6
}

fn default_max_parse_retries() -> usize {
    1
}

fn default_step_timeout() -> u64 {
    60
}

fn default_max_observation_chars() -> usize {
    2000
}
