//! Web search provider configuration

use serde::{Deserialize, Serialize};

/// SerpAPI settings for the live web search tool
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WebSearchConfig {
    /// Register the search tool with the agent
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Environment variable holding the SerpAPI key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Optional endpoint override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,

    #[serde(default = "default_engine")]
    pub engine: String,

    /// Free-form location, e.g. "Austin, Texas, United States"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    /// Country code
    #[serde(default = "default_gl")]
    pub gl: String,

    /// Interface language
    #[serde(default = "default_hl")]
    pub hl: String,

    #[serde(default = "default_google_domain")]
    pub google_domain: String,

    /// Organic results kept per query
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Per-request timeout (seconds)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for WebSearchConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            api_key_env: default_api_key_env(),
            api_base: None,
            engine: default_engine(),
            location: None,
            gl: default_gl(),
            hl: default_hl(),
            google_domain: default_google_domain(),
            max_results: default_max_results(),
            timeout_secs: default_timeout(),
        }
    }
}

impl crate::validation::Validate for WebSearchConfig {
    fn validate(&self) -> crate::error::Result<()> {
        use crate::validation::{validate_non_empty, validate_positive, validate_url};

        validate_non_empty("search.api_key_env", &self.api_key_env)?;
        validate_non_empty("search.engine", &self.engine)?;
        validate_positive("search.max_results", self.max_results, 0)?;
        validate_positive("search.timeout_secs", self.timeout_secs as usize, 0)?;
        validate_url("search.api_base", self.api_base.as_deref())?;

        Ok(())
    }
}

fn default_enabled() -> bool {
    true
}

fn default_api_key_env() -> String {
    "SERPAPI_API_KEY".to_string()
}

fn default_engine() -> String {
    "google".to_string()
}

fn default_gl() -> String {
    "us".to_string()
}

fn default_hl() -> String {
    "en".to_string()
}

fn default_google_domain() -> String {
    "google.com".to_string()
}

fn default_max_results() -> usize {
    5
}

fn default_timeout() -> u64 {
    20
}
