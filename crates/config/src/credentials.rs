//! Credential lookup for remote providers
//!
//! Keys never live in config files. The config names the environment
//! variable, and `Credentials::resolve` checks that every variable the
//! selected providers need is present before any query runs. A `.env`
//! file can supply them; variables already set in the process win.

use crate::{ConfigError, Config, EmbeddingBackend, LlmProvider, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Which remote services a command is about to use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Requirements {
    pub embeddings: bool,
    pub chat: bool,
    pub web_search: bool,
}

impl Requirements {
    /// Everything the full agent (QA + web search) touches
    pub fn agent(config: &Config) -> Self {
        Self {
            embeddings: true,
            chat: true,
            web_search: config.search.enabled,
        }
    }

    /// Retrieval plus synthesis only
    pub fn qa() -> Self {
        Self {
            embeddings: true,
            chat: true,
            web_search: false,
        }
    }
}

/// Resolved API keys
#[derive(Clone, Default)]
pub struct Credentials {
    pub embedding_api_key: Option<String>,
    pub llm_api_key: Option<String>,
    pub serpapi_api_key: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mask = |v: &Option<String>| v.as_ref().map(|_| "***");
        f.debug_struct("Credentials")
            .field("embedding_api_key", &mask(&self.embedding_api_key))
            .field("llm_api_key", &mask(&self.llm_api_key))
            .field("serpapi_api_key", &mask(&self.serpapi_api_key))
            .finish()
    }
}

impl Credentials {
    /// Load `.env` from the working directory or its ancestors, if one exists.
    ///
    /// Returns the file that was loaded.
    pub fn load_dotenv() -> Result<Option<PathBuf>> {
        match dotenvy::dotenv() {
            Ok(path) => {
                debug!(path = %path.display(), "loaded .env");
                Ok(Some(path))
            }
            Err(err) if err.not_found() => Ok(None),
            Err(err) => Err(ConfigError::DotenvError {
                path: PathBuf::from(".env"),
                message: err.to_string(),
            }),
        }
    }

    /// Load a specific env file into the process environment.
    pub fn load_dotenv_from(path: &Path) -> Result<()> {
        dotenvy::from_path(path).map_err(|err| {
            if err.not_found() {
                ConfigError::FileNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                ConfigError::DotenvError {
                    path: path.to_path_buf(),
                    message: err.to_string(),
                }
            }
        })?;
        debug!(path = %path.display(), "loaded env file");
        Ok(())
    }

    /// Resolve keys from the process environment
    pub fn resolve(config: &Config, needs: Requirements) -> Result<Self> {
        Self::resolve_with(config, needs, |var| std::env::var(var).ok())
    }

    /// Resolve keys through an arbitrary lookup (used by tests)
    pub fn resolve_with<F>(config: &Config, needs: Requirements, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let fetch = |var: &str, needed_for: &str| -> Result<String> {
            lookup(var)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| ConfigError::MissingCredential {
                    var: var.to_string(),
                    needed_for: needed_for.to_string(),
                })
        };

        let mut creds = Credentials::default();

        if needs.embeddings && config.embedding.backend == EmbeddingBackend::External {
            creds.embedding_api_key =
                Some(fetch(&config.embedding.api_key_env, "openai embeddings")?);
        }

        if needs.chat && config.llm.provider == LlmProvider::OpenAI {
            creds.llm_api_key = Some(fetch(&config.llm.api_key_env, "openai chat")?);
        }

        if needs.web_search {
            creds.serpapi_api_key = Some(fetch(&config.search.api_key_env, "web search")?);
        }

        Ok(creds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn test_local_providers_need_no_keys() {
        let mut config = Config::default();
        config.search.enabled = false;
        let creds =
            Credentials::resolve_with(&config, Requirements::agent(&config), lookup(&[])).unwrap();
        assert!(creds.llm_api_key.is_none());
        assert!(creds.serpapi_api_key.is_none());
    }

    #[test]
    fn test_missing_search_key_is_named() {
        let config = Config::default();
        let err = Credentials::resolve_with(&config, Requirements::agent(&config), lookup(&[]))
            .unwrap_err();
        match err {
            ConfigError::MissingCredential { var, .. } => assert_eq!(var, "SERPAPI_API_KEY"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_blank_key_counts_as_missing() {
        let mut config = Config::default();
        config.llm.provider = LlmProvider::OpenAI;
        let err = Credentials::resolve_with(
            &config,
            Requirements::qa(),
            lookup(&[("OPENAI_API_KEY", "  ")]),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredential { .. }));
    }

    #[test]
    fn test_key_from_env_file_only() {
        let _guard = crate::ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(
            &path,
            "# search credentials\nDEFRAUD_TEST_DOTENV_SERP=from-dotenv\n",
        )
        .unwrap();
        std::env::remove_var("DEFRAUD_TEST_DOTENV_SERP");

        let mut config = Config::default();
        config.search.api_key_env = "DEFRAUD_TEST_DOTENV_SERP".to_string();
        let needs = Requirements::agent(&config);
        assert!(Credentials::resolve(&config, needs).is_err());

        Credentials::load_dotenv_from(&path).unwrap();
        let creds = Credentials::resolve(&config, needs);
        std::env::remove_var("DEFRAUD_TEST_DOTENV_SERP");

        assert_eq!(creds.unwrap().serpapi_api_key.as_deref(), Some("from-dotenv"));
    }

    #[test]
    fn test_process_env_wins_over_env_file() {
        let _guard = crate::ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "DEFRAUD_TEST_DOTENV_KEEP=from-file\n").unwrap();
        std::env::set_var("DEFRAUD_TEST_DOTENV_KEEP", "from-shell");

        Credentials::load_dotenv_from(&path).unwrap();
        let value = std::env::var("DEFRAUD_TEST_DOTENV_KEEP");
        std::env::remove_var("DEFRAUD_TEST_DOTENV_KEEP");

        assert_eq!(value.as_deref(), Ok("from-shell"));
    }

    #[test]
    fn test_missing_env_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = Credentials::load_dotenv_from(&dir.path().join(".env")).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));
    }

    #[test]
    fn test_resolves_openai_and_serpapi() {
        let mut config = Config::default();
        config.llm.provider = LlmProvider::OpenAI;
        config.embedding.backend = EmbeddingBackend::External;
        let creds = Credentials::resolve_with(
            &config,
            Requirements::agent(&config),
            lookup(&[("OPENAI_API_KEY", "sk-test"), ("SERPAPI_API_KEY", "serp")]),
        )
        .unwrap();
        assert_eq!(creds.llm_api_key.as_deref(), Some("sk-test"));
        assert_eq!(creds.embedding_api_key.as_deref(), Some("sk-test"));
        assert_eq!(creds.serpapi_api_key.as_deref(), Some("serp"));
        assert!(!format!("{creds:?}").contains("sk-test"));
    }
}
