//! Environment variable configuration overlay
//!
//! Supports environment variables in the format:
//! `DEFRAUD_<section>_<field>=value`
//!
//! Examples:
//! - `DEFRAUD_RETRIEVAL_K=6`
//! - `DEFRAUD_LLM_PROVIDER=openai`
//! - `DEFRAUD_CHUNKING_CHUNK_OVERLAP=40`
//! - `DEFRAUD_DATASET_TEXT_COLUMNS=text,body`

use crate::{error::ConfigError, types::*, Config, Result};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

const PREFIX: &str = "DEFRAUD_";

/// Parse configuration from environment variables
///
/// Variables that fail to parse are reported and skipped.
pub fn from_env() -> Result<Option<Config>> {
    let env_vars: Vec<(String, String)> =
        env::vars().filter(|(k, _)| k.starts_with(PREFIX)).collect();

    if env_vars.is_empty() {
        return Ok(None);
    }

    let mut config = Config::default();
    for (key, value) in env_vars {
        if let Err(e) = apply_env_var(&mut config, &key, &value) {
            tracing::warn!("ignoring {}: {}", key, e);
        }
    }

    Ok(Some(config))
}

/// Apply a single environment variable to config
fn apply_env_var(config: &mut Config, key: &str, value: &str) -> Result<()> {
    let stripped = key.strip_prefix(PREFIX).unwrap_or(key);

    let Some((section, field)) = stripped.split_once('_') else {
        return Err(ConfigError::EnvVarError {
            var: key.to_string(),
            message: "Expected format: DEFRAUD_<section>_<field>".to_string(),
        });
    };

    let section = section.to_lowercase();
    let field = field.to_lowercase();
    let value = value.trim();

    match section.as_str() {
        "dataset" => apply_dataset_var(&mut config.dataset, key, &field, value),
        "chunking" => apply_chunking_var(&mut config.chunking, key, &field, value),
        "embedding" => apply_embedding_var(&mut config.embedding, key, &field, value),
        "index" => apply_index_var(&mut config.index, key, &field, value),
        "retrieval" => apply_retrieval_var(&mut config.retrieval, key, &field, value),
        "llm" => apply_llm_var(&mut config.llm, key, &field, value),
        "agent" => apply_agent_var(&mut config.agent, key, &field, value),
        "search" => apply_search_var(&mut config.search, key, &field, value),
        _ => Err(ConfigError::EnvVarError {
            var: key.to_string(),
            message: format!("Unknown section: {}", section),
        }),
    }
}

fn apply_dataset_var(config: &mut DatasetConfig, var: &str, field: &str, value: &str) -> Result<()> {
    match field {
        "title_column" => config.title_column = value.to_string(),
        "text_columns" => config.text_columns = parse_list(value),
        "label_column" => config.label_column = value.to_string(),
        "source_columns" => config.source_columns = parse_list(value),
        "skip_incomplete" => config.skip_incomplete = parse_bool(var, value)?,
        _ => return Err(unknown_field(var, field)),
    }
    Ok(())
}

fn apply_chunking_var(
    config: &mut ChunkingConfig,
    var: &str,
    field: &str,
    value: &str,
) -> Result<()> {
    match field {
        "chunk_size" => config.chunk_size = parse_num(var, value)?,
        "chunk_overlap" => config.chunk_overlap = parse_num(var, value)?,
        "title_separator" => config.title_separator = value.to_string(),
        _ => return Err(unknown_field(var, field)),
    }
    Ok(())
}

fn apply_embedding_var(
    config: &mut EmbeddingConfig,
    var: &str,
    field: &str,
    value: &str,
) -> Result<()> {
    match field {
        "backend" => {
            config.backend = match value.to_lowercase().as_str() {
                "openai" | "external" => EmbeddingBackend::External,
                "ollama" => EmbeddingBackend::Ollama,
                "hashing" => EmbeddingBackend::Hashing,
                _ => {
                    return Err(ConfigError::invalid_enum(
                        "embedding.backend",
                        value,
                        &["openai", "ollama", "hashing"],
                    ))
                }
            };
        }
        "model_name" => config.model_name = value.to_string(),
        "dimension" => config.dimension = parse_num(var, value)?,
        "batch_size" => config.batch_size = parse_num(var, value)?,
        "api_base" => config.api_base = Some(value.to_string()),
        "api_key_env" => config.api_key_env = value.to_string(),
        "timeout_secs" => config.timeout_secs = parse_num(var, value)?,
        _ => return Err(unknown_field(var, field)),
    }
    Ok(())
}

fn apply_index_var(config: &mut IndexConfig, var: &str, field: &str, value: &str) -> Result<()> {
    match field {
        "dir" => config.dir = PathBuf::from(value),
        "index_name" => config.index_name = value.to_string(),
        "metric" => {
            config.metric = match value.to_lowercase().as_str() {
                "cosine" => DistanceMetric::Cosine,
                "l2" | "euclidean" => DistanceMetric::L2,
                _ => {
                    return Err(ConfigError::invalid_enum(
                        "index.metric",
                        value,
                        &["cosine", "l2"],
                    ))
                }
            };
        }
        _ => return Err(unknown_field(var, field)),
    }
    Ok(())
}

fn apply_retrieval_var(
    config: &mut RetrievalConfig,
    var: &str,
    field: &str,
    value: &str,
) -> Result<()> {
    match field {
        "k" => config.k = parse_num(var, value)?,
        _ => return Err(unknown_field(var, field)),
    }
    Ok(())
}

fn apply_llm_var(config: &mut LlmConfig, var: &str, field: &str, value: &str) -> Result<()> {
    match field {
        "provider" => {
            config.provider = match value.to_lowercase().as_str() {
                "openai" => LlmProvider::OpenAI,
                "ollama" => LlmProvider::Ollama,
                _ => {
                    return Err(ConfigError::invalid_enum(
                        "llm.provider",
                        value,
                        &["openai", "ollama"],
                    ))
                }
            };
        }
        "model" => config.model = value.to_string(),
        "max_tokens" => config.max_tokens = parse_num(var, value)?,
        "api_base" => config.api_base = Some(value.to_string()),
        "timeout_secs" => config.timeout_secs = parse_num(var, value)?,
        "api_key_env" => config.api_key_env = value.to_string(),
        _ => return Err(unknown_field(var, field)),
    }
    Ok(())
}

fn apply_agent_var(config: &mut AgentConfig, var: &str, field: &str, value: &str) -> Result<()> {
    match field {
        "max_iterations" => config.max_iterations = parse_num(var, value)?,
        "max_parse_retries" => config.max_parse_retries = parse_num(var, value)?,
        "step_timeout_secs" => config.step_timeout_secs = parse_num(var, value)?,
        "max_observation_chars" => config.max_observation_chars = parse_num(var, value)?,
        _ => return Err(unknown_field(var, field)),
    }
    Ok(())
}

fn apply_search_var(
    config: &mut WebSearchConfig,
    var: &str,
    field: &str,
    value: &str,
) -> Result<()> {
    match field {
        "enabled" => config.enabled = parse_bool(var, value)?,
        "api_key_env" => config.api_key_env = value.to_string(),
        "api_base" => config.api_base = Some(value.to_string()),
        "engine" => config.engine = value.to_string(),
        "location" => config.location = Some(value.to_string()),
        "gl" => config.gl = value.to_string(),
        "hl" => config.hl = value.to_string(),
        "google_domain" => config.google_domain = value.to_string(),
        "max_results" => config.max_results = parse_num(var, value)?,
        "timeout_secs" => config.timeout_secs = parse_num(var, value)?,
        _ => return Err(unknown_field(var, field)),
    }
    Ok(())
}

fn parse_num<T: FromStr>(var: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| ConfigError::EnvVarError {
        var: var.to_string(),
        message: format!("Invalid integer: {}", value),
    })
}

fn parse_bool(var: &str, value: &str) -> Result<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::EnvVarError {
            var: var.to_string(),
            message: format!("Invalid boolean: {}", value),
        }),
    }
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn unknown_field(var: &str, field: &str) -> ConfigError {
    ConfigError::EnvVarError {
        var: var.to_string(),
        message: format!("Unknown field: {}", field),
    }
}
