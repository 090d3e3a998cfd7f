//! Configuration merging logic
//!
//! Merges configurations from multiple sources with proper precedence.

use crate::{types::*, Config};

/// Merge two configurations, with `overlay` taking precedence
///
/// This performs a deep merge where non-default values from `overlay`
/// override values in `base`. A field explicitly set back to its default in
/// the overlay therefore does not reset a non-default base value.
pub fn merge(mut base: Config, overlay: Config) -> Config {
    base.dataset = merge_dataset(base.dataset, overlay.dataset);
    base.chunking = merge_chunking(base.chunking, overlay.chunking);
    base.embedding = merge_embedding(base.embedding, overlay.embedding);
    base.index = merge_index(base.index, overlay.index);
    base.retrieval = merge_retrieval(base.retrieval, overlay.retrieval);
    base.llm = merge_llm(base.llm, overlay.llm);
    base.agent = merge_agent(base.agent, overlay.agent);
    base.search = merge_search(base.search, overlay.search);

    base
}

/// Overlay wins when it differs from the default
fn pick<T: PartialEq>(base: T, overlay: T, default: &T) -> T {
    if overlay != *default {
        overlay
    } else {
        base
    }
}

fn merge_dataset(base: DatasetConfig, overlay: DatasetConfig) -> DatasetConfig {
    let d = DatasetConfig::default();
    DatasetConfig {
        title_column: pick(base.title_column, overlay.title_column, &d.title_column),
        text_columns: pick(base.text_columns, overlay.text_columns, &d.text_columns),
        label_column: pick(base.label_column, overlay.label_column, &d.label_column),
        source_columns: pick(base.source_columns, overlay.source_columns, &d.source_columns),
        skip_incomplete: pick(base.skip_incomplete, overlay.skip_incomplete, &d.skip_incomplete),
    }
}

fn merge_chunking(base: ChunkingConfig, overlay: ChunkingConfig) -> ChunkingConfig {
    let d = ChunkingConfig::default();
    ChunkingConfig {
        chunk_size: pick(base.chunk_size, overlay.chunk_size, &d.chunk_size),
        chunk_overlap: pick(base.chunk_overlap, overlay.chunk_overlap, &d.chunk_overlap),
        title_separator: pick(
            base.title_separator,
            overlay.title_separator,
            &d.title_separator,
        ),
    }
}

fn merge_embedding(base: EmbeddingConfig, overlay: EmbeddingConfig) -> EmbeddingConfig {
    let d = EmbeddingConfig::default();
    EmbeddingConfig {
        backend: pick(base.backend, overlay.backend, &d.backend),
        model_name: pick(base.model_name, overlay.model_name, &d.model_name),
        dimension: pick(base.dimension, overlay.dimension, &d.dimension),
        batch_size: pick(base.batch_size, overlay.batch_size, &d.batch_size),
        api_base: overlay.api_base.or(base.api_base),
        api_key_env: pick(base.api_key_env, overlay.api_key_env, &d.api_key_env),
        timeout_secs: pick(base.timeout_secs, overlay.timeout_secs, &d.timeout_secs),
    }
}

fn merge_index(base: IndexConfig, overlay: IndexConfig) -> IndexConfig {
    let d = IndexConfig::default();
    IndexConfig {
        dir: pick(base.dir, overlay.dir, &d.dir),
        index_name: pick(base.index_name, overlay.index_name, &d.index_name),
        metric: pick(base.metric, overlay.metric, &d.metric),
    }
}

fn merge_retrieval(base: RetrievalConfig, overlay: RetrievalConfig) -> RetrievalConfig {
    let d = RetrievalConfig::default();
    RetrievalConfig {
        k: pick(base.k, overlay.k, &d.k),
    }
}

fn merge_llm(base: LlmConfig, overlay: LlmConfig) -> LlmConfig {
    let d = LlmConfig::default();
    LlmConfig {
        provider: pick(base.provider, overlay.provider, &d.provider),
        model: pick(base.model, overlay.model, &d.model),
        max_tokens: pick(base.max_tokens, overlay.max_tokens, &d.max_tokens),
        api_base: overlay.api_base.or(base.api_base),
        timeout_secs: pick(base.timeout_secs, overlay.timeout_secs, &d.timeout_secs),
        api_key_env: pick(base.api_key_env, overlay.api_key_env, &d.api_key_env),
    }
}

fn merge_agent(base: AgentConfig, overlay: AgentConfig) -> AgentConfig {
    let d = AgentConfig::default();
    AgentConfig {
        max_iterations: pick(base.max_iterations, overlay.max_iterations, &d.max_iterations),
        max_parse_retries: pick(
            base.max_parse_retries,
            overlay.max_parse_retries,
            &d.max_parse_retries,
        ),
        step_timeout_secs: pick(
            base.step_timeout_secs,
            overlay.step_timeout_secs,
            &d.step_timeout_secs,
        ),
        max_observation_chars: pick(
            base.max_observation_chars,
            overlay.max_observation_chars,
            &d.max_observation_chars,
        ),
    }
}

fn merge_search(base: WebSearchConfig, overlay: WebSearchConfig) -> WebSearchConfig {
    let d = WebSearchConfig::default();
    WebSearchConfig {
        enabled: pick(base.enabled, overlay.enabled, &d.enabled),
        api_key_env: pick(base.api_key_env, overlay.api_key_env, &d.api_key_env),
        api_base: overlay.api_base.or(base.api_base),
        engine: pick(base.engine, overlay.engine, &d.engine),
        location: overlay.location.or(base.location),
        gl: pick(base.gl, overlay.gl, &d.gl),
        hl: pick(base.hl, overlay.hl, &d.hl),
        google_domain: pick(base.google_domain, overlay.google_domain, &d.google_domain),
        max_results: pick(base.max_results, overlay.max_results, &d.max_results),
        timeout_secs: pick(base.timeout_secs, overlay.timeout_secs, &d.timeout_secs),
    }
}
