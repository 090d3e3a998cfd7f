use crate::embedder::select_embedder;
use crate::llm::select_chat_model;
use crate::search::SerpApiProvider;
use defraud_config::{ConfigError, Config, Credentials};
use defraud_core::{ChatModel, DefraudError, Embedder, Result, SearchProvider};
use defraud_index::{IndexPaths, Retriever, TrustPolicy, VectorIndex};
use once_cell::sync::OnceCell;
use std::sync::Arc;
use tracing::{info, warn};

/// Shared handles for one process: the loaded index plus every remote provider.
///
/// Each handle is created on first use and then reused for the process
/// lifetime, so a command that never touches web search never needs its key.
pub struct ServiceContext {
    pub config: Config,
    credentials: Credentials,
    trust: TrustPolicy,
    index: OnceCell<Arc<VectorIndex>>,
    embedder: OnceCell<Arc<dyn Embedder>>,
    chat: OnceCell<Arc<dyn ChatModel>>,
    search: OnceCell<Arc<dyn SearchProvider>>,
}

impl ServiceContext {
    pub fn new(config: Config, credentials: Credentials, trust: TrustPolicy) -> Self {
        Self {
            config,
            credentials,
            trust,
            index: OnceCell::new(),
            embedder: OnceCell::new(),
            chat: OnceCell::new(),
            search: OnceCell::new(),
        }
    }

    pub fn index_paths(&self) -> IndexPaths {
        IndexPaths::new(&self.config.index.dir, &self.config.index.index_name)
    }

    pub fn index(&self) -> Result<Arc<VectorIndex>> {
        self.index
            .get_or_try_init(|| {
                let paths = self.index_paths();
                let index = VectorIndex::load(&paths, self.trust)?;
                info!(
                    chunks = index.len(),
                    dimension = index.dimension(),
                    "loaded index {}",
                    paths.manifest().display()
                );
                Ok(Arc::new(index))
            })
            .cloned()
    }

    pub fn embedder(&self) -> Result<Arc<dyn Embedder>> {
        self.embedder
            .get_or_try_init(|| select_embedder(&self.config.embedding, &self.credentials))
            .cloned()
    }

    pub fn chat_model(&self) -> Result<Arc<dyn ChatModel>> {
        self.chat
            .get_or_try_init(|| select_chat_model(&self.config.llm, &self.credentials))
            .cloned()
    }

    pub fn web_search_enabled(&self) -> bool {
        self.config.search.enabled || self.search.get().is_some()
    }

    pub fn search_provider(&self) -> Result<Arc<dyn SearchProvider>> {
        self.search
            .get_or_try_init(|| {
                if !self.config.search.enabled {
                    return Err(DefraudError::config(
                        "search.enabled",
                        "web search is disabled",
                    ));
                }
                let api_key = self.credentials.serpapi_api_key.clone().ok_or_else(|| {
                    ConfigError::MissingCredential {
                        var: self.config.search.api_key_env.clone(),
                        needed_for: "web search".to_string(),
                    }
                })?;
                let provider: Arc<dyn SearchProvider> =
                    Arc::new(SerpApiProvider::new(&self.config.search, api_key)?);
                Ok(provider)
            })
            .cloned()
    }

    /// Retriever over the loaded index with the configured `k`.
    pub fn retriever(&self) -> Result<Retriever> {
        let index = self.index()?;
        let embedder = self.embedder()?;
        if index.model_id() != embedder.model_id() {
            warn!(
                index_model = index.model_id(),
                embedder_model = %embedder.model_id(),
                "index was built with a different embedding model; scores may be meaningless"
            );
        }
        Ok(Retriever::new(index, embedder, self.config.retrieval.k))
    }

    pub fn with_index(self, index: Arc<VectorIndex>) -> Self {
        let _ = self.index.set(index);
        self
    }

    pub fn with_embedder(self, embedder: Arc<dyn Embedder>) -> Self {
        let _ = self.embedder.set(embedder);
        self
    }

    pub fn with_chat_model(self, chat: Arc<dyn ChatModel>) -> Self {
        let _ = self.chat.set(chat);
        self
    }

    pub fn with_search_provider(self, search: Arc<dyn SearchProvider>) -> Self {
        let _ = self.search.set(search);
        self
    }
}
