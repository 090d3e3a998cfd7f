use crate::http::{check_status, client, malformed, transport_error};
use async_trait::async_trait;
use defraud_config::{ConfigError, Credentials, LlmConfig, LlmProvider};
use defraud_core::{ChatModel, Message, Result};
use reqwest::Client;
use std::env;
use std::sync::Arc;
use tracing::debug;

const SERVICE: &str = "llm";

/// Build the chat model named by `config.provider`.
pub fn select_chat_model(config: &LlmConfig, creds: &Credentials) -> Result<Arc<dyn ChatModel>> {
    match config.provider {
        LlmProvider::OpenAI => {
            let api_key = creds
                .llm_api_key
                .clone()
                .ok_or_else(|| ConfigError::MissingCredential {
                    var: config.api_key_env.clone(),
                    needed_for: "openai chat".to_string(),
                })?;
            let api_base = config
                .api_base
                .clone()
                .unwrap_or_else(|| "https://api.openai.com/v1".to_string());
            Ok(Arc::new(OpenAIProvider::new(
                config.model.clone(),
                api_key,
                api_base,
                config.max_tokens,
                config.timeout_secs,
            )?))
        }
        LlmProvider::Ollama => {
            let base_url = config
                .api_base
                .clone()
                .or_else(|| env::var("OLLAMA_BASE_URL").ok())
                .unwrap_or_else(|| "http://localhost:11434".to_string());
            Ok(Arc::new(OllamaProvider::new(
                config.model.clone(),
                base_url,
                config.timeout_secs,
            )?))
        }
    }
}

pub struct OllamaProvider {
    model: String,
    base_url: String,
    client: Client,
}

impl OllamaProvider {
    pub fn new(model: String, base_url: String, timeout_secs: u64) -> Result<Self> {
        Ok(Self {
            model,
            base_url,
            client: client(SERVICE, timeout_secs)?,
        })
    }
}

#[async_trait]
impl ChatModel for OllamaProvider {
    async fn chat(&self, messages: &[Message]) -> Result<String> {
        let resp = self
            .client
            .post(format!("{}/api/chat", self.base_url.trim_end_matches('/')))
            .json(&serde_json::json!({
                "model": self.model,
                "messages": messages,
                "stream": false,
            }))
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;
        let resp = check_status(SERVICE, resp).await?;

        let json: serde_json::Value = resp.json().await.map_err(|e| transport_error(SERVICE, e))?;
        let content = json["message"]["content"]
            .as_str()
            .ok_or_else(|| malformed(SERVICE, "no message content in Ollama response"))?;
        Ok(content.to_string())
    }

    fn model_id(&self) -> String {
        format!("ollama:{}", self.model)
    }
}

pub struct OpenAIProvider {
    model: String,
    api_key: String,
    api_base: String,
    max_tokens: u32,
    client: Client,
}

impl OpenAIProvider {
    pub fn new(
        model: String,
        api_key: String,
        api_base: String,
        max_tokens: u32,
        timeout_secs: u64,
    ) -> Result<Self> {
        Ok(Self {
            model,
            api_key,
            api_base,
            max_tokens,
            client: client(SERVICE, timeout_secs)?,
        })
    }
}

#[async_trait]
impl ChatModel for OpenAIProvider {
    async fn chat(&self, messages: &[Message]) -> Result<String> {
        debug!(model = %self.model, messages = messages.len(), "chat completion");
        let resp = self
            .client
            .post(format!(
                "{}/chat/completions",
                self.api_base.trim_end_matches('/')
            ))
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({
                "model": self.model,
                "messages": messages,
                "max_tokens": self.max_tokens,
                "temperature": 0.0,
            }))
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;
        let resp = check_status(SERVICE, resp).await?;

        let json: serde_json::Value = resp.json().await.map_err(|e| transport_error(SERVICE, e))?;
        if let Some(err) = json.get("error") {
            return Err(malformed(SERVICE, format!("OpenAI error: {err}")));
        }
        let content = json["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| malformed(SERVICE, "no choices in OpenAI response"))?;
        Ok(content.to_string())
    }

    fn model_id(&self) -> String {
        format!("openai:{}", self.model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_openai_requires_key() {
        let config = LlmConfig {
            provider: LlmProvider::OpenAI,
            ..Default::default()
        };
        let err = select_chat_model(&config, &Credentials::default()).err().unwrap();
        assert_eq!(err.kind(), "ConfigurationError");
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn test_select_ollama_uses_configured_model() {
        let config = LlmConfig {
            api_base: Some("http://127.0.0.1:9".to_string()),
            ..Default::default()
        };
        let model = select_chat_model(&config, &Credentials::default()).unwrap();
        assert_eq!(model.model_id(), "ollama:gemma3:1b");
    }

    #[tokio::test]
    async fn test_unreachable_server_is_unavailable() {
        let provider =
            OllamaProvider::new("m".to_string(), "http://127.0.0.1:9".to_string(), 2).unwrap();
        let err = provider.chat(&[Message::user("hi")]).await.unwrap_err();
        assert_eq!(err.kind(), "ToolInvocationError");
    }
}
