//! Live web search through SerpAPI.

use crate::http::{check_status, client, malformed, transport_error};
use async_trait::async_trait;
use defraud_config::WebSearchConfig;
use defraud_core::{DefraudError, ProviderFailure, Result, SearchProvider, WebResult};
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

const SERVICE: &str = "search";
const DEFAULT_ENDPOINT: &str = "https://serpapi.com/search.json";

pub struct SerpApiProvider {
    api_key: String,
    endpoint: String,
    engine: String,
    location: Option<String>,
    gl: String,
    hl: String,
    google_domain: String,
    client: Client,
}

impl SerpApiProvider {
    pub fn new(config: &WebSearchConfig, api_key: String) -> Result<Self> {
        Ok(Self {
            api_key,
            endpoint: config
                .api_base
                .clone()
                .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            engine: config.engine.clone(),
            location: config.location.clone(),
            gl: config.gl.clone(),
            hl: config.hl.clone(),
            google_domain: config.google_domain.clone(),
            client: client(SERVICE, config.timeout_secs)?,
        })
    }

    fn params<'a>(&'a self, query: &'a str) -> Vec<(&'static str, &'a str)> {
        let mut params = vec![
            ("engine", self.engine.as_str()),
            ("q", query),
            ("gl", self.gl.as_str()),
            ("hl", self.hl.as_str()),
            ("google_domain", self.google_domain.as_str()),
            ("api_key", self.api_key.as_str()),
        ];
        if let Some(location) = &self.location {
            params.push(("location", location.as_str()));
        }
        params
    }
}

#[async_trait]
impl SearchProvider for SerpApiProvider {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<WebResult>> {
        debug!(engine = %self.engine, "web search: {query}");
        let resp = self
            .client
            .get(&self.endpoint)
            .query(&self.params(query))
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;
        let resp = check_status(SERVICE, resp).await?;
        let json: Value = resp.json().await.map_err(|e| transport_error(SERVICE, e))?;

        let mut results = parse_serp_response(&json)?;
        results.truncate(limit);
        Ok(results)
    }
}

/// Extract organic results from a SerpAPI response body.
///
/// A body without `organic_results` is a valid "nothing found" answer. A body
/// carrying an `error` string is a provider failure, except SerpAPI's own
/// "no results" message, which is treated as empty.
pub fn parse_serp_response(json: &Value) -> Result<Vec<WebResult>> {
    if let Some(err) = json.get("error").and_then(Value::as_str) {
        if err.to_lowercase().contains("hasn't returned any results") {
            return Ok(Vec::new());
        }
        return Err(DefraudError::tool(
            SERVICE,
            ProviderFailure::Unavailable,
            err.to_string(),
        ));
    }

    let Some(organic) = json.get("organic_results") else {
        return Ok(Vec::new());
    };
    let items = organic
        .as_array()
        .ok_or_else(|| malformed(SERVICE, "organic_results is not an array"))?;

    Ok(items
        .iter()
        .filter_map(|item| {
            let link = item.get("link")?.as_str()?.to_string();
            let text = |key: &str| {
                item.get(key)
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string()
            };
            Some(WebResult {
                title: text("title"),
                link,
                snippet: text("snippet"),
            })
        })
        .collect())
}
