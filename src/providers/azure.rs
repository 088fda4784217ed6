//! Azure OpenAI provider adapter

use super::openai::whitespace_token_estimate;
use super::{ApiProvider, ProviderConfig};
use crate::error::{Error, Result};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde_json::{json, Value};

/// Adapter for Azure OpenAI deployments.
///
/// The deployment's endpoint URL already pins the model, so the request
/// body carries no model field.
#[derive(Debug, Clone)]
pub struct AzureOpenAiProvider {
    config: ProviderConfig,
}

impl AzureOpenAiProvider {
    /// Create a new Azure OpenAI provider.
    pub fn new(config: ProviderConfig) -> Self {
        Self { config }
    }
}

impl ApiProvider for AzureOpenAiProvider {
    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "api-key",
            HeaderValue::from_str(&self.config.api_key)
                .map_err(|_| Error::Config("API key is not a valid header value".to_string()))?,
        );
        Ok(headers)
    }

    fn build_payload(&self, prompt: &str, stream: bool) -> Value {
        json!({
            "messages": [{"role": "user", "content": prompt}],
            "stream": stream,
        })
    }

    fn request_url(&self) -> &str {
        &self.config.api_url
    }

    fn parse_token_count(&self, body: &Value) -> u64 {
        let count = body
            .pointer("/usage/completion_tokens")
            .and_then(Value::as_u64)
            .unwrap_or(0);
        if count == 0 {
            whitespace_token_estimate(&self.parse_content(body))
        } else {
            count
        }
    }

    fn parse_content(&self, body: &Value) -> String {
        body.pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    }

    fn is_first_content_event(&self, line: &str) -> bool {
        !line.trim().is_empty()
    }

    fn name(&self) -> &'static str {
        "azure"
    }
}
