//! OpenAI-compatible provider adapter

use super::{ApiProvider, ProviderConfig};
use crate::error::{Error, Result};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde_json::{json, Value};

/// Adapter for OpenAI-compatible chat-completion APIs.
///
/// Works against api.openai.com as well as vLLM, SGLang and other gateways
/// that speak the same protocol.
#[derive(Debug, Clone)]
pub struct OpenAiProvider {
    config: ProviderConfig,
}

impl OpenAiProvider {
    /// Create a new OpenAI-compatible provider.
    pub fn new(config: ProviderConfig) -> Self {
        Self { config }
    }
}

/// Estimate a token count by splitting content on whitespace.
///
/// Fallback for responses whose usage metadata is absent or zero.
pub(crate) fn whitespace_token_estimate(content: &str) -> u64 {
    content.split_whitespace().count() as u64
}

impl ApiProvider for OpenAiProvider {
    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let auth = format!("Bearer {}", self.config.api_key);
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth)
                .map_err(|_| Error::Config("API key is not a valid header value".to_string()))?,
        );
        Ok(headers)
    }

    fn build_payload(&self, prompt: &str, stream: bool) -> Value {
        json!({
            "model": self.config.model,
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
        "openai"
    }
}
