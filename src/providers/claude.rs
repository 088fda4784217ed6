//! Anthropic Claude provider adapter

use super::{ApiProvider, ProviderConfig};
use crate::error::{Error, Result};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde_json::{json, Value};

/// Anthropic API version header value.
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// The messages API requires an output-token bound on every request.
const MAX_OUTPUT_TOKENS: u64 = 1024;

/// Adapter for the Anthropic Claude messages API.
#[derive(Debug, Clone)]
pub struct ClaudeProvider {
    config: ProviderConfig,
}

impl ClaudeProvider {
    /// Create a new Claude provider.
    pub fn new(config: ProviderConfig) -> Self {
        Self { config }
    }
}

impl ApiProvider for ClaudeProvider {
    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(&self.config.api_key)
                .map_err(|_| Error::Config("API key is not a valid header value".to_string()))?,
        );
        headers.insert(
            "anthropic-version",
            HeaderValue::from_static(ANTHROPIC_VERSION),
        );
        Ok(headers)
    }

    fn build_payload(&self, prompt: &str, stream: bool) -> Value {
        let mut payload = json!({
            "model": self.config.model,
            "max_tokens": MAX_OUTPUT_TOKENS,
            "messages": [{"role": "user", "content": prompt}],
        });
        // The stream key is omitted entirely for non-streaming requests
        if stream {
            payload["stream"] = json!(true);
        }
        payload
    }

    fn request_url(&self) -> &str {
        &self.config.api_url
    }

    fn parse_token_count(&self, body: &Value) -> u64 {
        // Anthropic always reports output_tokens; no whitespace fallback
        body.pointer("/usage/output_tokens")
            .and_then(Value::as_u64)
            .unwrap_or(0)
    }

    fn parse_content(&self, body: &Value) -> String {
        body.pointer("/content/0/text")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    }

    fn is_first_content_event(&self, line: &str) -> bool {
        let Some(data) = line.trim().strip_prefix("data:") else {
            return false;
        };
        match serde_json::from_str::<Value>(data.trim()) {
            Ok(event) => event.get("type").and_then(Value::as_str) == Some("content_block_delta"),
            Err(_) => false,
        }
    }

    fn name(&self) -> &'static str {
        "claude"
    }
}
