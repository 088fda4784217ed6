//! HTTP transport seam
//!
//! The runner talks to APIs through [`HttpTransport`] so tests can swap in
//! a mock. The real implementation wraps a shared [`reqwest::Client`] with
//! a configurable per-request timeout; a timeout surfaces as a transport
//! error on the affected run.

use crate::error::{Error, Result};
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::StreamExt;
use reqwest::header::HeaderMap;
use serde_json::Value;
use std::time::Duration;

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Incremental line reader over a streaming response body.
///
/// Dropping the reader releases the underlying connection, so a caller can
/// stop after the first interesting line without draining the stream.
#[async_trait]
pub trait SseLines: Send {
    /// Next line of the response, without its trailing newline.
    ///
    /// Returns `None` once the stream is exhausted.
    async fn next_line(&mut self) -> Result<Option<String>>;
}

/// Minimal HTTP client surface the benchmark runner needs.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// POST a JSON body and read the response incrementally, line by line.
    async fn post_stream(
        &self,
        url: &str,
        headers: HeaderMap,
        body: &Value,
    ) -> Result<Box<dyn SseLines>>;

    /// POST a JSON body, await the full response, parse it as JSON.
    async fn post_json(&self, url: &str, headers: HeaderMap, body: &Value) -> Result<Value>;
}

/// [`HttpTransport`] backed by reqwest.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Create a transport with the default request timeout.
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_REQUEST_TIMEOUT)
    }

    /// Create a transport with an explicit per-request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    async fn send(
        &self,
        url: &str,
        headers: HeaderMap,
        body: &Value,
    ) -> Result<reqwest::Response> {
        let response = self
            .client
            .post(url)
            .headers(headers)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn post_stream(
        &self,
        url: &str,
        headers: HeaderMap,
        body: &Value,
    ) -> Result<Box<dyn SseLines>> {
        let response = self.send(url, headers, body).await?;
        Ok(Box::new(ReqwestSseLines {
            stream: response.bytes_stream().boxed(),
            buffer: String::new(),
        }))
    }

    async fn post_json(&self, url: &str, headers: HeaderMap, body: &Value) -> Result<Value> {
        let response = self.send(url, headers, body).await?;
        Ok(response.json().await?)
    }
}

struct ReqwestSseLines {
    stream: BoxStream<'static, reqwest::Result<Bytes>>,
    buffer: String,
}

#[async_trait]
impl SseLines for ReqwestSseLines {
    async fn next_line(&mut self) -> Result<Option<String>> {
        loop {
            if let Some(pos) = self.buffer.find('\n') {
                let line = self.buffer[..pos].trim_end_matches('\r').to_string();
                self.buffer.drain(..=pos);
                return Ok(Some(line));
            }
            match self.stream.next().await {
                Some(chunk) => {
                    self.buffer.push_str(&String::from_utf8_lossy(&chunk?));
                }
                None => {
                    if self.buffer.is_empty() {
                        return Ok(None);
                    }
                    let tail = std::mem::take(&mut self.buffer);
                    return Ok(Some(tail.trim_end_matches('\r').to_string()));
                }
            }
        }
    }
}
