//! Benchmark runner orchestration
//!
//! [`LlmBenchmark`] drives repeated measurement runs against one provider:
//! streaming requests for first-token latency, non-streaming requests for
//! throughput and total response time, with each sample series reduced
//! through the stats module at the end.
//!
//! Runs are strictly sequential. Overlapping runs against the same endpoint
//! would contend for the connection pool and skew both latency and
//! throughput timestamps.

use crate::error::Result;
use crate::providers::{create_provider, ApiProvider, ProviderConfig, ProviderRegistry};
use crate::stats::{compute_stats, StatsSummary};
use crate::transport::{HttpTransport, ReqwestTransport};
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::{sleep, Instant};

/// Pause between runs so repeated measurements don't trip vendor rate
/// limits. Never counted in any sample.
const RUN_DELAY: Duration = Duration::from_secs(1);

/// Aggregate result of one comprehensive benchmark invocation.
///
/// Field names and nesting are a persisted-result contract; downstream
/// report consumers read these exact keys. The top-level scalar averages
/// duplicate each summary's `avg` for older result-file consumers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkResult {
    /// Display name for this API, set in batch mode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Model under test
    pub model: String,
    /// Endpoint URL
    pub api_url: String,
    /// Provider kind tag
    pub api_type: String,
    /// When the result record was assembled
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Prompt length in characters
    pub prompt_length: usize,
    /// Requested run count
    pub runs: usize,
    /// Average first-token latency in seconds
    pub first_token_latency: f64,
    /// Average throughput in tokens per second
    pub token_throughput: f64,
    /// Average total response time in seconds
    pub total_time: f64,
    /// First-token latency statistics
    pub first_token_latency_stats: StatsSummary,
    /// Token throughput statistics
    pub token_throughput_stats: StatsSummary,
    /// Total response time statistics
    pub total_time_stats: StatsSummary,
}

/// Benchmark driver for a single provider/model/endpoint combination.
#[derive(Debug)]
pub struct LlmBenchmark<T: HttpTransport = ReqwestTransport> {
    config: ProviderConfig,
    api_type: String,
    provider: Box<dyn ApiProvider>,
    transport: T,
    run_delay: Duration,
}

impl LlmBenchmark<ReqwestTransport> {
    /// Create a benchmark against a provider kind from the default registry,
    /// using a reqwest transport with the default timeout.
    ///
    /// Fails before any network activity if the kind tag is unsupported.
    pub fn new(config: ProviderConfig, api_type: &str) -> Result<Self> {
        let provider = create_provider(api_type, config.clone())?;
        Ok(Self {
            config,
            api_type: api_type.to_string(),
            provider,
            transport: ReqwestTransport::new()?,
            run_delay: RUN_DELAY,
        })
    }

    /// Like [`new`](Self::new), with an explicit registry and transport
    /// timeout.
    pub fn with_registry(
        registry: &ProviderRegistry,
        config: ProviderConfig,
        api_type: &str,
        request_timeout: Duration,
    ) -> Result<Self> {
        let provider = registry.create(api_type, config.clone())?;
        Ok(Self {
            config,
            api_type: api_type.to_string(),
            provider,
            transport: ReqwestTransport::with_timeout(request_timeout)?,
            run_delay: RUN_DELAY,
        })
    }
}

impl<T: HttpTransport> LlmBenchmark<T> {
    /// Create a benchmark with an explicit transport.
    pub fn with_transport(config: ProviderConfig, api_type: &str, transport: T) -> Result<Self> {
        let provider = create_provider(api_type, config.clone())?;
        Ok(Self {
            config,
            api_type: api_type.to_string(),
            provider,
            transport,
            run_delay: RUN_DELAY,
        })
    }

    /// Override the inter-run politeness delay.
    pub fn with_run_delay(mut self, delay: Duration) -> Self {
        self.run_delay = delay;
        self
    }

    /// Measure time from request dispatch to the first content-bearing
    /// streamed event, across `runs` repetitions.
    ///
    /// A stream that ends without a qualifying line contributes no sample;
    /// the summary's `raw` length is the successful-run count.
    pub async fn measure_first_token_latency(
        &self,
        prompt: &str,
        runs: usize,
    ) -> Result<StatsSummary> {
        let mut latencies = Vec::with_capacity(runs);
        let pb = run_progress(runs);

        for i in 0..runs {
            let payload = self.provider.build_payload(prompt, true);
            let headers = self.provider.headers()?;

            let start = Instant::now();
            let mut lines = self
                .transport
                .post_stream(self.provider.request_url(), headers, &payload)
                .await?;

            let mut sample = None;
            while let Some(line) = lines.next_line().await? {
                if self.provider.is_first_content_event(&line) {
                    sample = Some(start.elapsed().as_secs_f64());
                    break;
                }
            }
            // Stop reading here; dropping the reader releases the connection
            drop(lines);

            match sample {
                Some(latency) => {
                    latencies.push(latency);
                    tracing::info!(
                        run = i + 1,
                        total = runs,
                        latency_secs = latency,
                        "first token received"
                    );
                }
                None => {
                    tracing::warn!(
                        run = i + 1,
                        total = runs,
                        "stream ended without a content event"
                    );
                }
            }

            pb.inc(1);
            if i + 1 < runs {
                sleep(self.run_delay).await;
            }
        }

        pb.finish_and_clear();
        Ok(compute_stats(&latencies))
    }

    /// Measure token throughput and total response time across `runs`
    /// non-streaming repetitions.
    ///
    /// Returns `(throughput_stats, total_time_stats)`. Total time is
    /// recorded for every completed run; a throughput sample is recorded
    /// only when the run yielded a positive token count in positive time.
    pub async fn measure_token_throughput(
        &self,
        prompt: &str,
        runs: usize,
    ) -> Result<(StatsSummary, StatsSummary)> {
        let mut throughputs = Vec::with_capacity(runs);
        let mut total_times = Vec::with_capacity(runs);
        let pb = run_progress(runs);

        for i in 0..runs {
            let payload = self.provider.build_payload(prompt, false);
            let headers = self.provider.headers()?;

            let start = Instant::now();
            let body = self
                .transport
                .post_json(self.provider.request_url(), headers, &payload)
                .await?;
            let elapsed = start.elapsed().as_secs_f64();
            total_times.push(elapsed);

            let tokens = self.provider.parse_token_count(&body);
            if elapsed > 0.0 && tokens > 0 {
                let throughput = tokens as f64 / elapsed;
                throughputs.push(throughput);
                tracing::info!(
                    run = i + 1,
                    total = runs,
                    tokens,
                    elapsed_secs = elapsed,
                    throughput,
                    "completion finished"
                );
            } else {
                tracing::warn!(
                    run = i + 1,
                    total = runs,
                    "no generated tokens reported; throughput sample skipped"
                );
            }

            pb.inc(1);
            if i + 1 < runs {
                sleep(self.run_delay).await;
            }
        }

        pb.finish_and_clear();
        Ok((compute_stats(&throughputs), compute_stats(&total_times)))
    }

    /// Run both measurement dimensions and assemble the full result record.
    pub async fn run_comprehensive_benchmark(
        &self,
        prompt: &str,
        runs: usize,
    ) -> Result<BenchmarkResult> {
        tracing::info!(
            model = %self.config.model,
            api_url = %self.config.api_url,
            api_type = %self.api_type,
            prompt_chars = prompt.chars().count(),
            runs,
            "starting benchmark"
        );

        tracing::info!("measuring first-token latency");
        let latency_stats = self.measure_first_token_latency(prompt, runs).await?;

        tracing::info!("measuring token throughput");
        let (throughput_stats, total_time_stats) =
            self.measure_token_throughput(prompt, runs).await?;

        Ok(BenchmarkResult {
            name: None,
            model: self.config.model.clone(),
            api_url: self.config.api_url.clone(),
            api_type: self.api_type.clone(),
            timestamp: chrono::Utc::now(),
            prompt_length: prompt.chars().count(),
            runs,
            first_token_latency: latency_stats.avg,
            token_throughput: throughput_stats.avg,
            total_time: total_time_stats.avg,
            first_token_latency_stats: latency_stats,
            token_throughput_stats: throughput_stats,
            total_time_stats,
        })
    }
}

fn run_progress(runs: usize) -> ProgressBar {
    let pb = ProgressBar::new(runs as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len}")
            .unwrap()
            .progress_chars("#>-"),
    );
    pb
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::SseLines;
    use async_trait::async_trait;
    use reqwest::header::HeaderMap;
    use serde_json::{json, Value};

    /// Transport that serves canned data after configurable virtual delays.
    struct MockTransport {
        stream_lines: Vec<String>,
        stream_delay: Duration,
        response: Value,
        response_delay: Duration,
    }

    struct MockLines {
        lines: std::vec::IntoIter<String>,
        delay: Option<Duration>,
    }

    #[async_trait]
    impl SseLines for MockLines {
        async fn next_line(&mut self) -> Result<Option<String>> {
            if let Some(delay) = self.delay.take() {
                sleep(delay).await;
            }
            Ok(self.lines.next())
        }
    }

    #[async_trait]
    impl HttpTransport for MockTransport {
        async fn post_stream(
            &self,
            _url: &str,
            _headers: HeaderMap,
            _body: &Value,
        ) -> Result<Box<dyn SseLines>> {
            Ok(Box::new(MockLines {
                lines: self.stream_lines.clone().into_iter(),
                delay: Some(self.stream_delay),
            }))
        }

        async fn post_json(
            &self,
            _url: &str,
            _headers: HeaderMap,
            _body: &Value,
        ) -> Result<Value> {
            sleep(self.response_delay).await;
            Ok(self.response.clone())
        }
    }

    fn benchmark(transport: MockTransport) -> LlmBenchmark<MockTransport> {
        let config = ProviderConfig::new("https://api.test/v1/chat", "key", "test-model");
        LlmBenchmark::with_transport(config, "openai", transport).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_token_latency_single_run() {
        let transport = MockTransport {
            stream_lines: vec!["data: {\"id\":\"test\"}".to_string()],
            stream_delay: Duration::from_millis(500),
            response: json!({}),
            response_delay: Duration::ZERO,
        };
        let stats = benchmark(transport)
            .measure_first_token_latency("hello", 1)
            .await
            .unwrap();

        assert!((stats.avg - 0.5).abs() < 1e-6);
        assert_eq!(stats.raw.len(), 1);
        assert!((stats.raw[0] - 0.5).abs() < 1e-6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stream_without_content_yields_no_sample() {
        let transport = MockTransport {
            stream_lines: vec!["".to_string(), "   ".to_string()],
            stream_delay: Duration::from_millis(100),
            response: json!({}),
            response_delay: Duration::ZERO,
        };
        let stats = benchmark(transport)
            .measure_first_token_latency("hello", 2)
            .await
            .unwrap();

        assert!(stats.raw.is_empty());
        assert_eq!(stats.avg, 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_token_throughput() {
        let transport = MockTransport {
            stream_lines: vec![],
            stream_delay: Duration::ZERO,
            response: json!({"usage": {"completion_tokens": 100}}),
            response_delay: Duration::from_secs(2),
        };
        let (throughput, total_time) = benchmark(transport)
            .measure_token_throughput("hello", 1)
            .await
            .unwrap();

        assert!((throughput.avg - 50.0).abs() < 1e-6);
        assert!((total_time.avg - 2.0).abs() < 1e-6);
        assert_eq!(throughput.raw.len(), 1);
        assert_eq!(total_time.raw.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_tokens_skips_throughput_but_keeps_total_time() {
        let transport = MockTransport {
            stream_lines: vec![],
            stream_delay: Duration::ZERO,
            response: json!({"usage": {"completion_tokens": 0}}),
            response_delay: Duration::from_secs(1),
        };
        let (throughput, total_time) = benchmark(transport)
            .measure_token_throughput("hello", 3)
            .await
            .unwrap();

        assert!(throughput.raw.is_empty());
        assert_eq!(total_time.raw.len(), 3);
        assert!((total_time.avg - 1.0).abs() < 1e-6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_comprehensive_benchmark_result() {
        let transport = MockTransport {
            stream_lines: vec!["data: {\"id\":\"test\"}".to_string()],
            stream_delay: Duration::from_millis(250),
            response: json!({"usage": {"completion_tokens": 40}}),
            response_delay: Duration::from_secs(2),
        };
        let result = benchmark(transport)
            .run_comprehensive_benchmark("hello world", 2)
            .await
            .unwrap();

        assert_eq!(result.model, "test-model");
        assert_eq!(result.api_url, "https://api.test/v1/chat");
        assert_eq!(result.api_type, "openai");
        assert_eq!(result.prompt_length, 11);
        assert_eq!(result.runs, 2);
        // Flattened scalars duplicate the summary averages
        assert_eq!(
            result.first_token_latency,
            result.first_token_latency_stats.avg
        );
        assert_eq!(result.token_throughput, result.token_throughput_stats.avg);
        assert_eq!(result.total_time, result.total_time_stats.avg);
        assert!((result.first_token_latency - 0.25).abs() < 1e-6);
        assert!((result.token_throughput - 20.0).abs() < 1e-6);
        assert!((result.total_time - 2.0).abs() < 1e-6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_result_serialized_field_contract() {
        let transport = MockTransport {
            stream_lines: vec!["data: {}".to_string()],
            stream_delay: Duration::from_millis(100),
            response: json!({"usage": {"completion_tokens": 10}}),
            response_delay: Duration::from_millis(500),
        };
        let result = benchmark(transport)
            .run_comprehensive_benchmark("p", 1)
            .await
            .unwrap();
        let json = serde_json::to_value(&result).unwrap();

        for key in [
            "model",
            "api_url",
            "api_type",
            "timestamp",
            "prompt_length",
            "runs",
            "first_token_latency",
            "token_throughput",
            "total_time",
            "first_token_latency_stats",
            "token_throughput_stats",
            "total_time_stats",
        ] {
            assert!(json.get(key).is_some(), "missing field: {}", key);
        }
        for key in ["avg", "min", "max", "median", "p90", "p99", "std_dev", "raw"] {
            assert!(
                json["first_token_latency_stats"].get(key).is_some(),
                "missing stats field: {}",
                key
            );
        }
        // name is only present in batch results
        assert!(json.get("name").is_none());
    }

    #[test]
    fn test_unknown_api_type_fails_before_any_network() {
        let config = ProviderConfig::new("https://api.test", "key", "model");
        let err = LlmBenchmark::new(config, "invalid_type").unwrap_err();
        assert!(err.to_string().contains("invalid_type"));
        assert!(err.to_string().contains("openai, claude, azure"));
    }
}
