//! llm-api-bench - Benchmark chat-completion LLM APIs
//!
//! Measures first-token latency (streaming) and token throughput
//! (non-streaming) across repeated runs, then reduces the samples into
//! summary statistics.
//!
//! # Architecture
//!
//! - **Providers**: adapters normalizing vendor protocols (OpenAI-compatible,
//!   Claude, Azure OpenAI) into one trait
//! - **Transport**: the HTTP seam (streaming line reader + JSON POST)
//! - **Stats**: sample-series reduction with interpolated percentiles
//! - **Runner**: sequential repeated-run orchestration
//! - **Batch**: benchmark several APIs from one TOML config
//!
//! # Example
//!
//! ```rust,no_run
//! use llm_api_bench::providers::ProviderConfig;
//! use llm_api_bench::runner::LlmBenchmark;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ProviderConfig::new(
//!         "https://api.openai.com/v1/chat/completions",
//!         "your-api-key",
//!         "gpt-4o-mini",
//!     );
//!     let benchmark = LlmBenchmark::new(config, "openai")?;
//!     let result = benchmark.run_comprehensive_benchmark("Hello!", 3).await?;
//!     println!("avg first-token latency: {:.3}s", result.first_token_latency);
//!     Ok(())
//! }
//! ```

pub mod batch;
pub mod cli;
pub mod error;
pub mod output;
pub mod providers;
pub mod runner;
pub mod stats;
pub mod transport;

// Re-export commonly used types
pub use error::{Error, Result};
pub use providers::{create_provider, ApiKind, ApiProvider, ProviderConfig, ProviderRegistry};
pub use runner::{BenchmarkResult, LlmBenchmark};
pub use stats::{compute_stats, StatsSummary};
pub use transport::{HttpTransport, ReqwestTransport};
