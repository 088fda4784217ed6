//! Batch mode: benchmark several APIs from one TOML config
//!
//! Config shape:
//!
//! ```toml
//! [general]
//! prompt = "Explain how TCP congestion control works."
//! runs = 3
//! output_dir = "./results"
//!
//! [[apis]]
//! name = "local vllm"
//! url = "http://localhost:8000/v1/chat/completions"
//! key = "none"
//! model = "llama-3-8b"
//! type = "openai"
//! ```
//!
//! Entries missing a url or model are skipped with a warning. A failure
//! against one API is logged and the batch moves on; the configured APIs
//! are mutually independent, so partial results are still useful.

use crate::error::{Error, Result};
use crate::output::JsonExporter;
use crate::providers::ProviderConfig;
use crate::runner::{BenchmarkResult, LlmBenchmark};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Top-level batch configuration.
#[derive(Debug, Deserialize)]
pub struct BatchConfig {
    /// Shared run parameters
    #[serde(default)]
    pub general: GeneralConfig,
    /// APIs to benchmark
    #[serde(default)]
    pub apis: Vec<ApiEntry>,
}

/// Shared parameters for every API in the batch.
#[derive(Debug, Deserialize)]
pub struct GeneralConfig {
    /// Prompt submitted to every API
    #[serde(default = "default_prompt")]
    pub prompt: String,
    /// Run count per measurement dimension
    #[serde(default = "default_runs")]
    pub runs: usize,
    /// Directory result JSON files are written to
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            prompt: default_prompt(),
            runs: default_runs(),
            output_dir: default_output_dir(),
        }
    }
}

fn default_prompt() -> String {
    "Explain the relationship between quantum mechanics and relativity, \
     and give three examples of practical applications."
        .to_string()
}

fn default_runs() -> usize {
    3
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./results")
}

/// One API under test.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEntry {
    /// Display name used in logs, file names and the comparison table
    #[serde(default)]
    pub name: Option<String>,
    /// Endpoint URL
    #[serde(default)]
    pub url: Option<String>,
    /// API credential
    #[serde(default)]
    pub key: Option<String>,
    /// Model name
    #[serde(default)]
    pub model: Option<String>,
    /// Provider kind tag
    #[serde(rename = "type", default = "default_api_type")]
    pub api_type: String,
}

fn default_api_type() -> String {
    "openai".to_string()
}

impl BatchConfig {
    /// Load and parse a TOML config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: BatchConfig = toml::from_str(&content)?;
        if config.apis.is_empty() {
            return Err(Error::Config(
                "no API entries found in config file".to_string(),
            ));
        }
        Ok(config)
    }
}

/// Run every configured API through a comprehensive benchmark.
///
/// Each completed result is persisted to `output_dir` as
/// `<name>_<unix-ts>.json` before the next API starts, so an interrupted
/// batch keeps what it measured.
pub async fn run_batch(config: &BatchConfig) -> Result<Vec<BenchmarkResult>> {
    std::fs::create_dir_all(&config.general.output_dir)?;

    let mut results = Vec::new();
    for (i, api) in config.apis.iter().enumerate() {
        let name = api
            .name
            .clone()
            .unwrap_or_else(|| format!("API_{}", i + 1));

        let (Some(url), Some(model)) = (api.url.as_deref(), api.model.as_deref()) else {
            tracing::warn!(name = %name, "incomplete API entry (url and model required), skipped");
            continue;
        };
        let key = api.key.as_deref().unwrap_or_default();

        tracing::info!(name = %name, api_type = %api.api_type, "benchmarking API");

        let provider_config = ProviderConfig::new(url, key, model);
        let outcome = async {
            let benchmark = LlmBenchmark::new(provider_config, &api.api_type)?;
            benchmark
                .run_comprehensive_benchmark(&config.general.prompt, config.general.runs)
                .await
        }
        .await;

        match outcome {
            Ok(mut result) => {
                result.name = Some(name.clone());
                let path = result_path(&config.general.output_dir, &name);
                if let Err(e) = JsonExporter::export(&result, &path) {
                    tracing::error!(name = %name, error = %e, "failed to persist result");
                } else {
                    tracing::info!(name = %name, path = %path.display(), "result saved");
                }
                results.push(result);
            }
            Err(e) => {
                tracing::error!(name = %name, error = %e, "benchmark failed, continuing batch");
            }
        }
    }

    Ok(results)
}

fn result_path(output_dir: &Path, name: &str) -> PathBuf {
    let slug = name.replace(' ', "_").to_lowercase();
    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    output_dir.join(format!("{slug}_{ts}.json"))
}
