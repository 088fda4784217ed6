//! CLI argument parsing and command handling

use crate::batch::{run_batch, BatchConfig};
use crate::output::JsonExporter;
use crate::providers::ProviderConfig;
use crate::runner::{BenchmarkResult, LlmBenchmark};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_PROMPT: &str = "Explain the relationship between quantum mechanics and relativity, \
                              and give three examples of practical applications.";

/// llm-api-bench - first-token latency and token throughput for LLM APIs
#[derive(Parser, Debug)]
#[command(name = "llm-api-bench")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Benchmark a single API
    Single {
        /// API endpoint URL
        #[arg(long, default_value = "https://api.openai.com/v1/chat/completions")]
        api_url: String,

        /// API key
        #[arg(long, env = "LLM_API_KEY")]
        api_key: String,

        /// Model name
        #[arg(long, default_value = "gpt-3.5-turbo")]
        model: String,

        /// API type (openai, claude, azure)
        #[arg(long, default_value = "openai")]
        api_type: String,

        /// Prompt submitted on every run
        #[arg(long, default_value = DEFAULT_PROMPT)]
        prompt: String,

        /// Run count per measurement dimension
        #[arg(long, default_value_t = 3)]
        runs: usize,

        /// Per-request timeout in seconds
        #[arg(long, default_value_t = 300)]
        timeout_secs: u64,

        /// Write the result record to this JSON file
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Benchmark every API in a TOML config file and compare them
    Batch {
        /// Path to the TOML config file
        #[arg(long)]
        config: PathBuf,
    },
}

impl Cli {
    /// Dispatch the parsed command.
    pub async fn run(&self) -> Result<()> {
        match &self.command {
            Command::Single {
                api_url,
                api_key,
                model,
                api_type,
                prompt,
                runs,
                timeout_secs,
                output,
            } => {
                let config = ProviderConfig::new(api_url, api_key, model);
                let benchmark = LlmBenchmark::with_registry(
                    &Default::default(),
                    config,
                    api_type,
                    Duration::from_secs(*timeout_secs),
                )
                .context("failed to set up benchmark")?;

                let result = benchmark
                    .run_comprehensive_benchmark(prompt, *runs)
                    .await
                    .with_context(|| format!("benchmark against {} failed", api_url))?;

                print_result(&result);

                if let Some(path) = output {
                    JsonExporter::export(&result, path)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    println!("Result saved to: {}", path.display());
                }
                Ok(())
            }

            Command::Batch { config } => {
                let batch_config = BatchConfig::from_file(config)
                    .with_context(|| format!("failed to load config: {}", config.display()))?;

                let results = run_batch(&batch_config).await?;
                if results.is_empty() {
                    anyhow::bail!("no API produced a result");
                }

                print_comparison(&results);
                println!(
                    "Results saved under: {}",
                    batch_config.general.output_dir.display()
                );
                Ok(())
            }
        }
    }
}

/// Print the results block for one benchmark.
fn print_result(result: &BenchmarkResult) {
    let latency = &result.first_token_latency_stats;
    let throughput = &result.token_throughput_stats;
    let total = &result.total_time_stats;

    println!("\n{}", "=".repeat(70));
    println!("   Benchmark Results");
    println!("{}", "=".repeat(70));
    println!();
    println!("Model:        {}", result.model);
    println!("Endpoint:     {}", result.api_url);
    println!("API type:     {}", result.api_type);
    println!("Prompt chars: {}", result.prompt_length);
    println!("Runs:         {}", result.runs);
    println!();
    println!(
        "First-token latency:  {:.3} s  (min={:.3}, p90={:.3}, std={:.3})",
        latency.avg, latency.min, latency.p90, latency.std_dev
    );
    println!(
        "Token throughput:     {:.2} tok/s  (min={:.2}, p90={:.2}, std={:.2})",
        throughput.avg, throughput.min, throughput.p90, throughput.std_dev
    );
    println!(
        "Total response time:  {:.2} s  (min={:.2}, max={:.2})",
        total.avg, total.min, total.max
    );
    println!("{}", "=".repeat(70));
    println!();
}

/// Print the cross-API comparison table, fastest first-token latency first.
fn print_comparison(results: &[BenchmarkResult]) {
    let mut sorted: Vec<&BenchmarkResult> = results.iter().collect();
    sorted.sort_by(|a, b| {
        a.first_token_latency
            .partial_cmp(&b.first_token_latency)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    println!("\n{}", "=".repeat(70));
    println!("   Comparison ({} APIs)", sorted.len());
    println!("{}", "=".repeat(70));
    println!(
        "{:<20} {:>12} {:>10} {:>12} {:>10}",
        "Name", "Latency (s)", "P90 (s)", "Tokens/s", "Total (s)"
    );
    for result in sorted {
        let name = result.name.as_deref().unwrap_or(&result.model);
        println!(
            "{:<20} {:>12.3} {:>10.3} {:>12.2} {:>10.2}",
            name,
            result.first_token_latency,
            result.first_token_latency_stats.p90,
            result.token_throughput,
            result.total_time
        );
    }
    println!("{}", "=".repeat(70));
}
