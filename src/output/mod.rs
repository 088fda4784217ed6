//! Result persistence

use crate::error::Result;
use crate::runner::BenchmarkResult;
use std::fs::File;
use std::path::Path;

/// Writes benchmark result records as pretty-printed JSON.
pub struct JsonExporter;

impl JsonExporter {
    /// Export a single result record.
    pub fn export(result: &BenchmarkResult, path: impl AsRef<Path>) -> Result<()> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, result)?;
        Ok(())
    }

    /// Export a list of result records (batch mode).
    pub fn export_all(results: &[BenchmarkResult], path: impl AsRef<Path>) -> Result<()> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, results)?;
        Ok(())
    }
}
