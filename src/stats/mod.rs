//! Sample-series reduction: summary statistics and percentiles

use serde::{Deserialize, Serialize};

/// Reduced, reportable form of one sample series.
///
/// All fields are zero for an empty series; percentiles of a single-element
/// series equal the lone value and its standard deviation is zero.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct StatsSummary {
    /// Arithmetic mean
    pub avg: f64,
    /// Minimum value
    pub min: f64,
    /// Maximum value
    pub max: f64,
    /// Median (average of the two middle elements for even n)
    pub median: f64,
    /// 90th percentile
    pub p90: f64,
    /// 99th percentile
    pub p99: f64,
    /// Sample standard deviation (n-1 denominator)
    pub std_dev: f64,
    /// The raw samples, in measurement order
    pub raw: Vec<f64>,
}

/// Reduce a sample series into a [`StatsSummary`].
///
/// The input is not mutated; sorting happens on a copy. Failed or skipped
/// runs never appear here, so `raw.len()` is the successful-measurement
/// count for the series.
pub fn compute_stats(samples: &[f64]) -> StatsSummary {
    if samples.is_empty() {
        return StatsSummary::default();
    }

    let mut sorted: Vec<f64> = samples.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let n = sorted.len();
    let avg = sorted.iter().sum::<f64>() / n as f64;

    let median = if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    };

    let variance = if n > 1 {
        sorted.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / (n - 1) as f64
    } else {
        0.0
    };

    StatsSummary {
        avg,
        min: sorted[0],
        max: sorted[n - 1],
        median,
        p90: percentile(&sorted, 90.0),
        p99: percentile(&sorted, 99.0),
        std_dev: variance.sqrt(),
        raw: samples.to_vec(),
    }
}

/// Percentile via linear interpolation between order statistics.
///
/// Expects `sorted` ascending. rank k = (n-1) * p/100; if k lands on an
/// index the element is returned as-is, otherwise the two neighbors are
/// interpolated.
fn percentile(sorted: &[f64], pct: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    if sorted.len() == 1 {
        return sorted[0];
    }

    let k = (sorted.len() - 1) as f64 * (pct / 100.0);
    let f = k.floor() as usize;
    let c = k.ceil() as usize;

    if f == c {
        sorted[f]
    } else {
        sorted[f] * (c as f64 - k) + sorted[c] * (k - f as f64)
    }
}
