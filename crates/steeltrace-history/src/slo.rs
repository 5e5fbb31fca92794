//! Per-stage latency aggregation over the full run history
//!
//! # p95 estimator
//!
//! Below [`SMALL_SAMPLE_THRESHOLD`] samples the p95 is the maximum sample.
//! From the threshold on it is the 95th of 100 cut points of the exclusive
//! quantile method (Hyndman–Fan type 6): with ascending samples `x[1..=n]`,
//! `m = n + 1`, `j = ⌊95·m / 100⌋`, `δ = 95·m − 100·j`,
//! `p95 = (x[j]·(100 − δ) + x[j+1]·δ) / 100`.
//! Trend comparisons across releases rely on this staying fixed.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use steeltrace_core::Run;

/// Sample count from which the interpolated estimator replaces `max`
pub const SMALL_SAMPLE_THRESHOLD: usize = 20;

/// Latency statistics for one stage name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageLatency {
    pub count: usize,
    pub p95_sec: f64,
    pub mean_sec: f64,
}

/// Groups step durations by stage name across runs
#[derive(Debug, Clone, Default)]
pub struct SloAggregator {
    samples: BTreeMap<String, Vec<f64>>,
}

impl SloAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replay a whole history
    pub fn from_runs<'a>(runs: impl IntoIterator<Item = &'a Run>) -> Self {
        let mut agg = Self::new();
        for run in runs {
            agg.add_run(run);
        }
        agg
    }

    pub fn add_run(&mut self, run: &Run) {
        for step in &run.steps {
            self.add_sample(&step.name, step.duration_sec);
        }
    }

    pub fn add_sample(&mut self, stage: &str, duration_sec: f64) {
        self.samples
            .entry(stage.to_string())
            .or_default()
            .push(duration_sec);
    }

    pub fn sample_count(&self, stage: &str) -> usize {
        self.samples.get(stage).map_or(0, Vec::len)
    }

    /// Statistics per stage name. Names with no samples never appear.
    pub fn summarize(&self) -> BTreeMap<String, StageLatency> {
        self.samples
            .iter()
            .filter_map(|(name, values)| {
                let p95_sec = p95(values)?;
                let mean_sec = values.iter().sum::<f64>() / values.len() as f64;
                Some((
                    name.clone(),
                    StageLatency {
                        count: values.len(),
                        p95_sec: round4(p95_sec),
                        mean_sec: round4(mean_sec),
                    },
                ))
            })
            .collect()
    }
}

/// 95th percentile as documented at module level; `None` without samples.
pub fn p95(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    if values.len() < SMALL_SAMPLE_THRESHOLD {
        return values.iter().copied().reduce(f64::max);
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let m = sorted.len() + 1;
    let j = 95 * m / 100;
    let delta = (95 * m - j * 100) as f64;
    Some((sorted[j - 1] * (100.0 - delta) + sorted[j] * delta) / 100.0)
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
