//! SLO report: `{utc, agg, last_run}`, rebuilt from scratch each run
use crate::error::HistoryError;
use crate::slo::{SloAggregator, StageLatency};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use steeltrace_core::{fsio, Run, StepResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SloReport {
    /// Timestamp of the run that triggered this report
    pub utc: DateTime<Utc>,
    pub agg: BTreeMap<String, StageLatency>,
    pub last_run: Vec<StepResult>,
}

impl SloReport {
    /// Aggregate `history` (which should already contain `last_run`)
    pub fn from_history(history: &[Run], last_run: &Run) -> Self {
        Self {
            utc: last_run.utc,
            agg: SloAggregator::from_runs(history).summarize(),
            last_run: last_run.steps.clone(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Replace the report file atomically
    pub fn write_to(&self, path: &Path) -> Result<(), HistoryError> {
        let json = self.to_json()?;
        fsio::write_atomic(path, json.as_bytes()).map_err(|e| HistoryError::io(path, e))?;
        tracing::info!(path = %path.display(), stages = self.agg.len(), "SLO report written");
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, HistoryError> {
        let text = std::fs::read_to_string(path).map_err(|e| HistoryError::io(path, e))?;
        Ok(serde_json::from_str(&text)?)
    }
}
