//! Data Model: StageOutcome, StepResult, Run
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status reported by a stage through its result contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Ok,
    Error,
}

/// What a stage hands back: `{status, message?, logs?}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageOutcome {
    pub status: OutcomeStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default)]
    pub logs: Vec<String>,
}

impl StageOutcome {
    pub fn ok() -> Self {
        Self {
            status: OutcomeStatus::Ok,
            message: None,
            logs: Vec::new(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: OutcomeStatus::Error,
            message: Some(message.into()),
            logs: Vec::new(),
        }
    }

    /// Append a log line
    pub fn with_log(mut self, line: impl Into<String>) -> Self {
        self.logs.push(line.into());
        self
    }

    pub fn with_logs<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.logs.extend(lines.into_iter().map(Into::into));
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn is_ok(&self) -> bool {
        self.status == OutcomeStatus::Ok
    }
}

/// Recorded outcome of one stage execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    pub name: String,
    pub ok: bool,
    /// Wall-clock seconds, never negative
    pub duration_sec: f64,
    /// Last characters of the stage's standard output
    #[serde(rename = "stdout", default)]
    pub stdout_tail: String,
    /// Last characters of the stage's diagnostic output
    #[serde(rename = "stderr", default)]
    pub stderr_tail: String,
}

/// One complete execution of every configured stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub utc: DateTime<Utc>,
    pub steps: Vec<StepResult>,
}

impl Run {
    pub fn new(utc: DateTime<Utc>, steps: Vec<StepResult>) -> Self {
        Self { utc, steps }
    }

    /// AND over every step; an empty run is trivially ok.
    pub fn is_ok(&self) -> bool {
        self.steps.iter().all(|s| s.ok)
    }

    pub fn failures(&self) -> impl Iterator<Item = &StepResult> {
        self.steps.iter().filter(|s| !s.ok)
    }
}
