//! Step Runner: executa um estágio isolado, mede duração e captura saída
use crate::data_model::{StageOutcome, StepResult};
use crate::stage::{Stage, StageError};
use std::any::Any;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinError;

/// Characters kept from each output stream
pub const TAIL_BUDGET: usize = 4000;

#[derive(Debug, Clone)]
pub struct StepRunner {
    tail_budget: usize,
}

impl Default for StepRunner {
    fn default() -> Self {
        Self::new(TAIL_BUDGET)
    }
}

impl StepRunner {
    pub fn new(tail_budget: usize) -> Self {
        Self { tail_budget }
    }

    /// Runs one stage to completion and records it.
    ///
    /// Never fails: stage errors, error statuses, panics and an exceeded
    /// deadline all come back as `ok = false` with the cause in `stderr`.
    ///
    /// The stage's worker is always joined before this returns, so the next
    /// stage never starts while this one is still running. A stage that
    /// overruns its deadline is recorded as failed; stopping the work is up
    /// to the stage itself (process stages kill their child).
    pub async fn execute(&self, stage: Arc<dyn Stage>) -> StepResult {
        let name = stage.name().to_string();
        let deadline = stage.timeout();

        let start = Instant::now();
        let mut task = tokio::task::spawn_blocking(move || stage.run());
        let result = match deadline {
            Some(limit) => match tokio::time::timeout(limit, &mut task).await {
                Ok(joined) => flatten(joined),
                Err(_) => {
                    tracing::warn!(stage = %name, "deadline passed, waiting for stage to stop");
                    let _ = task.await;
                    Err(StageError::DeadlineExceeded(limit))
                }
            },
            None => flatten(task.await),
        };
        let duration_sec = start.elapsed().as_secs_f64();

        let (ok, stdout, stderr) = match result {
            Ok(outcome) => self.split_outcome(outcome),
            Err(e) => (false, String::new(), e.to_string()),
        };

        if ok {
            tracing::info!(stage = %name, duration_sec, "[{}] OK ({:.2}s)", name, duration_sec);
        } else {
            tracing::warn!(stage = %name, duration_sec, stderr = %stderr, "[{}] FAILED", name);
        }

        StepResult {
            name,
            ok,
            duration_sec,
            stdout_tail: tail(&stdout, self.tail_budget),
            stderr_tail: tail(&stderr, self.tail_budget),
        }
    }

    fn split_outcome(&self, outcome: StageOutcome) -> (bool, String, String) {
        let ok = outcome.is_ok();
        let stdout = outcome.logs.join("\n");
        let stderr = match outcome.message {
            Some(msg) => msg,
            None if !ok => "stage reported error status".to_string(),
            None => String::new(),
        };
        (ok, stdout, stderr)
    }
}

fn flatten(
    joined: Result<Result<StageOutcome, StageError>, JoinError>,
) -> Result<StageOutcome, StageError> {
    match joined {
        Ok(result) => result,
        Err(e) if e.is_panic() => Err(StageError::Panicked(panic_message(e.into_panic()))),
        Err(e) => Err(StageError::ExecutionFailed(e.to_string())),
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Last `budget` characters of `text`, never splitting a character.
pub fn tail(text: &str, budget: usize) -> String {
    let count = text.chars().count();
    if count <= budget {
        return text.to_string();
    }
    match text.char_indices().nth(count - budget) {
        Some((idx, _)) => text[idx..].to_string(),
        None => String::new(),
    }
}
