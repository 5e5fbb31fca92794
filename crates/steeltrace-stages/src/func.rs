use std::time::Duration;
use steeltrace_core::{Stage, StageError, StageOutcome};

type StageFn = dyn Fn() -> Result<StageOutcome, StageError> + Send + Sync;

/// An in-process stage wrapping a closure.
pub struct FnStage {
    name: String,
    func: Box<StageFn>,
    timeout: Option<Duration>,
}

impl FnStage {
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn() -> Result<StageOutcome, StageError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Box::new(func),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl Stage for FnStage {
    fn name(&self) -> &str {
        &self.name
    }

    fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    fn run(&self) -> Result<StageOutcome, StageError> {
        (self.func)()
    }
}

impl std::fmt::Debug for FnStage {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("FnStage")
            .field("name", &self.name)
            .field("timeout", &self.timeout)
            .finish()
    }
}
