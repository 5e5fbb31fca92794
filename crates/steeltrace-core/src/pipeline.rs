//! Pipeline Orchestrator: encadeia estágios em ordem, sem curto-circuito
use crate::data_model::Run;
use crate::runner::StepRunner;
use crate::stage::Stage;
use chrono::Utc;
use std::sync::Arc;
use tracing::Instrument;

pub struct PipelineOrchestrator {
    stages: Vec<Arc<dyn Stage>>,
    runner: StepRunner,
}

impl PipelineOrchestrator {
    pub fn new(stages: Vec<Arc<dyn Stage>>) -> Self {
        Self::with_runner(stages, StepRunner::default())
    }

    pub fn with_runner(stages: Vec<Arc<dyn Stage>>, runner: StepRunner) -> Self {
        Self { stages, runner }
    }

    /// Executes every stage once, strictly in order.
    ///
    /// A failed stage does not stop the pipeline: later stages (evidence
    /// sealing in particular) still run and are recorded. The returned
    /// `Run` has exactly one step per configured stage.
    pub async fn run(&self) -> Run {
        let trace_id = uuid::Uuid::new_v4().to_string();
        let span = tracing::info_span!("pipeline", %trace_id, stages = self.stages.len());

        async {
            let mut steps = Vec::with_capacity(self.stages.len());
            for stage in &self.stages {
                steps.push(self.runner.execute(Arc::clone(stage)).await);
            }

            let run = Run::new(Utc::now(), steps);
            let failed = run.failures().count();
            tracing::info!(ok = run.is_ok(), failed, "pipeline finished");
            run
        }
        .instrument(span)
        .await
    }

    /// Stage names in execution order
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}
