use crate::process::ProcessStage;
use std::sync::Arc;
use steeltrace_core::{PipelineConfig, Stage, StageTarget};
use steeltrace_evidence::EvidenceStage;

/// Instantiate the configured stages, in order.
///
/// Command stages run with `root_dir` as their working directory so the
/// relative artifact paths they write line up with what evidence sealing reads.
pub fn build_stages(config: &PipelineConfig) -> Vec<Arc<dyn Stage>> {
    config
        .stages
        .iter()
        .map(|spec| -> Arc<dyn Stage> {
            match &spec.target {
                StageTarget::Command { program, args } => Arc::new(
                    ProcessStage::new(spec.name.clone(), program.clone())
                        .args(args.iter().cloned())
                        .current_dir(&config.root_dir)
                        .with_output_artifact(spec.output_artifact.clone())
                        .with_timeout(spec.timeout()),
                ),
                StageTarget::Evidence => Arc::new(EvidenceStage::from_config(spec, config)),
            }
        })
        .collect()
}
