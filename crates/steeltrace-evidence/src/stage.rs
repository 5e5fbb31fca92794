//! The evidence-sealing pipeline stage
use crate::manifest::build_manifest;
use crate::resolver::FsResolver;
use crate::store::EvidenceStore;
use std::path::{Path, PathBuf};
use std::time::Duration;
use steeltrace_core::{PipelineConfig, Stage, StageError, StageOutcome, StageSpec};

/// Builds, seals and persists the manifest for one run.
///
/// Unlike external stages, any I/O problem here (unreadable artifact,
/// unwritable output) fails the stage outright.
pub struct EvidenceStage {
    name: String,
    run_id: String,
    artifacts: Vec<String>,
    resolver: FsResolver,
    store: EvidenceStore,
    output_artifact: Option<PathBuf>,
    timeout: Option<Duration>,
}

impl EvidenceStage {
    pub fn new(
        name: impl Into<String>,
        run_id: impl Into<String>,
        artifacts: Vec<String>,
        resolver: FsResolver,
        store: EvidenceStore,
    ) -> Self {
        Self {
            name: name.into(),
            run_id: run_id.into(),
            artifacts,
            resolver,
            store,
            output_artifact: None,
            timeout: None,
        }
    }

    pub fn from_config(spec: &StageSpec, config: &PipelineConfig) -> Self {
        let mut stage = Self::new(
            spec.name.clone(),
            config.run_id.clone(),
            config.artifacts.clone(),
            FsResolver::new(&config.root_dir),
            EvidenceStore::new(config.evidence_root()),
        );
        stage.output_artifact = spec.output_artifact.clone();
        stage.timeout = spec.timeout();
        stage
    }
}

impl Stage for EvidenceStage {
    fn name(&self) -> &str {
        &self.name
    }

    fn output_artifact(&self) -> Option<&Path> {
        self.output_artifact.as_deref()
    }

    fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    fn run(&self) -> Result<StageOutcome, StageError> {
        let manifest = build_manifest(&self.resolver, &self.artifacts, &self.run_id)
            .map_err(|e| StageError::ExecutionFailed(e.to_string()))?;
        let written = self
            .store
            .persist(&manifest)
            .map_err(|e| StageError::ExecutionFailed(e.to_string()))?;

        let missing = manifest.missing().count();
        Ok(StageOutcome::ok()
            .with_log(format!("Evidence manifest → {}", written.manifest_path.display()))
            .with_log(format!("merkle_root = {}", manifest.merkle_root))
            .with_log(format!(
                "leaves = {} ({} missing)",
                manifest.leaves.len(),
                missing
            )))
    }
}
