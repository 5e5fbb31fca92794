//! SteelTrace audit cycle: orchestrate, append history, rebuild SLOs
use std::fmt::Write;
use steeltrace_core::{PipelineConfig, PipelineOrchestrator, Run, StageSpec};
use steeltrace_history::{HistoryError, RunHistoryStore, SloReport};
use steeltrace_stages::build_stages;
use thiserror::Error;

/// Failures outside any stage. Stage failures never show up here.
#[derive(Error, Debug)]
pub enum AuditError {
    /// Every stage ran, but the run could not be written to history or the
    /// SLO report. The run is kept so its failures can still be reported.
    #[error("AUDIT/RECORD: run finished but was not recorded")]
    Record {
        run: Box<Run>,
        #[source]
        source: HistoryError,
    },
}

impl AuditError {
    /// The finished run, when the stages got to execute
    pub fn run(&self) -> Option<&Run> {
        match self {
            Self::Record { run, .. } => Some(run),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuditOutcome {
    pub run: Run,
    pub report: SloReport,
    /// Corrupted history lines ignored while rebuilding the report
    pub skipped_history_lines: usize,
}

impl AuditOutcome {
    /// 0 iff every step passed
    pub fn exit_code(&self) -> u8 {
        if self.run.is_ok() {
            0
        } else {
            1
        }
    }
}

/// One full cycle: every stage once, then history and SLO report.
pub async fn run_audit(config: &PipelineConfig) -> Result<AuditOutcome, AuditError> {
    let orchestrator = PipelineOrchestrator::new(build_stages(config));
    let run = orchestrator.run().await;

    match record(config, &run) {
        Ok((report, skipped_history_lines)) => Ok(AuditOutcome {
            run,
            report,
            skipped_history_lines,
        }),
        Err(source) => Err(AuditError::Record {
            run: Box::new(run),
            source,
        }),
    }
}

fn record(config: &PipelineConfig, run: &Run) -> Result<(SloReport, usize), HistoryError> {
    let store = RunHistoryStore::new(config.history_file());
    store.append(run)?;
    let history = store.load_all()?;
    if history.skipped_lines > 0 {
        tracing::warn!(
            skipped = history.skipped_lines,
            path = %store.path().display(),
            "corrupted history lines ignored"
        );
    }

    let report = SloReport::from_history(&history.runs, run);
    report.write_to(&config.slo_report_file())?;
    Ok((report, history.skipped_lines))
}

/// Name, label, role and captured stderr of every failing step.
///
/// `stages` supplies the label and role; a step without a matching spec is
/// listed by name only.
pub fn failure_summary(run: &Run, stages: &[StageSpec]) -> String {
    let mut out = String::new();
    for step in run.failures() {
        let spec = stages.iter().find(|s| s.name == step.name);
        let _ = write!(out, "[{}] FAILED", step.name);
        if let Some(label) = spec.and_then(|s| s.label.as_deref()) {
            let _ = write!(out, " {}", label);
        }
        if let Some(role) = spec.and_then(|s| s.role.as_deref()) {
            let _ = write!(out, " ({})", role);
        }
        let _ = writeln!(out, ":");
        let _ = writeln!(out, "{}", step.stderr_tail.trim_end());
    }
    out
}
