//! End-to-end orchestration over real process stages and evidence sealing.
#![cfg(unix)]

use std::sync::Arc;
use std::time::Duration;
use steeltrace_core::{PipelineConfig, PipelineOrchestrator, Stage, StageError, StageOutcome, StageSpec};
use steeltrace_evidence::{EvidenceStore, FsResolver, verify_manifest};
use steeltrace_stages::{build_stages, FnStage};

fn config_in(root: &std::path::Path) -> PipelineConfig {
    PipelineConfig {
        root_dir: root.to_path_buf(),
        artifacts: vec!["raga/kpis.json".into(), "xbrl/informe.xbrl".into()],
        stages: vec![
            StageSpec::command("MCP.ingest", "sh", &["-c", "mkdir -p data && echo '{}' > data/dq_report.json"]),
            StageSpec::command("SHACL.validate", "sh", &["-c", "echo 'SHACL OK'"]),
            StageSpec::command("RAGA.compute", "sh", &["-c", "echo 'model unavailable' >&2; exit 1"]),
            StageSpec::command("EEE.gate", "sh", &["-c", "mkdir -p raga && echo '{\"kpi\": 1}' > raga/kpis.json"]),
            StageSpec::command("XBRL.generate", "steeltrace-missing-xbrl-tool", &[]),
            StageSpec::evidence("EVIDENCE.build"),
        ],
        ..PipelineConfig::default()
    }
}

#[tokio::test]
async fn test_failed_stage_does_not_stop_evidence_sealing() {
    let temp = tempfile::tempdir().unwrap();
    let config = config_in(temp.path());

    let run = PipelineOrchestrator::new(build_stages(&config)).run().await;

    assert_eq!(run.steps.len(), 6);
    let oks: Vec<bool> = run.steps.iter().map(|s| s.ok).collect();
    assert_eq!(oks, vec![true, true, false, true, false, true]);
    assert!(!run.is_ok());
    assert!(run.steps[2].stderr_tail.contains("model unavailable"));
    assert!(run.steps[4].stderr_tail.contains("STAGE/INVOKE"));
    assert!(run.steps[5].stdout_tail.contains("merkle_root = blake3:"));

    // artifacts written by stage 4 are sealed by stage 6
    let manifest = EvidenceStore::new(config.evidence_root()).load_manifest().unwrap();
    assert!(manifest.leaves[0].present);
    assert!(!manifest.leaves[1].present);
    let report = verify_manifest(&manifest, &FsResolver::new(temp.path())).unwrap();
    assert!(report.is_ok());
}

#[tokio::test]
async fn test_sealing_twice_gives_same_root() {
    let temp = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(temp.path().join("raga")).unwrap();
    std::fs::write(temp.path().join("raga/kpis.json"), b"{\"E1-6\": 12.5}").unwrap();

    let mut config = config_in(temp.path());
    config.stages.retain(|s| s.name == "EVIDENCE.build");
    let orchestrator = PipelineOrchestrator::new(build_stages(&config));
    let store = EvidenceStore::new(config.evidence_root());

    orchestrator.run().await;
    let first = store.load_manifest().unwrap();
    orchestrator.run().await;
    let second = store.load_manifest().unwrap();
    assert_eq!(first.merkle_root, second.merkle_root);

    std::fs::write(temp.path().join("raga/kpis.json"), b"{\"E1-6\": 12.6}").unwrap();
    orchestrator.run().await;
    let third = store.load_manifest().unwrap();
    assert_ne!(first.merkle_root, third.merkle_root);
}

#[tokio::test]
async fn test_mixed_in_process_and_deadline_stages() {
    let stages: Vec<Arc<dyn Stage>> = vec![
        Arc::new(FnStage::new("ok", || Ok(StageOutcome::ok().with_log("fine")))),
        Arc::new(
            FnStage::new("hangs", || {
                std::thread::sleep(Duration::from_millis(250));
                Ok(StageOutcome::ok())
            })
            .with_timeout(Duration::from_millis(20)),
        ),
        Arc::new(FnStage::new("errs", || {
            Err(StageError::ExecutionFailed("ontology mismatch".into()))
        })),
    ];

    let run = PipelineOrchestrator::new(stages).run().await;
    assert_eq!(run.steps.len(), 3);
    assert!(run.steps[0].ok);
    assert!(!run.steps[1].ok);
    assert!(run.steps[1].stderr_tail.starts_with("STAGE/DEADLINE"));
    assert!(!run.steps[2].ok);
    assert_eq!(run.failures().count(), 2);
}

#[tokio::test]
async fn test_timed_out_process_is_killed_before_sealing() {
    let temp = tempfile::tempdir().unwrap();
    let config = PipelineConfig {
        root_dir: temp.path().to_path_buf(),
        artifacts: vec!["xbrl/informe.xbrl".into()],
        stages: vec![
            StageSpec::command(
                "XBRL.generate",
                "sh",
                &["-c", "sleep 2; mkdir -p xbrl && echo late > xbrl/informe.xbrl"],
            )
            .with_timeout_sec(0.1),
            StageSpec::evidence("EVIDENCE.build"),
        ],
        ..PipelineConfig::default()
    };

    let started = std::time::Instant::now();
    let run = PipelineOrchestrator::new(build_stages(&config)).run().await;

    assert!(started.elapsed() < Duration::from_millis(1500));
    assert!(!run.steps[0].ok);
    assert!(run.steps[0].stderr_tail.starts_with("STAGE/DEADLINE"));
    assert!(run.steps[1].ok);

    let manifest = EvidenceStore::new(config.evidence_root()).load_manifest().unwrap();
    assert!(!manifest.leaves[0].present);

    tokio::time::sleep(Duration::from_millis(2500)).await;
    assert!(!temp.path().join("xbrl/informe.xbrl").exists());
}
