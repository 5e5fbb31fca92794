//! Binary entrypoint: runs every stage once; exit code 0 iff all passed.
use anyhow::Context;
use std::process::ExitCode;
use steeltrace_cli::{failure_summary, run_audit};
use steeltrace_core::PipelineConfig;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("steeltrace: {:#}", e);
            ExitCode::from(2)
        }
    }
}

async fn run() -> anyhow::Result<ExitCode> {
    // Defaults can be overridden with STEELTRACE_CONFIG and STEELTRACE_RUN_ID
    let config = PipelineConfig::from_env().context("loading pipeline configuration")?;
    let outcome = match run_audit(&config).await {
        Ok(outcome) => outcome,
        Err(e) => {
            if let Some(run) = e.run() {
                eprint!("{}", failure_summary(run, &config.stages));
            }
            return Err(anyhow::Error::new(e).context("recording run history"));
        }
    };

    println!("SLO report → {}", config.slo_report_file().display());
    if !outcome.run.is_ok() {
        eprint!("{}", failure_summary(&outcome.run, &config.stages));
    }
    Ok(ExitCode::from(outcome.exit_code()))
}
