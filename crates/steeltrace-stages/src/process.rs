use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use steeltrace_core::{Stage, StageError, StageOutcome};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// A stage backed by an external program. Exit code 0 is ok.
///
/// Captured stdout becomes the outcome's log; captured stderr becomes its
/// message, whatever the exit status. With a timeout the child is killed
/// once it elapses.
#[derive(Debug, Clone)]
pub struct ProcessStage {
    name: String,
    program: String,
    args: Vec<String>,
    current_dir: Option<PathBuf>,
    output_artifact: Option<PathBuf>,
    timeout: Option<Duration>,
}

impl ProcessStage {
    pub fn new(name: impl Into<String>, program: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
            output_artifact: None,
            timeout: None,
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    pub fn with_output_artifact(mut self, artifact: Option<PathBuf>) -> Self {
        self.output_artifact = artifact;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    fn wait_failed(&self, e: io::Error) -> StageError {
        StageError::ExecutionFailed(format!("{}: {}", self.program, e))
    }
}

impl Stage for ProcessStage {
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
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &self.current_dir {
            cmd.current_dir(dir);
        }

        tracing::debug!(stage = %self.name, program = %self.program, args = ?self.args, "spawning");
        let mut child = cmd.spawn().map_err(|e| {
            StageError::InvocationFailed(format!("{}: {}", self.program, e))
        })?;
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = match self.timeout {
            Some(limit) => match wait_until(&mut child, limit) {
                Ok(Some(status)) => status,
                Ok(None) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    tracing::warn!(stage = %self.name, "deadline passed, child killed");
                    return Err(StageError::DeadlineExceeded(limit));
                }
                Err(e) => {
                    let _ = child.kill();
                    return Err(self.wait_failed(e));
                }
            },
            None => child.wait().map_err(|e| self.wait_failed(e))?,
        };

        let stdout = collect(stdout);
        let stderr = collect(stderr);

        let mut outcome = match (status.success(), stderr.is_empty()) {
            (true, true) => StageOutcome::ok(),
            (true, false) => StageOutcome::ok().with_message(stderr),
            (false, true) => {
                StageOutcome::error(format!("{} exited with {}", self.program, status))
            }
            (false, false) => StageOutcome::error(stderr),
        };
        if !stdout.is_empty() {
            outcome = outcome.with_log(stdout);
        }
        Ok(outcome)
    }
}

/// Polls the child until it exits or `limit` elapses (`Ok(None)`).
fn wait_until(child: &mut Child, limit: Duration) -> io::Result<Option<ExitStatus>> {
    let start = Instant::now();
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        let elapsed = start.elapsed();
        if elapsed >= limit {
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL.min(limit - elapsed));
    }
}

// Pipes are read on their own threads so a chatty child never blocks on a
// full pipe while we wait on it.
fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        buf
    })
}

fn collect(reader: JoinHandle<Vec<u8>>) -> String {
    reader
        .join()
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default()
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(name: &str, script: &str) -> ProcessStage {
        ProcessStage::new(name, "sh").args(["-c", script])
    }

    #[test]
    fn test_exit_zero_is_ok() {
        let outcome = sh("MCP.ingest", "echo normalized 3 files").run().unwrap();
        assert!(outcome.is_ok());
        assert_eq!(outcome.logs, vec!["normalized 3 files\n".to_string()]);
        assert_eq!(outcome.message, None);
    }

    #[test]
    fn test_nonzero_exit_is_error_with_stderr() {
        let outcome = sh("XBRL.generate", "echo partial; echo 'XBRL validation failed' >&2; exit 1")
            .run()
            .unwrap();
        assert!(!outcome.is_ok());
        assert_eq!(outcome.message.as_deref(), Some("XBRL validation failed\n"));
        assert_eq!(outcome.logs, vec!["partial\n".to_string()]);
    }

    #[test]
    fn test_silent_failure_names_exit_status() {
        let outcome = sh("EEE.gate", "exit 3").run().unwrap();
        assert!(!outcome.is_ok());
        assert!(outcome.message.unwrap().contains("exited with"));
    }

    #[test]
    fn test_stderr_kept_on_success() {
        let outcome = sh("RAGA.compute", "echo 'deprecated flag' >&2").run().unwrap();
        assert!(outcome.is_ok());
        assert_eq!(outcome.message.as_deref(), Some("deprecated flag\n"));
    }

    #[test]
    fn test_missing_program_is_invocation_error() {
        let err = ProcessStage::new("SHACL.validate", "steeltrace-no-such-binary")
            .run()
            .unwrap_err();
        assert!(matches!(err, StageError::InvocationFailed(_)));
    }

    #[test]
    fn test_deadline_kills_child() {
        let start = Instant::now();
        let err = sh("XBRL.generate", "exec sleep 5")
            .with_timeout(Some(Duration::from_millis(100)))
            .run()
            .unwrap_err();
        assert_eq!(err, StageError::DeadlineExceeded(Duration::from_millis(100)));
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn test_fast_child_beats_deadline() {
        let outcome = sh("MCP.ingest", "echo done")
            .with_timeout(Some(Duration::from_secs(5)))
            .run()
            .unwrap();
        assert!(outcome.is_ok());
        assert_eq!(outcome.logs, vec!["done\n".to_string()]);
    }

    #[test]
    fn test_runs_in_current_dir() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::write(temp.path().join("marker.txt"), b"here").unwrap();
        let outcome = sh("ls", "cat marker.txt").current_dir(temp.path()).run().unwrap();
        assert!(outcome.is_ok());
        assert_eq!(outcome.logs, vec!["here".to_string()]);
    }
}
