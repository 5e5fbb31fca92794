//! Append-only NDJSON run history
//!
//! One `Run` per line. Lines are only ever appended; a line that no longer
//! parses is skipped on read and left where it is.

use crate::error::HistoryError;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use steeltrace_core::Run;

/// Result of replaying the log
#[derive(Debug, Clone, Default)]
pub struct HistoryLoad {
    pub runs: Vec<Run>,
    /// Corrupted lines that were skipped
    pub skipped_lines: usize,
}

pub struct RunHistoryStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl RunHistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one run as a single line.
    ///
    /// The line is written with one `write_all` on an append-mode handle and
    /// synced before returning. If a previous writer died mid-line, the new
    /// record starts on a fresh line so the torn bytes stay isolated.
    pub fn append(&self, run: &Run) -> Result<(), HistoryError> {
        let mut line = serde_json::to_string(run)?;
        line.push('\n');

        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| HistoryError::io(parent, e))?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| HistoryError::io(&self.path, e))?;

        if ends_with_torn_line(&mut file).map_err(|e| HistoryError::io(&self.path, e))? {
            tracing::warn!(path = %self.path.display(), "history log has a torn last line");
            line.insert(0, '\n');
        }

        file.write_all(line.as_bytes())
            .and_then(|_| file.sync_data())
            .map_err(|e| HistoryError::io(&self.path, e))?;

        tracing::debug!(path = %self.path.display(), steps = run.steps.len(), "run appended");
        Ok(())
    }

    /// Replay every line of the log.
    ///
    /// A missing log is an empty history. Blank lines are ignored; lines that
    /// fail to parse are counted in `skipped_lines` and never abort the read.
    pub fn load_all(&self) -> Result<HistoryLoad, HistoryError> {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(HistoryLoad::default())
            }
            Err(e) => return Err(HistoryError::io(&self.path, e)),
        };

        let mut load = HistoryLoad::default();
        let mut reader = BufReader::new(file);
        let mut buf = Vec::new();
        let mut line_no = 0usize;

        loop {
            buf.clear();
            let read = reader
                .read_until(b'\n', &mut buf)
                .map_err(|e| HistoryError::io(&self.path, e))?;
            if read == 0 {
                break;
            }
            line_no += 1;

            // invalid UTF-8 counts as corruption, same as bad JSON
            let parsed = std::str::from_utf8(&buf)
                .ok()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(serde_json::from_str::<Run>);

            match parsed {
                Some(Ok(run)) => load.runs.push(run),
                Some(Err(e)) => {
                    tracing::warn!(line = line_no, error = %e, "skipping corrupted history line");
                    load.skipped_lines += 1;
                }
                None if is_blank(&buf) => {}
                None => {
                    tracing::warn!(line = line_no, "skipping non UTF-8 history line");
                    load.skipped_lines += 1;
                }
            }
        }

        Ok(load)
    }
}

fn is_blank(bytes: &[u8]) -> bool {
    bytes.iter().all(|b| b.is_ascii_whitespace())
}

fn ends_with_torn_line(file: &mut File) -> std::io::Result<bool> {
    let len = file.metadata()?.len();
    if len == 0 {
        return Ok(false);
    }
    let mut last = [0u8; 1];
    file.seek(SeekFrom::Start(len - 1))?;
    file.read_exact(&mut last)?;
    Ok(last[0] != b'\n')
}
