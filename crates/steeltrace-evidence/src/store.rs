//! Evidence output layout
//!
//! ```text
//! <dir>/evidence_manifest.json
//! <dir>/tokens/<run_id>.tsr
//! <dir>/verify/<run_id>.txt
//! ```
use crate::error::EvidenceError;
use crate::manifest::EvidenceManifest;
use std::path::{Path, PathBuf};
use steeltrace_core::fsio;

pub const MANIFEST_FILE: &str = "evidence_manifest.json";

pub const VERIFICATION_NOTE: &str = "Verification: OK (simulated)\n";

#[derive(Debug, Clone, PartialEq)]
pub struct PersistedEvidence {
    pub manifest_path: PathBuf,
    /// `None` when the manifest carried no token
    pub token_path: Option<PathBuf>,
    pub note_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct EvidenceStore {
    dir: PathBuf,
}

impl EvidenceStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.dir.join(MANIFEST_FILE)
    }

    pub fn token_path(&self, run_id: &str) -> PathBuf {
        self.dir.join("tokens").join(format!("{}.tsr", run_id))
    }

    pub fn note_path(&self, run_id: &str) -> PathBuf {
        self.dir.join("verify").join(format!("{}.txt", run_id))
    }

    /// Write the manifest, its first token and the verification note.
    ///
    /// A manifest without a token is written as-is and no token file is
    /// produced; the builder always attaches one.
    pub fn persist(&self, manifest: &EvidenceManifest) -> Result<PersistedEvidence, EvidenceError> {
        let manifest_path = self.manifest_path();
        let note_path = self.note_path(&manifest.run_id);

        write(&manifest_path, serde_json::to_string_pretty(manifest)?.as_bytes())?;
        let token_path = match manifest.token() {
            Some(token) => {
                let path = self.token_path(&manifest.run_id);
                write(&path, serde_json::to_string_pretty(token)?.as_bytes())?;
                Some(path)
            }
            None => None,
        };
        write(&note_path, VERIFICATION_NOTE.as_bytes())?;

        tracing::info!(path = %manifest_path.display(), "evidence persisted");
        Ok(PersistedEvidence {
            manifest_path,
            token_path,
            note_path,
        })
    }

    pub fn load_manifest(&self) -> Result<EvidenceManifest, EvidenceError> {
        let path = self.manifest_path();
        let text = std::fs::read_to_string(&path).map_err(|e| EvidenceError::io(&path, e))?;
        Ok(serde_json::from_str(&text)?)
    }
}

fn write(path: &Path, bytes: &[u8]) -> Result<(), EvidenceError> {
    fsio::write_atomic(path, bytes).map_err(|e| EvidenceError::io(path, e))
}
