//! Evidence errors. Any of these fails the evidence stage.
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EvidenceError {
    #[error("EVIDENCE/IO {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("EVIDENCE/SERIALIZE: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl EvidenceError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}
