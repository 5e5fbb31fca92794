//! Artifact access for sealing and verification
use crate::error::EvidenceError;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;

pub trait ArtifactResolver {
    /// Raw bytes of `artifact`, `Ok(None)` when it does not exist.
    /// Any other read failure is an error.
    fn read(&self, artifact: &str) -> Result<Option<Vec<u8>>, EvidenceError>;
}

/// Reads artifacts relative to a root directory
#[derive(Debug, Clone)]
pub struct FsResolver {
    root: PathBuf,
}

impl FsResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_of(&self, artifact: &str) -> PathBuf {
        self.root.join(artifact)
    }
}

impl ArtifactResolver for FsResolver {
    fn read(&self, artifact: &str) -> Result<Option<Vec<u8>>, EvidenceError> {
        let path = self.path_of(artifact);
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(EvidenceError::io(&path, e)),
        }
    }
}

impl ArtifactResolver for HashMap<String, Vec<u8>> {
    fn read(&self, artifact: &str) -> Result<Option<Vec<u8>>, EvidenceError> {
        Ok(self.get(artifact).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_fs_resolver_present_and_absent() {
        let temp = tempdir().unwrap();
        std::fs::create_dir_all(temp.path().join("raga")).unwrap();
        std::fs::write(temp.path().join("raga/kpis.json"), b"{}").unwrap();

        let resolver = FsResolver::new(temp.path());
        assert_eq!(resolver.read("raga/kpis.json").unwrap(), Some(b"{}".to_vec()));
        assert_eq!(resolver.read("raga/explain.json").unwrap(), None);
    }

    #[test]
    fn test_fs_resolver_directory_is_an_error() {
        let temp = tempdir().unwrap();
        std::fs::create_dir_all(temp.path().join("xbrl")).unwrap();

        let resolver = FsResolver::new(temp.path());
        assert!(matches!(resolver.read("xbrl"), Err(EvidenceError::Io { .. })));
    }
}
