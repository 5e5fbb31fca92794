//! Re-check a persisted manifest against current storage
use crate::error::EvidenceError;
use crate::manifest::{EvidenceManifest, ManifestLeaf};
use crate::resolver::ArtifactResolver;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationReport {
    /// Recorded root matches the root recomputed from the recorded leaves
    pub root_consistent: bool,
    /// Every token carries the recorded root
    pub tokens_consistent: bool,
    /// Artifacts whose presence or content changed since sealing
    pub changed: Vec<String>,
}

impl VerificationReport {
    pub fn is_ok(&self) -> bool {
        self.root_consistent && self.tokens_consistent && self.changed.is_empty()
    }
}

pub fn verify_manifest<R: ArtifactResolver + ?Sized>(
    manifest: &EvidenceManifest,
    resolver: &R,
) -> Result<VerificationReport, EvidenceError> {
    let root_consistent = manifest.compute_root() == manifest.merkle_root;
    let tokens_consistent = manifest
        .tsa_tokens
        .iter()
        .all(|t| t.merkle_root == manifest.merkle_root);

    let mut changed = Vec::new();
    for leaf in &manifest.leaves {
        let content = resolver.read(&leaf.artifact_path)?;
        let current = ManifestLeaf::from_content(&leaf.artifact_path, content.as_deref());
        if current.node() != leaf.node() {
            changed.push(leaf.artifact_path.clone());
        }
    }

    let report = VerificationReport {
        root_consistent,
        tokens_consistent,
        changed,
    };
    if !report.is_ok() {
        tracing::warn!(run_id = %manifest.run_id, changed = report.changed.len(), "evidence verification failed");
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::Digest;
    use crate::manifest::build_manifest;
    use std::collections::HashMap;

    fn artifacts() -> Vec<String> {
        vec!["raga/kpis.json".into(), "xbrl/informe.xbrl".into()]
    }

    fn storage() -> HashMap<String, Vec<u8>> {
        let mut m = HashMap::new();
        m.insert("raga/kpis.json".to_string(), b"{\"E1-6\": 42}".to_vec());
        m
    }

    #[test]
    fn test_untouched_artifacts_verify() {
        let store = storage();
        let manifest = build_manifest(&store, &artifacts(), "r").unwrap();
        assert!(verify_manifest(&manifest, &store).unwrap().is_ok());
    }

    #[test]
    fn test_modified_and_appeared_artifacts_are_reported() {
        let mut store = storage();
        let manifest = build_manifest(&store, &artifacts(), "r").unwrap();

        store.insert("raga/kpis.json".into(), b"{\"E1-6\": 43}".to_vec());
        store.insert("xbrl/informe.xbrl".into(), Vec::new());

        let report = verify_manifest(&manifest, &store).unwrap();
        assert!(report.root_consistent);
        assert_eq!(report.changed, artifacts());
        assert!(!report.is_ok());
    }

    #[test]
    fn test_tampered_root_is_inconsistent() {
        let store = storage();
        let mut manifest = build_manifest(&store, &artifacts(), "r").unwrap();
        manifest.merkle_root = Digest::of(b"forged");

        let report = verify_manifest(&manifest, &store).unwrap();
        assert!(!report.root_consistent);
        assert!(!report.tokens_consistent);
        assert!(report.changed.is_empty());
    }
}
