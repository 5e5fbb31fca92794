//! Evidence manifest: one leaf per configured artifact, Merkle root, TSA token
use crate::digest::Digest;
use crate::error::EvidenceError;
use crate::merkle;
use crate::resolver::ArtifactResolver;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Authority id of the locally generated token. Not an external trust anchor.
pub const SIMULATED_TSA: &str = "SIMULATED-TSA";

/// Bytes hashed in place of a missing artifact
pub const ABSENT_SENTINEL: &[u8] = b"";

static ABSENT_CONTENT_HASH: Lazy<Digest> = Lazy::new(|| Digest::of(ABSENT_SENTINEL));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestLeaf {
    pub artifact_path: String,
    pub present: bool,
    pub content_hash: Digest,
}

impl ManifestLeaf {
    /// Leaf for raw artifact bytes, or the sentinel leaf when absent
    pub fn from_content(artifact_path: &str, content: Option<&[u8]>) -> Self {
        let (present, content_hash) = match content {
            Some(bytes) => (true, Digest::of(bytes)),
            None => (false, *ABSENT_CONTENT_HASH),
        };
        Self {
            artifact_path: artifact_path.to_string(),
            present,
            content_hash,
        }
    }

    pub fn node(&self) -> Digest {
        merkle::leaf_node(self.present, &self.content_hash)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TsaToken {
    /// Always [`SIMULATED_TSA`]
    pub tsa: String,
    pub ts_utc: DateTime<Utc>,
    pub merkle_root: Digest,
}

impl TsaToken {
    pub fn simulated(merkle_root: Digest) -> Self {
        Self {
            tsa: SIMULATED_TSA.to_string(),
            ts_utc: Utc::now(),
            merkle_root,
        }
    }

    pub fn is_simulated(&self) -> bool {
        self.tsa == SIMULATED_TSA
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceManifest {
    pub run_id: String,
    pub created_utc: DateTime<Utc>,
    pub leaves: Vec<ManifestLeaf>,
    pub merkle_root: Digest,
    #[serde(default)]
    pub tsa_tokens: Vec<TsaToken>,
}

impl EvidenceManifest {
    /// Root recomputed from the recorded leaves
    pub fn compute_root(&self) -> Digest {
        merkle::merkle_root(self.leaves.iter().map(|l| (l.present, &l.content_hash)))
    }

    pub fn missing(&self) -> impl Iterator<Item = &ManifestLeaf> {
        self.leaves.iter().filter(|l| !l.present)
    }

    pub fn token(&self) -> Option<&TsaToken> {
        self.tsa_tokens.first()
    }
}

/// Hash every artifact in order and seal the result.
///
/// The manifest always has one leaf per entry of `artifacts`; a missing
/// artifact is recorded with `present = false`. Any read failure other than
/// absence aborts the build.
pub fn build_manifest<R: ArtifactResolver + ?Sized>(
    resolver: &R,
    artifacts: &[String],
    run_id: &str,
) -> Result<EvidenceManifest, EvidenceError> {
    let mut leaves = Vec::with_capacity(artifacts.len());
    for artifact in artifacts {
        let content = resolver.read(artifact)?;
        if content.is_none() {
            tracing::warn!(artifact = %artifact, "artifact missing, sealing absence");
        }
        leaves.push(ManifestLeaf::from_content(artifact, content.as_deref()));
    }

    let merkle_root = merkle::merkle_root(leaves.iter().map(|l| (l.present, &l.content_hash)));
    tracing::info!(run_id, leaves = leaves.len(), %merkle_root, "evidence manifest built");

    Ok(EvidenceManifest {
        run_id: run_id.to_string(),
        created_utc: Utc::now(),
        leaves,
        merkle_root,
        tsa_tokens: vec![TsaToken::simulated(merkle_root)],
    })
}
