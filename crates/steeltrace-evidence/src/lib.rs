//! SteelTrace Evidence: artifacts pinned under a Merkle root + simulated TSA token
pub mod digest;
pub mod error;
pub mod manifest;
pub mod merkle;
pub mod resolver;
pub mod stage;
pub mod store;
pub mod verify;

pub use digest::Digest;
pub use error::EvidenceError;
pub use manifest::{build_manifest, EvidenceManifest, ManifestLeaf, TsaToken, SIMULATED_TSA};
pub use merkle::merkle_root;
pub use resolver::{ArtifactResolver, FsResolver};
pub use stage::EvidenceStage;
pub use store::{EvidenceStore, PersistedEvidence};
pub use verify::{verify_manifest, VerificationReport};
