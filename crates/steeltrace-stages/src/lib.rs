//! SteelTrace Stages: the concrete ways a stage can be invoked.
//!
//! The business logic of each compliance step lives elsewhere; these types
//! only adapt it to the single `Stage` contract so the orchestrator can time
//! and record it uniformly.
//!
//! # Pipeline Flow
//!
//! ```text
//! MCP.ingest → SHACL.validate → RAGA.compute → EEE.gate → XBRL.generate → EVIDENCE.build
//!   process       process          process       process      process        in-process
//! ```

mod catalogue;
mod func;
mod process;

pub use catalogue::build_stages;
pub use func::FnStage;
pub use process::ProcessStage;
