//! SteelTrace Core: Stage trait, StepRunner, orchestrator e Data Model
//!
//! Núcleo sequencial: cada estágio roda uma vez, isolado, medido e registrado.

pub mod config;
pub mod data_model;
pub mod error;
pub mod fsio;
pub mod pipeline;
pub mod runner;
pub mod stage;

pub use config::{PipelineConfig, StageSpec, StageTarget};
pub use data_model::{OutcomeStatus, Run, StageOutcome, StepResult};
pub use error::ConfigError;
pub use pipeline::PipelineOrchestrator;
pub use runner::{StepRunner, TAIL_BUDGET};
pub use stage::{Stage, StageError};

/// Versão do motor SteelTrace
pub const STEELTRACE_VERSION: &str = "1.0.0";
