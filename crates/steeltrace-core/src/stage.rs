//! Stage Trait: Contrato único para todos os estágios
use crate::data_model::StageOutcome;
use std::path::Path;
use std::time::Duration;

/// Contrato único de um estágio do pipeline
pub trait Stage: Send + Sync {
    /// Nome estável do estágio (ex: "RAGA.compute"), usado como chave nas SLOs
    fn name(&self) -> &str;

    /// Artefato de saída declarado, relativo à raiz do pipeline
    fn output_artifact(&self) -> Option<&Path> {
        None
    }

    /// Prazo opcional; `None` espera indefinidamente.
    ///
    /// O runner marca a etapa como falha ao estourar o prazo, mas só segue
    /// adiante quando `run` retorna. Quem pode ser interrompido (processos)
    /// deve respeitar o prazo dentro de `run`.
    fn timeout(&self) -> Option<Duration> {
        None
    }

    /// Executa o estágio
    fn run(&self) -> Result<StageOutcome, StageError>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum StageError {
    /// The stage could not even start (missing executable, bad cwd)
    InvocationFailed(String),
    ExecutionFailed(String),
    Panicked(String),
    DeadlineExceeded(Duration),
}

impl std::fmt::Display for StageError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::InvocationFailed(msg) => write!(f, "STAGE/INVOKE: {}", msg),
            Self::ExecutionFailed(msg) => write!(f, "STAGE/EXEC: {}", msg),
            Self::Panicked(msg) => write!(f, "STAGE/PANIC: {}", msg),
            Self::DeadlineExceeded(limit) => {
                write!(f, "STAGE/DEADLINE: no result after {:.1}s", limit.as_secs_f64())
            }
        }
    }
}

impl std::error::Error for StageError {}
