//! Tipos de erro para qlink-qubit

use qlink_cell::CellError;
use thiserror::Error;

/// Resultado customizado para operações de qubit
pub type QubitResult<T> = Result<T, QubitError>;

/// Erros de handles, grupos e configuração
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QubitError {
    #[error("Cell error: {0}")]
    Cell(#[from] CellError),

    #[error("Unknown gate: {0}")]
    UnknownGate(String),

    #[error("Group size must be between {min} and {max}, got {size}")]
    InvalidGroupSize { size: usize, min: usize, max: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),

    /// Thread do monitor não pôde ser criada
    #[error("Cannot start decoherence monitor: {0}")]
    Monitor(String),
}

impl QubitError {
    /// Operação rejeitada sem alterar estado algum
    pub fn is_validation(&self) -> bool {
        match self {
            QubitError::UnknownGate(_)
            | QubitError::InvalidGroupSize { .. }
            | QubitError::InvalidConfig(_) => true,
            QubitError::Cell(err) => err.is_validation(),
            _ => false,
        }
    }
}

impl<T> From<std::sync::PoisonError<T>> for QubitError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        QubitError::LockPoisoned(err.to_string())
    }
}
