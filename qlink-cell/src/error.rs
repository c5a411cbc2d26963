//! Tipos de erro para qlink-cell

use thiserror::Error;

/// Resultado customizado para operações de célula
pub type CellResult<T> = Result<T, CellError>;

/// Erros que podem ocorrer ao abrir, mapear ou remover uma célula
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CellError {
    /// Primitiva do SO falhou (criar, dimensionar ou mapear a região).
    /// Irrecuperável: nunca é repetida.
    #[error("Cannot create or map cell '{name}': {reason}")]
    Resource { name: String, reason: String },

    #[error("Cell already exists: {0}")]
    AlreadyExists(String),

    #[error("Cell not found: {0}")]
    NotFound(String),

    #[error("Cell '{name}' belongs to owner {found}, expected {expected}")]
    OwnerMismatch {
        name: String,
        expected: u32,
        found: u32,
    },

    #[error("Invalid cell name '{name}': {reason}")]
    InvalidName { name: String, reason: &'static str },

    /// Região existe mas o criador ainda não publicou o cabeçalho
    #[error("Cell not initialized: {0}")]
    Uninitialized(String),

    #[error("Cell '{name}' has incompatible layout (magic {magic:#010x}, version {version})")]
    IncompatibleLayout {
        name: String,
        magic: u32,
        version: u32,
    },
}

impl CellError {
    pub(crate) fn resource(name: impl Into<String>, err: std::io::Error) -> Self {
        CellError::Resource {
            name: name.into(),
            reason: err.to_string(),
        }
    }

    /// Erro de validação (nenhum estado foi tocado)
    pub fn is_validation(&self) -> bool {
        matches!(self, CellError::InvalidName { .. })
    }

    /// A região simplesmente não está disponível agora
    pub fn is_lookup_failure(&self) -> bool {
        matches!(
            self,
            CellError::NotFound(_) | CellError::Uninitialized(_) | CellError::IncompatibleLayout { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CellError::OwnerMismatch {
            name: "q".into(),
            expected: 1,
            found: 7,
        };
        assert!(err.to_string().contains("owner 7"));
    }

    #[test]
    fn test_resource_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = CellError::resource("q", io);
        assert!(matches!(err, CellError::Resource { .. }));
        assert!(!err.is_lookup_failure());
    }
}
