//! Nomes de células no namespace compartilhado

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

use crate::error::{CellError, CellResult};
use crate::layout::NAME_CAPACITY;

/// Identificador validado de uma célula.
///
/// Cabe num slot de link do registro (até 63 bytes, sem NUL) e é usável
/// como nome de arquivo no diretório do store (sem `/`, sem `.` inicial).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CellName(String);

impl CellName {
    pub fn new(name: impl Into<String>) -> CellResult<Self> {
        let name = name.into();
        let reason = if name.is_empty() {
            Some("empty")
        } else if name.len() > NAME_CAPACITY {
            Some("longer than 63 bytes")
        } else if name.contains('/') || name.contains('\\') {
            Some("contains a path separator")
        } else if name.contains('\0') {
            Some("contains NUL")
        } else if name.starts_with('.') {
            Some("starts with '.'")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(CellError::InvalidName { name, reason }),
            None => Ok(Self(name)),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CellName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CellName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for CellName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CellName {
    type Error = CellError;

    fn try_from(value: String) -> CellResult<Self> {
        Self::new(value)
    }
}

impl TryFrom<&str> for CellName {
    type Error = CellError;

    fn try_from(value: &str) -> CellResult<Self> {
        Self::new(value)
    }
}

impl From<CellName> for String {
    fn from(name: CellName) -> String {
        name.0
    }
}
