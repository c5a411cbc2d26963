//! Grupos totalmente conectados (estilo GHZ)

use qlink_cell::{CellName, LINK_CAPACITY};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{QubitError, QubitResult};
use crate::handle::QubitHandle;

/// Menor grupo aceito por padrão
pub const DEFAULT_MIN_GROUP: usize = 2;
/// Maior grupo possível: cada membro liga todos os outros
pub const MAX_GROUP: usize = LINK_CAPACITY + 1;

/// Limites de tamanho de grupo
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupBounds {
    min: usize,
    max: usize,
}

impl Default for GroupBounds {
    fn default() -> Self {
        Self {
            min: DEFAULT_MIN_GROUP,
            max: MAX_GROUP,
        }
    }
}

impl GroupBounds {
    /// `1 <= min <= max <= MAX_GROUP`
    pub fn new(min: usize, max: usize) -> QubitResult<Self> {
        if min == 0 || min > max || max > MAX_GROUP {
            return Err(QubitError::InvalidConfig(format!(
                "group bounds {min}..={max} outside 1..={MAX_GROUP}"
            )));
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> usize {
        self.min
    }

    pub fn max(&self) -> usize {
        self.max
    }

    pub fn check(&self, size: usize) -> QubitResult<()> {
        if size < self.min || size > self.max {
            return Err(QubitError::InvalidGroupSize {
                size,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }

    /// Liga cada membro a todos os outros e reinicia todos em (1/√2, 1/√2).
    ///
    /// O tamanho é checado uma vez antes de qualquer mutação. Valores
    /// anteriores são descartados; `set_state` depois da formação não se
    /// propaga, cada membro precisa ser ajustado pelo chamador.
    pub fn form(&self, members: &[&QubitHandle]) -> QubitResult<()> {
        self.check(members.len())?;

        let names: Vec<CellName> = members.iter().map(|m| m.cell_name().clone()).collect();
        for (i, member) in members.iter().enumerate() {
            let peers: Vec<CellName> = names
                .iter()
                .enumerate()
                .filter(|&(j, _)| j != i)
                .map(|(_, name)| name.clone())
                .collect();
            member.join_group(&peers)?;
        }

        info!(size = members.len(), members = ?names, "formed group");
        Ok(())
    }
}

/// Forma um grupo com os limites padrão (2 a 5 membros)
pub fn form_group(members: &[&QubitHandle]) -> QubitResult<()> {
    GroupBounds::default().form(members)
}
