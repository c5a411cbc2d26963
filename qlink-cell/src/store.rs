//! Capacidade de store nomeado: criar, anexar, resetar, remover

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{CellError, CellResult};
use crate::name::CellName;
use crate::region::CellRegion;

/// Como `open` trata uma região que já existe
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OpenMode {
    /// Cria; falha com `AlreadyExists` se a região existir
    Create,
    /// Anexa; falha com `NotFound` se não existir
    Attach,
    /// Anexa se existir (mesmo tag), senão cria
    #[default]
    OpenOrCreate,
    /// Cria ou anexa e então zera e re-marca o registro
    Reset,
}

/// O que `open` fez de fato
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Disposition {
    Created,
    Attached,
    Reset,
}

/// Região aberta e como foi obtida
#[derive(Debug, Clone)]
pub struct OpenedCell {
    pub region: Arc<CellRegion>,
    pub disposition: Disposition,
}

/// Namespace de células compartilhadas.
///
/// `ShmStore` mapeia arquivos visíveis entre processos; `MemoryStore` é o
/// equivalente em processo usado nos testes.
pub trait CellStore: Send + Sync + fmt::Debug {
    /// Cria e inicializa uma nova região
    fn create(&self, name: &CellName, owner_tag: u32) -> CellResult<Arc<CellRegion>>;

    /// Anexa a uma região existente e inicializada, sem olhar o tag
    fn lookup(&self, name: &CellName) -> CellResult<Arc<CellRegion>>;

    /// Cria ou anexa, depois zera e re-marca com `owner_tag`
    fn reset(&self, name: &CellName, owner_tag: u32) -> CellResult<Arc<CellRegion>>;

    /// Remove a região. Mapeamentos existentes continuam válidos; anexos
    /// posteriores falham. Retorna `false` se não existia.
    fn unlink(&self, name: &CellName) -> CellResult<bool>;

    fn exists(&self, name: &CellName) -> bool {
        self.lookup(name).is_ok()
    }

    fn open(&self, name: &CellName, owner_tag: u32, mode: OpenMode) -> CellResult<OpenedCell> {
        let opened = match mode {
            OpenMode::Create => OpenedCell {
                region: self.create(name, owner_tag)?,
                disposition: Disposition::Created,
            },
            OpenMode::Attach => OpenedCell {
                region: attach_owned(self, name, owner_tag)?,
                disposition: Disposition::Attached,
            },
            OpenMode::OpenOrCreate => match self.create(name, owner_tag) {
                Ok(region) => OpenedCell {
                    region,
                    disposition: Disposition::Created,
                },
                Err(CellError::AlreadyExists(_)) => OpenedCell {
                    region: attach_owned(self, name, owner_tag)?,
                    disposition: Disposition::Attached,
                },
                Err(err) => return Err(err),
            },
            OpenMode::Reset => OpenedCell {
                region: self.reset(name, owner_tag)?,
                disposition: Disposition::Reset,
            },
        };

        match opened.disposition {
            Disposition::Attached => debug!(cell = %name, owner_tag, "attached to cell"),
            Disposition::Created => info!(cell = %name, owner_tag, "created cell"),
            Disposition::Reset => info!(cell = %name, owner_tag, "reset cell"),
        }
        Ok(opened)
    }
}

fn attach_owned<S: CellStore + ?Sized>(
    store: &S,
    name: &CellName,
    owner_tag: u32,
) -> CellResult<Arc<CellRegion>> {
    let region = store.lookup(name)?;
    let found = region.owner_tag();
    if found != owner_tag {
        warn!(cell = %name, expected = owner_tag, found, "owner tag mismatch");
        return Err(CellError::OwnerMismatch {
            name: name.to_string(),
            expected: owner_tag,
            found,
        });
    }
    Ok(region)
}
