//! Store em processo, com a mesma semântica do store mapeado

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::{CellError, CellResult};
use crate::name::CellName;
use crate::region::CellRegion;
use crate::store::CellStore;

/// Namespace de células local ao processo
#[derive(Debug, Default)]
pub struct MemoryStore {
    cells: Mutex<HashMap<CellName, Arc<CellRegion>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Número de células registradas
    pub fn len(&self) -> usize {
        self.cells().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells().is_empty()
    }

    fn cells(&self) -> MutexGuard<'_, HashMap<CellName, Arc<CellRegion>>> {
        // O mapa continua consistente mesmo após pânico de outro thread
        self.cells.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CellStore for MemoryStore {
    fn create(&self, name: &CellName, owner_tag: u32) -> CellResult<Arc<CellRegion>> {
        let mut cells = self.cells();
        if cells.contains_key(name) {
            return Err(CellError::AlreadyExists(name.to_string()));
        }
        let region = Arc::new(CellRegion::in_memory(name.clone(), owner_tag));
        cells.insert(name.clone(), Arc::clone(&region));
        Ok(region)
    }

    fn lookup(&self, name: &CellName) -> CellResult<Arc<CellRegion>> {
        self.cells()
            .get(name)
            .cloned()
            .ok_or_else(|| CellError::NotFound(name.to_string()))
    }

    fn reset(&self, name: &CellName, owner_tag: u32) -> CellResult<Arc<CellRegion>> {
        let mut cells = self.cells();
        let region = cells
            .entry(name.clone())
            .or_insert_with(|| Arc::new(CellRegion::in_memory(name.clone(), owner_tag)));
        region.initialize(owner_tag);
        Ok(Arc::clone(region))
    }

    fn unlink(&self, name: &CellName) -> CellResult<bool> {
        Ok(self.cells().remove(name).is_some())
    }
}
