//! # Store mapeado em memória
//!
//! Cada célula é um arquivo de `RECORD_SIZE` bytes num diretório de
//! namespace (por padrão `/dev/shm/qlink`, que vive em RAM no Linux) e é
//! mapeado com `MAP_SHARED`. Qualquer processo que use o mesmo diretório
//! enxerga o mesmo registro.
//!
//! Criar usa `create_new`, então a distinção criar/anexar é decidida pelo
//! sistema de arquivos. Remover o arquivo não invalida mapeamentos já
//! feitos: um escritor concorrente com `unlink` ou escreve numa região ainda
//! mapeada, ou falha ao abrir.

use memmap2::MmapOptions;
use std::fs::{self, File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use crate::error::{CellError, CellResult};
use crate::layout::RECORD_SIZE;
use crate::name::CellName;
use crate::region::CellRegion;
use crate::store::CellStore;

const NAMESPACE: &str = "qlink";

/// Store de células compartilhadas entre processos
#[derive(Debug, Clone)]
pub struct ShmStore {
    root: PathBuf,
}

impl ShmStore {
    /// Usa `root` como namespace, criando o diretório se preciso
    pub fn new(root: impl Into<PathBuf>) -> CellResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .map_err(|e| CellError::resource(root.display().to_string(), e))?;
        Ok(Self { root })
    }

    /// Namespace padrão do sistema
    pub fn system() -> CellResult<Self> {
        Self::new(Self::default_root())
    }

    /// `/dev/shm/qlink` quando existe, senão `<tmp>/qlink`
    pub fn default_root() -> PathBuf {
        let shm = Path::new("/dev/shm");
        if shm.is_dir() {
            shm.join(NAMESPACE)
        } else {
            std::env::temp_dir().join(NAMESPACE)
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_of(&self, name: &CellName) -> PathBuf {
        self.root.join(name.as_str())
    }

    fn map(&self, name: &CellName, file: &File) -> CellResult<CellRegion> {
        let mmap = MmapOptions::new()
            .len(RECORD_SIZE)
            .map_raw(file)
            .map_err(|e| CellError::resource(name.as_str(), e))?;
        CellRegion::from_mapping(name.clone(), mmap)
    }

    fn open_existing(&self, name: &CellName) -> CellResult<File> {
        OpenOptions::new()
            .read(true)
            .write(true)
            .open(self.path_of(name))
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => CellError::NotFound(name.to_string()),
                _ => CellError::resource(name.as_str(), e),
            })
    }
}

impl CellStore for ShmStore {
    fn create(&self, name: &CellName, owner_tag: u32) -> CellResult<Arc<CellRegion>> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(self.path_of(name))
            .map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => CellError::AlreadyExists(name.to_string()),
                _ => CellError::resource(name.as_str(), e),
            })?;
        file.set_len(RECORD_SIZE as u64)
            .map_err(|e| CellError::resource(name.as_str(), e))?;

        let region = self.map(name, &file)?;
        region.initialize(owner_tag);
        Ok(Arc::new(region))
    }

    fn lookup(&self, name: &CellName) -> CellResult<Arc<CellRegion>> {
        let file = self.open_existing(name)?;
        let len = file
            .metadata()
            .map_err(|e| CellError::resource(name.as_str(), e))?
            .len();
        // Criador ainda não dimensionou o arquivo
        if len < RECORD_SIZE as u64 {
            return Err(CellError::Uninitialized(name.to_string()));
        }

        let region = self.map(name, &file)?;
        region.validate_header()?;
        Ok(Arc::new(region))
    }

    fn reset(&self, name: &CellName, owner_tag: u32) -> CellResult<Arc<CellRegion>> {
        match self.create(name, owner_tag) {
            Err(CellError::AlreadyExists(_)) => {}
            other => return other,
        }

        let file = self.open_existing(name)?;
        file.set_len(RECORD_SIZE as u64)
            .map_err(|e| CellError::resource(name.as_str(), e))?;
        let region = self.map(name, &file)?;
        region.initialize(owner_tag);
        Ok(Arc::new(region))
    }

    fn unlink(&self, name: &CellName) -> CellResult<bool> {
        match fs::remove_file(self.path_of(name)) {
            Ok(()) => {
                info!(cell = %name, "unlinked cell");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(CellError::resource(name.as_str(), e)),
        }
    }
}
