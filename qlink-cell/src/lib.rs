//! # 🧊 qlink-cell : Shared State Cell
//!
//! Registro nomeado e compartilhado entre processos com as amplitudes de um
//! qubit simulado, a flag de medição e a lista de links.
//!
//! ## Arquitetura
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │  CellStore (create / lookup / reset / unlink)   │
//! │  ┌──────────────────┐  ┌─────────────────────┐  │
//! │  │  ShmStore (mmap) │  │  MemoryStore (fake) │  │
//! │  └──────────────────┘  └─────────────────────┘  │
//! │  ┌───────────────────────────────────────────┐  │
//! │  │  CellRegion: 42 palavras atômicas         │  │
//! │  └───────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────┘
//! ```
//!
//! ## Exemplo
//!
//! ```ignore
//! use qlink_cell::{CellName, CellStore, OpenMode, ShmStore};
//!
//! let store = ShmStore::system()?;
//! let name = CellName::new("bell_qubit1")?;
//! let cell = store.open(&name, 1, OpenMode::OpenOrCreate)?.region;
//! cell.set_uniform_superposition();
//! store.unlink(&name)?;
//! ```

pub mod error;
pub mod layout;
pub mod name;
pub mod region;
pub mod store;
pub mod shm;
pub mod memory;

pub use error::{CellError, CellResult};
pub use layout::{INITIAL_DECOHERE_TIMEOUT_MS, LINK_CAPACITY, NAME_CAPACITY, RECORD_SIZE, Measurement, Outcome, now_ms};
pub use name::CellName;
pub use region::{CellRegion, CellSnapshot};
pub use store::{CellStore, Disposition, OpenMode, OpenedCell};
pub use shm::ShmStore;
pub use memory::MemoryStore;
