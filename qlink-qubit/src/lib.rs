//! # ⚛️ qlink-qubit : Shared-Memory Qubits
//!
//! Qubits simulados cujo estado vive numa célula nomeada e compartilhada
//! entre processos. Medir um qubit propaga o resultado para os peers
//! ligados; um qubit esquecido colapsa sozinho depois do prazo de
//! decoerência.
//!
//! ## Arquitetura
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │          QubitHandle                            │
//! │  ┌───────────────────────────────────────────┐  │
//! │  │  Lock local + RNG                         │  │
//! │  └───────────────────────────────────────────┘  │
//! │  ┌───────────────────────────────────────────┐  │
//! │  │  Gates / Measure / Entangle               │  │
//! │  └───────────────────────────────────────────┘  │
//! │  ┌─────────────────────┐ ┌───────────────────┐  │
//! │  │  DecoherenceMonitor │ │  propagate()      │  │
//! │  └─────────────────────┘ └───────────────────┘  │
//! └─────────────────────────────────────────────────┘
//!                    │ CellStore
//!              qlink-cell (mmap)
//! ```
//!
//! ## Modelo de concorrência
//!
//! - Operações de um handle são ordenadas pelo lock local.
//! - A propagação escreve direto na célula do peer, sem o lock dele.
//! - A medição é monotônica: não medido → valor fixo, nunca revertido
//!   (exceto por re-preparação explícita do dono).
//! - Entre handles não há ordem entre um `measure()` e o monitor de outro.
//!
//! ## Exemplo
//!
//! ```ignore
//! use qlink_qubit::{QubitConfig, QubitHandle, form_group};
//! use std::time::Duration;
//!
//! let config = QubitConfig::default().with_decohere_timeout(Duration::from_millis(500));
//! let a = QubitHandle::new("a", config.clone())?;
//! let b = QubitHandle::new("b", config)?;
//!
//! form_group(&[&a, &b])?;
//! let r = a.measure()?;
//! assert_eq!(b.measurement(), Some(r));
//! ```

pub mod error;
pub mod config;
pub mod gate;
pub mod handle;
pub mod propagate;
pub mod group;
mod monitor;

pub use error::{QubitError, QubitResult};
pub use config::{QubitConfig, default_store, shm_dir};
pub use gate::Gate;
pub use handle::{QubitHandle, probability_of_one, unlink};
pub use propagate::{PropagationReport, propagate};
pub use group::{GroupBounds, MAX_GROUP, form_group};

// Re-exporta tipos da célula
pub use qlink_cell::{
    CellError, CellName, CellSnapshot, CellStore, Measurement, MemoryStore, OpenMode, Outcome,
    ShmStore,
};
