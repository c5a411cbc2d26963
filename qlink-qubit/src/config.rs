//! Configuração de handles
//!
//! Valores vêm de código (`QubitConfig::default()` + `with_*`) ou do
//! ambiente / `.env`:
//!
//! - `QLINK_OWNER_TAG`
//! - `QLINK_DECOHERE_TIMEOUT_MS`
//! - `QLINK_POLL_INTERVAL_MS`
//! - `QLINK_SEED`
//! - `QLINK_SHM_DIR`

use once_cell::sync::Lazy;
use qlink_cell::{CellStore, OpenMode, ShmStore};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{QubitError, QubitResult};

pub const DEFAULT_DECOHERE_TIMEOUT_MS: u64 = qlink_cell::INITIAL_DECOHERE_TIMEOUT_MS;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

static DOTENV_INIT: Lazy<()> = Lazy::new(|| {
    let _ = dotenv::dotenv();
});

#[inline]
fn ensure_loaded() {
    let _ = &*DOTENV_INIT;
}

/// Parâmetros de construção de um `QubitHandle`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QubitConfig {
    /// Tag do dono lógico da célula
    pub owner_tag: u32,
    /// Prazo até o colapso forçado (0 colapsa no próximo ciclo do monitor)
    pub decohere_timeout_ms: u64,
    /// Intervalo de verificação do monitor
    pub poll_interval_ms: u64,
    /// Tratamento de uma célula já existente
    pub open_mode: OpenMode,
    /// Semente fixa para amostragem reprodutível
    pub seed: Option<u64>,
}

impl Default for QubitConfig {
    fn default() -> Self {
        Self {
            owner_tag: 1,
            decohere_timeout_ms: DEFAULT_DECOHERE_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            open_mode: OpenMode::OpenOrCreate,
            seed: None,
        }
    }
}

impl QubitConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults sobrescritos pelas variáveis `QLINK_*`
    pub fn from_env() -> QubitResult<Self> {
        ensure_loaded();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Como `from_env`, com uma fonte de variáveis arbitrária
    pub fn from_lookup<F>(lookup: F) -> QubitResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        fn parse<T: std::str::FromStr>(key: &str, raw: Option<String>) -> QubitResult<Option<T>> {
            raw.map(|v| {
                v.trim()
                    .parse()
                    .map_err(|_| QubitError::InvalidConfig(format!("{key}={v}")))
            })
            .transpose()
        }

        let mut config = Self::default();
        if let Some(tag) = parse::<u32>("QLINK_OWNER_TAG", lookup("QLINK_OWNER_TAG"))? {
            config.owner_tag = tag;
        }
        if let Some(ms) = parse::<u64>("QLINK_DECOHERE_TIMEOUT_MS", lookup("QLINK_DECOHERE_TIMEOUT_MS"))? {
            config.decohere_timeout_ms = ms;
        }
        if let Some(ms) = parse::<u64>("QLINK_POLL_INTERVAL_MS", lookup("QLINK_POLL_INTERVAL_MS"))? {
            config.poll_interval_ms = ms;
        }
        config.seed = parse::<u64>("QLINK_SEED", lookup("QLINK_SEED"))?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_owner_tag(mut self, owner_tag: u32) -> Self {
        self.owner_tag = owner_tag;
        self
    }

    pub fn with_decohere_timeout(mut self, timeout: Duration) -> Self {
        self.decohere_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = interval.as_millis() as u64;
        self
    }

    pub fn with_open_mode(mut self, mode: OpenMode) -> Self {
        self.open_mode = mode;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn decohere_timeout(&self) -> Duration {
        Duration::from_millis(self.decohere_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn validate(&self) -> QubitResult<()> {
        if self.poll_interval_ms == 0 {
            return Err(QubitError::InvalidConfig("poll_interval_ms must be > 0".into()));
        }
        Ok(())
    }
}

/// Diretório do namespace: `QLINK_SHM_DIR` ou o padrão do sistema
pub fn shm_dir() -> PathBuf {
    ensure_loaded();
    env::var_os("QLINK_SHM_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(ShmStore::default_root)
}

/// Store compartilhado usado por `QubitHandle::new` e `unlink`
pub fn default_store() -> QubitResult<Arc<dyn CellStore>> {
    let store: Arc<dyn CellStore> = Arc::new(ShmStore::new(shm_dir())?);
    Ok(store)
}
