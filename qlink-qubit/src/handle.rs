//! Handle de processo sobre uma célula compartilhada

use num_complex::Complex64;
use qlink_cell::{CellName, CellRegion, CellSnapshot, CellStore, Disposition, Outcome};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::{QubitConfig, default_store};
use crate::error::QubitResult;
use crate::gate::Gate;
use crate::monitor::DecoherenceMonitor;
use crate::propagate::{PropagationReport, propagate};

/// Probabilidade de |1⟩ = |β|², limitada a [0, 1] (NaN conta como 0)
pub fn probability_of_one(beta: Complex64) -> f64 {
    let p = beta.norm_sqr();
    if p.is_nan() { 0.0 } else { p.clamp(0.0, 1.0) }
}

/// Por que uma célula colapsou
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum CollapseCause {
    Measured,
    Decohered,
}

/// Estado compartilhado entre o handle e o thread do monitor
pub(crate) struct QubitCore {
    name: CellName,
    region: Arc<CellRegion>,
    store: Arc<dyn CellStore>,
    config: QubitConfig,
    /// Lock local: serializa o acesso deste handle à célula e guarda o RNG
    guard: Mutex<StdRng>,
}

impl QubitCore {
    fn lock(&self) -> QubitResult<MutexGuard<'_, StdRng>> {
        Ok(self.guard.lock()?)
    }

    /// Para leituras e para o monitor, um lock envenenado não impede o acesso
    fn lock_lenient(&self) -> MutexGuard<'_, StdRng> {
        self.guard.lock().unwrap_or_else(|poisoned| {
            warn!(cell = %self.name, "local lock poisoned, continuing");
            PoisonError::into_inner(poisoned)
        })
    }

    pub(crate) fn name(&self) -> &CellName {
        &self.name
    }

    /// Amostra, colapsa, força o estado puro e propaga. Chamar com o lock.
    ///
    /// Se uma propagação chegou antes, o valor já gravado vence e nada é
    /// propagado de novo.
    fn collapse_locked(&self, rng: &mut StdRng, cause: CollapseCause) -> Outcome {
        let (_, beta) = self.region.amplitudes();
        let sampled = Outcome::from_bit(rng.gen_bool(probability_of_one(beta)));

        let outcome = self.region.collapse_to(sampled);
        self.region.set_basis_state(outcome);
        self.region.touch(self.config.decohere_timeout_ms);

        if outcome == sampled {
            let links = self.region.links();
            let report = propagate(self.store.as_ref(), &self.name, &links, outcome);
            self.log_collapse(cause, outcome, &report);
        }
        outcome
    }

    fn log_collapse(&self, cause: CollapseCause, outcome: Outcome, report: &PropagationReport) {
        debug!(
            cell = %self.name,
            ?cause,
            %outcome,
            delivered = report.delivered,
            skipped = report.skipped,
            conflicting = report.conflicting,
            "collapsed"
        );
    }

    /// Um passo do monitor de decoerência. Retorna o resultado se colapsou.
    pub(crate) fn decohere_tick(&self) -> Option<Outcome> {
        let mut rng = self.lock_lenient();
        if self.region.measurement().is_measured() {
            return None;
        }
        let timeout = self.region.decohere_timeout_ms();
        if self.region.elapsed_ms() <= timeout {
            return None;
        }
        Some(self.collapse_locked(&mut rng, CollapseCause::Decohered))
    }
}

/// Qubit simulado ligado a uma célula nomeada.
///
/// Todas as operações tomam o lock local do handle. Esse lock não protege
/// contra escritas de propagação vindas de outros handles, que gravam
/// direto no registro.
///
/// Um monitor em segundo plano força o colapso quando o prazo de decoerência
/// expira; ele é parado e aguardado em [`QubitHandle::shutdown`] ou no `Drop`.
pub struct QubitHandle {
    core: Arc<QubitCore>,
    monitor: DecoherenceMonitor,
}

impl QubitHandle {
    /// Abre `name` no store padrão (`ShmStore`)
    pub fn new(name: impl AsRef<str>, config: QubitConfig) -> QubitResult<Self> {
        Self::open(default_store()?, name, config)
    }

    /// Abre ou cria `name` em `store` conforme `config.open_mode`
    pub fn open(store: Arc<dyn CellStore>, name: impl AsRef<str>, config: QubitConfig) -> QubitResult<Self> {
        config.validate()?;
        let name = CellName::new(name.as_ref())?;
        let opened = store.open(&name, config.owner_tag, config.open_mode)?;
        if opened.disposition != Disposition::Attached {
            opened.region.touch(config.decohere_timeout_ms);
        }

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let poll_interval = config.poll_interval();

        let core = Arc::new(QubitCore {
            name,
            region: opened.region,
            store,
            config,
            guard: Mutex::new(rng),
        });
        let monitor = DecoherenceMonitor::spawn(Arc::clone(&core), poll_interval)?;

        Ok(Self { core, monitor })
    }

    pub fn name(&self) -> &str {
        self.core.name.as_str()
    }

    pub fn cell_name(&self) -> &CellName {
        &self.core.name
    }

    pub fn config(&self) -> &QubitConfig {
        &self.core.config
    }

    pub fn decohere_timeout(&self) -> Duration {
        self.core.config.decohere_timeout()
    }

    /// Superposição uniforme, não medido, sem links
    pub fn init_superposition(&self) -> QubitResult<()> {
        let _guard = self.core.lock()?;
        let region = &self.core.region;
        region.set_uniform_superposition();
        region.clear_links();
        region.rearm(self.core.config.decohere_timeout_ms);
        Ok(())
    }

    /// Grava as amplitudes como dadas, sem checar normalização
    pub fn set_state(&self, re0: f64, im0: f64, re1: f64, im1: f64) -> QubitResult<()> {
        self.set_amplitudes(Complex64::new(re0, im0), Complex64::new(re1, im1))
    }

    pub fn set_amplitudes(&self, alpha: Complex64, beta: Complex64) -> QubitResult<()> {
        let _guard = self.core.lock()?;
        let region = &self.core.region;
        region.set_amplitudes(alpha, beta);
        region.rearm(self.core.config.decohere_timeout_ms);
        Ok(())
    }

    /// Aplica `gate`; sem efeito se já medido
    pub fn apply_gate(&self, gate: Gate) -> QubitResult<()> {
        let _guard = self.core.lock()?;
        let region = &self.core.region;
        if region.measurement().is_measured() {
            return Ok(());
        }
        let (alpha, beta) = region.amplitudes();
        let (alpha, beta) = gate.apply(alpha, beta);
        region.set_amplitudes(alpha, beta);
        region.touch(self.core.config.decohere_timeout_ms);
        Ok(())
    }

    /// Aplica uma porta pelo símbolo (`H`, `X`, `Z`, ...)
    pub fn apply_gate_symbol(&self, symbol: &str) -> QubitResult<()> {
        self.apply_gate(symbol.parse()?)
    }

    /// Mede a célula. Idempotente: depois do colapso devolve sempre o
    /// mesmo valor, sem reamostrar nem propagar.
    pub fn measure(&self) -> QubitResult<Outcome> {
        let mut rng = self.core.lock()?;
        if let Some(outcome) = self.core.region.measurement().outcome() {
            return Ok(outcome);
        }
        Ok(self.core.collapse_locked(&mut rng, CollapseCause::Measured))
    }

    /// Substitui os links pelos primeiros `LINK_CAPACITY` nomes distintos.
    /// Repetições e o próprio nome do handle são ignorados, na ordem dada.
    /// Retorna quantos foram mantidos.
    pub fn entangle<I, S>(&self, peers: I) -> QubitResult<usize>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut names: Vec<CellName> = Vec::with_capacity(qlink_cell::LINK_CAPACITY);
        for peer in peers {
            let name = CellName::new(peer.as_ref())?;
            if name == self.core.name || names.contains(&name) {
                continue;
            }
            if names.len() < qlink_cell::LINK_CAPACITY {
                names.push(name);
            }
        }

        let _guard = self.core.lock()?;
        Ok(self.core.region.set_links(&names))
    }

    /// Membro de grupo: links = `peers`, amplitudes = (1/√2, 1/√2)
    pub(crate) fn join_group(&self, peers: &[CellName]) -> QubitResult<()> {
        let _guard = self.core.lock()?;
        let region = &self.core.region;
        region.set_links(peers);
        region.set_uniform_superposition();
        region.rearm(self.core.config.decohere_timeout_ms);
        Ok(())
    }

    pub fn is_measured(&self) -> bool {
        let _guard = self.core.lock_lenient();
        self.core.region.measurement().is_measured()
    }

    /// Resultado, se já medido
    pub fn measurement(&self) -> Option<Outcome> {
        let _guard = self.core.lock_lenient();
        self.core.region.measurement().outcome()
    }

    pub fn links(&self) -> Vec<CellName> {
        let _guard = self.core.lock_lenient();
        self.core.region.links()
    }

    /// Amplitudes gravadas (podem estar velhas após propagação)
    pub fn amplitudes(&self) -> (Complex64, Complex64) {
        let _guard = self.core.lock_lenient();
        self.core.region.amplitudes()
    }

    pub fn snapshot(&self) -> CellSnapshot {
        let _guard = self.core.lock_lenient();
        self.core.region.snapshot()
    }

    /// Para e aguarda o monitor. Chamado também no `Drop`.
    pub fn shutdown(&mut self) {
        self.monitor.stop();
    }
}

impl fmt::Debug for QubitHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QubitHandle")
            .field("name", &self.core.name)
            .field("config", &self.core.config)
            .field("monitor_running", &self.monitor.is_running())
            .finish()
    }
}

impl fmt::Display for QubitHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.snapshot())
    }
}

impl Drop for QubitHandle {
    fn drop(&mut self) {
        self.monitor.stop();
    }
}

/// Remove a célula `name` do store padrão
pub fn unlink(name: impl AsRef<str>) -> QubitResult<bool> {
    let name = CellName::new(name.as_ref())?;
    Ok(default_store()?.unlink(&name)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use qlink_cell::MemoryStore;

    #[test]
    fn test_probability_clamped() {
        assert_eq!(probability_of_one(Complex64::new(2.0, 0.0)), 1.0);
        assert_eq!(probability_of_one(Complex64::new(f64::NAN, 0.0)), 0.0);
        assert!((probability_of_one(Complex64::new(0.6, 0.0)) - 0.36).abs() < 1e-12);
    }

    #[test]
    fn test_open_touches_new_cell() {
        let store: Arc<dyn CellStore> = Arc::new(MemoryStore::new());
        let config = QubitConfig::default().with_decohere_timeout(Duration::from_millis(1234));
        let q = QubitHandle::open(store, "fresh", config).unwrap();
        assert_eq!(q.snapshot().decohere_timeout_ms, 1234);
        assert!(!q.is_measured());
    }

    #[test]
    fn test_zero_timeout_is_due_immediately() {
        let store: Arc<dyn CellStore> = Arc::new(MemoryStore::new());
        let config = QubitConfig::default()
            .with_decohere_timeout(Duration::ZERO)
            .with_poll_interval(Duration::from_secs(60));
        let q = QubitHandle::open(store, "instant", config).unwrap();
        q.init_superposition().unwrap();
        std::thread::sleep(Duration::from_millis(5));

        assert!(q.core.decohere_tick().is_some());
        assert!(q.is_measured());
    }

    #[test]
    fn test_reprepare_restarts_deadline() {
        let store: Arc<dyn CellStore> = Arc::new(MemoryStore::new());
        let config = QubitConfig::default()
            .with_decohere_timeout(Duration::from_millis(50))
            .with_poll_interval(Duration::from_secs(60));
        let q = QubitHandle::open(store, "stale", config).unwrap();
        q.measure().unwrap();
        std::thread::sleep(Duration::from_millis(80));

        q.init_superposition().unwrap();
        assert_eq!(q.core.decohere_tick(), None);
        assert!(!q.is_measured());

        q.set_state(0.0, 0.0, 1.0, 0.0).unwrap();
        assert_eq!(q.core.decohere_tick(), None);
        assert!(!q.is_measured());
    }

    #[test]
    fn test_invalid_name_is_validation() {
        let store: Arc<dyn CellStore> = Arc::new(MemoryStore::new());
        let err = QubitHandle::open(store, "a/b", QubitConfig::default()).unwrap_err();
        assert!(err.is_validation());
    }
}
