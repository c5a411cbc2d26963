//! # Monitor de decoerência
//!
//! Um thread por handle. A cada `poll_interval` verifica se a célula segue
//! não medida depois do prazo `decohere_timeout` desde o último timestamp;
//! se sim, colapsa exatamente como `measure()` e propaga.
//!
//! A espera é um `recv_timeout` num canal de parada, então `stop()` acorda
//! o thread na hora em vez de esperar o próximo tick.

use crossbeam_channel::{RecvTimeoutError, Sender, bounded};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{QubitError, QubitResult};
use crate::handle::QubitCore;

pub(crate) struct DecoherenceMonitor {
    stop: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl DecoherenceMonitor {
    pub(crate) fn spawn(core: Arc<QubitCore>, poll_interval: Duration) -> QubitResult<Self> {
        let (stop_tx, stop_rx) = bounded::<()>(1);
        let cell = core.name().to_string();

        let thread = thread::Builder::new()
            .name(format!("qlink-decohere-{cell}"))
            .spawn(move || {
                debug!(cell = %core.name(), "decoherence monitor started");
                loop {
                    match stop_rx.recv_timeout(poll_interval) {
                        Err(RecvTimeoutError::Timeout) => {
                            if let Some(outcome) = core.decohere_tick() {
                                debug!(cell = %core.name(), %outcome, "decohered");
                            }
                        }
                        // Sinal de parada ou sender descartado
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                debug!(cell = %core.name(), "decoherence monitor stopped");
            })
            .map_err(|e| QubitError::Monitor(e.to_string()))?;

        Ok(Self {
            stop: Some(stop_tx),
            thread: Some(thread),
        })
    }

    pub(crate) fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Sinaliza e aguarda o thread. Idempotente.
    pub(crate) fn stop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.try_send(());
        }
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("decoherence monitor panicked");
            }
        }
    }
}

impl Drop for DecoherenceMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}
