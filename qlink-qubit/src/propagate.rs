//! # Propagação de colapso
//!
//! Empurra um resultado para as células ligadas. Best-effort, sem
//! transação: cada peer é anexado, recebe o resultado direto no registro
//! (sem passar pelo lock do handle dono) e é solto. Peer ausente é pulado
//! sem erro.
//!
//! Só a flag de medição do peer muda. As amplitudes dele continuam
//! mostrando a superposição anterior; quem lê deve tratar
//! `measurement != Unmeasured` como autoritativo.
//!
//! A escrita é monotônica: um peer já medido mantém o próprio valor.

use qlink_cell::{CellName, CellStore, Outcome};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Resumo de uma propagação
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropagationReport {
    /// Peers que agora mostram o resultado
    pub delivered: usize,
    /// Peers sem região disponível
    pub skipped: usize,
    /// Peers já medidos com outro valor
    pub conflicting: usize,
}

impl PropagationReport {
    pub fn attempted(&self) -> usize {
        self.delivered + self.skipped + self.conflicting
    }
}

/// Propaga `outcome` de `origin` para cada nome em `links`
pub fn propagate(
    store: &dyn CellStore,
    origin: &CellName,
    links: &[CellName],
    outcome: Outcome,
) -> PropagationReport {
    let mut report = PropagationReport::default();

    for peer in links {
        let region = match store.lookup(peer) {
            Ok(region) => region,
            Err(err) => {
                debug!(cell = %origin, %peer, error = %err, "peer unavailable, skipping");
                report.skipped += 1;
                continue;
            }
        };

        let stored = region.collapse_to(outcome);
        if stored == outcome {
            report.delivered += 1;
        } else {
            debug!(cell = %origin, %peer, %outcome, %stored, "peer already collapsed");
            report.conflicting += 1;
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use qlink_cell::{Measurement, MemoryStore, OpenMode};

    fn name(s: &str) -> CellName {
        CellName::new(s).unwrap()
    }

    #[test]
    fn test_propagate_to_peers() {
        let store = MemoryStore::new();
        for n in ["a", "b", "c"] {
            store.open(&name(n), 1, OpenMode::Create).unwrap();
        }

        let report = propagate(&store, &name("a"), &[name("b"), name("c")], Outcome::One);
        assert_eq!(report.delivered, 2);

        let b = store.lookup(&name("b")).unwrap();
        assert_eq!(b.measurement(), Measurement::Measured(Outcome::One));
        // Amplitudes do peer ficam como estavam
        assert_eq!(b.amplitudes().0.re, 1.0);
    }

    #[test]
    fn test_missing_peer_is_skipped() {
        let store = MemoryStore::new();
        store.open(&name("b"), 1, OpenMode::Create).unwrap();

        let report = propagate(&store, &name("a"), &[name("ghost"), name("b")], Outcome::Zero);
        assert_eq!(report, PropagationReport { delivered: 1, skipped: 1, conflicting: 0 });
    }

    #[test]
    fn test_measured_peer_keeps_value() {
        let store = MemoryStore::new();
        let b = store.open(&name("b"), 1, OpenMode::Create).unwrap().region;
        b.collapse_to(Outcome::Zero);

        let report = propagate(&store, &name("a"), &[name("b")], Outcome::One);
        assert_eq!(report.conflicting, 1);
        assert_eq!(b.measurement(), Measurement::Measured(Outcome::Zero));
    }

    #[test]
    fn test_unlinked_peer_is_skipped() {
        let store = MemoryStore::new();
        let b = store.open(&name("b"), 1, OpenMode::Create).unwrap().region;
        store.unlink(&name("b")).unwrap();

        let report = propagate(&store, &name("a"), &[name("b")], Outcome::One);
        assert_eq!(report.skipped, 1);
        assert_eq!(b.measurement(), Measurement::Unmeasured);
    }
}
