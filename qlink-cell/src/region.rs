//! Acesso a um registro mapeado

use memmap2::MmapRaw;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_1_SQRT_2;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{CellError, CellResult};
use crate::layout::*;
use crate::name::CellName;

enum Backing {
    /// Região compartilhada entre processos
    Mapped(MmapRaw),
    /// Região local ao processo (store em memória)
    Heap(Box<[AtomicU64]>),
}

/// Uma célula de estado: visão tipada sobre `RECORD_WORDS` palavras atômicas.
///
/// Várias `CellRegion` (em processos diferentes, ou no mesmo) podem apontar
/// para o mesmo registro. Nenhuma delas tem acesso exclusivo.
pub struct CellRegion {
    name: CellName,
    backing: Backing,
}

impl CellRegion {
    /// Região em memória do processo, já inicializada
    pub fn in_memory(name: CellName, owner_tag: u32) -> Self {
        let words = (0..RECORD_WORDS).map(|_| AtomicU64::new(0)).collect();
        let region = Self {
            name,
            backing: Backing::Heap(words),
        };
        region.initialize(owner_tag);
        region
    }

    /// Envolve um mapeamento sem validar o cabeçalho
    pub(crate) fn from_mapping(name: CellName, mmap: MmapRaw) -> CellResult<Self> {
        if mmap.len() < RECORD_SIZE {
            return Err(CellError::Uninitialized(name.to_string()));
        }
        Ok(Self {
            name,
            backing: Backing::Mapped(mmap),
        })
    }

    fn words(&self) -> &[AtomicU64] {
        match &self.backing {
            // SAFETY: o mapeamento é alinhado à página, tem pelo menos
            // RECORD_SIZE bytes (checado em `from_mapping`) e vive tanto
            // quanto `self`. AtomicU64 tem o mesmo layout de u64.
            Backing::Mapped(mmap) => unsafe {
                std::slice::from_raw_parts(mmap.as_ptr() as *const AtomicU64, RECORD_WORDS)
            },
            Backing::Heap(words) => &words[..],
        }
    }

    fn load(&self, word: usize) -> u64 {
        self.words()[word].load(Ordering::Acquire)
    }

    fn store(&self, word: usize, value: u64) {
        self.words()[word].store(value, Ordering::Release);
    }

    fn load_f64(&self, word: usize) -> f64 {
        f64::from_bits(self.load(word))
    }

    fn store_f64(&self, word: usize, value: f64) {
        self.store(word, value.to_bits());
    }

    pub fn name(&self) -> &CellName {
        &self.name
    }

    /// Confere magic e versão publicados pelo criador
    pub fn validate_header(&self) -> CellResult<()> {
        let (magic, version) = unpack_header(self.load(WORD_HEADER));
        if magic == 0 {
            return Err(CellError::Uninitialized(self.name.to_string()));
        }
        if magic != MAGIC || version != LAYOUT_VERSION {
            return Err(CellError::IncompatibleLayout {
                name: self.name.to_string(),
                magic,
                version,
            });
        }
        Ok(())
    }

    /// Zera o registro, grava o tag e publica o cabeçalho por último.
    ///
    /// Estado inicial: |0⟩, não medido, sem links, prazo
    /// [`INITIAL_DECOHERE_TIMEOUT_MS`] até o primeiro `touch`.
    pub fn initialize(&self, owner_tag: u32) {
        self.store(WORD_HEADER, 0);
        for word in 1..RECORD_WORDS {
            self.store(word, 0);
        }
        self.store(WORD_OWNER_TAG, owner_tag as u64);
        self.set_amplitudes(Complex64::new(1.0, 0.0), Complex64::new(0.0, 0.0));
        self.store(WORD_MEASUREMENT, Measurement::Unmeasured.encode());
        self.store(WORD_CREATED_AT, now_ms());
        self.store(WORD_DECOHERE_TIMEOUT, INITIAL_DECOHERE_TIMEOUT_MS);
        self.store(WORD_HEADER, pack_header(MAGIC, LAYOUT_VERSION));
    }

    pub fn owner_tag(&self) -> u32 {
        self.load(WORD_OWNER_TAG) as u32
    }

    pub fn amplitudes(&self) -> (Complex64, Complex64) {
        (
            Complex64::new(self.load_f64(WORD_ALPHA_RE), self.load_f64(WORD_ALPHA_IM)),
            Complex64::new(self.load_f64(WORD_BETA_RE), self.load_f64(WORD_BETA_IM)),
        )
    }

    /// Grava as amplitudes sem normalizar
    pub fn set_amplitudes(&self, alpha: Complex64, beta: Complex64) {
        self.store_f64(WORD_ALPHA_RE, alpha.re);
        self.store_f64(WORD_ALPHA_IM, alpha.im);
        self.store_f64(WORD_BETA_RE, beta.re);
        self.store_f64(WORD_BETA_IM, beta.im);
    }

    /// Superposição uniforme (1/√2, 1/√2)
    pub fn set_uniform_superposition(&self) {
        let amp = Complex64::new(FRAC_1_SQRT_2, 0.0);
        self.set_amplitudes(amp, amp);
    }

    /// Força o estado puro correspondente ao resultado
    pub fn set_basis_state(&self, outcome: Outcome) {
        let (one, zero) = (Complex64::new(1.0, 0.0), Complex64::new(0.0, 0.0));
        match outcome {
            Outcome::Zero => self.set_amplitudes(one, zero),
            Outcome::One => self.set_amplitudes(zero, one),
        }
    }

    pub fn measurement(&self) -> Measurement {
        Measurement::decode(self.load(WORD_MEASUREMENT))
    }

    /// Transição monotônica não medido → `outcome`.
    ///
    /// Retorna o valor que ficou gravado: `outcome` se esta chamada venceu,
    /// ou o resultado já existente caso a célula estivesse medida.
    pub fn collapse_to(&self, outcome: Outcome) -> Outcome {
        let word = &self.words()[WORD_MEASUREMENT];
        let desired = Measurement::from(outcome).encode();
        let mut current = word.load(Ordering::Acquire);
        loop {
            if let Measurement::Measured(existing) = Measurement::decode(current) {
                return existing;
            }
            match word.compare_exchange_weak(current, desired, Ordering::AcqRel, Ordering::Acquire) {
                Ok(_) => return outcome,
                Err(actual) => current = actual,
            }
        }
    }

    /// Volta a célula para não medida (re-preparação pelo dono)
    pub fn clear_measurement(&self) {
        self.store(WORD_MEASUREMENT, Measurement::Unmeasured.encode());
    }

    pub fn links(&self) -> Vec<CellName> {
        let count = (self.load(WORD_LINK_COUNT) as usize).min(LINK_CAPACITY);
        (0..count)
            .filter_map(|slot| {
                let base = WORD_LINKS + slot * WORDS_PER_LINK;
                let mut words = [0u64; WORDS_PER_LINK];
                for (i, word) in words.iter_mut().enumerate() {
                    *word = self.load(base + i);
                }
                decode_slot(&words).and_then(|name| CellName::new(name).ok())
            })
            .collect()
    }

    /// Substitui a lista de links, mantendo só os primeiros `LINK_CAPACITY`.
    /// Retorna quantos ficaram.
    pub fn set_links(&self, links: &[CellName]) -> usize {
        let count = links.len().min(LINK_CAPACITY);
        self.store(WORD_LINK_COUNT, 0);
        for slot in 0..LINK_CAPACITY {
            let words = match links.get(slot).filter(|_| slot < count) {
                Some(name) => encode_slot(name.as_str()),
                None => [0; WORDS_PER_LINK],
            };
            let base = WORD_LINKS + slot * WORDS_PER_LINK;
            for (i, word) in words.into_iter().enumerate() {
                self.store(base + i, word);
            }
        }
        self.store(WORD_LINK_COUNT, count as u64);
        count
    }

    pub fn clear_links(&self) {
        self.set_links(&[]);
    }

    pub fn created_at_ms(&self) -> u64 {
        self.load(WORD_CREATED_AT)
    }

    pub fn decohere_timeout_ms(&self) -> u64 {
        self.load(WORD_DECOHERE_TIMEOUT)
    }

    /// Renova o timestamp e grava o timeout de decoerência
    pub fn touch(&self, decohere_timeout_ms: u64) {
        self.store(WORD_CREATED_AT, now_ms());
        self.store(WORD_DECOHERE_TIMEOUT, decohere_timeout_ms);
    }

    /// Re-preparação: novo prazo e volta a Unmeasured.
    ///
    /// O carimbo vem antes de limpar a medição, senão um monitor de outro
    /// processo pode ver Unmeasured com o `created_at` antigo e colapsar
    /// o estado recém-preparado antes do prazo.
    pub fn rearm(&self, decohere_timeout_ms: u64) {
        self.touch(decohere_timeout_ms);
        self.clear_measurement();
    }

    /// Milissegundos desde o último `touch` (0 se o relógio voltou)
    pub fn elapsed_ms(&self) -> u64 {
        now_ms().saturating_sub(self.created_at_ms())
    }

    pub fn snapshot(&self) -> CellSnapshot {
        let (alpha, beta) = self.amplitudes();
        CellSnapshot {
            name: self.name.clone(),
            owner_tag: self.owner_tag(),
            alpha,
            beta,
            measurement: self.measurement(),
            links: self.links(),
            created_at_ms: self.created_at_ms(),
            decohere_timeout_ms: self.decohere_timeout_ms(),
        }
    }
}

impl fmt::Debug for CellRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CellRegion")
            .field("name", &self.name)
            .field("mapped", &matches!(self.backing, Backing::Mapped(_)))
            .field("measurement", &self.measurement())
            .finish()
    }
}

/// Cópia de um registro num instante (campos lidos um a um)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellSnapshot {
    pub name: CellName,
    pub owner_tag: u32,
    pub alpha: Complex64,
    pub beta: Complex64,
    pub measurement: Measurement,
    pub links: Vec<CellName>,
    pub created_at_ms: u64,
    pub decohere_timeout_ms: u64,
}

impl fmt::Display for CellSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Qubit '{}': ", self.name)?;
        match self.measurement {
            Measurement::Unmeasured => write!(
                f,
                "|ψ⟩ = ({:.3}{:+.3}i)|0⟩ + ({:.3}{:+.3}i)|1⟩",
                self.alpha.re, self.alpha.im, self.beta.re, self.beta.im
            )?,
            Measurement::Measured(outcome) => write!(f, "collapsed to {outcome}")?,
        }
        write!(f, "\nLinks: {}", self.links.len())?;
        for link in &self.links {
            write!(f, " {link}")?;
        }
        write!(f, "\nDecoherence: {}ms", self.decohere_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(name: &str) -> CellRegion {
        CellRegion::in_memory(CellName::new(name).unwrap(), 1)
    }

    #[test]
    fn test_initial_state() {
        let cell = region("q");
        assert!(cell.validate_header().is_ok());
        assert_eq!(cell.owner_tag(), 1);
        assert_eq!(cell.measurement(), Measurement::Unmeasured);
        let (alpha, beta) = cell.amplitudes();
        assert_eq!(alpha, Complex64::new(1.0, 0.0));
        assert_eq!(beta, Complex64::new(0.0, 0.0));
        assert!(cell.links().is_empty());
    }

    #[test]
    fn test_collapse_is_monotonic() {
        let cell = region("q");
        assert_eq!(cell.collapse_to(Outcome::One), Outcome::One);
        assert_eq!(cell.collapse_to(Outcome::Zero), Outcome::One);
        assert_eq!(cell.measurement(), Measurement::Measured(Outcome::One));

        cell.clear_measurement();
        assert_eq!(cell.collapse_to(Outcome::Zero), Outcome::Zero);
    }

    #[test]
    fn test_links_clamped() {
        let cell = region("q");
        let names: Vec<_> = (0..6).map(|i| CellName::new(format!("peer{i}")).unwrap()).collect();
        assert_eq!(cell.set_links(&names), LINK_CAPACITY);
        assert_eq!(cell.links(), names[..LINK_CAPACITY].to_vec());

        cell.set_links(&names[..1]);
        assert_eq!(cell.links(), names[..1].to_vec());
    }

    #[test]
    fn test_amplitudes_verbatim() {
        let cell = region("q");
        // sem normalização
        cell.set_amplitudes(Complex64::new(3.0, -1.0), Complex64::new(0.5, 2.0));
        let (alpha, beta) = cell.amplitudes();
        assert_eq!(alpha, Complex64::new(3.0, -1.0));
        assert_eq!(beta, Complex64::new(0.5, 2.0));
    }

    #[test]
    fn test_touch_sets_timeout() {
        let cell = region("q");
        cell.touch(750);
        assert_eq!(cell.decohere_timeout_ms(), 750);
        assert!(cell.elapsed_ms() < 1000);
    }

    #[test]
    fn test_initialize_stamps_nonzero_timeout() {
        let cell = region("q");
        assert_eq!(cell.decohere_timeout_ms(), INITIAL_DECOHERE_TIMEOUT_MS);
    }

    #[test]
    fn test_rearm_refreshes_stale_measured_cell() {
        let cell = region("q");
        cell.collapse_to(Outcome::One);
        // created_at bem no passado
        cell.store(WORD_CREATED_AT, now_ms().saturating_sub(60_000));
        assert!(cell.elapsed_ms() >= 60_000);

        cell.rearm(500);
        assert_eq!(cell.measurement(), Measurement::Unmeasured);
        assert!(cell.elapsed_ms() < 500);
        assert_eq!(cell.decohere_timeout_ms(), 500);
    }

    #[test]
    fn test_snapshot_display() {
        let cell = region("bell_qubit1");
        cell.set_uniform_superposition();
        let text = cell.snapshot().to_string();
        assert!(text.contains("Qubit 'bell_qubit1'"));
        assert!(text.contains("0.707"));

        cell.collapse_to(Outcome::One);
        assert!(cell.snapshot().to_string().contains("collapsed to |1⟩"));
    }
}
