//! # Layout do registro compartilhado
//!
//! O único contrato entre processos. Cada campo ocupa uma palavra de 64 bits
//! acessada atomicamente, de modo que escritores em mapeamentos diferentes
//! nunca produzem acesso indefinido. O registro como um todo não é atômico.
//!
//! ```text
//! word   campo
//! ─────  ──────────────────────────────────────
//!  0     magic (lo32) | version (hi32)
//!  1     owner_tag
//!  2     link_count
//!  3     measurement (0 = |0⟩, 1 = |1⟩, 2 = não medido)
//!  4-7   α.re, α.im, β.re, β.im (bits f64)
//!  8     created_at (ms)
//!  9     decohere_timeout (ms)
//! 10-41  4 slots de link × 64 bytes
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// "QLNK"
pub const MAGIC: u32 = 0x514C_4E4B;
pub const LAYOUT_VERSION: u32 = 1;

/// Máximo de links por célula (fixo no layout)
pub const LINK_CAPACITY: usize = 4;
/// Bytes por slot de link
pub const LINK_SLOT_BYTES: usize = 64;
/// Tamanho máximo de um nome (o último byte do slot é sempre NUL)
pub const NAME_CAPACITY: usize = LINK_SLOT_BYTES - 1;
/// Prazo gravado por `initialize`, até o dono carimbar o seu
pub const INITIAL_DECOHERE_TIMEOUT_MS: u64 = 5000;

pub(crate) const WORD_HEADER: usize = 0;
pub(crate) const WORD_OWNER_TAG: usize = 1;
pub(crate) const WORD_LINK_COUNT: usize = 2;
pub(crate) const WORD_MEASUREMENT: usize = 3;
pub(crate) const WORD_ALPHA_RE: usize = 4;
pub(crate) const WORD_ALPHA_IM: usize = 5;
pub(crate) const WORD_BETA_RE: usize = 6;
pub(crate) const WORD_BETA_IM: usize = 7;
pub(crate) const WORD_CREATED_AT: usize = 8;
pub(crate) const WORD_DECOHERE_TIMEOUT: usize = 9;
pub(crate) const WORD_LINKS: usize = 10;
pub(crate) const WORDS_PER_LINK: usize = LINK_SLOT_BYTES / 8;

/// Palavras de 64 bits no registro
pub const RECORD_WORDS: usize = WORD_LINKS + LINK_CAPACITY * WORDS_PER_LINK;
/// Tamanho do registro em bytes
pub const RECORD_SIZE: usize = RECORD_WORDS * 8;

const MEASUREMENT_ZERO: u64 = 0;
const MEASUREMENT_ONE: u64 = 1;
const MEASUREMENT_NONE: u64 = 2;

pub(crate) fn pack_header(magic: u32, version: u32) -> u64 {
    (magic as u64) | ((version as u64) << 32)
}

pub(crate) fn unpack_header(word: u64) -> (u32, u32) {
    (word as u32, (word >> 32) as u32)
}

/// Resultado de uma medição
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Outcome {
    Zero = 0,
    One = 1,
}

impl Outcome {
    pub fn as_bit(self) -> u8 {
        self as u8
    }

    pub fn from_bit(bit: bool) -> Self {
        if bit { Outcome::One } else { Outcome::Zero }
    }
}

impl From<Outcome> for u8 {
    fn from(outcome: Outcome) -> u8 {
        outcome.as_bit()
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "|{}⟩", self.as_bit())
    }
}

/// Flag tri-estado de medição
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Measurement {
    #[default]
    Unmeasured,
    Measured(Outcome),
}

impl Measurement {
    pub fn is_measured(self) -> bool {
        matches!(self, Measurement::Measured(_))
    }

    pub fn outcome(self) -> Option<Outcome> {
        match self {
            Measurement::Measured(outcome) => Some(outcome),
            Measurement::Unmeasured => None,
        }
    }

    pub(crate) fn encode(self) -> u64 {
        match self {
            Measurement::Unmeasured => MEASUREMENT_NONE,
            Measurement::Measured(Outcome::Zero) => MEASUREMENT_ZERO,
            Measurement::Measured(Outcome::One) => MEASUREMENT_ONE,
        }
    }

    /// Valores desconhecidos contam como não medido
    pub(crate) fn decode(word: u64) -> Self {
        match word {
            MEASUREMENT_ZERO => Measurement::Measured(Outcome::Zero),
            MEASUREMENT_ONE => Measurement::Measured(Outcome::One),
            _ => Measurement::Unmeasured,
        }
    }
}

impl From<Outcome> for Measurement {
    fn from(outcome: Outcome) -> Self {
        Measurement::Measured(outcome)
    }
}

/// Codifica um nome num slot de link (zero-padded, little-endian)
pub(crate) fn encode_slot(name: &str) -> [u64; WORDS_PER_LINK] {
    let mut bytes = [0u8; LINK_SLOT_BYTES];
    let len = name.len().min(NAME_CAPACITY);
    bytes[..len].copy_from_slice(&name.as_bytes()[..len]);

    let mut words = [0u64; WORDS_PER_LINK];
    for (word, chunk) in words.iter_mut().zip(bytes.chunks_exact(8)) {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(chunk);
        *word = u64::from_le_bytes(buf);
    }
    words
}

/// Decodifica um slot; `None` se vazio ou não UTF-8
pub(crate) fn decode_slot(words: &[u64; WORDS_PER_LINK]) -> Option<String> {
    let mut bytes = [0u8; LINK_SLOT_BYTES];
    for (chunk, word) in bytes.chunks_exact_mut(8).zip(words) {
        chunk.copy_from_slice(&word.to_le_bytes());
    }
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(NAME_CAPACITY);
    if end == 0 {
        return None;
    }
    String::from_utf8(bytes[..end].to_vec()).ok()
}

/// Timestamp em milissegundos (relógio de parede, compartilhável entre processos)
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_size() {
        assert_eq!(RECORD_WORDS, 42);
        assert_eq!(RECORD_SIZE, 336);
    }

    #[test]
    fn test_header_packing() {
        let word = pack_header(MAGIC, LAYOUT_VERSION);
        assert_eq!(unpack_header(word), (MAGIC, LAYOUT_VERSION));
    }

    #[test]
    fn test_measurement_encoding() {
        assert_eq!(Measurement::decode(Measurement::Unmeasured.encode()), Measurement::Unmeasured);
        assert_eq!(Measurement::decode(1), Measurement::Measured(Outcome::One));
        assert_eq!(Measurement::decode(0), Measurement::Measured(Outcome::Zero));
        assert_eq!(Measurement::decode(99), Measurement::Unmeasured);
    }

    #[test]
    fn test_slot_codec() {
        let slot = encode_slot("adv_qubit3");
        assert_eq!(decode_slot(&slot).as_deref(), Some("adv_qubit3"));
        assert_eq!(decode_slot(&[0; WORDS_PER_LINK]), None);
    }

    #[test]
    fn test_slot_keeps_terminator() {
        let long = "x".repeat(80);
        let decoded = decode_slot(&encode_slot(&long)).unwrap();
        assert_eq!(decoded.len(), NAME_CAPACITY);
    }
}
