//! Portas de um qubit: H, X, Z

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_1_SQRT_2;
use std::fmt;
use std::str::FromStr;

use crate::error::QubitError;

/// Porta aplicável a uma célula não medida
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gate {
    /// H: α' = (α+β)/√2, β' = (α−β)/√2
    Hadamard,
    /// X: troca α e β
    BitFlip,
    /// Z: nega β
    PhaseFlip,
}

impl Gate {
    pub fn apply(self, alpha: Complex64, beta: Complex64) -> (Complex64, Complex64) {
        match self {
            Gate::Hadamard => ((alpha + beta) * FRAC_1_SQRT_2, (alpha - beta) * FRAC_1_SQRT_2),
            Gate::BitFlip => (beta, alpha),
            Gate::PhaseFlip => (alpha, -beta),
        }
    }

    pub fn symbol(self) -> char {
        match self {
            Gate::Hadamard => 'H',
            Gate::BitFlip => 'X',
            Gate::PhaseFlip => 'Z',
        }
    }
}

impl FromStr for Gate {
    type Err = QubitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "h" | "hadamard" => Ok(Gate::Hadamard),
            "x" | "bitflip" | "pauli-x" => Ok(Gate::BitFlip),
            "z" | "phaseflip" | "pauli-z" => Ok(Gate::PhaseFlip),
            _ => Err(QubitError::UnknownGate(s.to_string())),
        }
    }
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    fn close(a: Complex64, b: Complex64) -> bool {
        (a - b).norm() < EPS
    }

    #[test]
    fn test_hadamard_from_zero() {
        let (a, b) = Gate::Hadamard.apply(Complex64::new(1.0, 0.0), Complex64::new(0.0, 0.0));
        assert!(close(a, Complex64::new(FRAC_1_SQRT_2, 0.0)));
        assert!(close(b, Complex64::new(FRAC_1_SQRT_2, 0.0)));
    }

    #[test]
    fn test_hadamard_componentwise_imaginary() {
        let (a, b) = Gate::Hadamard.apply(Complex64::new(0.0, 1.0), Complex64::new(0.0, 1.0));
        assert!(close(a, Complex64::new(0.0, 2.0 * FRAC_1_SQRT_2)));
        assert!(close(b, Complex64::new(0.0, 0.0)));
    }

    #[test]
    fn test_involutions() {
        let alpha = Complex64::new(0.3, -0.4);
        let beta = Complex64::new(0.5, 0.7);
        for gate in [Gate::Hadamard, Gate::BitFlip, Gate::PhaseFlip] {
            let (a1, b1) = gate.apply(alpha, beta);
            let (a2, b2) = gate.apply(a1, b1);
            assert!(close(a2, alpha) && close(b2, beta), "{gate} twice should be identity");
        }
    }

    #[test]
    fn test_parse() {
        assert_eq!("H".parse::<Gate>().unwrap(), Gate::Hadamard);
        assert_eq!("bitflip".parse::<Gate>().unwrap(), Gate::BitFlip);
        assert_eq!("Z".parse::<Gate>().unwrap(), Gate::PhaseFlip);
        assert!(matches!("Y".parse::<Gate>(), Err(QubitError::UnknownGate(_))));
    }
}
