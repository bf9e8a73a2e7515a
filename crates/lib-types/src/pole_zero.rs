//! Pole-zero response representation.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// Rational transfer function given by a gain constant and the complex
/// roots of its numerator (zeros) and denominator (poles).
///
/// Order of the roots does not change the evaluated response, but it is kept
/// so that equal inputs hash equally.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PoleZeroData {
    pub scale: f64,
    pub poles: Vec<Complex64>,
    pub zeros: Vec<Complex64>,
}

impl PoleZeroData {
    pub fn new(scale: f64, poles: Vec<Complex64>, zeros: Vec<Complex64>) -> Self {
        Self { scale, poles, zeros }
    }
}

impl Eq for PoleZeroData {}

impl Hash for PoleZeroData {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.scale.to_bits().hash(state);
        for root in self.poles.iter().chain(self.zeros.iter()) {
            root.re.to_bits().hash(state);
            root.im.to_bits().hash(state);
        }
        self.poles.len().hash(state);
        self.zeros.len().hash(state);
    }
}
