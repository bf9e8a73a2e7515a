//! Frequency/amplitude/phase table resampling.
//!
//! Amplitudes are interpolated in log10(amplitude) against log10(frequency)
//! with a Lagrange polynomial: two points (the bracketing interval) within two
//! samples of either end of the table, four points (one either side of the
//! bracket) elsewhere. Phase is interpolated linearly in frequency across the
//! bracketing interval.
//!
//! Knots with zero amplitude have no logarithm. Such a knot is left out of
//! the four-point window, and a bracket that ends on one is interpolated
//! linearly in amplitude.
//!
//! Only strictly positive frequencies enter the table. Requests at or below
//! the first tabulated frequency take the first row, requests at or above the
//! last take the last row.

use crate::error::{DspError, DspResult};
use crate::pole_zero::AmpPhase;

/// Tabulated response, sorted by strictly increasing frequency.
#[derive(Clone, Debug, PartialEq)]
pub struct FapTable {
    frequencies: Vec<f64>,
    amplitudes: Vec<f64>,
    phases: Vec<f64>,
}

impl FapTable {
    /// Build a table, dropping rows at non-positive frequencies.
    pub fn new(frequencies: Vec<f64>, amplitudes: Vec<f64>, phases: Vec<f64>) -> DspResult<Self> {
        if amplitudes.len() != frequencies.len() {
            return Err(DspError::LengthMismatch {
                expected: frequencies.len(),
                actual: amplitudes.len(),
            });
        }
        if phases.len() != frequencies.len() {
            return Err(DspError::LengthMismatch {
                expected: frequencies.len(),
                actual: phases.len(),
            });
        }

        let mut table = Self {
            frequencies: Vec::with_capacity(frequencies.len()),
            amplitudes: Vec::with_capacity(frequencies.len()),
            phases: Vec::with_capacity(frequencies.len()),
        };
        for ((f, a), p) in frequencies.into_iter().zip(amplitudes).zip(phases) {
            if !(f > 0.0) {
                continue;
            }
            if let Some(&last) = table.frequencies.last() {
                if f <= last {
                    return Err(DspError::InvalidTable(format!(
                        "frequencies must increase, got {f} after {last}"
                    )));
                }
            }
            table.frequencies.push(f);
            table.amplitudes.push(a);
            table.phases.push(p);
        }

        if table.frequencies.is_empty() {
            return Err(DspError::InsufficientData { needed: 1, got: 0 });
        }
        Ok(table)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    pub fn amplitudes(&self) -> &[f64] {
        &self.amplitudes
    }

    pub fn phases(&self) -> &[f64] {
        &self.phases
    }

    /// Highest tabulated frequency.
    pub fn last_frequency(&self) -> f64 {
        self.frequencies[self.frequencies.len() - 1]
    }

    /// Append a row repeating the last amplitude and phase at `fhi` when
    /// `fhi` lies beyond the table.
    pub fn extend_to(&mut self, fhi: f64) {
        if fhi > self.last_frequency() {
            let n = self.len();
            let (amp, phase) = (self.amplitudes[n - 1], self.phases[n - 1]);
            self.frequencies.push(fhi);
            self.amplitudes.push(amp);
            self.phases.push(phase);
        }
    }

    /// Amplitude and phase at one frequency.
    pub fn evaluate(&self, frequency: f64) -> DspResult<AmpPhase> {
        let n = self.len();
        if n == 1 || frequency <= self.frequencies[0] {
            return Ok(AmpPhase::new(self.amplitudes[0], self.phases[0]));
        }
        if frequency >= self.frequencies[n - 1] {
            return Ok(AmpPhase::new(self.amplitudes[n - 1], self.phases[n - 1]));
        }

        // frequencies[j] <= frequency < frequencies[j + 1]
        let j = self.frequencies.partition_point(|&f| f <= frequency) - 1;
        let (f0, f1) = (self.frequencies[j], self.frequencies[j + 1]);
        let frac = (frequency - f0) / (f1 - f0);
        let phase = self.phases[j] + frac * (self.phases[j + 1] - self.phases[j]);

        let (a0, a1) = (self.amplitudes[j], self.amplitudes[j + 1]);
        let amp = if a0 <= 0.0 || a1 <= 0.0 {
            a0 + frac * (a1 - a0)
        } else {
            let mut range = if j < 2 || j + 4 > n { j..j + 2 } else { j - 1..j + 3 };
            if self.amplitudes[range.clone()].iter().any(|&a| a <= 0.0) {
                range = j..j + 2;
            }
            let log_f: Vec<f64> = self.frequencies[range.clone()].iter().map(|f| f.log10()).collect();
            let log_a: Vec<f64> = self.amplitudes[range].iter().map(|a| a.log10()).collect();
            10f64.powf(lagrange(&log_f, &log_a, frequency.log10()))
        };
        if !amp.is_finite() {
            return Err(DspError::InterpolationFailed(format!(
                "non-finite amplitude at {frequency} Hz"
            )));
        }

        Ok(AmpPhase::new(amp, phase))
    }

    /// Resample onto `frequencies`.
    pub fn resample(&self, frequencies: &[f64]) -> DspResult<Vec<AmpPhase>> {
        frequencies.iter().map(|&f| self.evaluate(f)).collect()
    }
}

/// Lagrange polynomial through `(xs[i], ys[i])` evaluated at `x`.
pub fn lagrange(xs: &[f64], ys: &[f64], x: f64) -> f64 {
    let mut sum = 0.0;
    for (i, (&xi, &yi)) in xs.iter().zip(ys).enumerate() {
        let mut weight = 1.0;
        for (k, &xk) in xs.iter().enumerate() {
            if k != i {
                weight *= (x - xk) / (xi - xk);
            }
        }
        sum += weight * yi;
    }
    sum
}
