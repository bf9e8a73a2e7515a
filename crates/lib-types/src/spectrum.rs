//! Uniformly binned complex spectra.
//!
//! Bin `i` sits at frequency `i * delfreq`, starting from 0 Hz. For a
//! transfer function computed for `nfft` samples at interval `dt`,
//! `delfreq = 1 / (nfft * dt)` and there are `nfft / 2 + 1` bins up to
//! Nyquist.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::io::{self, Write};

/// Complex spectrum on a uniform frequency grid.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Spectrum {
    /// Bin spacing in Hz.
    pub delfreq: f64,

    /// One value per bin.
    pub values: Vec<Complex64>,
}

impl Spectrum {
    pub fn new(delfreq: f64, values: Vec<Complex64>) -> Self {
        Self { delfreq, values }
    }

    /// A spectrum of `len` bins all equal to `value`.
    pub fn filled(delfreq: f64, len: usize, value: Complex64) -> Self {
        Self {
            delfreq,
            values: vec![value; len],
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[inline]
    pub fn frequency(&self, index: usize) -> f64 {
        index as f64 * self.delfreq
    }

    pub fn frequencies(&self) -> Vec<f64> {
        (0..self.values.len()).map(|i| self.frequency(i)).collect()
    }

    /// Highest bin frequency.
    pub fn max_frequency(&self) -> f64 {
        self.frequency(self.values.len().saturating_sub(1))
    }

    pub fn amplitudes(&self) -> Vec<f64> {
        self.values.iter().map(|c| c.norm()).collect()
    }

    pub fn phases(&self) -> Vec<f64> {
        self.values.iter().map(|c| c.arg()).collect()
    }

    /// Amplitude at an arbitrary frequency by linear interpolation between
    /// the bracketing bins. Returns `None` outside the grid.
    pub fn amplitude_at(&self, frequency: f64) -> Option<f64> {
        if self.values.is_empty() || !(self.delfreq > 0.0) || frequency < 0.0 {
            return None;
        }
        let position = frequency / self.delfreq;
        let lower = position.floor() as usize;
        let last = self.values.len() - 1;
        if lower > last {
            return None;
        }
        if lower == last {
            return (position - lower as f64 <= f64::EPSILON * position.max(1.0))
                .then(|| self.values[last].norm());
        }
        let frac = position - lower as f64;
        let a0 = self.values[lower].norm();
        let a1 = self.values[lower + 1].norm();
        Some(a0 + frac * (a1 - a0))
    }

    /// Multiply every bin by a real factor.
    pub fn scale(&mut self, factor: f64) {
        for value in self.values.iter_mut() {
            *value *= factor;
        }
    }

    /// Write `frequency  amplitude` line pairs, one per bin.
    pub fn write_amplitude_text<W: Write>(&self, mut writer: W) -> io::Result<()> {
        for (i, value) in self.values.iter().enumerate() {
            writeln!(writer, "{:.6e}  {:.6e}", self.frequency(i), value.norm())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amplitude_at_interpolates() {
        let spectrum = Spectrum::new(
            0.5,
            vec![
                Complex64::new(0.0, 0.0),
                Complex64::new(0.0, 2.0),
                Complex64::new(4.0, 0.0),
            ],
        );
        assert!((spectrum.amplitude_at(0.25).unwrap() - 1.0).abs() < 1e-12);
        assert!((spectrum.amplitude_at(0.75).unwrap() - 3.0).abs() < 1e-12);
        assert!((spectrum.amplitude_at(1.0).unwrap() - 4.0).abs() < 1e-12);
        assert!(spectrum.amplitude_at(1.5).is_none());
        assert!(spectrum.amplitude_at(-0.1).is_none());
    }

    #[test]
    fn test_text_export() {
        let spectrum = Spectrum::filled(1.0, 2, Complex64::new(3.0, 4.0));
        let mut out = Vec::new();
        spectrum.write_amplitude_text(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let fields: Vec<f64> = lines[1].split_whitespace().map(|t| t.parse().unwrap()).collect();
        assert_eq!(fields, vec![1.0, 5.0]);
    }
}
