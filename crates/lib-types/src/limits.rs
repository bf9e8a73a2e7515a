//! Frequency limits of a two-sided cosine taper.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fraction of Nyquist at which the high-frequency taper starts.
pub const DEFAULT_HIGH_PASS_FRACTION: f64 = 0.8;

/// Fraction of Nyquist at which the high-frequency taper reaches zero.
pub const DEFAULT_HIGH_CUT_FRACTION: f64 = 0.9;

/// Invalid frequency limits.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LimitsError {
    #[error("Frequency limits must satisfy low-cut <= low-pass <= high-pass <= high-cut, got {0:?}")]
    NotMonotonic([f64; 4]),

    #[error("Frequency limits must be finite and non-negative, got {0:?}")]
    NotFinite([f64; 4]),

    #[error("Cannot derive limits: {0}")]
    Degenerate(String),
}

/// Four increasing corner frequencies (Hz) of a band-pass cosine taper.
///
/// The taper is zero below `low_cut`, ramps up to one at `low_pass`, stays
/// at one through `high_pass` and ramps back to zero at `high_cut`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FreqLimits {
    pub low_cut: f64,
    pub low_pass: f64,
    pub high_pass: f64,
    pub high_cut: f64,
}

impl FreqLimits {
    pub fn new(low_cut: f64, low_pass: f64, high_pass: f64, high_cut: f64) -> Result<Self, LimitsError> {
        let corners = [low_cut, low_pass, high_pass, high_cut];
        if corners.iter().any(|f| !f.is_finite() || *f < 0.0) {
            return Err(LimitsError::NotFinite(corners));
        }
        if !(low_cut <= low_pass && low_pass <= high_pass && high_pass <= high_cut) {
            return Err(LimitsError::NotMonotonic(corners));
        }
        Ok(Self {
            low_cut,
            low_pass,
            high_pass,
            high_cut,
        })
    }

    /// Limits from the data Nyquist and analysis window length: the low
    /// corners sit at one and two cycles per window, the high corners at
    /// fixed fractions of Nyquist.
    pub fn from_window(nyquist: f64, window_seconds: f64) -> Result<Self, LimitsError> {
        if !(nyquist > 0.0) || !(window_seconds > 0.0) {
            return Err(LimitsError::Degenerate(format!(
                "nyquist={nyquist}, window={window_seconds}s"
            )));
        }
        let low_cut = 1.0 / window_seconds;
        let low_pass = 2.0 / window_seconds;
        let high_pass = DEFAULT_HIGH_PASS_FRACTION * nyquist;
        let high_cut = DEFAULT_HIGH_CUT_FRACTION * nyquist;
        if low_pass > high_pass {
            return Err(LimitsError::Degenerate(format!(
                "window of {window_seconds}s is too short for nyquist {nyquist} Hz"
            )));
        }
        Self::new(low_cut, low_pass, high_pass, high_cut)
    }

    /// True when `[low, high]` lies inside the flat part of the taper.
    pub fn contains(&self, low: f64, high: f64) -> bool {
        low >= self.low_pass && high <= self.high_pass
    }

    /// Split the pass band into `n` log-spaced narrow bands.
    ///
    /// Each band keeps the taper steepness of `self`: its corners are scaled
    /// by the same ratios `low_cut / low_pass` and `high_cut / high_pass`.
    pub fn log_subdivide(&self, n: usize) -> Result<Vec<FreqLimits>, LimitsError> {
        if n == 0 || !(self.low_pass > 0.0) {
            return Err(LimitsError::Degenerate(format!(
                "cannot split pass band [{}, {}] into {n} log bands",
                self.low_pass, self.high_pass
            )));
        }
        let lo = self.low_pass.log10();
        let step = (self.high_pass.log10() - lo) / n as f64;
        let low_ratio = self.low_cut / self.low_pass;
        let high_ratio = if self.high_pass > 0.0 { self.high_cut / self.high_pass } else { 1.0 };

        (0..n)
            .map(|i| {
                let pass_lo = 10f64.powf(lo + step * i as f64);
                let pass_hi = 10f64.powf(lo + step * (i + 1) as f64);
                FreqLimits::new(pass_lo * low_ratio, pass_lo, pass_hi, pass_hi * high_ratio)
            })
            .collect()
    }

    pub fn as_array(&self) -> [f64; 4] {
        [self.low_cut, self.low_pass, self.high_pass, self.high_cut]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monotonic_validation() {
        assert!(FreqLimits::new(0.01, 0.02, 8.0, 9.0).is_ok());
        assert!(matches!(
            FreqLimits::new(0.03, 0.02, 8.0, 9.0),
            Err(LimitsError::NotMonotonic(_))
        ));
        assert!(matches!(
            FreqLimits::new(f64::NAN, 0.02, 8.0, 9.0),
            Err(LimitsError::NotFinite(_))
        ));
    }

    #[test]
    fn test_contains() {
        let limits = FreqLimits::new(0.5, 1.0, 4.0, 5.0).unwrap();
        assert!(limits.contains(1.0, 4.0));
        assert!(limits.contains(2.0, 3.0));
        assert!(!limits.contains(0.7, 3.0));
        assert!(!limits.contains(2.0, 4.5));
    }

    #[test]
    fn test_from_window() {
        let limits = FreqLimits::from_window(20.0, 100.0).unwrap();
        assert!((limits.low_cut - 0.01).abs() < 1e-12);
        assert!((limits.low_pass - 0.02).abs() < 1e-12);
        assert!((limits.high_pass - 16.0).abs() < 1e-12);
        assert!((limits.high_cut - 18.0).abs() < 1e-12);

        assert!(FreqLimits::from_window(1.0, 1.0).is_err());
    }

    #[test]
    fn test_log_subdivide() {
        let limits = FreqLimits::new(0.05, 0.1, 10.0, 12.0).unwrap();
        let bands = limits.log_subdivide(4).unwrap();
        assert_eq!(bands.len(), 4);
        assert!((bands[0].low_pass - 0.1).abs() < 1e-12);
        assert!((bands[3].high_pass - 10.0).abs() < 1e-9);
        // log-spaced: equal ratios
        let r0 = bands[0].high_pass / bands[0].low_pass;
        let r3 = bands[3].high_pass / bands[3].low_pass;
        assert!((r0 - r3).abs() < 1e-9);
        for pair in bands.windows(2) {
            assert!((pair[0].high_pass - pair[1].low_pass).abs() < 1e-9);
        }
        assert!((bands[1].low_cut / bands[1].low_pass - 0.5).abs() < 1e-12);
    }
}
