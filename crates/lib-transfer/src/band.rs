//! Pass-band estimation from an amplitude spectrum.
//!
//! The usable band runs from the first non-zero bin to the point where the
//! high-frequency roll-off ends: starting near the log-centre of the
//! spectrum, the walk flags the down-slope once the amplitude has moved by
//! more than half the full log range, and stops at the first bin after which
//! the amplitude rises again. The taper corners sit at 1%, 5%, 95% and 99%
//! of the log-frequency span of that band.

use crate::error::FatalError;
use crate::transfer_data::TransferData;
use lib_types::{FreqLimits, Spectrum};

const CORNER_FRACTIONS: [f64; 4] = [0.01, 0.05, 0.95, 0.99];

/// Estimate taper limits for `spectrum`, considering bins up to `nyquist`.
pub fn estimate_band(spectrum: &Spectrum, nyquist: f64) -> Result<FreqLimits, FatalError> {
    let amps = spectrum.amplitudes();
    let last = amps
        .iter()
        .enumerate()
        .take_while(|(i, _)| spectrum.frequency(*i) <= nyquist)
        .count()
        .saturating_sub(1);

    let first = (1..=last)
        .find(|&i| amps[i] > 0.0)
        .ok_or_else(|| FatalError::config("amplitude spectrum is zero below Nyquist"))?;

    let log_amp = |i: usize| amps[i].max(f64::MIN_POSITIVE).log10();
    let (min, max) = (first..=last)
        .map(log_amp)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    let range = max - min;
    if !(range > 0.0) {
        return Err(FatalError::config(format!(
            "amplitude spectrum has no dynamic range between bins {first} and {last}"
        )));
    }

    let f_first = spectrum.frequency(first);
    let mid = (f_first * spectrum.frequency(last)).sqrt();
    let seed = (first..=last)
        .min_by(|&a, &b| {
            (spectrum.frequency(a) - mid)
                .abs()
                .total_cmp(&(spectrum.frequency(b) - mid).abs())
        })
        .unwrap_or(first);

    let mut cutoff = last;
    let mut running = (log_amp(seed), log_amp(seed));
    let mut down_slope = false;
    for i in seed + 1..=last {
        let value = log_amp(i);
        if down_slope && value > log_amp(i - 1) {
            cutoff = i - 1;
            break;
        }
        running = (running.0.min(value), running.1.max(value));
        if running.1 - running.0 > range / 2.0 {
            down_slope = true;
        }
    }

    let f_cut = spectrum.frequency(cutoff);
    if !(f_cut > f_first) {
        return Err(FatalError::config(format!(
            "no usable band: cutoff {f_cut} Hz is not above {f_first} Hz"
        )));
    }

    let (lo, hi) = (f_first.log10(), f_cut.log10());
    let [a, b, c, d] = CORNER_FRACTIONS.map(|p| 10f64.powf(lo + p * (hi - lo)));
    tracing::debug!(first = f_first, cutoff = f_cut, down_slope, "estimated pass band");
    FreqLimits::new(a, b, c, d).map_err(|e| FatalError::config(e.to_string()))
}

/// Band of a forward response's current spectrum.
pub fn estimate_response_band(data: &TransferData, nyquist: f64) -> Result<FreqLimits, FatalError> {
    estimate_band(data.current(), nyquist)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lib_types::Complex64;

    fn spectrum(log_amps: impl Fn(usize) -> f64, len: usize) -> Spectrum {
        let values = (0..len)
            .map(|i| Complex64::new(10f64.powf(log_amps(i)), 0.0))
            .collect();
        Spectrum::new(1.0, values)
    }

    fn notch(i: usize) -> f64 {
        match i {
            0..=39 => 0.0,
            40..=49 => -0.5 * (i - 40) as f64,
            _ => -4.5 + 0.1 * (i - 49) as f64,
        }
    }

    #[test]
    fn test_cutoff_before_rise() {
        let limits = estimate_band(&spectrum(notch, 65), 64.0).unwrap();
        let [low_cut, low_pass, high_pass, high_cut] = limits.as_array();
        let span = 49f64.log10();
        assert!((low_cut - 10f64.powf(0.01 * span)).abs() < 1e-9);
        assert!((low_pass - 10f64.powf(0.05 * span)).abs() < 1e-9);
        assert!((high_pass - 10f64.powf(0.95 * span)).abs() < 1e-9);
        assert!((high_cut - 10f64.powf(0.99 * span)).abs() < 1e-9);
        assert!(high_cut < 49.0);
    }

    #[test]
    fn test_monotonic_rolloff_runs_to_nyquist() {
        let limits = estimate_band(&spectrum(|i| -0.05 * i as f64, 33), 32.0).unwrap();
        assert!((limits.high_cut - 10f64.powf(0.99 * 32f64.log10())).abs() < 1e-9);
    }

    #[test]
    fn test_nyquist_limits_the_search() {
        let limits = estimate_band(&spectrum(|i| -0.05 * i as f64, 33), 16.0).unwrap();
        assert!(limits.high_cut < 16.0);
    }

    #[test]
    fn test_degenerate_inputs() {
        let zeros = Spectrum::new(1.0, vec![Complex64::new(0.0, 0.0); 16]);
        assert!(matches!(estimate_band(&zeros, 8.0), Err(FatalError::Config(_))));

        let flat = Spectrum::new(1.0, vec![Complex64::new(3.0, 0.0); 16]);
        assert!(matches!(estimate_band(&flat, 8.0), Err(FatalError::Config(_))));
    }
}
