//! Cosine tapers.
//!
//! The frequency taper is the product of a low-side and a high-side raised
//! cosine ramp set by a [`FreqLimits`]:
//!
//! ```text
//! 0            f <  low_cut
//! ramp up      low_cut  <= f < low_pass
//! 1            low_pass <= f <= high_pass
//! ramp down    high_pass < f <= high_cut
//! 0            f >  high_cut
//! ```

use lib_types::FreqLimits;
use std::f64::consts::PI;

/// Taper weight at `frequency`.
pub fn cosine_taper_weight(frequency: f64, limits: &FreqLimits) -> f64 {
    low_side(frequency, limits.low_cut, limits.low_pass) * high_side(frequency, limits.high_pass, limits.high_cut)
}

fn low_side(f: f64, cut: f64, pass: f64) -> f64 {
    if f >= pass {
        1.0
    } else if f < cut {
        0.0
    } else {
        0.5 * (1.0 - (PI * (f - cut) / (pass - cut)).cos())
    }
}

fn high_side(f: f64, pass: f64, cut: f64) -> f64 {
    if f <= pass {
        1.0
    } else if f > cut {
        0.0
    } else {
        0.5 * (1.0 + (PI * (f - pass) / (cut - pass)).cos())
    }
}

/// Weights for `len` bins spaced `delfreq` apart from 0 Hz.
///
/// Without limits every weight is 1.
pub fn frequency_taper(delfreq: f64, len: usize, limits: Option<&FreqLimits>) -> Vec<f64> {
    match limits {
        Some(limits) => (0..len)
            .map(|i| cosine_taper_weight(i as f64 * delfreq, limits))
            .collect(),
        None => vec![1.0; len],
    }
}

/// Apply a half-cosine ramp to `fraction` of the samples at each end.
pub fn apply_time_taper(samples: &mut [f64], fraction: f64) {
    let n = samples.len();
    let width = ((fraction.clamp(0.0, 0.5)) * n as f64) as usize;
    if width < 2 {
        return;
    }
    for i in 0..width {
        let w = 0.5 * (1.0 - (PI * i as f64 / width as f64).cos());
        samples[i] *= w;
        samples[n - 1 - i] *= w;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> FreqLimits {
        FreqLimits::new(1.0, 2.0, 8.0, 10.0).unwrap()
    }

    #[test]
    fn test_taper_regions() {
        let l = limits();
        assert_eq!(cosine_taper_weight(0.5, &l), 0.0);
        assert_eq!(cosine_taper_weight(1.0, &l), 0.0);
        assert!((cosine_taper_weight(1.5, &l) - 0.5).abs() < 1e-12);
        assert_eq!(cosine_taper_weight(2.0, &l), 1.0);
        assert_eq!(cosine_taper_weight(5.0, &l), 1.0);
        assert_eq!(cosine_taper_weight(8.0, &l), 1.0);
        assert!((cosine_taper_weight(9.0, &l) - 0.5).abs() < 1e-12);
        assert!(cosine_taper_weight(10.0, &l).abs() < 1e-12);
        assert_eq!(cosine_taper_weight(12.0, &l), 0.0);
    }

    #[test]
    fn test_taper_is_monotonic_on_ramps() {
        let l = limits();
        let weights = frequency_taper(0.05, 200, Some(&l));
        for i in 20..40 {
            assert!(weights[i + 1] >= weights[i]);
        }
        for i in 160..199 {
            assert!(weights[i + 1] <= weights[i]);
        }
    }

    #[test]
    fn test_no_limits_is_identity() {
        assert_eq!(frequency_taper(0.1, 5, None), vec![1.0; 5]);
    }

    #[test]
    fn test_steep_edges() {
        let l = FreqLimits::new(2.0, 2.0, 4.0, 4.0).unwrap();
        assert_eq!(cosine_taper_weight(1.99, &l), 0.0);
        assert_eq!(cosine_taper_weight(2.0, &l), 1.0);
        assert_eq!(cosine_taper_weight(4.0, &l), 1.0);
        assert_eq!(cosine_taper_weight(4.01, &l), 0.0);
    }

    #[test]
    fn test_time_taper() {
        let mut samples = vec![1.0; 100];
        apply_time_taper(&mut samples, 0.1);
        assert_eq!(samples[0], 0.0);
        assert_eq!(samples[99], 0.0);
        assert!(samples[5] > 0.0 && samples[5] < 1.0);
        assert_eq!(samples[50], 1.0);
        assert!((samples[3] - samples[96]).abs() < 1e-15);
    }
}
