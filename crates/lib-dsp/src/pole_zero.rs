//! Pole-zero response evaluation.
//!
//! Two flavours are provided. [`paz_response`] returns separate amplitude and
//! phase per frequency, the form consumed by the stage cascade, where stage
//! contributions are multiplied in amplitude and summed in phase.
//! [`evaluate_pole_zero`] returns the complex value `scale * prod(s - z) /
//! prod(s - p)` with `s = 2 pi i f`.

use lib_types::{Complex64, PoleZeroData};
use std::f64::consts::PI;

/// Amplitude and phase (radians) of a response at one frequency.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AmpPhase {
    pub amp: f64,
    pub phase: f64,
}

impl AmpPhase {
    pub const UNITY: AmpPhase = AmpPhase { amp: 1.0, phase: 0.0 };

    pub fn new(amp: f64, phase: f64) -> Self {
        Self { amp, phase }
    }

    pub fn from_complex(value: Complex64) -> Self {
        Self {
            amp: value.norm(),
            phase: value.arg(),
        }
    }

    pub fn to_complex(&self) -> Complex64 {
        Complex64::from_polar(self.amp, self.phase)
    }

    /// Series combination of two stages.
    #[inline]
    pub fn cascade(self, other: AmpPhase) -> AmpPhase {
        AmpPhase {
            amp: self.amp * other.amp,
            phase: self.phase + other.phase,
        }
    }
}

impl Default for AmpPhase {
    fn default() -> Self {
        Self::UNITY
    }
}

/// `nfr` frequencies from `flo` to `fhi` inclusive.
///
/// A single-point grid uses a unit step, which is never applied.
pub fn frequency_grid(flo: f64, fhi: f64, nfr: usize) -> Vec<f64> {
    let step = if nfr > 1 {
        (fhi - flo) / (nfr - 1) as f64
    } else {
        1.0
    };
    (0..nfr).map(|i| flo + i as f64 * step).collect()
}

/// Amplitude and phase of `norm * prod(jw - z) / prod(jw - p)`.
///
/// A pole sitting exactly on the evaluation point contributes nothing
/// instead of dividing by zero.
pub fn paz_response(
    norm: f64,
    poles: &[Complex64],
    zeros: &[Complex64],
    frequencies: &[f64],
) -> Vec<AmpPhase> {
    frequencies
        .iter()
        .map(|&f| {
            let jw = Complex64::new(0.0, 2.0 * PI * f);
            let mut amp = norm;
            let mut phase = 0.0;

            for z in zeros {
                let d = jw - z;
                amp *= d.norm();
                phase += d.arg();
            }
            for p in poles {
                let d = jw - p;
                let mag = d.norm();
                if mag == 0.0 {
                    continue;
                }
                amp /= mag;
                phase -= d.arg();
            }

            AmpPhase { amp, phase }
        })
        .collect()
}

/// Complex response of SAC-convention pole-zero data at each frequency.
pub fn evaluate_pole_zero(data: &PoleZeroData, frequencies: &[f64]) -> Vec<Complex64> {
    frequencies
        .iter()
        .map(|&f| {
            let s = Complex64::new(0.0, 2.0 * PI * f);
            let numerator: Complex64 = data.zeros.iter().map(|z| s - z).product();
            let denominator: Complex64 = data.poles.iter().map(|p| s - p).product();
            if denominator.norm_sqr() == 0.0 {
                return Complex64::new(0.0, 0.0);
            }
            numerator / denominator * data.scale
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sts2_poles() -> Vec<Complex64> {
        vec![
            Complex64::new(-0.037004, 0.037016),
            Complex64::new(-0.037004, -0.037016),
            Complex64::new(-251.33, 0.0),
            Complex64::new(-131.04, -467.29),
            Complex64::new(-131.04, 467.29),
        ]
    }

    #[test]
    fn test_frequency_grid() {
        let grid = frequency_grid(0.0, 10.0, 11);
        assert_eq!(grid.len(), 11);
        assert!((grid[10] - 10.0).abs() < 1e-12);

        let single = frequency_grid(2.5, 2.5, 1);
        assert_eq!(single, vec![2.5]);
    }

    #[test]
    fn test_cancelling_roots_are_flat() {
        let roots = sts2_poles();
        let grid = frequency_grid(0.0, 50.0, 64);
        for ap in paz_response(3.5, &roots, &roots, &grid) {
            assert!((ap.amp - 3.5).abs() < 1e-9, "amp {}", ap.amp);
            assert!(ap.phase.abs() < 1e-12, "phase {}", ap.phase);
        }
    }

    #[test]
    fn test_single_pole_corner() {
        // 1 / (jw + w0) at w = w0: amplitude 1 / (sqrt(2) w0), phase -pi/4
        let f0 = 1.0;
        let w0 = 2.0 * PI * f0;
        let response = paz_response(1.0, &[Complex64::new(-w0, 0.0)], &[], &[f0]);
        assert!((response[0].amp - 1.0 / (2f64.sqrt() * w0)).abs() < 1e-12);
        assert!((response[0].phase + PI / 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_pole_at_evaluation_point_is_skipped() {
        let response = paz_response(2.0, &[Complex64::new(0.0, 0.0)], &[], &[0.0]);
        assert_eq!(response[0], AmpPhase::new(2.0, 0.0));
    }

    #[test]
    fn test_complex_matches_amp_phase() {
        let zeros = vec![Complex64::new(0.0, 0.0), Complex64::new(0.0, 0.0)];
        let poles = sts2_poles();
        let data = PoleZeroData::new(6.0e7, poles.clone(), zeros.clone());
        let grid = frequency_grid(0.01, 20.0, 32);

        let complex = evaluate_pole_zero(&data, &grid);
        let split = paz_response(6.0e7, &poles, &zeros, &grid);
        for (c, ap) in complex.iter().zip(split.iter()) {
            let rebuilt = ap.to_complex();
            assert!((c - rebuilt).norm() <= 1e-9 * c.norm().max(1.0));
        }
    }

    #[test]
    fn test_cascade() {
        let a = AmpPhase::new(2.0, 0.5);
        let b = AmpPhase::new(3.0, -0.25);
        assert_eq!(a.cascade(b), AmpPhase::new(6.0, 0.25));
        assert_eq!(a.cascade(AmpPhase::UNITY), a);
    }
}
