//! FIR stage response.
//!
//! Coefficients are zero-padded to an FFT of `next2(bins)` points and
//! transformed with [`radix2_fft`]. With a denominator the stage response is
//! `N / (1 - D)`. The first `bins` values cover 0 Hz up to the Nyquist of the
//! stage input rate; their phase is unwrapped outward from the flattest
//! point and the table is handed to [`FapTable`] for resampling.

use crate::error::{DspError, DspResult};
use crate::fft::{next2, radix2_fft, FftDirection};
use crate::interpolation::FapTable;
use crate::pole_zero::AmpPhase;
use lib_types::Complex64;
use std::f64::consts::PI;

/// Default number of tabulated bins, 0 Hz to Nyquist inclusive.
pub const FIR_TABLE_BINS: usize = 513;

/// Tabulated FIR response, one entry per bin including 0 Hz.
#[derive(Clone, Debug, PartialEq)]
pub struct FirResponse {
    pub frequencies: Vec<f64>,
    pub values: Vec<AmpPhase>,
}

impl FirResponse {
    /// Convert to a resampling table. The 0 Hz bin is dropped.
    pub fn into_table(self) -> DspResult<FapTable> {
        let (amplitudes, phases) = self.values.iter().map(|v| (v.amp, v.phase)).unzip();
        FapTable::new(self.frequencies, amplitudes, phases)
    }
}

fn coefficient_spectrum(coefficients: &[f64], nfft: usize) -> DspResult<Vec<Complex64>> {
    if coefficients.len() > nfft {
        return Err(DspError::InvalidConfig(format!(
            "{} FIR coefficients exceed FFT length {nfft}",
            coefficients.len()
        )));
    }
    let mut buffer = vec![Complex64::new(0.0, 0.0); nfft];
    for (slot, &c) in buffer.iter_mut().zip(coefficients) {
        *slot = Complex64::new(c, 0.0);
    }
    radix2_fft(&mut buffer, FftDirection::Forward)?;
    Ok(buffer)
}

/// Response of an FIR (or IIR, with `denominator`) stage.
pub fn fir_response(
    numerator: &[f64],
    denominator: &[f64],
    input_rate: f64,
    bins: usize,
) -> DspResult<FirResponse> {
    if !(input_rate > 0.0) || !input_rate.is_finite() {
        return Err(DspError::InvalidConfig(format!(
            "FIR input sample rate must be positive, got {input_rate}"
        )));
    }
    if bins < 2 {
        return Err(DspError::InsufficientData { needed: 2, got: bins });
    }
    let nfft = next2(bins);

    let num = coefficient_spectrum(numerator, nfft)?;
    let mut response: Vec<Complex64> = num[..bins].to_vec();

    if !denominator.is_empty() {
        let den = coefficient_spectrum(denominator, nfft)?;
        for (k, (value, d)) in response.iter_mut().zip(&den[..bins]).enumerate() {
            let divisor = Complex64::new(1.0, 0.0) - d;
            if divisor.norm_sqr() == 0.0 {
                return Err(DspError::DegenerateInput(format!(
                    "FIR denominator cancels at bin {k}"
                )));
            }
            *value /= divisor;
        }
    }

    let wrapped: Vec<f64> = response.iter().map(|c| c.arg()).collect();
    let phase = unwrap_phase(&wrapped);

    let step = input_rate / nfft as f64;
    let frequencies = (0..bins).map(|k| k as f64 * step).collect();
    let values = response
        .iter()
        .zip(phase)
        .map(|(c, p)| AmpPhase::new(c.norm(), p))
        .collect();

    tracing::trace!(
        numerator = numerator.len(),
        denominator = denominator.len(),
        nfft,
        "FIR stage evaluated"
    );

    Ok(FirResponse { frequencies, values })
}

/// Remove 2 pi jumps from a wrapped phase curve.
///
/// The anchor is the sample with the smallest adjacent difference (the
/// search threshold starts at 6). Walking outward from it, a difference
/// larger than pi whose sign flips against the previous corrected slope is
/// shifted by 2 pi.
pub fn unwrap_phase(wrapped: &[f64]) -> Vec<f64> {
    let n = wrapped.len();
    if n < 2 {
        return wrapped.to_vec();
    }

    let diffs: Vec<f64> = wrapped.windows(2).map(|w| w[1] - w[0]).collect();

    let mut threshold = (2.0 * PI) as i32 as f64;
    let mut anchor = 0;
    for (k, d) in diffs.iter().enumerate() {
        if d.abs() < threshold {
            threshold = d.abs();
            anchor = k;
        }
    }

    let correct = |d: f64, slope: f64| -> f64 {
        let flips = slope == 0.0 || d.signum() != slope.signum();
        if flips && d.abs() > PI {
            d - d.signum() * 2.0 * PI
        } else {
            d
        }
    };

    let mut unwrapped = wrapped.to_vec();

    let mut slope = diffs[anchor];
    for k in anchor + 1..n {
        let d = correct(diffs[k - 1], slope);
        unwrapped[k] = unwrapped[k - 1] + d;
        slope = d;
    }

    slope = diffs[anchor];
    for k in (0..anchor).rev() {
        let d = correct(diffs[k], slope);
        unwrapped[k] = unwrapped[k + 1] - d;
        slope = d;
    }

    unwrapped
}
