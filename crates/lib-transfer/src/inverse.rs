//! Inverse (deconvolution) transfer functions.
//!
//! Each bin of the inverse is
//!
//! ```text
//! I(f) = taper(f) * T(f) / F(f)
//! ```
//!
//! where `F` is the forward ("from") response, `T` an optional second
//! ("to") response, and `taper` the two-sided cosine taper of the frequency
//! limits (1 everywhere without limits). Bins where `|F|^2` does not exceed
//! the smallest normal `f64` are set to zero.

use crate::error::FatalError;
use crate::transfer_data::TransferData;
use lib_dsp::taper::frequency_taper;
use lib_types::{Complex64, FreqLimits, Spectrum, Units};
use std::sync::Arc;

/// Spectrum by which a recorded spectrum is multiplied to remove the
/// instrument response.
#[derive(Clone, Debug, PartialEq)]
pub struct InverseTransferFunction {
    spectrum: Spectrum,
    nfft: usize,
    units: Units,
    requested_units: Units,
    forward: Arc<TransferData>,
}

impl InverseTransferFunction {
    pub fn spectrum(&self) -> &Spectrum {
        &self.spectrum
    }

    pub fn values(&self) -> &[Complex64] {
        &self.spectrum.values
    }

    pub fn frequencies(&self) -> Vec<f64> {
        self.spectrum.frequencies()
    }

    /// FFT length the bins were computed for.
    pub fn nfft(&self) -> usize {
        self.nfft
    }

    pub fn len(&self) -> usize {
        self.spectrum.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spectrum.is_empty()
    }

    /// Units of deconvolved data.
    pub fn units(&self) -> Units {
        self.units
    }

    /// Units the caller asked for.
    pub fn requested_units(&self) -> Units {
        self.requested_units
    }

    /// Forward response this inverse was built from.
    pub fn forward(&self) -> &TransferData {
        &self.forward
    }
}

/// Inputs of [`build_inverse`].
#[derive(Clone, Debug)]
pub struct InverseRequest<'a> {
    pub nsamp: usize,
    pub sample_rate: f64,
    pub limits: Option<&'a FreqLimits>,
    pub from: Arc<TransferData>,
    pub to: Option<&'a TransferData>,
    pub requested_units: Units,
}

/// FFT length for `nsamp` samples: the next power of two, at least 2.
pub fn fft_length(nsamp: usize) -> usize {
    nsamp.next_power_of_two().max(2)
}

/// Build the inverse of `request.from`, optionally composed with `request.to`.
pub fn build_inverse(request: InverseRequest<'_>) -> Result<InverseTransferFunction, FatalError> {
    let InverseRequest {
        nsamp,
        sample_rate,
        limits,
        from,
        to,
        requested_units,
    } = request;

    if nsamp == 0 || !(sample_rate > 0.0) {
        return Err(FatalError::config(format!(
            "cannot build an inverse for {nsamp} samples at {sample_rate} Hz"
        )));
    }
    let nfft = fft_length(nsamp);
    let nbins = nfft / 2 + 1;

    let forward = from.current();
    if forward.len() != nbins {
        return Err(FatalError::config(format!(
            "forward response has {} bins, expected {nbins} for nfft {nfft}",
            forward.len()
        )));
    }
    if let Some(to) = to {
        if to.len() != forward.len() {
            return Err(FatalError::config(format!(
                "from and to responses differ in length: {} vs {}",
                forward.len(),
                to.len()
            )));
        }
    }

    let delfreq = sample_rate / nfft as f64;
    let taper = frequency_taper(delfreq, nbins, limits);
    let target = to.map(|t| t.current());

    let mut zeroed = 0usize;
    let values: Vec<Complex64> = forward
        .values
        .iter()
        .zip(&taper)
        .enumerate()
        .map(|(i, (f, &weight))| {
            let denom = f.norm_sqr();
            if denom <= f64::MIN_POSITIVE {
                zeroed += 1;
                return Complex64::new(0.0, 0.0);
            }
            let mut inverse = f.conj() / denom * weight;
            if let Some(target) = target {
                inverse *= target.values[i];
            }
            inverse
        })
        .collect();

    let units = if to.is_some() {
        Units::Unspecified
    } else {
        from.units()
    };

    tracing::debug!(
        id = from.metadata().id,
        nfft,
        zeroed,
        tapered = limits.is_some(),
        composed = to.is_some(),
        units = %units,
        "built inverse transfer function"
    );

    Ok(InverseTransferFunction {
        spectrum: Spectrum::new(delfreq, values),
        nfft,
        units,
        requested_units,
        forward: from,
    })
}
