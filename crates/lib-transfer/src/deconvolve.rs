//! Instrument-response removal from recorded waveforms.

use crate::error::FatalError;
use crate::inverse::{fft_length, InverseTransferFunction};
use lib_dsp::taper::apply_time_taper;
use lib_dsp::FftEngine;
use lib_types::Waveform;
use rayon::prelude::*;

/// Relative sample-rate mismatch tolerated between a waveform and the
/// inverse it is deconvolved with.
const RATE_TOLERANCE: f64 = 1e-3;

/// Multiply the spectrum of `waveform` by `inverse`.
///
/// The trace is demeaned, tapered over `taper_fraction` of its length at
/// each end and zero-padded to the inverse's FFT length. The result keeps
/// the original length and start time and carries the inverse's units.
pub fn remove_response(
    waveform: &Waveform,
    inverse: &InverseTransferFunction,
    engine: &mut FftEngine,
    taper_fraction: f64,
) -> Result<Waveform, FatalError> {
    let nsamp = waveform.len();
    let nfft = inverse.nfft();
    if nsamp == 0 || fft_length(nsamp) != nfft {
        return Err(FatalError::config(format!(
            "waveform of {nsamp} samples does not match inverse of FFT length {nfft}"
        )));
    }
    let inverse_rate = inverse.spectrum().delfreq * nfft as f64;
    if ((inverse_rate - waveform.sample_rate) / waveform.sample_rate).abs() > RATE_TOLERANCE {
        return Err(FatalError::config(format!(
            "waveform sampled at {} Hz, inverse built for {inverse_rate} Hz",
            waveform.sample_rate
        )));
    }

    let mut trace = waveform.clone();
    trace.demean();
    apply_time_taper(&mut trace.samples, taper_fraction);
    trace.samples.resize(nfft, 0.0);

    let mut spectrum = engine.rfft(&trace.samples)?;
    for (bin, factor) in spectrum.iter_mut().zip(inverse.values()) {
        *bin *= factor;
    }
    let mut samples = engine.irfft(&spectrum, nfft)?;
    samples.truncate(nsamp);

    tracing::debug!(
        id = inverse.forward().metadata().id,
        nsamp,
        nfft,
        units = %inverse.units(),
        "removed instrument response"
    );
    Ok(Waveform::new(samples, waveform.sample_rate, waveform.start, inverse.units()))
}

/// [`remove_response`] over many waveforms in parallel.
pub fn remove_response_batch(
    waveforms: &[Waveform],
    inverse: &InverseTransferFunction,
    taper_fraction: f64,
) -> Result<Vec<Waveform>, FatalError> {
    waveforms
        .par_iter()
        .map_init(FftEngine::new, |engine, waveform| {
            remove_response(waveform, inverse, engine, taper_fraction)
        })
        .collect()
}
