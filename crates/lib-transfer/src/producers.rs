//! Forward-response producers.
//!
//! The response type of a metadata row selects one of three producer
//! families. Each produces the complex response on the one-sided bin grid
//! of an FFT of length `nfft`, plus the units that response maps from.

use crate::error::FatalError;
use lib_dsp::pole_zero::evaluate_pole_zero;
use lib_ndc::Cascade;
use lib_types::{Complex64, ProducerFamily, ResponseMetadata, ResponseSource, Spectrum, Units};
use std::sync::Arc;

/// Evaluator for self-describing full responses.
///
/// Implementations return one complex value per requested frequency and the
/// ground-motion units of the response input.
pub trait FullResponseEvaluator: Send + Sync {
    fn evaluate(
        &self,
        metadata: &ResponseMetadata,
        frequencies: &[f64],
    ) -> Result<(Vec<Complex64>, Units), FatalError>;
}

/// Forward response as produced, before calibration.
#[derive(Clone, Debug, PartialEq)]
pub struct Produced {
    pub spectrum: Spectrum,
    pub units: Units,
}

/// Bin frequencies of a one-sided spectrum of an `nfft` transform.
pub fn bin_frequencies(nfft: usize, sample_rate: f64) -> (f64, Vec<f64>) {
    let delfreq = sample_rate / nfft as f64;
    let freqs = (0..nfft / 2 + 1).map(|i| i as f64 * delfreq).collect();
    (delfreq, freqs)
}

/// Produce the forward response of `metadata` for an `nfft` transform.
pub fn produce(
    metadata: &ResponseMetadata,
    nfft: usize,
    sample_rate: f64,
    fir_bins: usize,
    evaluator: Option<&Arc<dyn FullResponseEvaluator>>,
) -> Result<Produced, FatalError> {
    let family = metadata
        .response_type
        .family()
        .ok_or_else(|| FatalError::UnsupportedResponseType(metadata.response_type.to_string()))?;
    let (delfreq, freqs) = bin_frequencies(nfft, sample_rate);

    tracing::debug!(
        id = metadata.id,
        response_type = %metadata.response_type,
        ?family,
        nfft,
        sample_rate,
        "producing forward response"
    );

    let (values, units) = match family {
        ProducerFamily::Cascade => {
            let cascade = match &metadata.source {
                ResponseSource::NdcFile { path } => Cascade::from_file(path)?,
                ResponseSource::NdcText { text } => Cascade::from_text(text)?,
                other => {
                    return Err(FatalError::config(format!(
                        "{} response {} needs NDC stage text, got {other:?}",
                        metadata.response_type, metadata.id
                    )))
                }
            };
            let values = cascade.with_fir_bins(fir_bins).evaluate_complex(&freqs)?;
            (values, metadata.input_units)
        }
        ProducerFamily::SacPoleZero => match &metadata.source {
            // SAC pole-zero files map displacement in metres
            ResponseSource::PoleZero { data } => (evaluate_pole_zero(data, &freqs), Units::Meters),
            other => {
                return Err(FatalError::config(format!(
                    "{} response {} needs pole-zero data, got {other:?}",
                    metadata.response_type, metadata.id
                )))
            }
        },
        ProducerFamily::FullResponse => {
            let evaluator = evaluator
                .ok_or_else(|| FatalError::MissingEvaluator(metadata.response_type.to_string()))?;
            let (values, units) = evaluator.evaluate(metadata, &freqs)?;
            if values.len() != freqs.len() {
                return Err(FatalError::config(format!(
                    "evaluator returned {} values for {} frequencies",
                    values.len(),
                    freqs.len()
                )));
            }
            (values, units)
        }
    };

    Ok(Produced {
        spectrum: Spectrum::new(delfreq, values),
        units,
    })
}
