//! Stage cascade.
//!
//! The response of a chain of stages is the product of the stage amplitudes
//! and the sum of the stage phases at each frequency. Table-based stages
//! (`fap` and FIR) are resampled onto the requested frequencies, extending
//! the table by one point when the request runs past its last frequency.

use crate::error::{NdcError, ParseError};
use crate::stage::{parse_stage_file, parse_stages, Stage, StageRecord};
use lib_dsp::fir::{fir_response, FIR_TABLE_BINS};
use lib_dsp::pole_zero::paz_response;
use lib_dsp::{AmpPhase, DspResult, FapTable};
use lib_types::Complex64;
use std::path::Path;

impl Stage {
    /// Response of this stage alone at `frequencies`.
    pub fn response(&self, frequencies: &[f64], fir_bins: usize) -> DspResult<Vec<AmpPhase>> {
        let fhi = frequencies.iter().copied().fold(0.0, f64::max);
        match self {
            Stage::Paz { norm, poles, zeros } => Ok(paz_response(*norm, poles, zeros, frequencies)),
            Stage::Fap {
                frequencies: table_freqs,
                amplitudes,
                phases,
            } => {
                let mut table = FapTable::new(table_freqs.clone(), amplitudes.clone(), phases.clone())?;
                table.extend_to(fhi);
                table.resample(frequencies)
            }
            Stage::Fir {
                input_rate,
                numerator,
                denominator,
            } => {
                let mut table = fir_response(numerator, denominator, *input_rate, fir_bins)?.into_table()?;
                table.extend_to(fhi);
                table.resample(frequencies)
            }
        }
    }
}

/// An ordered list of stages evaluated as one response.
#[derive(Clone, Debug, PartialEq)]
pub struct Cascade {
    stages: Vec<StageRecord>,
    fir_bins: usize,
}

impl Cascade {
    pub fn new(stages: Vec<StageRecord>) -> Result<Self, ParseError> {
        if stages.is_empty() {
            return Err(ParseError::NoStages);
        }
        Ok(Self {
            stages,
            fir_bins: FIR_TABLE_BINS,
        })
    }

    pub fn from_text(text: &str) -> Result<Self, ParseError> {
        Self::new(parse_stages(text)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ParseError> {
        Self::new(parse_stage_file(path)?)
    }

    /// Number of tabulated bins used for FIR stages.
    pub fn with_fir_bins(mut self, bins: usize) -> Self {
        self.fir_bins = bins;
        self
    }

    pub fn stages(&self) -> &[StageRecord] {
        &self.stages
    }

    /// Combined amplitude and phase at `frequencies`.
    ///
    /// Any failing stage aborts the whole evaluation.
    pub fn evaluate(&self, frequencies: &[f64]) -> Result<Vec<AmpPhase>, NdcError> {
        let mut total = vec![AmpPhase::UNITY; frequencies.len()];

        for (index, record) in self.stages.iter().enumerate() {
            let response = record
                .stage
                .response(frequencies, self.fir_bins)
                .map_err(|source| NdcError::Stage {
                    index,
                    kind: record.stage.kind(),
                    line: record.line,
                    source,
                })?;
            for (acc, stage) in total.iter_mut().zip(response) {
                *acc = acc.cascade(stage);
            }
        }

        tracing::debug!(
            stages = self.stages.len(),
            bins = frequencies.len(),
            "evaluated stage cascade"
        );
        Ok(total)
    }

    /// Combined response as complex values.
    pub fn evaluate_complex(&self, frequencies: &[f64]) -> Result<Vec<Complex64>, NdcError> {
        Ok(self.evaluate(frequencies)?.iter().map(AmpPhase::to_complex).collect())
    }
}
