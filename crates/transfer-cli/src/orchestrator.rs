//! Request orchestration.

use crate::config::{RequestConfig, TaperMode};
use anyhow::{Context, Result};
use lib_dsp::FftEngine;
use lib_transfer::{
    estimate_response_band, remove_response, ComputationContext, Dispatcher, ForwardRequest,
    InverseOptions, InverseTransferFunction, TransferData,
};
use lib_types::{FreqLimits, Waveform};

/// Runs the operations of one request against a dispatcher.
pub struct Orchestrator {
    config: RequestConfig,
    dispatcher: Dispatcher,
}

impl Orchestrator {
    /// Create a new orchestrator.
    pub fn new(config: RequestConfig) -> Result<Self> {
        let context = ComputationContext::new(config.match_policy, config.tuning.clone());
        let dispatcher = Dispatcher::new(context).context("Failed to set up dispatcher")?;
        Ok(Self { config, dispatcher })
    }

    pub fn config(&self) -> &RequestConfig {
        &self.config
    }

    fn request(&self) -> ForwardRequest<'_> {
        let recording = &self.config.recording;
        ForwardRequest::new(
            recording.nsamp,
            recording.sample_rate,
            recording.epoch(),
            &self.config.channel,
            &self.config.response,
        )
    }

    /// Forward transfer function, converted to the inverse units when set.
    pub fn forward(&self) -> Result<TransferData> {
        tracing::info!("Computing forward response {}", self.config.response.id);
        let data = self.dispatcher.compute_forward(&self.request())?;
        tracing::info!(
            "Forward response: {} bins, units {}, normalization {:?}",
            data.len(),
            data.units(),
            data.normalization()
        );
        Ok(data)
    }

    /// Taper limits selected by the request.
    pub fn limits(&self) -> Result<Option<FreqLimits>> {
        let recording = &self.config.recording;
        let limits = match self.config.inverse.taper {
            TaperMode::None => None,
            TaperMode::Explicit => self.config.inverse.explicit_limits()?,
            TaperMode::Window => Some(
                FreqLimits::from_window(recording.nyquist(), recording.window_seconds())
                    .context("Recording window too short for window-based taper")?,
            ),
            TaperMode::Estimated => Some(self.estimate_band()?),
        };
        if let Some(limits) = &limits {
            tracing::debug!("Taper limits: {:?}", limits.as_array());
        }
        Ok(limits)
    }

    /// Band estimated from the forward amplitude spectrum.
    pub fn estimate_band(&self) -> Result<FreqLimits> {
        let forward = self.forward()?;
        let limits = estimate_response_band(&forward, self.config.recording.nyquist())?;
        Ok(limits)
    }

    /// Inverse transfer function.
    pub fn inverse(&self) -> Result<InverseTransferFunction> {
        let inverse_config = &self.config.inverse;
        let options = InverseOptions {
            limits: self.limits()?,
            requested_units: inverse_config.units,
            forced_input_units: inverse_config.forced_input_units,
            to: inverse_config.target.as_ref(),
        };
        tracing::info!("Computing inverse response {}", self.config.response.id);
        let inverse = self.dispatcher.compute_inverse(&self.request(), &options)?;
        if inverse.units() != inverse.requested_units() {
            tracing::warn!(
                "Inverse is in {} instead of the requested {}",
                inverse.units(),
                inverse.requested_units()
            );
        }
        Ok(inverse)
    }

    /// Remove the instrument response from `waveform`.
    pub fn remove(&self, waveform: &Waveform) -> Result<Waveform> {
        if waveform.len() != self.config.recording.nsamp {
            anyhow::bail!(
                "Waveform has {} samples, request declares {}",
                waveform.len(),
                self.config.recording.nsamp
            );
        }
        let inverse = self.inverse()?;
        let mut engine = FftEngine::new();
        let ground = remove_response(
            waveform,
            &inverse,
            &mut engine,
            self.config.tuning.time_taper_fraction,
        )?;
        Ok(ground)
    }

    /// Cache counters of the dispatcher.
    pub fn diagnostics(&self) -> String {
        self.dispatcher.cache().diagnostics()
    }
}
