//! Response dispatcher.
//!
//! Entry point for forward and inverse transfer functions. Every request is
//! keyed on its FFT size, standardized sample rate, channel identity and
//! metadata, and answered from the cache when an entry valid at the request
//! time exists. Misses are produced, calibrated, converted and inverted, then
//! cached. Two racing requests for the same key may both compute; the last
//! insert wins.

use crate::cache::TransferCache;
use crate::config::TuningParams;
use crate::error::{FatalError, TransferError};
use crate::inverse::{build_inverse, fft_length, InverseRequest, InverseTransferFunction};
use crate::keys::{FromKey, ToKey};
use crate::producers::{produce, FullResponseEvaluator};
use crate::transfer_data::TransferData;
use lib_types::{ChannelIdentity, ChannelMatchPolicy, Epoch, FreqLimits, ResponseMetadata, Units};
use std::sync::Arc;

/// Everything a dispatcher shares across requests.
#[derive(Clone)]
pub struct ComputationContext {
    pub match_policy: ChannelMatchPolicy,
    pub cache: Arc<TransferCache>,
    pub tuning: TuningParams,
    pub evaluator: Option<Arc<dyn FullResponseEvaluator>>,
}

impl ComputationContext {
    pub fn new(match_policy: ChannelMatchPolicy, tuning: TuningParams) -> Self {
        Self {
            match_policy,
            cache: Arc::new(TransferCache::new()),
            tuning,
            evaluator: None,
        }
    }

    /// Share an existing cache.
    pub fn with_cache(mut self, cache: Arc<TransferCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_evaluator(mut self, evaluator: Arc<dyn FullResponseEvaluator>) -> Self {
        self.evaluator = Some(evaluator);
        self
    }
}

impl Default for ComputationContext {
    fn default() -> Self {
        Self::new(ChannelMatchPolicy::default(), TuningParams::default())
    }
}

/// One response evaluated for one recording.
#[derive(Clone, Copy, Debug)]
pub struct ForwardRequest<'a> {
    pub nsamp: usize,
    pub sample_rate: f64,
    /// Reference time checked against metadata validity.
    pub time: Epoch,
    pub identity: &'a ChannelIdentity,
    pub metadata: &'a ResponseMetadata,
    /// Overrides the context's policy for this request.
    pub match_policy: Option<ChannelMatchPolicy>,
}

impl<'a> ForwardRequest<'a> {
    pub fn new(
        nsamp: usize,
        sample_rate: f64,
        time: Epoch,
        identity: &'a ChannelIdentity,
        metadata: &'a ResponseMetadata,
    ) -> Self {
        Self {
            nsamp,
            sample_rate,
            time,
            identity,
            metadata,
            match_policy: None,
        }
    }

    /// Same recording, another response.
    fn with_metadata(&self, metadata: &'a ResponseMetadata) -> Self {
        Self { metadata, ..*self }
    }
}

/// Inverse-specific options of a request.
#[derive(Clone, Debug, Default)]
pub struct InverseOptions<'a> {
    pub limits: Option<FreqLimits>,
    /// `Units::Unspecified` keeps the units of the forward response.
    pub requested_units: Units,
    /// Relabels the forward response before conversion.
    pub forced_input_units: Option<Units>,
    /// Response composed into the inverse.
    pub to: Option<&'a ResponseMetadata>,
}

impl InverseOptions<'_> {
    pub fn new(requested_units: Units) -> Self {
        Self {
            requested_units,
            ..Self::default()
        }
    }
}

/// Computes and caches transfer functions for one context.
pub struct Dispatcher {
    context: ComputationContext,
}

impl Dispatcher {
    pub fn new(context: ComputationContext) -> Result<Self, FatalError> {
        context.tuning.validate()?;
        Ok(Self { context })
    }

    pub fn context(&self) -> &ComputationContext {
        &self.context
    }

    pub fn cache(&self) -> &TransferCache {
        &self.context.cache
    }

    fn from_key(&self, request: &ForwardRequest<'_>) -> Result<(FromKey, f64), FatalError> {
        if request.nsamp == 0 || !(request.sample_rate > 0.0) || !request.sample_rate.is_finite() {
            return Err(FatalError::config(format!(
                "invalid request: {} samples at {} Hz",
                request.nsamp, request.sample_rate
            )));
        }
        let rate = self.context.tuning.standardize_sample_rate(request.sample_rate);
        if rate != request.sample_rate {
            tracing::trace!(requested = request.sample_rate, standard = rate, "standardized sample rate");
        }
        let policy = request.match_policy.unwrap_or(self.context.match_policy);
        let key = FromKey::new(fft_length(request.nsamp), rate, request.identity, request.metadata, policy);
        Ok((key, rate))
    }

    /// Forward transfer function for `request`.
    ///
    /// The returned value is the caller's own copy.
    pub fn compute_forward(&self, request: &ForwardRequest<'_>) -> Result<TransferData, FatalError> {
        let (key, rate) = self.from_key(request)?;
        if let Some(hit) = self.context.cache.retrieve_forward(&key, request.time) {
            return Ok(hit);
        }

        let tuning = &self.context.tuning;
        let produced = produce(
            request.metadata,
            key.nfft,
            rate,
            tuning.fir_table_bins,
            self.context.evaluator.as_ref(),
        )?;
        let data = TransferData::new(
            produced.spectrum,
            produced.units,
            request.metadata.clone(),
            tuning.normalization_tolerance,
        );

        self.context.cache.cache_forward(key, data.clone());
        Ok(data)
    }

    /// Inverse transfer function for `request`.
    ///
    /// A failed unit conversion is logged and the inverse is built in the
    /// units the forward response already has.
    pub fn compute_inverse(
        &self,
        request: &ForwardRequest<'_>,
        options: &InverseOptions<'_>,
    ) -> Result<InverseTransferFunction, FatalError> {
        let (from_key, rate) = self.from_key(request)?;
        let mut key = ToKey::new(
            from_key,
            options.limits,
            options.requested_units,
            options.forced_input_units,
        );
        if let Some(target) = options.to {
            key = key.with_target(target);
        }
        if let Some(hit) = self.context.cache.retrieve_inverse(&key, request.time) {
            return Ok(hit);
        }

        let mut forward = self.compute_forward(request)?;
        if let Some(forced) = options.forced_input_units {
            forward.override_units(forced);
        }
        if options.requested_units != Units::Unspecified {
            if let Err(err) = forward.convert_units(options.requested_units) {
                let err = TransferError::from(err);
                debug_assert!(err.is_recoverable());
                tracing::warn!(
                    id = request.metadata.id,
                    error = %err,
                    units = %forward.units(),
                    "unit conversion failed, continuing with unconverted response"
                );
            }
        }

        let to = match options.to {
            Some(target) => Some(self.compute_forward(&request.with_metadata(target))?),
            None => None,
        };

        let inverse = build_inverse(InverseRequest {
            nsamp: request.nsamp,
            sample_rate: rate,
            limits: options.limits.as_ref(),
            from: Arc::new(forward),
            to: to.as_ref(),
            requested_units: options.requested_units,
        })?;

        self.context.cache.cache_inverse(key, inverse.clone());
        Ok(inverse)
    }

    /// Make `metadata` available to [`Dispatcher::lookup_metadata`].
    pub fn register_metadata(&self, metadata: ResponseMetadata) {
        self.context.cache.cache_metadata(metadata);
    }

    /// Metadata registered under `id` and valid at `time`.
    pub fn lookup_metadata(&self, id: i64, time: Epoch) -> Option<ResponseMetadata> {
        self.context.cache.retrieve_metadata(id, time)
    }
}
