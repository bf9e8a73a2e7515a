//! # lib-transfer
//!
//! Instrument transfer functions and their inverses.
//!
//! - [`Dispatcher`]: forward and inverse transfer functions for a request,
//!   produced by the stage cascade, SAC pole-zero evaluation or an external
//!   full-response evaluator, and memoized in a [`TransferCache`]
//! - [`TransferData`]: calibrated forward response with unit conversion
//! - [`build_inverse`]: stabilized, tapered spectral inversion
//! - [`estimate_band`]: taper limits from an amplitude spectrum
//! - [`remove_response`]: deconvolution of recorded waveforms

pub mod band;
pub mod cache;
pub mod config;
pub mod deconvolve;
pub mod dispatcher;
pub mod error;
pub mod inverse;
pub mod keys;
pub mod producers;
pub mod transfer_data;

pub use band::{estimate_band, estimate_response_band};
pub use cache::TransferCache;
pub use config::{standardize_sample_rate, TuningParams};
pub use deconvolve::{remove_response, remove_response_batch};
pub use dispatcher::{ComputationContext, Dispatcher, ForwardRequest, InverseOptions};
pub use error::{FatalError, TransferError, TransferResult, UnitError};
pub use inverse::{build_inverse, fft_length, InverseRequest, InverseTransferFunction};
pub use keys::{FromKey, ToKey};
pub use producers::{FullResponseEvaluator, Produced};
pub use transfer_data::{CalibrationRecord, NormalizationStatus, TransferData, UnitTransform};
