//! # lib-types
//!
//! Core type definitions for instrument response computation.
//!
//! This crate provides the plain data model shared by the workspace:
//! - Physical units, frequencies, periods and epoch times
//! - Channel identity and the channel-match policy used in cache keys
//! - Response metadata (type tag, stage source, calibration, validity window)
//! - Pole-zero data, frequency limits and uniformly binned complex spectra
//! - Waveform representation for recorded time series

pub mod units;
pub mod identity;
pub mod pole_zero;
pub mod metadata;
pub mod limits;
pub mod spectrum;
pub mod waveform;

pub use units::*;
pub use identity::*;
pub use pole_zero::PoleZeroData;
pub use metadata::*;
pub use limits::{FreqLimits, LimitsError};
pub use spectrum::Spectrum;
pub use waveform::Waveform;

/// Re-export num_complex for convenience
pub use num_complex::Complex64;
