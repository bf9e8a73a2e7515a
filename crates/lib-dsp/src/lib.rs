//! # lib-dsp
//!
//! Numeric kernels for instrument response evaluation.
//!
//! This crate provides the leaf computations of the response cascade:
//!
//! - **FFT**: In-place radix-2 transform with bit-reversal permutation, plus a
//!   real-FFT engine for waveform processing
//! - **Interpolation**: Log-log Lagrange resampling of frequency/amplitude/phase tables
//! - **Pole-zero evaluation**: Amplitude/phase and complex evaluation on a frequency grid
//! - **FIR stages**: Coefficient spectra with outward phase unwrapping
//! - **Tapers**: Two-sided cosine frequency tapers and time-domain edge tapers

pub mod error;
pub mod fft;
pub mod interpolation;
pub mod pole_zero;
pub mod fir;
pub mod taper;

pub use error::{DspError, DspResult};
pub use fft::{next2, FftDirection, FftEngine};
pub use interpolation::FapTable;
pub use pole_zero::AmpPhase;
