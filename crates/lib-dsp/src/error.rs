//! Error types for DSP operations.

use thiserror::Error;

/// Errors that can occur during DSP operations.
#[derive(Debug, Error)]
pub enum DspError {
    /// FFT size is not a power of 2.
    #[error("FFT size must be power of 2, got {0}")]
    InvalidFftSize(usize),

    /// Input length mismatch.
    #[error("Input length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    /// Insufficient data for operation.
    #[error("Insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Tabulated response is structurally unusable.
    #[error("Invalid response table: {0}")]
    InvalidTable(String),

    /// Interpolation failed.
    #[error("Interpolation failed: {0}")]
    InterpolationFailed(String),

    /// Input has no usable dynamic range.
    #[error("Degenerate input: {0}")]
    DegenerateInput(String),

    /// Numerical instability detected.
    #[error("Numerical instability: {0}")]
    NumericalInstability(String),

    /// Invalid configuration parameter.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for DSP operations.
pub type DspResult<T> = Result<T, DspError>;
