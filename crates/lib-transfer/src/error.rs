//! Error types for transfer-function computation.
//!
//! Faults are split by what the dispatcher does with them. A [`FatalError`]
//! aborts the request and reaches the caller. A [`UnitError`] is
//! recoverable: the dispatcher logs it and continues with the units it
//! already has.

use lib_dsp::DspError;
use lib_ndc::{NdcError, ParseError};
use lib_types::Units;
use thiserror::Error;

/// Faults that abort a computation.
#[derive(Debug, Error)]
pub enum FatalError {
    /// Malformed stage text.
    #[error("Stage text parse error: {0}")]
    Parse(ParseError),

    /// Inconsistent inputs: mismatched lengths, missing predecessor lines,
    /// degenerate spectra, unusable request parameters.
    #[error("Configuration error: {0}")]
    Config(String),

    /// No producer handles this response type.
    #[error("Unsupported response type: {0}")]
    UnsupportedResponseType(String),

    /// The response type needs an external evaluator that is not registered.
    #[error("No evaluator registered for response type {0}")]
    MissingEvaluator(String),

    #[error("DSP error: {0}")]
    Dsp(#[from] DspError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FatalError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

impl From<ParseError> for FatalError {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::Io(e) => FatalError::Io(e),
            e if e.is_configuration() => FatalError::Config(e.to_string()),
            e => FatalError::Parse(e),
        }
    }
}

impl From<NdcError> for FatalError {
    fn from(err: NdcError) -> Self {
        match err {
            NdcError::Parse(e) => e.into(),
            stage @ NdcError::Stage { .. } => FatalError::Config(stage.to_string()),
        }
    }
}

/// Requested units cannot be reached from the current units.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnitError {
    #[error("Cannot convert response from {from} to {to}")]
    Incompatible { from: Units, to: Units },
}

/// Any fault raised while computing a transfer function.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error(transparent)]
    Fatal(#[from] FatalError),

    #[error(transparent)]
    Recoverable(#[from] UnitError),
}

impl TransferError {
    /// Check if the computation can continue past this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable(_))
    }

    /// Check if the computation must be abandoned.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal(_))
    }
}

impl From<DspError> for TransferError {
    fn from(err: DspError) -> Self {
        Self::Fatal(err.into())
    }
}

impl From<NdcError> for TransferError {
    fn from(err: NdcError) -> Self {
        Self::Fatal(err.into())
    }
}

/// Result type for transfer-function operations.
pub type TransferResult<T> = Result<T, TransferError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        let unit: TransferError = UnitError::Incompatible {
            from: Units::Counts,
            to: Units::Meters,
        }
        .into();
        assert!(unit.is_recoverable());
        assert!(!unit.is_fatal());

        let unsupported: TransferError = FatalError::UnsupportedResponseType("seed".into()).into();
        assert!(unsupported.is_fatal());
        assert!(unsupported.to_string().contains("seed"));
    }

    #[test]
    fn test_parse_error_mapping() {
        let missing = ParseError::MissingPredecessor {
            line: 3,
            stage: "FIR2",
            required: "DIG2",
        };
        assert!(matches!(FatalError::from(missing), FatalError::Config(_)));

        let syntax = ParseError::syntax(4, "bad token");
        assert!(matches!(FatalError::from(syntax), FatalError::Parse(_)));
    }
}
