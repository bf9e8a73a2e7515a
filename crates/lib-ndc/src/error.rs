//! Error types for stage parsing and evaluation.

use lib_dsp::DspError;
use thiserror::Error;

/// Errors that can occur while reading stage text.
#[derive(Debug, Error)]
pub enum ParseError {
    /// I/O error reading the file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed or unexpected tokens.
    #[error("Syntax error at line {line}: {message}")]
    Syntax { line: usize, message: String },

    /// A record needs state that an earlier line should have set.
    #[error("{stage} at line {line} requires a preceding {required} line")]
    MissingPredecessor {
        line: usize,
        stage: &'static str,
        required: &'static str,
    },

    /// A table ended before its declared row count.
    #[error("{stage} at line {line} declares {expected} entries, found {actual}")]
    LengthMismatch {
        line: usize,
        stage: &'static str,
        expected: usize,
        actual: usize,
    },

    /// The input holds no stage at all.
    #[error("No response stages found")]
    NoStages,

    /// Nom parsing error (internal).
    #[error("Parse error: {0}")]
    Nom(String),
}

impl ParseError {
    pub fn syntax(line: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            line,
            message: message.into(),
        }
    }

    /// Structural faults in otherwise well-formed text.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            ParseError::MissingPredecessor { .. } | ParseError::LengthMismatch { .. }
        )
    }
}

impl<'a> From<nom::Err<nom::error::Error<&'a str>>> for ParseError {
    fn from(err: nom::Err<nom::error::Error<&'a str>>) -> Self {
        match err {
            nom::Err::Incomplete(_) => ParseError::Nom("Incomplete input".to_string()),
            nom::Err::Error(e) | nom::Err::Failure(e) => {
                let preview: String = e.input.chars().take(20).collect();
                ParseError::Nom(format!("{:?} at '{}...'", e.code, preview))
            }
        }
    }
}

/// Errors from reading or evaluating a cascade.
#[derive(Debug, Error)]
pub enum NdcError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// A stage failed numerically.
    #[error("Stage {index} ({kind}) at line {line}: {source}")]
    Stage {
        index: usize,
        kind: &'static str,
        line: usize,
        #[source]
        source: DspError,
    },
}
