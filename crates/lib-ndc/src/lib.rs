//! # lib-ndc
//!
//! Reader and evaluator for NDC-style instrument response files.
//!
//! A response file is a sequence of stage descriptions. This crate provides:
//! - a line-oriented parser (built on `nom`) for the `paz`, `PAZ2`, `fap`,
//!   `FAP2`, `fir`, `FIR2` and `DIG2` record formats
//! - the stage cascade, which multiplies stage amplitudes and adds stage
//!   phases in file order

pub mod error;
pub mod stage;
pub mod cascade;

pub use cascade::Cascade;
pub use error::{NdcError, ParseError};
pub use stage::{parse_stage_file, parse_stages, Stage, StageRecord};
