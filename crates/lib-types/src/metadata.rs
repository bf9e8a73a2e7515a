//! Instrument response metadata.
//!
//! Metadata describes *where* a response comes from (the stage source), *what
//! kind* of response it is (the type tag that selects a producer), how it is
//! calibrated and over which time span it is valid. It is consumed by the
//! transfer-function dispatcher and forms part of every cache key, so
//! equality and hashing are structural over all fields (floats by bit
//! pattern).

use crate::pole_zero::PoleZeroData;
use crate::units::{Epoch, Units};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;

/// Producer family a response type is routed to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProducerFamily {
    /// Stage cascade over NDC-style stage text.
    Cascade,
    /// Direct pole-zero evaluation of SAC-style data.
    SacPoleZero,
    /// External evaluator for self-describing full responses.
    FullResponse,
}

/// Declared response type of a metadata row.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ResponseType {
    Paz,
    Fap,
    Fir,
    PazFir,
    PazFap,
    Sacpzf,
    Evresp,
    /// Any tag no producer understands.
    Other(String),
}

impl ResponseType {
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "paz" => ResponseType::Paz,
            "fap" => ResponseType::Fap,
            "fir" => ResponseType::Fir,
            "pazfir" | "paz+fir" => ResponseType::PazFir,
            "pazfap" | "paz+fap" => ResponseType::PazFap,
            "sacpzf" | "sacpz" => ResponseType::Sacpzf,
            "evresp" | "resp" => ResponseType::Evresp,
            _ => ResponseType::Other(tag.trim().to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ResponseType::Paz => "paz",
            ResponseType::Fap => "fap",
            ResponseType::Fir => "fir",
            ResponseType::PazFir => "pazfir",
            ResponseType::PazFap => "pazfap",
            ResponseType::Sacpzf => "sacpzf",
            ResponseType::Evresp => "evresp",
            ResponseType::Other(name) => name,
        }
    }

    /// Producer family for this type, `None` when unsupported.
    pub fn family(&self) -> Option<ProducerFamily> {
        match self {
            ResponseType::Paz
            | ResponseType::Fap
            | ResponseType::Fir
            | ResponseType::PazFir
            | ResponseType::PazFap => Some(ProducerFamily::Cascade),
            ResponseType::Sacpzf => Some(ProducerFamily::SacPoleZero),
            ResponseType::Evresp => Some(ProducerFamily::FullResponse),
            ResponseType::Other(_) => None,
        }
    }
}

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<String> for ResponseType {
    fn from(tag: String) -> Self {
        ResponseType::from_tag(&tag)
    }
}

impl From<ResponseType> for String {
    fn from(kind: ResponseType) -> String {
        kind.name().to_string()
    }
}

/// Where the response description lives.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResponseSource {
    /// NDC-style stage text in a file.
    NdcFile { path: PathBuf },
    /// NDC-style stage text held in memory.
    NdcText { text: String },
    /// Pole-zero data already parsed from a SAC pole-zero file.
    PoleZero { data: PoleZeroData },
    /// Self-describing response file read by an external evaluator.
    External { path: PathBuf },
    #[default]
    None,
}

/// A calibration value paired with the period at which it applies.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalibrationPair {
    pub calib: f64,
    pub calper: f64,
}

impl CalibrationPair {
    pub fn new(calib: f64, calper: f64) -> Self {
        Self { calib, calper }
    }

    /// Frequency at which the calibration applies (`1 / calper`).
    pub fn frequency(&self) -> f64 {
        1.0 / self.calper
    }

    /// Both values are usable (finite and strictly positive).
    pub fn is_usable(&self) -> bool {
        self.calib.is_finite() && self.calper.is_finite() && self.calib > 0.0 && self.calper > 0.0
    }

    fn hash_bits<H: Hasher>(&self, state: &mut H) {
        self.calib.to_bits().hash(state);
        self.calper.to_bits().hash(state);
    }
}

/// Waveform-specific and nominal calibrations; waveform-specific wins.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    #[serde(default)]
    pub waveform: Option<CalibrationPair>,
    #[serde(default)]
    pub nominal: Option<CalibrationPair>,
}

/// Which calibration source was applied to a spectrum.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CalibrationSource {
    Waveform,
    Nominal,
    #[default]
    None,
}

impl Calibration {
    /// The calibration to apply, in priority order.
    pub fn select(&self) -> Option<(CalibrationSource, CalibrationPair)> {
        if let Some(pair) = self.waveform.filter(CalibrationPair::is_usable) {
            return Some((CalibrationSource::Waveform, pair));
        }
        self.nominal
            .filter(CalibrationPair::is_usable)
            .map(|pair| (CalibrationSource::Nominal, pair))
    }
}

/// Half-open validity interval `[start, end)`; open ends are unbounded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeWindow {
    #[serde(default)]
    pub start: Option<Epoch>,
    #[serde(default)]
    pub end: Option<Epoch>,
}

impl TimeWindow {
    pub const ALWAYS: TimeWindow = TimeWindow { start: None, end: None };

    pub fn new(start: Option<Epoch>, end: Option<Epoch>) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, time: Epoch) -> bool {
        self.start.map_or(true, |s| time.0 >= s.0) && self.end.map_or(true, |e| time.0 < e.0)
    }
}

/// Response metadata row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResponseMetadata {
    /// Numeric identifier, key of the metadata cache.
    pub id: i64,

    pub response_type: ResponseType,

    pub source: ResponseSource,

    #[serde(default)]
    pub calibration: Calibration,

    /// Sample rate of the instrument, when known.
    #[serde(default)]
    pub instrument_sample_rate: Option<f64>,

    /// Ground-motion units the stage description is expressed in.
    #[serde(default = "default_input_units")]
    pub input_units: Units,

    #[serde(default)]
    pub validity: TimeWindow,
}

fn default_input_units() -> Units {
    Units::Nanometers
}

impl ResponseMetadata {
    pub fn new(id: i64, response_type: ResponseType, source: ResponseSource) -> Self {
        Self {
            id,
            response_type,
            source,
            calibration: Calibration::default(),
            instrument_sample_rate: None,
            input_units: default_input_units(),
            validity: TimeWindow::ALWAYS,
        }
    }

    pub fn with_calibration(mut self, calibration: Calibration) -> Self {
        self.calibration = calibration;
        self
    }

    pub fn with_validity(mut self, validity: TimeWindow) -> Self {
        self.validity = validity;
        self
    }

    pub fn with_input_units(mut self, units: Units) -> Self {
        self.input_units = units;
        self
    }

    pub fn contains(&self, time: Epoch) -> bool {
        self.validity.contains(time)
    }
}

impl Eq for ResponseMetadata {}

impl Hash for ResponseMetadata {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.response_type.hash(state);
        self.source.hash(state);
        for pair in [self.calibration.waveform, self.calibration.nominal] {
            match pair {
                Some(p) => {
                    1u8.hash(state);
                    p.hash_bits(state);
                }
                None => 0u8.hash(state),
            }
        }
        self.instrument_sample_rate.map(f64::to_bits).hash(state);
        self.input_units.hash(state);
        self.validity.start.map(|e| e.0.to_bits()).hash(state);
        self.validity.end.map(|e| e.0.to_bits()).hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of<T: Hash>(value: &T) -> u64 {
        let mut h = DefaultHasher::new();
        value.hash(&mut h);
        h.finish()
    }

    #[test]
    fn test_type_routing() {
        assert_eq!(ResponseType::from_tag("PAZFIR"), ResponseType::PazFir);
        assert_eq!(ResponseType::from_tag("sacpzf").family(), Some(ProducerFamily::SacPoleZero));
        assert_eq!(ResponseType::from_tag(" evresp ").family(), Some(ProducerFamily::FullResponse));
        let other = ResponseType::from_tag("seed-blockette");
        assert_eq!(other.family(), None);
        assert_eq!(other.name(), "seed-blockette");
    }

    #[test]
    fn test_calibration_priority() {
        let both = Calibration {
            waveform: Some(CalibrationPair::new(2.0, 1.0)),
            nominal: Some(CalibrationPair::new(3.0, 1.0)),
        };
        assert_eq!(both.select().unwrap().0, CalibrationSource::Waveform);

        let bad_waveform = Calibration {
            waveform: Some(CalibrationPair::new(0.0, 1.0)),
            nominal: Some(CalibrationPair::new(3.0, 1.0)),
        };
        assert_eq!(bad_waveform.select().unwrap().0, CalibrationSource::Nominal);
        assert!(Calibration::default().select().is_none());
    }

    #[test]
    fn test_time_window() {
        let w = TimeWindow::new(Some(Epoch(100.0)), Some(Epoch(200.0)));
        assert!(w.contains(Epoch(100.0)));
        assert!(w.contains(Epoch(199.9)));
        assert!(!w.contains(Epoch(200.0)));
        assert!(!w.contains(Epoch(50.0)));
        assert!(TimeWindow::ALWAYS.contains(Epoch(-1e12)));
    }

    #[test]
    fn test_structural_hash() {
        let a = ResponseMetadata::new(
            7,
            ResponseType::Paz,
            ResponseSource::NdcText { text: "x".into() },
        );
        let b = a.clone();
        let c = a.clone().with_calibration(Calibration {
            waveform: Some(CalibrationPair::new(1.0, 1.0)),
            nominal: None,
        });
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
        assert_ne!(a, c);
        assert_ne!(hash_of(&a), hash_of(&c));
    }

    #[test]
    fn test_metadata_from_json() {
        let json = r#"{
            "id": 3,
            "response_type": "PAZ",
            "source": {"kind": "ndc_file", "path": "sts2.paz"},
            "calibration": {"nominal": {"calib": 1.0, "calper": 1.0}},
            "input_units": "nm"
        }"#;
        let meta: ResponseMetadata = serde_json::from_str(json).unwrap();
        assert_eq!(meta.response_type, ResponseType::Paz);
        assert_eq!(meta.input_units, Units::Nanometers);
        assert!(meta.calibration.waveform.is_none());
        assert!(meta.contains(Epoch(0.0)));
    }
}
