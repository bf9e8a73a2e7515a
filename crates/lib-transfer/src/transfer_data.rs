//! Forward transfer functions with calibration and unit conversion.
//!
//! A [`TransferData`] keeps the spectrum exactly as a producer returned it,
//! plus two derived views:
//!
//! - the working spectrum, the original divided by the calibration scale
//!   `amplitude(1 / calper) * calib` when a usable calibration exists and its
//!   frequency lies below Nyquist
//! - the converted spectrum, the working spectrum re-expressed in other
//!   ground-motion units
//!
//! Unit conversion multiplies every bin by the SI scale ratio and by
//! `(j w)^-k`, where `k` is the number of time derivatives from the current
//! quantity to the requested one. Bin 0 is left as is when `k != 0`.

use crate::error::UnitError;
use lib_types::{
    CalibrationPair, CalibrationSource, Complex64, ResponseMetadata, Spectrum, Units,
};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// How close the raw response was to unity at the calibration frequency.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NormalizationStatus {
    Normalized,
    UnNormalized,
    #[default]
    Unknown,
}

/// Unit transform applied by the last conversion.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitTransform {
    #[default]
    None,
    ScaleOnly,
    IntegrateOnce,
    IntegrateTwice,
    DifferentiateOnce,
    DifferentiateTwice,
}

impl UnitTransform {
    /// Classify the move from `from` to `to`, with the scale factor to apply.
    pub fn classify(from: Units, to: Units) -> Result<(UnitTransform, f64), UnitError> {
        if from == to {
            return Ok((UnitTransform::None, 1.0));
        }
        let steps = from
            .derivative_steps(&to)
            .ok_or(UnitError::Incompatible { from, to })?;
        let transform = match steps {
            0 => UnitTransform::ScaleOnly,
            1 => UnitTransform::IntegrateOnce,
            2 => UnitTransform::IntegrateTwice,
            -1 => UnitTransform::DifferentiateOnce,
            -2 => UnitTransform::DifferentiateTwice,
            _ => return Err(UnitError::Incompatible { from, to }),
        };
        Ok((transform, to.si_scale() / from.si_scale()))
    }

    /// Power of `j w` the spectrum is multiplied by.
    pub fn power(&self) -> i32 {
        match self {
            UnitTransform::None | UnitTransform::ScaleOnly => 0,
            UnitTransform::IntegrateOnce => -1,
            UnitTransform::IntegrateTwice => -2,
            UnitTransform::DifferentiateOnce => 1,
            UnitTransform::DifferentiateTwice => 2,
        }
    }
}

/// Calibration bookkeeping of a forward transfer function.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalibrationRecord {
    pub source: CalibrationSource,
    pub pair: Option<CalibrationPair>,
    /// Raw amplitude at the calibration frequency.
    pub amplitude_at_calper: Option<f64>,
    /// The working spectrum is the original divided by this.
    pub scale_factor: f64,
    pub status: NormalizationStatus,
}

impl Default for CalibrationRecord {
    fn default() -> Self {
        Self {
            source: CalibrationSource::None,
            pair: None,
            amplitude_at_calper: None,
            scale_factor: 1.0,
            status: NormalizationStatus::Unknown,
        }
    }
}

/// Forward transfer function of one response at one FFT size.
#[derive(Clone, Debug, PartialEq)]
pub struct TransferData {
    original: Spectrum,
    original_units: Units,
    metadata: ResponseMetadata,
    calibration: CalibrationRecord,
    working: Spectrum,
    converted: Option<Spectrum>,
    units: Units,
    transform: UnitTransform,
}

impl TransferData {
    /// Wrap a producer spectrum and apply calibration.
    pub fn new(
        original: Spectrum,
        units: Units,
        metadata: ResponseMetadata,
        normalization_tolerance: f64,
    ) -> Self {
        let calibration = calibrate(&original, &metadata, normalization_tolerance);
        let mut working = original.clone();
        if calibration.scale_factor != 1.0 {
            working.scale(1.0 / calibration.scale_factor);
        }

        tracing::debug!(
            id = metadata.id,
            source = ?calibration.source,
            scale = calibration.scale_factor,
            status = ?calibration.status,
            "calibrated forward response"
        );

        Self {
            original,
            original_units: units,
            metadata,
            calibration,
            working,
            converted: None,
            units,
            transform: UnitTransform::None,
        }
    }

    /// Spectrum as produced, never modified.
    pub fn original(&self) -> &Spectrum {
        &self.original
    }

    pub fn original_units(&self) -> Units {
        self.original_units
    }

    /// Calibrated spectrum.
    pub fn working(&self) -> &Spectrum {
        &self.working
    }

    /// Spectrum after the last unit conversion, if any.
    pub fn converted(&self) -> Option<&Spectrum> {
        self.converted.as_ref()
    }

    /// Converted spectrum if present, otherwise the working one.
    pub fn current(&self) -> &Spectrum {
        self.converted.as_ref().unwrap_or(&self.working)
    }

    /// Units of [`current`](Self::current).
    pub fn units(&self) -> Units {
        self.units
    }

    pub fn metadata(&self) -> &ResponseMetadata {
        &self.metadata
    }

    pub fn calibration(&self) -> &CalibrationRecord {
        &self.calibration
    }

    pub fn calibration_source(&self) -> CalibrationSource {
        self.calibration.source
    }

    pub fn scale_factor(&self) -> f64 {
        self.calibration.scale_factor
    }

    pub fn normalization(&self) -> NormalizationStatus {
        self.calibration.status
    }

    pub fn transform(&self) -> UnitTransform {
        self.transform
    }

    pub fn len(&self) -> usize {
        self.working.len()
    }

    pub fn is_empty(&self) -> bool {
        self.working.is_empty()
    }

    pub fn delfreq(&self) -> f64 {
        self.working.delfreq
    }

    pub fn frequencies(&self) -> Vec<f64> {
        self.current().frequencies()
    }

    pub fn amplitudes(&self) -> Vec<f64> {
        self.current().amplitudes()
    }

    pub fn phases(&self) -> Vec<f64> {
        self.current().phases()
    }

    /// Amplitude of the current spectrum at `frequency`.
    pub fn amplitude_at(&self, frequency: f64) -> Option<f64> {
        self.current().amplitude_at(frequency)
    }

    /// Amplitude of the current spectrum at the calibration frequency.
    pub fn amplitude_at_calper(&self) -> Option<f64> {
        self.calibration
            .pair
            .and_then(|pair| self.amplitude_at(pair.frequency()))
    }

    /// Relabel the current spectrum without touching its values.
    pub fn override_units(&mut self, units: Units) {
        if units != self.units {
            tracing::info!(id = self.metadata.id, from = %self.units, to = %units, "overriding input units");
            self.units = units;
        }
    }

    /// Re-express the current spectrum in `requested` units.
    ///
    /// On error nothing changes.
    pub fn convert_units(&mut self, requested: Units) -> Result<UnitTransform, UnitError> {
        let (transform, factor) = UnitTransform::classify(self.units, requested)?;
        if transform == UnitTransform::None {
            self.transform = transform;
            return Ok(transform);
        }

        let power = transform.power();
        let current = self.current();
        let delfreq = current.delfreq;
        let values: Vec<Complex64> = current
            .values
            .iter()
            .enumerate()
            .map(|(i, &value)| {
                if power == 0 {
                    return value * factor;
                }
                if i == 0 {
                    return value;
                }
                let jw = Complex64::new(0.0, 2.0 * PI * i as f64 * delfreq);
                value * factor * jw.powi(power)
            })
            .collect();

        tracing::debug!(
            id = self.metadata.id,
            from = %self.units,
            to = %requested,
            transform = ?transform,
            "converted response units"
        );

        self.converted = Some(Spectrum::new(delfreq, values));
        self.units = requested;
        self.transform = transform;
        Ok(transform)
    }
}

fn calibrate(original: &Spectrum, metadata: &ResponseMetadata, tolerance: f64) -> CalibrationRecord {
    let Some((source, pair)) = metadata.calibration.select() else {
        return CalibrationRecord::default();
    };

    let nyquist = original.max_frequency();
    let frequency = pair.frequency();
    if frequency >= nyquist {
        tracing::debug!(
            id = metadata.id,
            frequency,
            nyquist,
            "calibration frequency above Nyquist, not applied"
        );
        return CalibrationRecord {
            pair: Some(pair),
            ..CalibrationRecord::default()
        };
    }

    let amplitude = match original.amplitude_at(frequency) {
        Some(a) if a > 0.0 && a.is_finite() => a,
        _ => {
            tracing::warn!(id = metadata.id, frequency, "no usable amplitude at calibration frequency");
            return CalibrationRecord {
                pair: Some(pair),
                ..CalibrationRecord::default()
            };
        }
    };

    let status = if (amplitude - 1.0).abs() <= tolerance {
        NormalizationStatus::Normalized
    } else {
        NormalizationStatus::UnNormalized
    };

    CalibrationRecord {
        source,
        pair: Some(pair),
        amplitude_at_calper: Some(amplitude),
        scale_factor: amplitude * pair.calib,
        status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lib_types::{Calibration, ResponseSource, ResponseType};

    fn metadata(calibration: Calibration) -> ResponseMetadata {
        ResponseMetadata::new(
            9,
            ResponseType::Paz,
            ResponseSource::NdcText { text: String::new() },
        )
        .with_calibration(calibration)
    }

    /// Velocity-flat response with unit gain: |H| = 1 above 0.5 Hz.
    fn flat_spectrum(len: usize, delfreq: f64, gain: f64) -> Spectrum {
        let values = (0..len)
            .map(|i| Complex64::new(0.0, gain * if i == 0 { 0.0 } else { 1.0 }))
            .collect();
        Spectrum::new(delfreq, values)
    }

    #[test]
    fn test_normalized_input() {
        let cal = Calibration {
            waveform: None,
            nominal: Some(CalibrationPair::new(0.5, 1.0)),
        };
        let data = TransferData::new(flat_spectrum(65, 0.25, 1.0), Units::Nanometers, metadata(cal), 0.01);

        assert_eq!(data.normalization(), NormalizationStatus::Normalized);
        assert_eq!(data.calibration_source(), CalibrationSource::Nominal);
        assert!((data.scale_factor() - 0.5).abs() < 1e-12);

        let raw = data.original().amplitude_at(1.0).unwrap();
        let scaled = data.amplitude_at_calper().unwrap();
        let ratio = scaled / (raw / data.scale_factor());
        assert!((0.99..=1.01).contains(&ratio));
        assert!((scaled - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_unnormalized_input_and_priority() {
        let cal = Calibration {
            waveform: Some(CalibrationPair::new(2.0, 2.0)),
            nominal: Some(CalibrationPair::new(0.5, 1.0)),
        };
        let data = TransferData::new(flat_spectrum(65, 0.25, 300.0), Units::Nanometers, metadata(cal), 0.01);
        assert_eq!(data.calibration_source(), CalibrationSource::Waveform);
        assert_eq!(data.normalization(), NormalizationStatus::UnNormalized);
        assert!((data.scale_factor() - 600.0).abs() < 1e-9);
        assert!((data.working().values[4].norm() - 0.5).abs() < 1e-12);
        // the producer spectrum is untouched
        assert!((data.original().values[4].norm() - 300.0).abs() < 1e-12);
    }

    #[test]
    fn test_calibration_record_json() {
        let cal = Calibration {
            waveform: Some(CalibrationPair::new(2.0, 2.0)),
            nominal: None,
        };
        let data = TransferData::new(flat_spectrum(65, 0.25, 300.0), Units::Nanometers, metadata(cal), 0.01);

        let json = serde_json::to_value(data.calibration()).unwrap();
        assert_eq!(json["source"], "Waveform");
        assert_eq!(json["status"], "UnNormalized");
        assert_eq!(json["pair"]["calper"], 2.0);
        assert!((json["scale_factor"].as_f64().unwrap() - 600.0).abs() < 1e-9);

        let back: CalibrationRecord = serde_json::from_value(json).unwrap();
        assert_eq!(&back, data.calibration());
        assert_eq!(
            serde_json::from_str::<UnitTransform>("\"IntegrateTwice\"").unwrap(),
            UnitTransform::IntegrateTwice
        );
    }

    #[test]
    fn test_calibration_above_nyquist_is_skipped() {
        let cal = Calibration {
            waveform: None,
            nominal: Some(CalibrationPair::new(2.0, 0.01)),
        };
        let data = TransferData::new(flat_spectrum(65, 0.25, 3.0), Units::Nanometers, metadata(cal), 0.01);
        assert_eq!(data.normalization(), NormalizationStatus::Unknown);
        assert_eq!(data.scale_factor(), 1.0);
        assert_eq!(data.working(), data.original());
    }

    #[test]
    fn test_classify() {
        use UnitTransform::*;
        assert_eq!(UnitTransform::classify(Units::Meters, Units::Meters).unwrap().0, None);
        let (t, f) = UnitTransform::classify(Units::Nanometers, Units::Meters).unwrap();
        assert_eq!(t, ScaleOnly);
        assert!((f - 1e-9f64.recip()).abs() < 1e-3);
        assert_eq!(
            UnitTransform::classify(Units::Nanometers, Units::MetersPerSecond).unwrap().0,
            IntegrateOnce
        );
        assert_eq!(
            UnitTransform::classify(Units::Nanometers, Units::NanometersPerSecondSquared).unwrap().0,
            IntegrateTwice
        );
        assert_eq!(
            UnitTransform::classify(Units::MetersPerSecondSquared, Units::MetersPerSecond).unwrap().0,
            DifferentiateOnce
        );
        assert_eq!(
            UnitTransform::classify(Units::MetersPerSecondSquared, Units::Meters).unwrap().0,
            DifferentiateTwice
        );
        assert_eq!(
            UnitTransform::classify(Units::Counts, Units::Meters),
            Err(UnitError::Incompatible {
                from: Units::Counts,
                to: Units::Meters
            })
        );
    }

    #[test]
    fn test_integration_divides_by_jw() {
        let mut data = TransferData::new(
            flat_spectrum(17, 0.5, 1.0),
            Units::Meters,
            metadata(Calibration::default()),
            0.01,
        );
        assert_eq!(data.convert_units(Units::MetersPerSecond).unwrap(), UnitTransform::IntegrateOnce);
        assert_eq!(data.units(), Units::MetersPerSecond);
        let converted = data.converted().unwrap();
        assert_eq!(converted.values[0], data.working().values[0]);
        for i in 1..converted.len() {
            let w = 2.0 * PI * i as f64 * 0.5;
            let expected = Complex64::new(0.0, 1.0) / Complex64::new(0.0, w);
            assert!((converted.values[i] - expected).norm() < 1e-12);
        }
    }

    #[test]
    fn test_round_trip() {
        let spectrum = Spectrum::new(
            0.1,
            (0..33).map(|i| Complex64::new(1.0 + i as f64, -0.5 * i as f64)).collect(),
        );
        let mut data = TransferData::new(spectrum, Units::Nanometers, metadata(Calibration::default()), 0.01);

        data.convert_units(Units::MetersPerSecondSquared).unwrap();
        data.convert_units(Units::Nanometers).unwrap();
        assert_eq!(data.transform(), UnitTransform::DifferentiateTwice);

        let back = data.current();
        for (a, b) in back.values.iter().zip(&data.working().values) {
            assert!((a - b).norm() <= 1e-9 * b.norm().max(1.0));
        }
    }

    #[test]
    fn test_failed_conversion_changes_nothing() {
        let mut data = TransferData::new(
            flat_spectrum(9, 1.0, 1.0),
            Units::Counts,
            metadata(Calibration::default()),
            0.01,
        );
        let before = data.clone();
        assert!(data.convert_units(Units::Meters).is_err());
        assert_eq!(data, before);
    }

    #[test]
    fn test_override_units_keeps_values() {
        let mut data = TransferData::new(
            flat_spectrum(9, 1.0, 2.0),
            Units::Nanometers,
            metadata(Calibration::default()),
            0.01,
        );
        data.override_units(Units::Micrometers);
        assert_eq!(data.units(), Units::Micrometers);
        assert_eq!(data.original_units(), Units::Nanometers);
        assert_eq!(data.current(), data.original());
    }
}
