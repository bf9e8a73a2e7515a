//! Tuning parameters for transfer-function computation.

use crate::error::FatalError;
use lib_dsp::fir::FIR_TABLE_BINS;
use serde::{Deserialize, Serialize};

/// Numeric knobs shared by every computation of a dispatcher.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TuningParams {
    /// Sample rates requests are snapped to, in Hz.
    #[serde(default = "default_standard_rates")]
    pub standard_rates: Vec<f64>,

    /// Largest relative difference between a requested rate and a table
    /// entry for the entry to be used.
    #[serde(default = "default_rate_tolerance")]
    pub rate_tolerance: f64,

    /// A response is considered normalized when its amplitude at the
    /// calibration frequency is within this distance of 1.
    #[serde(default = "default_normalization_tolerance")]
    pub normalization_tolerance: f64,

    /// Tabulated bins for FIR stage responses.
    #[serde(default = "default_fir_table_bins")]
    pub fir_table_bins: usize,

    /// Fraction of a waveform tapered at each end before deconvolution.
    #[serde(default = "default_time_taper_fraction")]
    pub time_taper_fraction: f64,
}

fn default_standard_rates() -> Vec<f64> {
    vec![
        0.01, 0.1, 1.0, 2.0, 4.0, 5.0, 8.0, 10.0, 16.0, 20.0, 25.0, 40.0, 50.0, 80.0, 100.0, 125.0,
        160.0, 200.0, 250.0, 400.0, 500.0, 1000.0, 2000.0, 4000.0, 5000.0, 10000.0,
    ]
}
fn default_rate_tolerance() -> f64 { 1e-3 }
fn default_normalization_tolerance() -> f64 { 0.01 }
fn default_fir_table_bins() -> usize { FIR_TABLE_BINS }
fn default_time_taper_fraction() -> f64 { 0.05 }

impl Default for TuningParams {
    fn default() -> Self {
        Self {
            standard_rates: default_standard_rates(),
            rate_tolerance: default_rate_tolerance(),
            normalization_tolerance: default_normalization_tolerance(),
            fir_table_bins: default_fir_table_bins(),
            time_taper_fraction: default_time_taper_fraction(),
        }
    }
}

impl TuningParams {
    pub fn validate(&self) -> Result<(), FatalError> {
        if self.standard_rates.iter().any(|r| !(*r > 0.0) || !r.is_finite()) {
            return Err(FatalError::config("standard rates must be positive and finite"));
        }
        if !(self.rate_tolerance >= 0.0) {
            return Err(FatalError::config(format!(
                "rate tolerance must be non-negative, got {}",
                self.rate_tolerance
            )));
        }
        if !(self.normalization_tolerance > 0.0) {
            return Err(FatalError::config(format!(
                "normalization tolerance must be positive, got {}",
                self.normalization_tolerance
            )));
        }
        if self.fir_table_bins < 2 {
            return Err(FatalError::config(format!(
                "FIR table needs at least 2 bins, got {}",
                self.fir_table_bins
            )));
        }
        if !(0.0..=0.5).contains(&self.time_taper_fraction) {
            return Err(FatalError::config(format!(
                "time taper fraction must lie in [0, 0.5], got {}",
                self.time_taper_fraction
            )));
        }
        Ok(())
    }

    /// Snap `rate` to the closest standard rate within tolerance.
    pub fn standardize_sample_rate(&self, rate: f64) -> f64 {
        standardize_sample_rate(rate, &self.standard_rates, self.rate_tolerance)
    }
}

/// Closest entry of `table` when its relative distance to `rate` is within
/// `tolerance`, otherwise `rate` unchanged.
pub fn standardize_sample_rate(rate: f64, table: &[f64], tolerance: f64) -> f64 {
    table
        .iter()
        .map(|&standard| (standard, ((rate - standard) / standard).abs()))
        .filter(|(_, error)| *error <= tolerance)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map_or(rate, |(standard, _)| standard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standardize() {
        let tuning = TuningParams::default();
        assert_eq!(tuning.standardize_sample_rate(99.95), 100.0);
        assert_eq!(tuning.standardize_sample_rate(100.08), 100.0);
        assert_eq!(tuning.standardize_sample_rate(39.99), 40.0);
        assert_eq!(tuning.standardize_sample_rate(99.5), 99.5);
        assert_eq!(tuning.standardize_sample_rate(33.3), 33.3);
    }

    #[test]
    fn test_partial_toml() {
        let tuning: TuningParams = toml::from_str("rate_tolerance = 0.01\nfir_table_bins = 257").unwrap();
        assert_eq!(tuning.rate_tolerance, 0.01);
        assert_eq!(tuning.fir_table_bins, 257);
        assert_eq!(tuning.normalization_tolerance, 0.01);
        assert!(tuning.standard_rates.contains(&100.0));
        assert!(tuning.validate().is_ok());
    }

    #[test]
    fn test_validate() {
        let mut tuning = TuningParams::default();
        tuning.time_taper_fraction = 0.7;
        assert!(matches!(tuning.validate(), Err(FatalError::Config(_))));

        let mut tuning = TuningParams::default();
        tuning.standard_rates.push(-1.0);
        assert!(tuning.validate().is_err());
    }
}
