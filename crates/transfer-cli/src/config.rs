//! Request file loading and validation.

use anyhow::{Context, Result};
use lib_transfer::TuningParams;
use lib_types::{ChannelIdentity, ChannelMatchPolicy, Epoch, FreqLimits, ResponseMetadata, ResponseSource, Units};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level request configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RequestConfig {
    /// Request name/description.
    #[serde(default)]
    pub name: String,

    /// Channel the recording comes from.
    pub channel: ChannelIdentity,

    /// Response metadata row.
    pub response: ResponseMetadata,

    /// Recording parameters.
    pub recording: RecordingParams,

    /// Inverse parameters.
    #[serde(default)]
    pub inverse: InverseConfig,

    #[serde(default)]
    pub match_policy: ChannelMatchPolicy,

    #[serde(default)]
    pub tuning: TuningParams,
}

/// Recording parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RecordingParams {
    /// Number of samples.
    pub nsamp: usize,

    /// Samples per second.
    pub sample_rate: f64,

    /// Epoch time of the first sample.
    #[serde(default)]
    pub time: f64,
}

impl RecordingParams {
    pub fn epoch(&self) -> Epoch {
        Epoch(self.time)
    }

    pub fn nyquist(&self) -> f64 {
        self.sample_rate / 2.0
    }

    pub fn window_seconds(&self) -> f64 {
        self.nsamp as f64 / self.sample_rate
    }
}

/// How the inverse taper limits are chosen.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaperMode {
    /// No taper.
    #[default]
    None,
    /// Corners given in `corners`.
    Explicit,
    /// Corners from the Nyquist and window length.
    Window,
    /// Corners estimated from the forward amplitude spectrum.
    Estimated,
}

/// Inverse parameters.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct InverseConfig {
    /// Output units of deconvolved data; unset keeps the response units.
    #[serde(default)]
    pub units: Units,

    /// Relabel the response input units before conversion.
    #[serde(default)]
    pub forced_input_units: Option<Units>,

    #[serde(default)]
    pub taper: TaperMode,

    /// Taper corners in Hz, for `taper = "explicit"`.
    #[serde(default)]
    pub corners: Option<[f64; 4]>,

    /// Second response composed into the inverse.
    #[serde(default)]
    pub target: Option<ResponseMetadata>,
}

impl InverseConfig {
    pub fn explicit_limits(&self) -> Result<Option<FreqLimits>> {
        match (self.taper, self.corners) {
            (TaperMode::Explicit, Some([a, b, c, d])) => Ok(Some(
                FreqLimits::new(a, b, c, d).context("Invalid taper corners")?,
            )),
            _ => Ok(None),
        }
    }
}

/// Load a request from a file.
pub fn load_config(path: &Path) -> Result<RequestConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read request file: {:?}", path))?;

    let config: RequestConfig = if path.extension().map_or(false, |e| e == "json") {
        serde_json::from_str(&content)?
    } else {
        // Assume TOML
        toml::from_str(&content)
            .with_context(|| "Failed to parse request as TOML")?
    };

    validate_config(&config)?;

    Ok(config)
}

/// Validate a request.
fn validate_config(config: &RequestConfig) -> Result<()> {
    let recording = &config.recording;
    if recording.nsamp == 0 {
        anyhow::bail!("Recording must have at least one sample");
    }
    if !(recording.sample_rate > 0.0) || !recording.sample_rate.is_finite() {
        anyhow::bail!("Invalid sample rate: {}", recording.sample_rate);
    }

    validate_source(&config.response, "Response")?;
    if let Some(ref target) = config.inverse.target {
        validate_source(target, "Target response")?;
    }

    if config.inverse.taper == TaperMode::Explicit {
        if config.inverse.corners.is_none() {
            anyhow::bail!("taper = \"explicit\" requires four corner frequencies");
        }
        config.inverse.explicit_limits()?;
    }

    config
        .tuning
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid tuning parameters: {e}"))?;

    Ok(())
}

/// Check that file-backed sources exist.
fn validate_source(metadata: &ResponseMetadata, label: &str) -> Result<()> {
    match &metadata.source {
        ResponseSource::NdcFile { path } | ResponseSource::External { path } if !path.exists() => {
            anyhow::bail!("{} file not found: {:?}", label, path);
        }
        _ => Ok(()),
    }
}
