//! Recorded time-series representation.
//!
//! Samples are point measurements at uniformly spaced instants:
//!
//! ```text
//! t[i] = start + i / sample_rate,  for i = 0, 1, ..., N-1
//! ```
//!
//! `duration()` is `N / sample_rate`, the span from `start` to one sample
//! past the last.

use crate::units::{Epoch, Seconds, Units};
use serde::{Deserialize, Serialize};

/// A uniformly-sampled seismic trace.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Waveform {
    pub samples: Vec<f64>,

    /// Samples per second.
    pub sample_rate: f64,

    /// Epoch time of the first sample.
    pub start: Epoch,

    /// Units of the sample values (counts for raw data).
    pub units: Units,
}

impl Waveform {
    pub fn new(samples: Vec<f64>, sample_rate: f64, start: Epoch, units: Units) -> Self {
        Self {
            samples,
            sample_rate,
            start,
            units,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Sample interval.
    #[inline]
    pub fn dt(&self) -> Seconds {
        Seconds(1.0 / self.sample_rate)
    }

    #[inline]
    pub fn duration(&self) -> Seconds {
        Seconds(self.samples.len() as f64 / self.sample_rate)
    }

    #[inline]
    pub fn nyquist(&self) -> f64 {
        self.sample_rate / 2.0
    }

    /// Time of the last sample, or `start` when empty.
    pub fn end(&self) -> Epoch {
        if self.samples.is_empty() {
            return self.start;
        }
        self.start.offset(Seconds((self.samples.len() - 1) as f64 / self.sample_rate))
    }

    pub fn mean(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples.iter().sum::<f64>() / self.samples.len() as f64
    }

    /// Subtract the mean in place.
    pub fn demean(&mut self) {
        let mean = self.mean();
        for s in self.samples.iter_mut() {
            *s -= mean;
        }
    }

    /// Maximum absolute value.
    pub fn max_abs(&self) -> f64 {
        self.samples.iter().map(|v| v.abs()).fold(0.0, f64::max)
    }
}
