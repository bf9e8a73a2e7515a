//! Physical units with type safety.
//!
//! Frequencies, periods and epoch times are newtypes so they cannot be mixed
//! by accident. Ground-motion units are a closed enum that doubles as the
//! compatibility oracle used by unit conversion: two units are convertible when
//! they measure the same quantity, or quantities one or two time derivatives
//! apart.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Div, Mul, Sub};
use std::str::FromStr;

/// Time duration in seconds.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Seconds(pub f64);

impl Seconds {
    pub const ZERO: Self = Self(0.0);

    /// Convert to frequency (reciprocal).
    #[inline]
    pub fn to_frequency(&self) -> Hertz {
        Hertz(1.0 / self.0)
    }
}

impl Add for Seconds {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Seconds {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl Mul<f64> for Seconds {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self {
        Self(self.0 * rhs)
    }
}

impl Div<f64> for Seconds {
    type Output = Self;
    fn div(self, rhs: f64) -> Self {
        Self(self.0 / rhs)
    }
}

/// Frequency in Hertz.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Hertz(pub f64);

impl Hertz {
    pub const ZERO: Self = Self(0.0);

    /// Convert to period (reciprocal).
    #[inline]
    pub fn to_period(&self) -> Seconds {
        Seconds(1.0 / self.0)
    }

    /// Angular frequency (omega = 2 * pi * f).
    #[inline]
    pub fn angular(&self) -> f64 {
        2.0 * std::f64::consts::PI * self.0
    }
}

impl Mul<f64> for Hertz {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self {
        Self(self.0 * rhs)
    }
}

impl Div<f64> for Hertz {
    type Output = Self;
    fn div(self, rhs: f64) -> Self {
        Self(self.0 / rhs)
    }
}

/// Absolute time as seconds since 1970-01-01T00:00:00 UTC.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Epoch(pub f64);

impl Epoch {
    #[inline]
    pub fn offset(&self, by: Seconds) -> Epoch {
        Epoch(self.0 + by.0)
    }
}

/// Physical quantity measured by a set of units.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Quantity {
    Counts,
    Displacement,
    Velocity,
    Acceleration,
    #[default]
    Unspecified,
}

impl Quantity {
    /// Number of time derivatives of displacement, for motion quantities.
    pub fn time_order(&self) -> Option<i32> {
        match self {
            Quantity::Displacement => Some(0),
            Quantity::Velocity => Some(1),
            Quantity::Acceleration => Some(2),
            Quantity::Counts | Quantity::Unspecified => None,
        }
    }
}

/// Units of the ground-motion input of an instrument response.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Units {
    Counts,
    Nanometers,
    Micrometers,
    Millimeters,
    Meters,
    NanometersPerSecond,
    MicrometersPerSecond,
    MillimetersPerSecond,
    MetersPerSecond,
    NanometersPerSecondSquared,
    MicrometersPerSecondSquared,
    MillimetersPerSecondSquared,
    MetersPerSecondSquared,
    /// No units could be determined, e.g. for a composed From/To inverse.
    #[default]
    Unspecified,
}

impl Units {
    pub fn quantity(&self) -> Quantity {
        use Units::*;
        match self {
            Counts => Quantity::Counts,
            Nanometers | Micrometers | Millimeters | Meters => Quantity::Displacement,
            NanometersPerSecond | MicrometersPerSecond | MillimetersPerSecond | MetersPerSecond => {
                Quantity::Velocity
            }
            NanometersPerSecondSquared
            | MicrometersPerSecondSquared
            | MillimetersPerSecondSquared
            | MetersPerSecondSquared => Quantity::Acceleration,
            Unspecified => Quantity::Unspecified,
        }
    }

    /// Size of one unit expressed in the SI base unit of its quantity.
    pub fn si_scale(&self) -> f64 {
        use Units::*;
        match self {
            Nanometers | NanometersPerSecond | NanometersPerSecondSquared => 1e-9,
            Micrometers | MicrometersPerSecond | MicrometersPerSecondSquared => 1e-6,
            Millimeters | MillimetersPerSecond | MillimetersPerSecondSquared => 1e-3,
            Meters | MetersPerSecond | MetersPerSecondSquared | Counts | Unspecified => 1.0,
        }
    }

    /// Whether values in `self` can be rescaled into `other` without
    /// integration or differentiation.
    pub fn is_compatible(&self, other: &Units) -> bool {
        let q = self.quantity();
        q == other.quantity() && q.time_order().is_some()
    }

    /// Time-derivative steps from `self` to `other`: positive when `other` is
    /// `self` divided by time that many times.
    pub fn derivative_steps(&self, other: &Units) -> Option<i32> {
        let from = self.quantity().time_order()?;
        let to = other.quantity().time_order()?;
        Some(to - from)
    }

    pub fn symbol(&self) -> &'static str {
        use Units::*;
        match self {
            Counts => "counts",
            Nanometers => "nm",
            Micrometers => "um",
            Millimeters => "mm",
            Meters => "m",
            NanometersPerSecond => "nm/s",
            MicrometersPerSecond => "um/s",
            MillimetersPerSecond => "mm/s",
            MetersPerSecond => "m/s",
            NanometersPerSecondSquared => "nm/s^2",
            MicrometersPerSecondSquared => "um/s^2",
            MillimetersPerSecondSquared => "mm/s^2",
            MetersPerSecondSquared => "m/s^2",
            Unspecified => "unspecified",
        }
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Unrecognized unit symbol.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown units: {0}")]
pub struct UnknownUnits(pub String);

impl FromStr for Units {
    type Err = UnknownUnits;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use Units::*;
        let normalized = s.trim().to_ascii_lowercase().replace("/s/s", "/s^2").replace("/s**2", "/s^2");
        let units = match normalized.as_str() {
            "counts" | "count" | "du" => Counts,
            "nm" => Nanometers,
            "um" | "micron" => Micrometers,
            "mm" => Millimeters,
            "m" => Meters,
            "nm/s" => NanometersPerSecond,
            "um/s" => MicrometersPerSecond,
            "mm/s" => MillimetersPerSecond,
            "m/s" => MetersPerSecond,
            "nm/s^2" => NanometersPerSecondSquared,
            "um/s^2" => MicrometersPerSecondSquared,
            "mm/s^2" => MillimetersPerSecondSquared,
            "m/s^2" => MetersPerSecondSquared,
            "" | "unspecified" | "default" => Unspecified,
            _ => return Err(UnknownUnits(s.to_string())),
        };
        Ok(units)
    }
}

impl From<Units> for String {
    fn from(units: Units) -> String {
        units.symbol().to_string()
    }
}

impl TryFrom<String> for Units {
    type Error = UnknownUnits;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
