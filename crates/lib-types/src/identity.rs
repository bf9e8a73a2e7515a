//! Channel identity and matching policy.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Network/station/channel/location code of a recorded channel.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelIdentity {
    pub network: String,
    pub station: String,
    pub channel: String,
    #[serde(default)]
    pub location: String,
}

impl ChannelIdentity {
    pub fn new(
        network: impl Into<String>,
        station: impl Into<String>,
        channel: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            network: network.into(),
            station: station.into(),
            channel: channel.into(),
            location: location.into(),
        }
    }
}

impl fmt::Display for ChannelIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}.{}", self.network, self.station, self.location, self.channel)
    }
}

/// Which identity fields must agree for two requests to share a cached
/// response.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelMatchPolicy {
    /// Network, station, channel and location all take part.
    #[default]
    Exact,
    /// Location codes are ignored.
    IgnoreLocation,
    /// Only network and station take part; every channel of a station
    /// shares the response of its metadata.
    StationOnly,
}

impl ChannelMatchPolicy {
    /// The identity as seen through this policy, with ignored fields blanked.
    pub fn project(&self, identity: &ChannelIdentity) -> ChannelIdentity {
        match self {
            ChannelMatchPolicy::Exact => identity.clone(),
            ChannelMatchPolicy::IgnoreLocation => ChannelIdentity {
                location: String::new(),
                ..identity.clone()
            },
            ChannelMatchPolicy::StationOnly => ChannelIdentity {
                network: identity.network.clone(),
                station: identity.station.clone(),
                channel: String::new(),
                location: String::new(),
            },
        }
    }
}
