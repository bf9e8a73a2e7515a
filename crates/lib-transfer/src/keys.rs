//! Cache keys for forward and inverse transfer functions.
//!
//! Keys compare and hash structurally over every field, floats by bit
//! pattern. Sample rates are expected to be standardized before a key is
//! built so that nearly equal rates share an entry.

use lib_types::{ChannelIdentity, ChannelMatchPolicy, Epoch, FreqLimits, ResponseMetadata, Units};
use std::hash::{Hash, Hasher};

/// Key of a forward transfer function.
#[derive(Clone, Debug, PartialEq)]
pub struct FromKey {
    pub nfft: usize,
    pub sample_rate: f64,
    /// Identity as projected by `match_policy`.
    pub identity: ChannelIdentity,
    pub metadata: ResponseMetadata,
    pub match_policy: ChannelMatchPolicy,
}

impl FromKey {
    pub fn new(
        nfft: usize,
        sample_rate: f64,
        identity: &ChannelIdentity,
        metadata: &ResponseMetadata,
        match_policy: ChannelMatchPolicy,
    ) -> Self {
        Self {
            nfft,
            sample_rate,
            identity: match_policy.project(identity),
            metadata: metadata.clone(),
            match_policy,
        }
    }

    /// Whether the metadata behind this key is valid at `time`.
    pub fn contains(&self, time: Epoch) -> bool {
        self.metadata.contains(time)
    }
}

impl Eq for FromKey {}

impl Hash for FromKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.nfft.hash(state);
        self.sample_rate.to_bits().hash(state);
        self.identity.hash(state);
        self.metadata.hash(state);
        self.match_policy.hash(state);
    }
}

/// Key of an inverse transfer function.
#[derive(Clone, Debug, PartialEq)]
pub struct ToKey {
    pub from: FromKey,
    pub limits: Option<FreqLimits>,
    pub requested_units: Units,
    pub forced_input_units: Option<Units>,
    /// Second response composed into the inverse, if any.
    pub target: Option<ResponseMetadata>,
}

impl ToKey {
    pub fn new(
        from: FromKey,
        limits: Option<FreqLimits>,
        requested_units: Units,
        forced_input_units: Option<Units>,
    ) -> Self {
        Self {
            from,
            limits,
            requested_units,
            forced_input_units,
            target: None,
        }
    }

    pub fn with_target(mut self, target: &ResponseMetadata) -> Self {
        self.target = Some(target.clone());
        self
    }

    /// Valid only while both the source and any target metadata are.
    pub fn contains(&self, time: Epoch) -> bool {
        self.from.contains(time) && self.target.as_ref().map_or(true, |t| t.contains(time))
    }
}

impl Eq for ToKey {}

impl Hash for ToKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.from.hash(state);
        match &self.limits {
            Some(limits) => {
                1u8.hash(state);
                for corner in limits.as_array() {
                    corner.to_bits().hash(state);
                }
            }
            None => 0u8.hash(state),
        }
        self.requested_units.hash(state);
        self.forced_input_units.hash(state);
        self.target.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lib_types::{ResponseSource, ResponseType, TimeWindow};
    use std::collections::HashMap;

    fn metadata() -> ResponseMetadata {
        ResponseMetadata::new(
            1,
            ResponseType::Paz,
            ResponseSource::NdcText { text: "x".into() },
        )
        .with_validity(TimeWindow::new(Some(Epoch(0.0)), Some(Epoch(100.0))))
    }

    #[test]
    fn test_policy_controls_sharing() {
        let a = ChannelIdentity::new("IU", "ANMO", "BHZ", "00");
        let b = ChannelIdentity::new("IU", "ANMO", "BHZ", "10");
        let meta = metadata();

        let exact_a = FromKey::new(1024, 40.0, &a, &meta, ChannelMatchPolicy::Exact);
        let exact_b = FromKey::new(1024, 40.0, &b, &meta, ChannelMatchPolicy::Exact);
        assert_ne!(exact_a, exact_b);

        let loose_a = FromKey::new(1024, 40.0, &a, &meta, ChannelMatchPolicy::IgnoreLocation);
        let loose_b = FromKey::new(1024, 40.0, &b, &meta, ChannelMatchPolicy::IgnoreLocation);
        assert_eq!(loose_a, loose_b);

        let mut map = HashMap::new();
        map.insert(loose_a, 1);
        assert_eq!(map.get(&loose_b), Some(&1));
    }

    #[test]
    fn test_to_key_fields() {
        let id = ChannelIdentity::new("IU", "ANMO", "BHZ", "00");
        let from = FromKey::new(1024, 40.0, &id, &metadata(), ChannelMatchPolicy::Exact);
        let limits = FreqLimits::new(0.01, 0.02, 8.0, 9.0).unwrap();

        let a = ToKey::new(from.clone(), Some(limits), Units::Meters, None);
        let b = ToKey::new(from.clone(), Some(limits), Units::Meters, None);
        let c = ToKey::new(from.clone(), None, Units::Meters, None);
        let d = ToKey::new(from, Some(limits), Units::Meters, Some(Units::Micrometers));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);

        let mut map = HashMap::new();
        map.insert(a, "inverse");
        assert_eq!(map.get(&b), Some(&"inverse"));
        assert_eq!(map.get(&c), None);
    }

    #[test]
    fn test_validity() {
        let id = ChannelIdentity::new("IU", "ANMO", "BHZ", "00");
        let from = FromKey::new(1024, 40.0, &id, &metadata(), ChannelMatchPolicy::Exact);
        assert!(from.contains(Epoch(50.0)));
        assert!(!from.contains(Epoch(150.0)));

        let expired_target = metadata().with_validity(TimeWindow::new(None, Some(Epoch(10.0))));
        let to = ToKey::new(from, None, Units::Meters, None).with_target(&expired_target);
        assert!(!to.contains(Epoch(50.0)));
    }
}
