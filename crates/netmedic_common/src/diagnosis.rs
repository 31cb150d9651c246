//! Fuzzy diagnosis - probe snapshot to per-category suspicion scores
//!
//! Scores encode relative confidence, not probability. Several categories
//! can be suspected at once; a missing interface suspends all the others.

use crate::probes::ProbeSnapshot;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;

pub const WEIGHT_INTERFACE_MISSING: f64 = 1.0;
pub const WEIGHT_LINK_DOWN: f64 = 0.8;
pub const WEIGHT_NO_IPV4: f64 = 0.7;
pub const WEIGHT_NO_ROUTE: f64 = 0.6;
pub const WEIGHT_NO_INTERNET: f64 = 0.6;
/// Reachable but names don't resolve: unambiguous DNS fault
pub const WEIGHT_DNS_ISOLATED: f64 = 0.9;
/// Nothing reachable and names don't resolve: DNS may be collateral
pub const WEIGHT_DNS_COLLATERAL: f64 = 0.4;

/// Fault categories, in declaration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Suspicion {
    InterfaceMissing,
    LinkDown,
    NoIPv4,
    NoRoute,
    NoInternet,
    DnsBroken,
}

impl Suspicion {
    pub const ALL: [Suspicion; 6] = [
        Suspicion::InterfaceMissing,
        Suspicion::LinkDown,
        Suspicion::NoIPv4,
        Suspicion::NoRoute,
        Suspicion::NoInternet,
        Suspicion::DnsBroken,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Suspicion::InterfaceMissing => "interface_missing",
            Suspicion::LinkDown => "link_down",
            Suspicion::NoIPv4 => "no_ipv4",
            Suspicion::NoRoute => "no_route",
            Suspicion::NoInternet => "no_internet",
            Suspicion::DnsBroken => "dns_broken",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Suspicion::InterfaceMissing => "interface missing",
            Suspicion::LinkDown => "link down",
            Suspicion::NoIPv4 => "no IPv4 address",
            Suspicion::NoRoute => "no default route",
            Suspicion::NoInternet => "internet unreachable",
            Suspicion::DnsBroken => "DNS resolution broken",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Suspicion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Suspicion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Score for every suspicion, fixed at construction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Diagnosis {
    scores: [f64; 6],
}

impl Diagnosis {
    /// Combine a snapshot into scores
    pub fn from_snapshot(snapshot: &ProbeSnapshot) -> Self {
        let mut scores = [0.0; 6];

        if !snapshot.interface_exists {
            scores[Suspicion::InterfaceMissing.index()] = WEIGHT_INTERFACE_MISSING;
            return Self { scores };
        }

        if !snapshot.link_up {
            scores[Suspicion::LinkDown.index()] = WEIGHT_LINK_DOWN;
        }
        if !snapshot.has_ipv4 {
            scores[Suspicion::NoIPv4.index()] = WEIGHT_NO_IPV4;
        }
        if !snapshot.has_default_route {
            scores[Suspicion::NoRoute.index()] = WEIGHT_NO_ROUTE;
        }
        if !snapshot.ping_reachable {
            scores[Suspicion::NoInternet.index()] = WEIGHT_NO_INTERNET;
        }
        let dns = match (snapshot.ping_reachable, snapshot.dns_resolves) {
            (_, true) => 0.0,
            (true, false) => WEIGHT_DNS_ISOLATED,
            (false, false) => WEIGHT_DNS_COLLATERAL,
        };
        scores[Suspicion::DnsBroken.index()] = dns;

        Self { scores }
    }

    pub fn score(&self, suspicion: Suspicion) -> f64 {
        self.scores[suspicion.index()]
    }

    /// The terminal shape: nothing else is worth scoring
    pub fn interface_missing(&self) -> bool {
        self.score(Suspicion::InterfaceMissing) > 0.0
    }

    /// Every non-zero suspicion, in declaration order
    pub fn suspected(&self) -> Vec<(Suspicion, f64)> {
        Suspicion::ALL
            .iter()
            .map(|s| (*s, self.score(*s)))
            .filter(|(_, score)| *score > 0.0)
            .collect()
    }

    pub fn is_healthy(&self) -> bool {
        self.suspected().is_empty()
    }

    pub fn format_summary(&self) -> String {
        let suspected = self.suspected();
        if suspected.is_empty() {
            return "no faults suspected".to_string();
        }
        suspected
            .iter()
            .map(|(s, score)| format!("{}={:.1}", s, score))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Serialize for Diagnosis {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Suspicion::ALL.len()))?;
        for suspicion in Suspicion::ALL {
            map.serialize_entry(suspicion.as_str(), &self.score(suspicion))?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_snapshots() -> Vec<ProbeSnapshot> {
        (0u8..64)
            .map(|bits| {
                ProbeSnapshot::from_flags(
                    bits & 1 != 0,
                    bits & 2 != 0,
                    bits & 4 != 0,
                    bits & 8 != 0,
                    bits & 16 != 0,
                    bits & 32 != 0,
                )
            })
            .collect()
    }

    #[test]
    fn test_missing_interface_is_terminal() {
        for snapshot in all_snapshots().iter().filter(|s| !s.interface_exists) {
            let d = Diagnosis::from_snapshot(snapshot);
            assert_eq!(d.score(Suspicion::InterfaceMissing), 1.0);
            for s in &Suspicion::ALL[1..] {
                assert_eq!(d.score(*s), 0.0, "{} should be zero", s);
            }
        }
    }

    #[test]
    fn test_scores_within_unit_interval() {
        for snapshot in all_snapshots() {
            let d = Diagnosis::from_snapshot(&snapshot);
            for s in Suspicion::ALL {
                let score = d.score(s);
                assert!((0.0..=1.0).contains(&score), "{}={} out of range", s, score);
            }
        }
    }

    #[test]
    fn test_exactly_one_shape_holds() {
        for snapshot in all_snapshots() {
            let d = Diagnosis::from_snapshot(&snapshot);
            let missing = d.score(Suspicion::InterfaceMissing);
            if snapshot.interface_exists {
                assert_eq!(missing, 0.0);
            } else {
                assert_eq!(missing, 1.0);
                assert_eq!(d.suspected().len(), 1);
            }
        }
    }

    #[test]
    fn test_all_probes_pass_means_healthy() {
        let d = Diagnosis::from_snapshot(&ProbeSnapshot::healthy());
        assert!(d.is_healthy());
        assert_eq!(d.format_summary(), "no faults suspected");
    }

    #[test]
    fn test_dns_split() {
        for snapshot in all_snapshots().iter().filter(|s| s.interface_exists) {
            let dns = Diagnosis::from_snapshot(snapshot).score(Suspicion::DnsBroken);
            match (snapshot.ping_reachable, snapshot.dns_resolves) {
                (true, false) => assert_eq!(dns, 0.9),
                (false, false) => assert_eq!(dns, 0.4),
                (_, true) => assert_eq!(dns, 0.0),
            }
        }
    }

    #[test]
    fn test_independent_weights() {
        let snapshot = ProbeSnapshot::from_flags(true, false, false, false, false, true);
        let d = Diagnosis::from_snapshot(&snapshot);
        assert_eq!(d.score(Suspicion::LinkDown), 0.8);
        assert_eq!(d.score(Suspicion::NoIPv4), 0.7);
        assert_eq!(d.score(Suspicion::NoRoute), 0.6);
        assert_eq!(d.score(Suspicion::NoInternet), 0.6);
        assert_eq!(d.score(Suspicion::DnsBroken), 0.0);
        assert_eq!(
            d.format_summary(),
            "link_down=0.8, no_ipv4=0.7, no_route=0.6, no_internet=0.6"
        );
    }

    #[test]
    fn test_serializes_every_category() {
        let snapshot = ProbeSnapshot::from_flags(true, true, true, true, true, false);
        let d = Diagnosis::from_snapshot(&snapshot);
        let json = serde_json::to_value(d).unwrap();
        assert_eq!(json["dns_broken"], 0.9);
        assert_eq!(json["interface_missing"], 0.0);
        assert_eq!(json.as_object().unwrap().len(), 6);
    }
}
