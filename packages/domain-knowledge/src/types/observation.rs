//! Observation records: one row of success/failure tallies per candidate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::domain::DomainKey;

/// Result of one attempt to use a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success,
    Failure,
}

impl Outcome {
    /// Build from a matched/not-matched flag.
    pub fn from_matched(matched: bool) -> Self {
        if matched {
            Outcome::Success
        } else {
            Outcome::Failure
        }
    }
}

/// How a selector candidate was first proposed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryMethod {
    /// Static, pre-authored extraction rule.
    #[default]
    Heuristic,
    /// Proposed by automated selector discovery.
    Discovered,
}

impl DiscoveryMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscoveryMethod::Heuristic => "heuristic",
            DiscoveryMethod::Discovered => "discovered",
        }
    }

    /// Parse a stored value; anything unrecognized is treated as heuristic.
    pub fn from_stored(raw: &str) -> Self {
        match raw {
            "discovered" => DiscoveryMethod::Discovered,
            _ => DiscoveryMethod::Heuristic,
        }
    }
}

impl fmt::Display for DiscoveryMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provenance attached when a candidate is first recorded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservationMeta {
    pub discovery_method: DiscoveryMethod,
    pub discovery_score: Option<i32>,
}

impl ObservationMeta {
    /// Meta for a candidate produced by a static rule.
    pub fn heuristic() -> Self {
        Self::default()
    }

    /// Meta for a candidate produced by selector discovery.
    pub fn discovered(score: i32) -> Self {
        Self {
            discovery_method: DiscoveryMethod::Discovered,
            discovery_score: Some(score),
        }
    }

    pub fn is_discovered(&self) -> bool {
        self.discovery_method == DiscoveryMethod::Discovered
    }
}

/// Identity of an observation record: unique per store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObservationKey {
    pub domain: DomainKey,
    pub discriminator: String,
    pub candidate: String,
}

impl ObservationKey {
    pub fn new(
        domain: impl Into<DomainKey>,
        discriminator: impl Into<String>,
        candidate: impl Into<String>,
    ) -> Self {
        Self {
            domain: domain.into(),
            discriminator: discriminator.into(),
            candidate: candidate.into(),
        }
    }
}

/// Success/failure tallies for one candidate on one domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub domain: DomainKey,

    /// Field name for selectors, `"category"` for categories.
    pub discriminator: String,

    /// Selector text or category value.
    pub candidate: String,

    pub success_count: u64,
    pub failure_count: u64,

    pub discovery_method: DiscoveryMethod,
    pub discovery_score: Option<i32>,

    pub created_at: DateTime<Utc>,

    /// Stamped on every recorded outcome.
    pub last_seen_at: DateTime<Utc>,
}

impl Observation {
    /// First sighting of a candidate.
    pub fn first(key: ObservationKey, outcome: Outcome, meta: ObservationMeta) -> Self {
        let now = Utc::now();
        let (success_count, failure_count) = match outcome {
            Outcome::Success => (1, 0),
            Outcome::Failure => (0, 1),
        };

        Self {
            domain: key.domain,
            discriminator: key.discriminator,
            candidate: key.candidate,
            success_count,
            failure_count,
            discovery_method: meta.discovery_method,
            discovery_score: meta.discovery_score,
            created_at: now,
            last_seen_at: now,
        }
    }

    /// Apply a further outcome to an existing record.
    ///
    /// Discovered meta promotes a heuristic record; heuristic meta never
    /// demotes a discovered one.
    pub fn apply(&mut self, outcome: Outcome, meta: ObservationMeta) {
        match outcome {
            Outcome::Success => self.success_count += 1,
            Outcome::Failure => self.failure_count += 1,
        }
        if meta.is_discovered() {
            self.discovery_method = DiscoveryMethod::Discovered;
            self.discovery_score = meta.discovery_score;
        }
        self.last_seen_at = Utc::now();
    }

    pub fn key(&self) -> ObservationKey {
        ObservationKey {
            domain: self.domain.clone(),
            discriminator: self.discriminator.clone(),
            candidate: self.candidate.clone(),
        }
    }

    pub fn total_samples(&self) -> u64 {
        self.success_count + self.failure_count
    }

    pub fn is_discovered(&self) -> bool {
        self.discovery_method == DiscoveryMethod::Discovered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> ObservationKey {
        ObservationKey::new("www.shop.pl", "name", "h1.title")
    }

    #[test]
    fn test_first_observation_counts() {
        let success = Observation::first(key(), Outcome::Success, ObservationMeta::heuristic());
        assert_eq!((success.success_count, success.failure_count), (1, 0));
        assert_eq!(success.domain.as_str(), "shop.pl");

        let failure = Observation::first(key(), Outcome::Failure, ObservationMeta::heuristic());
        assert_eq!((failure.success_count, failure.failure_count), (0, 1));
    }

    #[test]
    fn test_apply_promotes_but_never_demotes() {
        let mut obs = Observation::first(key(), Outcome::Success, ObservationMeta::heuristic());
        obs.apply(Outcome::Success, ObservationMeta::discovered(90));
        assert!(obs.is_discovered());
        assert_eq!(obs.discovery_score, Some(90));

        obs.apply(Outcome::Failure, ObservationMeta::heuristic());
        assert!(obs.is_discovered());
        assert_eq!(obs.discovery_score, Some(90));
        assert_eq!(obs.total_samples(), 3);
    }

    #[test]
    fn test_apply_stamps_last_seen() {
        let mut obs = Observation::first(key(), Outcome::Success, ObservationMeta::heuristic());
        let before = obs.last_seen_at;
        obs.apply(Outcome::Failure, ObservationMeta::heuristic());
        assert!(obs.last_seen_at >= before);
        assert_eq!(obs.created_at, before);
    }
}
