//! Storage trait for observation counters.
//!
//! A store owns every mutation of an observation record. Implementations
//! must make increment-or-create a single atomic step per
//! `(domain, discriminator, candidate)`: concurrent callers recording the
//! same key may neither create duplicates nor lose increments.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{
    domain::DomainKey,
    observation::{Observation, ObservationKey, ObservationMeta, Outcome},
};

/// Durable success/failure counters keyed by domain, discriminator and
/// candidate.
#[async_trait]
pub trait ObservationStore: Send + Sync {
    /// Record one outcome for a candidate.
    ///
    /// Creates the record with (1,0) or (0,1) on first sight, otherwise
    /// increments the matching counter and stamps `last_seen_at`. `meta` is
    /// applied on creation; discovered meta also promotes an existing
    /// heuristic record.
    ///
    /// Returns the record as it stands after the write.
    async fn record(
        &self,
        key: &ObservationKey,
        outcome: Outcome,
        meta: ObservationMeta,
    ) -> Result<Observation>;

    /// Record a successful sighting of a discovered candidate.
    async fn record_discovered(&self, key: &ObservationKey, score: i32) -> Result<Observation> {
        self.record(key, Outcome::Success, ObservationMeta::discovered(score))
            .await
    }

    /// All records for a domain, optionally scoped to one discriminator.
    async fn query(
        &self,
        domain: &DomainKey,
        discriminator: Option<&str>,
    ) -> Result<Vec<Observation>>;

    /// Every domain with at least one record, sorted.
    async fn domains(&self) -> Result<Vec<DomainKey>>;
}
