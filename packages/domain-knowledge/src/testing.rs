//! Testing utilities including fixtures and failing stores.
//!
//! Useful for testing applications that embed the knowledge engine without
//! standing up a database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{KnowledgeError, Result};
use crate::traits::store::ObservationStore;
use crate::types::{
    domain::DomainKey,
    observation::{DiscoveryMethod, Observation, ObservationKey, ObservationMeta, Outcome},
};

/// Builds observation records with arbitrary counts.
///
/// ```rust,ignore
/// let obs = ObservationBuilder::new("shop.pl", "name", "h1.title")
///     .counts(20, 2)
///     .discovered(90)
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ObservationBuilder {
    observation: Observation,
}

impl ObservationBuilder {
    pub fn new(domain: &str, discriminator: &str, candidate: &str) -> Self {
        let mut observation = Observation::first(
            ObservationKey::new(domain, discriminator, candidate),
            Outcome::Success,
            ObservationMeta::heuristic(),
        );
        observation.success_count = 0;
        Self { observation }
    }

    pub fn counts(mut self, successes: u64, failures: u64) -> Self {
        self.observation.success_count = successes;
        self.observation.failure_count = failures;
        self
    }

    pub fn discovered(mut self, score: i32) -> Self {
        self.observation.discovery_method = DiscoveryMethod::Discovered;
        self.observation.discovery_score = Some(score);
        self
    }

    pub fn last_seen(mut self, at: DateTime<Utc>) -> Self {
        self.observation.last_seen_at = at;
        if self.observation.created_at > at {
            self.observation.created_at = at;
        }
        self
    }

    pub fn build(self) -> Observation {
        self.observation
    }
}

/// A store whose every operation fails, for exercising error paths.
#[derive(Debug, Default)]
pub struct FailingStore {
    calls: AtomicUsize,
}

impl FailingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of store calls attempted so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn fail<T>(&self) -> Result<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(KnowledgeError::storage("database unavailable"))
    }
}

#[async_trait]
impl ObservationStore for FailingStore {
    async fn record(
        &self,
        _key: &ObservationKey,
        _outcome: Outcome,
        _meta: ObservationMeta,
    ) -> Result<Observation> {
        self.fail()
    }

    async fn query(
        &self,
        _domain: &DomainKey,
        _discriminator: Option<&str>,
    ) -> Result<Vec<Observation>> {
        self.fail()
    }

    async fn domains(&self) -> Result<Vec<DomainKey>> {
        self.fail()
    }
}
