//! In-memory storage implementation for testing and development.

use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{KnowledgeError, Result};
use crate::traits::store::ObservationStore;
use crate::types::{
    domain::DomainKey,
    observation::{Observation, ObservationKey, ObservationMeta, Outcome},
};

/// In-memory observation store.
///
/// Useful for testing and development. Not suitable for production
/// as data is lost on restart.
pub struct MemoryStore {
    observations: RwLock<HashMap<ObservationKey, Observation>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create a new empty memory store.
    pub fn new() -> Self {
        Self {
            observations: RwLock::new(HashMap::new()),
        }
    }

    /// Seed the store with existing records, replacing any with the same key.
    pub fn with_observations(observations: impl IntoIterator<Item = Observation>) -> Self {
        Self {
            observations: RwLock::new(
                observations
                    .into_iter()
                    .map(|obs| (obs.key(), obs))
                    .collect(),
            ),
        }
    }

    /// Get the number of stored records.
    pub fn observation_count(&self) -> Result<usize> {
        Ok(self.read()?.len())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<ObservationKey, Observation>>> {
        self.observations
            .read()
            .map_err(|_| KnowledgeError::storage("observation lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<ObservationKey, Observation>>> {
        self.observations
            .write()
            .map_err(|_| KnowledgeError::storage("observation lock poisoned"))
    }
}

#[async_trait]
impl ObservationStore for MemoryStore {
    async fn record(
        &self,
        key: &ObservationKey,
        outcome: Outcome,
        meta: ObservationMeta,
    ) -> Result<Observation> {
        // The write guard spans lookup, insert and increment.
        let mut observations = self.write()?;
        let record = observations
            .entry(key.clone())
            .and_modify(|obs| obs.apply(outcome, meta))
            .or_insert_with(|| Observation::first(key.clone(), outcome, meta));
        Ok(record.clone())
    }

    async fn query(
        &self,
        domain: &DomainKey,
        discriminator: Option<&str>,
    ) -> Result<Vec<Observation>> {
        let observations = self.read()?;
        let mut matching: Vec<Observation> = observations
            .values()
            .filter(|obs| &obs.domain == domain)
            .filter(|obs| discriminator.map_or(true, |d| obs.discriminator == d))
            .cloned()
            .collect();

        // HashMap order is arbitrary; keep results stable across calls.
        matching.sort_by(|a, b| {
            (&a.discriminator, &a.candidate).cmp(&(&b.discriminator, &b.candidate))
        });
        Ok(matching)
    }

    async fn domains(&self) -> Result<Vec<DomainKey>> {
        let observations = self.read()?;
        let domains: BTreeSet<DomainKey> = observations.keys().map(|k| k.domain.clone()).collect();
        Ok(domains.into_iter().collect())
    }
}
