//! Selector ranking: discovered selectors beat heuristic ones.

use chrono::{DateTime, Utc};

use super::{best_of, eligible, RankedCandidate, RankingPolicy};
use crate::types::{config::RankingConfig, observation::Observation};

/// Ranks CSS selector candidates for one field.
///
/// Among candidates that pass gating, any discovered selector wins over
/// every heuristic one, even a heuristic with higher confidence. Within a
/// group the usual confidence / samples / recency ordering applies.
#[derive(Debug, Clone)]
pub struct SelectorRankingPolicy {
    config: RankingConfig,
}

impl Default for SelectorRankingPolicy {
    fn default() -> Self {
        Self::new(RankingConfig::for_selectors())
    }
}

impl SelectorRankingPolicy {
    pub fn new(config: RankingConfig) -> Self {
        Self { config }
    }
}

impl RankingPolicy for SelectorRankingPolicy {
    fn config(&self) -> &RankingConfig {
        &self.config
    }

    fn rank_at(&self, records: &[Observation], now: DateTime<Utc>) -> Option<RankedCandidate> {
        let (discovered, heuristic): (Vec<_>, Vec<_>) = eligible(records, &self.config, now)
            .into_iter()
            .partition(|c| c.observation.is_discovered());

        if discovered.is_empty() {
            best_of(heuristic)
        } else {
            best_of(discovered)
        }
    }
}
