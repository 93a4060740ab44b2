//! Category ranking: confidence only.

use chrono::{DateTime, Utc};

use super::{best_of, eligible, sort_candidates, RankedCandidate, RankingPolicy};
use crate::types::{config::RankingConfig, observation::Observation};

/// Ranks category candidates for a domain.
#[derive(Debug, Clone)]
pub struct CategoryRankingPolicy {
    config: RankingConfig,
}

impl Default for CategoryRankingPolicy {
    fn default() -> Self {
        Self::new(RankingConfig::for_categories())
    }
}

impl CategoryRankingPolicy {
    pub fn new(config: RankingConfig) -> Self {
        Self { config }
    }

    /// Every surviving candidate, best first.
    pub fn ranked(&self, records: &[Observation]) -> Vec<RankedCandidate> {
        self.ranked_at(records, Utc::now())
    }

    pub fn ranked_at(&self, records: &[Observation], now: DateTime<Utc>) -> Vec<RankedCandidate> {
        let mut survivors = eligible(records, &self.config, now);
        sort_candidates(&mut survivors);
        survivors
    }
}

impl RankingPolicy for CategoryRankingPolicy {
    fn config(&self) -> &RankingConfig {
        &self.config
    }

    fn rank_at(&self, records: &[Observation], now: DateTime<Utc>) -> Option<RankedCandidate> {
        best_of(eligible(records, &self.config, now))
    }
}
