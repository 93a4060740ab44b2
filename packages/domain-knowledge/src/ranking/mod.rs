//! Candidate ranking.
//!
//! Every policy first gates candidates (enough samples, a high enough
//! Wilson lower bound, optionally seen recently enough) and then picks a
//! single winner among the survivors. Ranking is a pure read: empty or fully
//! gated input is `None`, never an error.

pub mod category;
pub mod selector;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::confidence::wilson_lower_bound;
use crate::types::{config::RankingConfig, observation::Observation};

pub use category::CategoryRankingPolicy;
pub use selector::SelectorRankingPolicy;

/// A candidate that passed gating, with the confidence it was ranked on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCandidate {
    pub observation: Observation,
    pub confidence: f64,
}

impl RankedCandidate {
    pub fn candidate(&self) -> &str {
        &self.observation.candidate
    }

    pub fn total_samples(&self) -> u64 {
        self.observation.total_samples()
    }
}

/// Picks the best candidate for one discriminator.
pub trait RankingPolicy: Send + Sync {
    /// Gating thresholds this policy applies.
    fn config(&self) -> &RankingConfig;

    /// Best candidate among `records` as of `now`.
    ///
    /// `records` are expected to share one domain and discriminator.
    fn rank_at(&self, records: &[Observation], now: DateTime<Utc>) -> Option<RankedCandidate>;

    /// Best candidate among `records`.
    fn rank(&self, records: &[Observation]) -> Option<RankedCandidate> {
        self.rank_at(records, Utc::now())
    }

    /// Best candidate per discriminator.
    ///
    /// Every requested discriminator gets an entry; `None` means no
    /// candidate survived gating.
    fn rank_all(
        &self,
        records: &[Observation],
        discriminators: &[&str],
    ) -> BTreeMap<String, Option<RankedCandidate>> {
        self.rank_all_at(records, discriminators, Utc::now())
    }

    /// [`RankingPolicy::rank_all`] as of `now`.
    fn rank_all_at(
        &self,
        records: &[Observation],
        discriminators: &[&str],
        now: DateTime<Utc>,
    ) -> BTreeMap<String, Option<RankedCandidate>> {
        discriminators
            .iter()
            .map(|d| {
                let scoped: Vec<Observation> = records
                    .iter()
                    .filter(|obs| obs.discriminator == *d)
                    .cloned()
                    .collect();
                (d.to_string(), self.rank_at(&scoped, now))
            })
            .collect()
    }
}

/// Candidates that pass the sample, confidence and staleness gates.
pub fn eligible(
    records: &[Observation],
    config: &RankingConfig,
    now: DateTime<Utc>,
) -> Vec<RankedCandidate> {
    let min_samples = config.effective_min_samples();
    let cutoff = config.stale_cutoff(now);

    records
        .iter()
        .filter(|obs| obs.total_samples() >= min_samples)
        .filter(|obs| cutoff.map_or(true, |c| obs.last_seen_at >= c))
        .filter_map(|obs| {
            let confidence =
                wilson_lower_bound(obs.success_count, obs.failure_count, config.z_score);
            (confidence >= config.min_confidence).then(|| RankedCandidate {
                observation: obs.clone(),
                confidence,
            })
        })
        .collect()
}

/// Ordering with the better candidate first.
///
/// Higher confidence, then more samples, then more recently seen, then
/// candidate text so results are deterministic.
pub fn compare_candidates(a: &RankedCandidate, b: &RankedCandidate) -> Ordering {
    b.confidence
        .partial_cmp(&a.confidence)
        .unwrap_or(Ordering::Equal)
        .then_with(|| b.total_samples().cmp(&a.total_samples()))
        .then_with(|| b.observation.last_seen_at.cmp(&a.observation.last_seen_at))
        .then_with(|| a.candidate().cmp(b.candidate()))
}

/// Sort best-first in place.
pub fn sort_candidates(candidates: &mut [RankedCandidate]) {
    candidates.sort_by(compare_candidates);
}

/// The best of `candidates`, if any.
pub fn best_of(candidates: impl IntoIterator<Item = RankedCandidate>) -> Option<RankedCandidate> {
    candidates
        .into_iter()
        .min_by(compare_candidates)
}
