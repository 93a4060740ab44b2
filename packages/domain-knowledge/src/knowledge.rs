//! `DomainKnowledge` - main entry point for the library.
//!
//! Wraps an [`ObservationStore`] with the two ranking policies and exposes
//! the operations the host API calls: record what the extension saw, and
//! ask what has been learned about a domain.
//!
//! Raw inputs come from many independently-updated extension builds, so
//! unknown fields, unknown categories, blank selectors and blank domains are
//! dropped quietly (`Ok(None)`) instead of failing the request.

use chrono::Utc;
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::error::Result;
use crate::ranking::{
    eligible, CategoryRankingPolicy, RankedCandidate, RankingPolicy, SelectorRankingPolicy,
};
use crate::traits::store::ObservationStore;
use crate::types::{
    config::KnowledgeConfig,
    domain::DomainKey,
    field::{Category, TrackableField, CATEGORY_DISCRIMINATOR},
    observation::{Observation, ObservationKey, ObservationMeta, Outcome},
    report::{CategoryGuess, FieldStats, SelectorReport, SelectorStats},
};

/// Learned selectors and categories per shopping domain.
///
/// # Example
///
/// ```rust,ignore
/// let knowledge = DomainKnowledge::new(MemoryStore::new());
///
/// knowledge
///     .record_selector_outcome("www.shop.pl", "name", "h1.title", Outcome::Success)
///     .await?;
///
/// let report = knowledge.best_selectors("shop.pl").await?;
/// let name_selector = report.selector(TrackableField::Name);
/// ```
pub struct DomainKnowledge<S: ObservationStore> {
    store: S,
    config: KnowledgeConfig,
    selector_policy: SelectorRankingPolicy,
    category_policy: CategoryRankingPolicy,
}

impl<S: ObservationStore> DomainKnowledge<S> {
    /// Create with default thresholds.
    pub fn new(store: S) -> Self {
        Self::with_config(store, KnowledgeConfig::default())
    }

    /// Create with custom configuration.
    pub fn with_config(store: S, config: KnowledgeConfig) -> Self {
        Self {
            store,
            selector_policy: SelectorRankingPolicy::new(config.selector.clone()),
            category_policy: CategoryRankingPolicy::new(config.category.clone()),
            config,
        }
    }

    /// Get a reference to the configuration.
    pub fn config(&self) -> &KnowledgeConfig {
        &self.config
    }

    /// Get a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    // =========================================================================
    // Ingestion
    // =========================================================================

    /// Record whether `selector` matched `field` on `domain`.
    pub async fn record_selector_outcome(
        &self,
        domain: &str,
        field: &str,
        selector: &str,
        outcome: Outcome,
    ) -> Result<Option<Observation>> {
        let Some(key) = selector_key(domain, field, selector) else {
            return Ok(None);
        };
        let observation = self
            .store
            .record(&key, outcome, ObservationMeta::heuristic())
            .await?;

        debug!(
            domain = %key.domain,
            field = %key.discriminator,
            successes = observation.success_count,
            failures = observation.failure_count,
            "selector outcome recorded"
        );
        Ok(Some(observation))
    }

    /// Record a selector proposed by automated discovery, with its quality
    /// score. Counts as a success.
    pub async fn record_discovered_selector(
        &self,
        domain: &str,
        field: &str,
        selector: &str,
        score: i32,
    ) -> Result<Option<Observation>> {
        let Some(key) = selector_key(domain, field, selector) else {
            return Ok(None);
        };
        let observation = self.store.record_discovered(&key, score).await?;

        debug!(
            domain = %key.domain,
            field = %key.discriminator,
            score,
            "discovered selector recorded"
        );
        Ok(Some(observation))
    }

    /// Record that a user accepted (success) or overrode (failure) a
    /// category for a domain.
    pub async fn record_category_outcome(
        &self,
        domain: &str,
        category: &str,
        outcome: Outcome,
    ) -> Result<Option<Observation>> {
        let domain_key = DomainKey::normalize(domain);
        if domain_key.is_empty() {
            debug!("ignoring category outcome without a domain");
            return Ok(None);
        }
        let Some(category) = Category::parse(category) else {
            debug!(domain = %domain_key, category, "ignoring unknown category");
            return Ok(None);
        };

        let key = ObservationKey {
            domain: domain_key,
            discriminator: CATEGORY_DISCRIMINATOR.to_string(),
            candidate: category.as_str().to_string(),
        };
        let observation = self
            .store
            .record(&key, outcome, ObservationMeta::heuristic())
            .await?;
        Ok(Some(observation))
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Best known selector for every trackable field of `domain`.
    pub async fn best_selectors(&self, domain: &str) -> Result<SelectorReport> {
        let domain = DomainKey::normalize(domain);
        let records = self.store.query(&domain, None).await?;
        let now = Utc::now();

        let mut winners = self.selector_policy.rank_all_at(
            &records,
            &TrackableField::discriminators(),
            now,
        );

        let mut selectors = BTreeMap::new();
        let mut stats = SelectorStats::default();

        for field in TrackableField::ALL {
            let scoped: Vec<Observation> = records
                .iter()
                .filter(|obs| obs.discriminator == field.as_str())
                .cloned()
                .collect();
            if scoped.is_empty() {
                continue;
            }

            let winner = winners.remove(field.as_str()).flatten();
            let summary = field_stats(
                &scoped,
                eligible(&scoped, self.selector_policy.config(), now).len(),
                winner.as_ref(),
            );

            stats.total_candidates += summary.candidates;
            stats.discovered_candidates += summary.discovered;
            stats.heuristic_candidates += summary.heuristic;
            stats.fields.insert(field, summary);

            if let Some(winner) = winner {
                selectors.insert(field, winner.observation.candidate);
            }
        }

        debug!(
            domain = %domain,
            resolved = selectors.len(),
            candidates = stats.total_candidates,
            "selector report built"
        );

        Ok(SelectorReport {
            domain,
            selectors,
            stats,
        })
    }

    /// Most reliable category for `domain`, if any candidate passes gating.
    pub async fn top_category(&self, domain: &str) -> Result<Option<CategoryGuess>> {
        let records = self.category_records(domain).await?;
        Ok(self
            .category_policy
            .rank(&records)
            .and_then(|winner| category_guess(&winner)))
    }

    /// Every plausible category for `domain`, best first.
    pub async fn all_categories(&self, domain: &str) -> Result<Vec<CategoryGuess>> {
        let records = self.category_records(domain).await?;
        Ok(self
            .category_policy
            .ranked(&records)
            .iter()
            .filter_map(category_guess)
            .collect())
    }

    /// Every domain the engine holds observations for.
    pub async fn known_domains(&self) -> Result<Vec<DomainKey>> {
        self.store.domains().await
    }

    /// Category records for `domain`, minus values outside the category set
    /// (rows written by older deployments).
    async fn category_records(&self, domain: &str) -> Result<Vec<Observation>> {
        let domain = DomainKey::normalize(domain);
        let records = self
            .store
            .query(&domain, Some(CATEGORY_DISCRIMINATOR))
            .await?;

        Ok(records
            .into_iter()
            .filter(|obs| {
                let known = Category::parse(&obs.candidate).is_some();
                if !known {
                    warn!(
                        domain = %obs.domain,
                        value = %obs.candidate,
                        "skipping stored category outside the category set"
                    );
                }
                known
            })
            .collect())
    }
}

fn selector_key(domain: &str, field: &str, selector: &str) -> Option<ObservationKey> {
    let domain = DomainKey::normalize(domain);
    if domain.is_empty() {
        debug!("ignoring selector outcome without a domain");
        return None;
    }
    let Some(field) = TrackableField::parse(field) else {
        debug!(domain = %domain, field, "ignoring untracked field");
        return None;
    };
    let selector = selector.trim();
    if selector.is_empty() {
        debug!(domain = %domain, field = %field, "ignoring blank selector");
        return None;
    }

    Some(ObservationKey {
        domain,
        discriminator: field.as_str().to_string(),
        candidate: selector.to_string(),
    })
}

fn field_stats(
    records: &[Observation],
    eligible: usize,
    winner: Option<&RankedCandidate>,
) -> FieldStats {
    let discovered = records.iter().filter(|obs| obs.is_discovered()).count();

    FieldStats {
        candidates: records.len(),
        discovered,
        heuristic: records.len() - discovered,
        eligible,
        best_selector: winner.map(|w| w.observation.candidate.clone()),
        best_confidence: winner.map(|w| w.confidence),
        best_method: winner.map(|w| w.observation.discovery_method),
        best_samples: winner.map(|w| w.total_samples()),
    }
}

fn category_guess(candidate: &RankedCandidate) -> Option<CategoryGuess> {
    Category::parse(candidate.candidate()).map(|category| CategoryGuess {
        category,
        confidence: candidate.confidence,
        samples: candidate.total_samples(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::MemoryStore;
    use crate::testing::{FailingStore, ObservationBuilder};
    use crate::types::config::RankingConfig;
    use crate::types::observation::DiscoveryMethod;
    use crate::KnowledgeError;

    async fn record_n(
        knowledge: &DomainKnowledge<MemoryStore>,
        domain: &str,
        field: &str,
        selector: &str,
        successes: u64,
        failures: u64,
    ) {
        for _ in 0..successes {
            knowledge
                .record_selector_outcome(domain, field, selector, Outcome::Success)
                .await
                .unwrap();
        }
        for _ in 0..failures {
            knowledge
                .record_selector_outcome(domain, field, selector, Outcome::Failure)
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_discovered_selector_wins_end_to_end() {
        let knowledge = DomainKnowledge::new(MemoryStore::new());

        record_n(&knowledge, "shop.pl", "name", "h1.title", 10, 0).await;
        knowledge
            .record_discovered_selector("shop.pl", "name", "h1.product-name", 90)
            .await
            .unwrap();
        record_n(&knowledge, "shop.pl", "name", "h1.product-name", 4, 1).await;

        let report = knowledge.best_selectors("shop.pl").await.unwrap();
        assert_eq!(report.selector(TrackableField::Name), Some("h1.product-name"));

        let name_stats = &report.stats.fields[&TrackableField::Name];
        assert_eq!(name_stats.candidates, 2);
        assert_eq!(name_stats.discovered, 1);
        assert_eq!(name_stats.heuristic, 1);
        assert_eq!(name_stats.eligible, 2);
        assert_eq!(name_stats.best_method, Some(DiscoveryMethod::Discovered));
        assert_eq!(name_stats.best_samples, Some(6));
    }

    #[tokio::test]
    async fn test_fields_without_winner_are_absent() {
        let knowledge = DomainKnowledge::new(MemoryStore::new());
        record_n(&knowledge, "shop.pl", "name", "h1", 10, 0).await;
        record_n(&knowledge, "shop.pl", "price", ".price", 1, 0).await;

        let report = knowledge.best_selectors("www.SHOP.pl").await.unwrap();
        assert_eq!(report.domain.as_str(), "shop.pl");
        assert_eq!(report.selectors.len(), 1);
        assert!(report.selector(TrackableField::Price).is_none());

        // Price is still visible in diagnostics.
        let price = &report.stats.fields[&TrackableField::Price];
        assert_eq!(price.eligible, 0);
        assert!(price.best_selector.is_none());
        assert_eq!(report.stats.total_candidates, 2);
    }

    #[tokio::test]
    async fn test_invalid_input_is_silently_dropped() {
        let knowledge = DomainKnowledge::new(MemoryStore::new());

        let dropped = [
            knowledge
                .record_selector_outcome("shop.pl", "shoe_size", "h1", Outcome::Success)
                .await
                .unwrap(),
            knowledge
                .record_selector_outcome("shop.pl", "name", "   ", Outcome::Success)
                .await
                .unwrap(),
            knowledge
                .record_selector_outcome("  ", "name", "h1", Outcome::Success)
                .await
                .unwrap(),
            knowledge
                .record_discovered_selector("shop.pl", "", "h1", 50)
                .await
                .unwrap(),
            knowledge
                .record_category_outcome("shop.pl", "spaceships", Outcome::Success)
                .await
                .unwrap(),
        ];

        assert!(dropped.iter().all(Option::is_none));
        assert_eq!(knowledge.store().observation_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_category_gating() {
        let knowledge = DomainKnowledge::new(MemoryStore::new());
        for _ in 0..3 {
            knowledge
                .record_category_outcome("lamps.com", "lighting", Outcome::Success)
                .await
                .unwrap();
        }
        for _ in 0..7 {
            knowledge
                .record_category_outcome("lamps.com", "lighting", Outcome::Failure)
                .await
                .unwrap();
        }
        assert!(knowledge.top_category("lamps.com").await.unwrap().is_none());
        assert!(knowledge.all_categories("lamps.com").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_top_category_and_alternatives() {
        let store = MemoryStore::with_observations([
            ObservationBuilder::new("lamps.com", "category", "lighting").counts(20, 1).build(),
            ObservationBuilder::new("lamps.com", "category", "decor").counts(15, 5).build(),
            ObservationBuilder::new("lamps.com", "category", "outdoor").counts(1, 4).build(),
        ]);
        let knowledge = DomainKnowledge::new(store);

        let top = knowledge.top_category("https://www.lamps.com/p/1").await.unwrap().unwrap();
        assert_eq!(top.category, Category::Lighting);
        assert!(top.confidence > 0.7);
        assert_eq!(top.samples, 21);

        let all = knowledge.all_categories("lamps.com").await.unwrap();
        let categories: Vec<Category> = all.iter().map(|g| g.category).collect();
        assert_eq!(categories, vec![Category::Lighting, Category::Decor]);
    }

    #[tokio::test]
    async fn test_stored_garbage_category_is_skipped() {
        let store = MemoryStore::with_observations([
            ObservationBuilder::new("lamps.com", "category", "legacy_value").counts(50, 0).build(),
            ObservationBuilder::new("lamps.com", "category", "lighting").counts(20, 1).build(),
        ]);
        let knowledge = DomainKnowledge::new(store);

        let all = knowledge.all_categories("lamps.com").await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].category, Category::Lighting);

        let top = knowledge.top_category("lamps.com").await.unwrap().unwrap();
        assert_eq!(top.category, Category::Lighting);
    }

    #[tokio::test]
    async fn test_custom_config_is_applied() {
        let config = KnowledgeConfig::new()
            .with_category(RankingConfig::for_categories().with_min_confidence(0.05));
        let store = MemoryStore::with_observations([ObservationBuilder::new(
            "lamps.com",
            "category",
            "lighting",
        )
        .counts(3, 7)
        .build()]);
        let knowledge = DomainKnowledge::with_config(store, config);

        let top = knowledge.top_category("lamps.com").await.unwrap();
        assert_eq!(top.map(|g| g.category), Some(Category::Lighting));
    }

    #[tokio::test]
    async fn test_report_matches_rank_all_over_fields() {
        let store = MemoryStore::with_observations([
            ObservationBuilder::new("shop.pl", "name", "h1.title").counts(20, 1).build(),
            ObservationBuilder::new("shop.pl", "name", "h1.product-name")
                .counts(5, 1)
                .discovered(90)
                .build(),
            ObservationBuilder::new("shop.pl", "price", ".price").counts(9, 1).build(),
            ObservationBuilder::new("shop.pl", "brand", ".brand").counts(1, 0).build(),
            ObservationBuilder::new("shop.pl", "category", "lighting").counts(30, 0).build(),
        ]);
        let knowledge = DomainKnowledge::new(store);

        let records = knowledge
            .store()
            .query(&DomainKey::normalize("shop.pl"), None)
            .await
            .unwrap();
        let expected: BTreeMap<TrackableField, String> = knowledge
            .selector_policy
            .rank_all(&records, &TrackableField::discriminators())
            .into_iter()
            .filter_map(|(field, winner)| {
                Some((TrackableField::parse(&field)?, winner?.observation.candidate))
            })
            .collect();

        let report = knowledge.best_selectors("shop.pl").await.unwrap();
        assert_eq!(report.selectors, expected);
        assert_eq!(report.selector(TrackableField::Name), Some("h1.product-name"));
        assert_eq!(report.selector(TrackableField::Price), Some(".price"));
        assert!(report.selector(TrackableField::Brand).is_none());
        assert!(report.stats.fields.contains_key(&TrackableField::Brand));
        assert_eq!(report.stats.total_candidates, 4);
    }

    #[tokio::test]
    async fn test_storage_failure_propagates() {
        let knowledge = DomainKnowledge::new(FailingStore::new());

        let err = knowledge
            .record_selector_outcome("shop.pl", "name", "h1", Outcome::Success)
            .await
            .unwrap_err();
        assert!(matches!(err, KnowledgeError::Storage(_)));
        assert!(knowledge.best_selectors("shop.pl").await.is_err());
        assert!(knowledge.top_category("shop.pl").await.is_err());

        // Invalid input never reaches the store.
        let dropped = knowledge
            .record_category_outcome("shop.pl", "spaceships", Outcome::Success)
            .await
            .unwrap();
        assert!(dropped.is_none());
        assert_eq!(knowledge.store().call_count(), 3);
    }
}
