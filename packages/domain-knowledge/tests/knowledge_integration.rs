//! Integration tests for the ingestion and query paths.
//!
//! These tests drive `DomainKnowledge` the way the web API does:
//! 1. Record selector and category outcomes from extension events
//! 2. Ask for the best selectors and categories for a domain
//! 3. Check gating, discovery priority and idempotent reads

use std::sync::Arc;

use domain_knowledge::{
    Category, DiscoveryMethod, DomainKnowledge, KnowledgeConfig, MemoryStore, ObservationStore,
    Outcome, RankingConfig, TrackableField,
};

/// Helper to replay `successes` then `failures` for one selector.
async fn replay_selector<S: ObservationStore>(
    knowledge: &DomainKnowledge<S>,
    domain: &str,
    field: &str,
    selector: &str,
    successes: usize,
    failures: usize,
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

/// Helper to replay category feedback.
async fn replay_category<S: ObservationStore>(
    knowledge: &DomainKnowledge<S>,
    domain: &str,
    category: &str,
    successes: usize,
    failures: usize,
) {
    for _ in 0..successes {
        knowledge
            .record_category_outcome(domain, category, Outcome::Success)
            .await
            .unwrap();
    }
    for _ in 0..failures {
        knowledge
            .record_category_outcome(domain, category, Outcome::Failure)
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn test_discovered_selector_replaces_heuristic_for_shop() {
    let knowledge = DomainKnowledge::new(MemoryStore::new());

    replay_selector(&knowledge, "shop.pl", "name", "h1.title", 10, 0).await;

    // Discovery reports the selector once (a success), then it is used.
    knowledge
        .record_discovered_selector("shop.pl", "name", "h1.product-name", 90)
        .await
        .unwrap();
    replay_selector(&knowledge, "shop.pl", "name", "h1.product-name", 4, 1).await;

    let report = knowledge.best_selectors("shop.pl").await.unwrap();
    assert_eq!(report.selector(TrackableField::Name), Some("h1.product-name"));

    let stats = &report.stats.fields[&TrackableField::Name];
    assert_eq!(stats.best_method, Some(DiscoveryMethod::Discovered));
    assert!(stats.best_confidence.unwrap() < 0.5);
    assert_eq!(report.stats.discovered_candidates, 1);
    assert_eq!(report.stats.heuristic_candidates, 1);
}

#[tokio::test]
async fn test_domain_variants_share_knowledge() {
    let knowledge = DomainKnowledge::new(MemoryStore::new());

    replay_selector(&knowledge, "https://www.Shop.pl/sofa-1", "price", ".price", 2, 0).await;
    replay_selector(&knowledge, "WWW.SHOP.PL ", "price", ".price", 2, 0).await;
    replay_selector(&knowledge, "shop.pl", "price", ".price", 2, 0).await;

    let report = knowledge.best_selectors("http://shop.pl").await.unwrap();
    assert_eq!(report.selector(TrackableField::Price), Some(".price"));
    assert_eq!(report.stats.fields[&TrackableField::Price].best_samples, Some(6));

    let domains = knowledge.known_domains().await.unwrap();
    assert_eq!(domains.len(), 1);
    assert_eq!(domains[0].as_str(), "shop.pl");
}

#[tokio::test]
async fn test_single_observation_never_answers() {
    let knowledge = DomainKnowledge::new(MemoryStore::new());

    replay_selector(&knowledge, "lamps.com", "name", "h1", 1, 0).await;
    replay_selector(&knowledge, "lamps.com", "price", ".price", 0, 1).await;
    replay_category(&knowledge, "lamps.com", "lighting", 1, 0).await;

    let report = knowledge.best_selectors("lamps.com").await.unwrap();
    assert!(report.selectors.is_empty());
    assert_eq!(report.stats.total_candidates, 2);
    assert!(knowledge.top_category("lamps.com").await.unwrap().is_none());
}

#[tokio::test]
async fn test_category_learning() {
    let knowledge = DomainKnowledge::new(MemoryStore::new());

    replay_category(&knowledge, "weak.com", "textiles", 3, 7).await;
    assert!(knowledge.top_category("weak.com").await.unwrap().is_none());

    replay_category(&knowledge, "lamps.com", "lighting", 20, 1).await;
    replay_category(&knowledge, "lamps.com", "decor", 9, 1).await;
    replay_category(&knowledge, "lamps.com", "furniture", 2, 9).await;

    let top = knowledge.top_category("lamps.com").await.unwrap().unwrap();
    assert_eq!(top.category, Category::Lighting);
    assert!(top.confidence > 0.7);
    assert_eq!(top.samples, 21);

    let all = knowledge.all_categories("lamps.com").await.unwrap();
    let ordered: Vec<Category> = all.iter().map(|g| g.category).collect();
    assert_eq!(ordered, vec![Category::Lighting, Category::Decor]);
}

#[tokio::test]
async fn test_repeated_queries_are_identical() {
    let knowledge = DomainKnowledge::new(MemoryStore::new());

    replay_selector(&knowledge, "shop.pl", "name", "h1", 12, 1).await;
    replay_selector(&knowledge, "shop.pl", "name", ".product h1", 12, 1).await;
    replay_selector(&knowledge, "shop.pl", "thumbnail_url", "img.main", 8, 0).await;
    replay_category(&knowledge, "shop.pl", "furniture", 10, 0).await;

    let first = knowledge.best_selectors("shop.pl").await.unwrap();
    let second = knowledge.best_selectors("shop.pl").await.unwrap();
    assert_eq!(first, second);

    let first = knowledge.all_categories("shop.pl").await.unwrap();
    let second = knowledge.all_categories("shop.pl").await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_report_serializes_for_api() {
    let knowledge = DomainKnowledge::new(MemoryStore::new());
    replay_selector(&knowledge, "shop.pl", "thumbnail_url", "img.hero", 5, 0).await;

    let report = knowledge.best_selectors("shop.pl").await.unwrap();
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["domain"], "shop.pl");
    assert_eq!(json["selectors"]["thumbnail_url"], "img.hero");
    assert_eq!(json["stats"]["fields"]["thumbnail_url"]["best_method"], "heuristic");
}

#[tokio::test]
async fn test_stricter_config_withholds_answers() {
    let config = KnowledgeConfig::new()
        .with_selector(RankingConfig::for_selectors().with_min_samples(20));
    let knowledge = DomainKnowledge::with_config(MemoryStore::new(), config);

    replay_selector(&knowledge, "shop.pl", "name", "h1", 10, 0).await;
    assert!(knowledge.best_selectors("shop.pl").await.unwrap().selectors.is_empty());

    replay_selector(&knowledge, "shop.pl", "name", "h1", 10, 0).await;
    let report = knowledge.best_selectors("shop.pl").await.unwrap();
    assert_eq!(report.selector(TrackableField::Name), Some("h1"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_ingestion_counts_every_event() {
    let knowledge = Arc::new(DomainKnowledge::new(MemoryStore::new()));

    let mut handles = Vec::new();
    for i in 0..100 {
        let knowledge = Arc::clone(&knowledge);
        handles.push(tokio::spawn(async move {
            let outcome = if i % 10 == 0 { Outcome::Failure } else { Outcome::Success };
            knowledge
                .record_selector_outcome("shop.pl", "name", "h1.title", outcome)
                .await
                .unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(knowledge.store().observation_count().unwrap(), 1);
    let report = knowledge.best_selectors("shop.pl").await.unwrap();
    let stats = &report.stats.fields[&TrackableField::Name];
    assert_eq!(stats.best_samples, Some(100));
}

#[cfg(feature = "sqlite")]
mod sqlite {
    use super::*;
    use domain_knowledge::SqliteStore;

    #[tokio::test]
    async fn test_end_to_end_on_sqlite() {
        let store = SqliteStore::in_memory().await.unwrap();
        let knowledge = DomainKnowledge::new(store);

        replay_selector(&knowledge, "shop.pl", "name", "h1.title", 10, 0).await;
        knowledge
            .record_discovered_selector("shop.pl", "name", "h1.product-name", 90)
            .await
            .unwrap();
        replay_selector(&knowledge, "shop.pl", "name", "h1.product-name", 4, 1).await;
        replay_category(&knowledge, "shop.pl", "furniture", 20, 1).await;

        let report = knowledge.best_selectors("www.shop.pl").await.unwrap();
        assert_eq!(report.selector(TrackableField::Name), Some("h1.product-name"));

        let top = knowledge.top_category("shop.pl").await.unwrap().unwrap();
        assert_eq!(top.category, Category::Furniture);
    }
}
