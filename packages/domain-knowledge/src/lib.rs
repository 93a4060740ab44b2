//! Domain Knowledge Learning Engine
//!
//! Learns, per shopping domain, which CSS selector most reliably extracts
//! each product field and which product category the domain's items belong
//! to. Input is a stream of noisy success/failure observations sent by the
//! browser extension across many users.
//!
//! # Design Philosophy
//!
//! **Count, then be conservative**
//!
//! - Every candidate is a pair of tallies, nothing more
//! - Candidates are compared by the Wilson score lower bound, so a long
//!   track record beats a lucky streak
//! - Selectors found by automated discovery outrank static heuristics once
//!   they clear the same gates
//! - Bad input is dropped, missing knowledge is `None`, only storage fails
//!
//! # Usage
//!
//! ```rust,ignore
//! use domain_knowledge::{DomainKnowledge, MemoryStore, Outcome, TrackableField};
//!
//! let knowledge = DomainKnowledge::new(MemoryStore::new());
//!
//! // Ingestion path
//! knowledge
//!     .record_selector_outcome("https://www.shop.pl/p/1", "name", "h1.title", Outcome::Success)
//!     .await?;
//! knowledge
//!     .record_discovered_selector("shop.pl", "name", "h1.product-name", 90)
//!     .await?;
//! knowledge
//!     .record_category_outcome("shop.pl", "lighting", Outcome::Success)
//!     .await?;
//!
//! // Query path
//! let report = knowledge.best_selectors("shop.pl").await?;
//! let name = report.selector(TrackableField::Name);
//! let category = knowledge.top_category("shop.pl").await?;
//! ```
//!
//! # Modules
//!
//! - [`confidence`] - Wilson score lower bound
//! - [`traits`] - Storage trait (`ObservationStore`)
//! - [`stores`] - Storage implementations (MemoryStore, SqliteStore, PostgresStore)
//! - [`ranking`] - Gating and the selector/category ranking policies
//! - [`types`] - Domain keys, vocabularies, observations, config and reports
//! - [`testing`] - Fixtures and failing stores for tests

pub mod confidence;
pub mod error;
pub mod knowledge;
pub mod ranking;
pub mod stores;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use confidence::{confidence, wilson_lower_bound, DEFAULT_Z};
pub use error::KnowledgeError;
pub use knowledge::DomainKnowledge;
pub use ranking::{CategoryRankingPolicy, RankedCandidate, RankingPolicy, SelectorRankingPolicy};
pub use traits::store::ObservationStore;
pub use types::{
    config::{KnowledgeConfig, RankingConfig},
    domain::DomainKey,
    field::{Category, TrackableField, CATEGORY_DISCRIMINATOR},
    observation::{DiscoveryMethod, Observation, ObservationKey, ObservationMeta, Outcome},
    report::{CategoryGuess, FieldStats, SelectorReport, SelectorStats},
};

// Re-export stores
pub use stores::MemoryStore;

#[cfg(feature = "sqlite")]
pub use stores::SqliteStore;

#[cfg(feature = "postgres")]
pub use stores::PostgresStore;
