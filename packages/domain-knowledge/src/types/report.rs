//! Query results returned to the host application.
//!
//! All of these serialize to JSON so the web API can hand them straight to
//! the extension and dashboard.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{
    domain::DomainKey,
    field::{Category, TrackableField},
    observation::DiscoveryMethod,
};

/// Best known selectors for a domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectorReport {
    pub domain: DomainKey,

    /// Winning selector per field. Fields without a reliable winner are
    /// absent, not null.
    pub selectors: BTreeMap<TrackableField, String>,

    pub stats: SelectorStats,
}

impl SelectorReport {
    pub fn selector(&self, field: TrackableField) -> Option<&str> {
        self.selectors.get(&field).map(String::as_str)
    }
}

/// Diagnostics behind a [`SelectorReport`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectorStats {
    /// Selector records stored for trackable fields of this domain.
    pub total_candidates: usize,
    pub discovered_candidates: usize,
    pub heuristic_candidates: usize,

    /// Per-field breakdown, only for fields with at least one record.
    pub fields: BTreeMap<TrackableField, FieldStats>,
}

/// Per-field selector diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldStats {
    pub candidates: usize,
    pub discovered: usize,
    pub heuristic: usize,

    /// Candidates that passed gating.
    pub eligible: usize,

    pub best_selector: Option<String>,
    pub best_confidence: Option<f64>,
    pub best_method: Option<DiscoveryMethod>,
    pub best_samples: Option<u64>,
}

/// A category with the evidence behind it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryGuess {
    pub category: Category,
    pub confidence: f64,
    pub samples: u64,
}
