//! Configuration for candidate ranking.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

use crate::error::{KnowledgeError, Result};

/// Smallest sample count a candidate may ever be ranked on.
///
/// A single observation says nothing about reliability, so configured
/// values below this are raised to it.
pub const MIN_SAMPLES_FLOOR: u64 = 2;

/// Gating thresholds for one ranking policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingConfig {
    /// Minimum `success + failure` before a candidate is eligible.
    ///
    /// Default: 3.
    pub min_samples: u64,

    /// Minimum Wilson lower bound before a candidate is eligible.
    pub min_confidence: f64,

    /// z-value of the Wilson interval.
    ///
    /// Default: 1.96 (~95%).
    pub z_score: f64,

    /// Ignore candidates not seen for this many days.
    ///
    /// Counts never decay; this is a plain window. Default: None (keep all).
    #[serde(default)]
    pub stale_after_days: Option<i64>,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            min_samples: 3,
            min_confidence: 0.5,
            z_score: 1.96,
            stale_after_days: None,
        }
    }
}

impl RankingConfig {
    /// Defaults for selector learning.
    ///
    /// The bar is lower than for categories because a young discovered
    /// selector (e.g. 5/1, bound ~0.44) must be able to displace a
    /// well-worn heuristic.
    pub fn for_selectors() -> Self {
        Self {
            min_confidence: 0.3,
            ..Default::default()
        }
    }

    /// Defaults for category learning.
    pub fn for_categories() -> Self {
        Self::default()
    }

    pub fn with_min_samples(mut self, min_samples: u64) -> Self {
        self.min_samples = min_samples;
        self
    }

    pub fn with_min_confidence(mut self, min_confidence: f64) -> Self {
        self.min_confidence = min_confidence;
        self
    }

    pub fn with_z_score(mut self, z_score: f64) -> Self {
        self.z_score = z_score;
        self
    }

    pub fn with_stale_after_days(mut self, days: i64) -> Self {
        self.stale_after_days = Some(days);
        self
    }

    /// The sample threshold actually applied.
    pub fn effective_min_samples(&self) -> u64 {
        self.min_samples.max(MIN_SAMPLES_FLOOR)
    }

    /// Oldest `last_seen_at` still eligible, if a window is configured.
    ///
    /// Negative windows and windows reaching past the representable time
    /// range apply no cutoff.
    pub fn stale_cutoff(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.stale_after_days
            .filter(|days| *days >= 0)
            .and_then(Duration::try_days)
            .and_then(|window| now.checked_sub_signed(window))
    }

    fn apply_env(&mut self, prefix: &str) -> Result<()> {
        if let Some(v) = env_parse::<u64>(&format!("{}_MIN_SAMPLES", prefix))? {
            self.min_samples = v;
        }
        if let Some(v) = env_parse::<f64>(&format!("{}_MIN_CONFIDENCE", prefix))? {
            self.min_confidence = v;
        }
        if let Some(v) = env_parse::<f64>(&format!("{}_Z_SCORE", prefix))? {
            self.z_score = v;
        }
        let name = format!("{}_STALE_AFTER_DAYS", prefix);
        if let Some(v) = env_parse::<i64>(&name)? {
            let in_range = Duration::try_days(v)
                .and_then(|window| Utc::now().checked_sub_signed(window))
                .is_some();
            if v < 0 || !in_range {
                return Err(KnowledgeError::Config(format!(
                    "{} must be a non-negative day count within the supported date range, got {}",
                    name, v
                )));
            }
            self.stale_after_days = Some(v);
        }
        Ok(())
    }
}

/// Top-level configuration for the knowledge engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    /// Thresholds for CSS selector ranking.
    pub selector: RankingConfig,

    /// Thresholds for category ranking.
    pub category: RankingConfig,
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            selector: RankingConfig::for_selectors(),
            category: RankingConfig::for_categories(),
        }
    }
}

impl KnowledgeConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load defaults overridden by environment variables.
    ///
    /// Reads `.env` if present, then `KNOWLEDGE_SELECTOR_*` and
    /// `KNOWLEDGE_CATEGORY_*` variables (`MIN_SAMPLES`, `MIN_CONFIDENCE`,
    /// `Z_SCORE`, `STALE_AFTER_DAYS`).
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenvy::dotenv();

        let mut config = Self::default();
        config.selector.apply_env("KNOWLEDGE_SELECTOR")?;
        config.category.apply_env("KNOWLEDGE_CATEGORY")?;
        Ok(config)
    }

    pub fn with_selector(mut self, selector: RankingConfig) -> Self {
        self.selector = selector;
        self
    }

    pub fn with_category(mut self, category: RankingConfig) -> Self {
        self.category = category;
        self
    }
}

fn env_parse<T: FromStr>(name: &str) -> Result<Option<T>> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| KnowledgeError::Config(format!("{} has invalid value {:?}", name, raw))),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(KnowledgeError::Config(format!("{}: {}", name, e))),
    }
}
