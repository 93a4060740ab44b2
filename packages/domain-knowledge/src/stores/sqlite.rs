//! SQLite storage implementation.
//!
//! A file-based storage backend using SQLite. Good for:
//! - Local development
//! - Single-server deployments
//! - Testing with persistent data

use async_trait::async_trait;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;
use tracing::{info, warn};

use crate::error::{KnowledgeError, Result};
use crate::traits::store::ObservationStore;
use crate::types::{
    domain::DomainKey,
    observation::{DiscoveryMethod, Observation, ObservationKey, ObservationMeta, Outcome},
};

const SELECT_COLUMNS: &str = "domain, discriminator, candidate, success_count, failure_count, \
     discovery_method, discovery_score, created_at, last_seen_at";

/// SQLite-based observation store.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Create a new SQLite store with the given connection URL.
    ///
    /// # Example URLs
    /// - `sqlite://./knowledge.db` - File-based database
    /// - `sqlite://./knowledge.db?mode=rwc` - Create if not exists
    pub async fn new(database_url: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .map_err(KnowledgeError::storage)?;

        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    /// Create an in-memory SQLite store (for testing).
    ///
    /// Every SQLite connection gets its own in-memory database, so the pool
    /// is pinned to one long-lived connection.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .map_err(KnowledgeError::storage)?;

        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    /// Run database migrations.
    async fn run_migrations(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS domain_observations (
                domain TEXT NOT NULL,
                discriminator TEXT NOT NULL,
                candidate TEXT NOT NULL,
                success_count INTEGER NOT NULL DEFAULT 0,
                failure_count INTEGER NOT NULL DEFAULT 0,
                discovery_method TEXT NOT NULL DEFAULT 'heuristic',
                discovery_score INTEGER,
                created_at TEXT NOT NULL,
                last_seen_at TEXT NOT NULL,
                UNIQUE (domain, discriminator, candidate)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(KnowledgeError::storage)?;

        info!("domain_observations table ready (sqlite)");
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

// Row type for sqlx queries
#[derive(Debug, FromRow)]
struct ObservationRow {
    domain: String,
    discriminator: String,
    candidate: String,
    success_count: i64,
    failure_count: i64,
    discovery_method: String,
    discovery_score: Option<i64>,
    created_at: String,
    last_seen_at: String,
}

impl ObservationRow {
    fn into_observation(self) -> Result<Observation> {
        let created_at = parse_timestamp(&self.created_at)?;
        let last_seen_at = parse_timestamp(&self.last_seen_at)?;

        if self.success_count < 0 || self.failure_count < 0 {
            warn!(
                domain = %self.domain,
                candidate = %self.candidate,
                "negative counter in domain_observations, treating as zero"
            );
        }

        Ok(Observation {
            domain: DomainKey::normalize(&self.domain),
            discriminator: self.discriminator,
            candidate: self.candidate,
            success_count: self.success_count.max(0) as u64,
            failure_count: self.failure_count.max(0) as u64,
            discovery_method: DiscoveryMethod::from_stored(&self.discovery_method),
            discovery_score: self.discovery_score.and_then(|s| i32::try_from(s).ok()),
            created_at,
            last_seen_at,
        })
    }
}

fn parse_timestamp(raw: &str) -> Result<chrono::DateTime<chrono::Utc>> {
    Ok(chrono::DateTime::parse_from_rfc3339(raw)
        .map_err(|e| KnowledgeError::storage(format!("Invalid date: {}", e)))?
        .with_timezone(&chrono::Utc))
}

#[async_trait]
impl ObservationStore for SqliteStore {
    async fn record(
        &self,
        key: &ObservationKey,
        outcome: Outcome,
        meta: ObservationMeta,
    ) -> Result<Observation> {
        let (success, failure): (i64, i64) = match outcome {
            Outcome::Success => (1, 0),
            Outcome::Failure => (0, 1),
        };
        let now = chrono::Utc::now().to_rfc3339();

        // Single statement: the unique constraint makes create-or-increment atomic.
        let query = format!(
            r#"
            INSERT INTO domain_observations
                (domain, discriminator, candidate, success_count, failure_count,
                 discovery_method, discovery_score, created_at, last_seen_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(domain, discriminator, candidate) DO UPDATE SET
                success_count = domain_observations.success_count + excluded.success_count,
                failure_count = domain_observations.failure_count + excluded.failure_count,
                discovery_method = CASE WHEN excluded.discovery_method = 'discovered'
                    THEN 'discovered' ELSE domain_observations.discovery_method END,
                discovery_score = CASE WHEN excluded.discovery_method = 'discovered'
                    THEN excluded.discovery_score ELSE domain_observations.discovery_score END,
                last_seen_at = excluded.last_seen_at
            RETURNING {}
            "#,
            SELECT_COLUMNS
        );

        let row = sqlx::query_as::<_, ObservationRow>(&query)
            .bind(key.domain.as_str())
            .bind(&key.discriminator)
            .bind(&key.candidate)
            .bind(success)
            .bind(failure)
            .bind(meta.discovery_method.as_str())
            .bind(meta.discovery_score)
            .bind(&now)
            .bind(&now)
            .fetch_one(&self.pool)
            .await
            .map_err(KnowledgeError::storage)?;

        row.into_observation()
    }

    async fn query(
        &self,
        domain: &DomainKey,
        discriminator: Option<&str>,
    ) -> Result<Vec<Observation>> {
        let rows = match discriminator {
            Some(d) => {
                let query = format!(
                    "SELECT {} FROM domain_observations WHERE domain = ? AND discriminator = ? ORDER BY discriminator, candidate",
                    SELECT_COLUMNS
                );
                sqlx::query_as::<_, ObservationRow>(&query)
                    .bind(domain.as_str())
                    .bind(d)
                    .fetch_all(&self.pool)
                    .await
                    .map_err(KnowledgeError::storage)?
            }
            None => {
                let query = format!(
                    "SELECT {} FROM domain_observations WHERE domain = ? ORDER BY discriminator, candidate",
                    SELECT_COLUMNS
                );
                sqlx::query_as::<_, ObservationRow>(&query)
                    .bind(domain.as_str())
                    .fetch_all(&self.pool)
                    .await
                    .map_err(KnowledgeError::storage)?
            }
        };

        rows.into_iter().map(|r| r.into_observation()).collect()
    }

    async fn domains(&self) -> Result<Vec<DomainKey>> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT DISTINCT domain FROM domain_observations ORDER BY domain")
                .fetch_all(&self.pool)
                .await
                .map_err(KnowledgeError::storage)?;

        Ok(rows.into_iter().map(|(d,)| DomainKey::normalize(&d)).collect())
    }
}
