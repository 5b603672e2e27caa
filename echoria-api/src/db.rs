//! Postgres Vote Store
//!
//! Connection pooling via deadpool-postgres and the `VoteStore`
//! implementation over the single `votes` table. The table's unique
//! constraint on `(user_id, nomination)` is the only thing enforcing one
//! vote per voter and nomination; inserts never check first.

use std::time::Duration;

use async_trait::async_trait;
use deadpool_postgres::{Config, ManagerConfig, Pool, RecyclingMethod, Runtime};
use echoria_core::{ChoiceCount, NewVote, Vote, VoteOutcome};
use echoria_storage::{StorageError, StorageResult, VoteStore};
use tokio_postgres::{NoTls, Row};

use crate::error::{ApiError, ApiResult};

const CREATE_VOTES_TABLE: &str = "\
CREATE TABLE IF NOT EXISTS votes (
    id BIGSERIAL PRIMARY KEY,
    user_id TEXT NOT NULL,
    nomination TEXT NOT NULL,
    choice TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    UNIQUE (user_id, nomination)
)";

const INSERT_VOTE: &str = "\
INSERT INTO votes (user_id, nomination, choice)
VALUES ($1, $2, $3)
ON CONFLICT (user_id, nomination) DO NOTHING
RETURNING id, user_id, nomination, choice, created_at";

const FIND_VOTE: &str = "\
SELECT id, user_id, nomination, choice, created_at
FROM votes
WHERE user_id = $1 AND nomination = $2";

const CHOICE_COUNTS: &str = "\
SELECT nomination, choice, COUNT(*) AS votes
FROM votes
WHERE $1::TEXT IS NULL OR nomination = $1
GROUP BY nomination, choice";

// ============================================================================
// CONNECTION POOL CONFIGURATION
// ============================================================================

/// Database connection pool configuration.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// PostgreSQL host
    pub host: String,
    /// PostgreSQL port
    pub port: u16,
    /// Database name
    pub dbname: String,
    /// Database user
    pub user: String,
    /// Database password
    pub password: String,
    /// Maximum pool size
    pub max_size: usize,
    /// Wait for a free connection
    pub timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            dbname: "echoria".to_string(),
            user: "postgres".to_string(),
            password: "".to_string(),
            max_size: 16,
            timeout: Duration::from_secs(30),
        }
    }
}

impl DbConfig {
    /// Create a new database configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(&|key: &str| std::env::var(key).ok())
    }

    /// Reads `ECHORIA_DB_HOST`, `_PORT`, `_NAME`, `_USER`, `_PASSWORD`,
    /// `_POOL_SIZE` and `_TIMEOUT` (seconds); unparsable values fall back to
    /// the defaults.
    pub fn from_lookup<F>(get: &F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            host: get("ECHORIA_DB_HOST").unwrap_or(defaults.host),
            port: get("ECHORIA_DB_PORT")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            dbname: get("ECHORIA_DB_NAME").unwrap_or(defaults.dbname),
            user: get("ECHORIA_DB_USER").unwrap_or(defaults.user),
            password: get("ECHORIA_DB_PASSWORD").unwrap_or(defaults.password),
            max_size: get("ECHORIA_DB_POOL_SIZE")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_size),
            timeout: get("ECHORIA_DB_TIMEOUT")
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
        }
    }

    /// Create a connection pool from this configuration.
    pub fn create_pool(&self) -> ApiResult<Pool> {
        let mut cfg = Config::new();
        cfg.host = Some(self.host.clone());
        cfg.port = Some(self.port);
        cfg.dbname = Some(self.dbname.clone());
        cfg.user = Some(self.user.clone());
        cfg.password = Some(self.password.clone());

        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });

        let mut pool_config = deadpool_postgres::PoolConfig::new(self.max_size);
        pool_config.timeouts.wait = Some(self.timeout);
        cfg.pool = Some(pool_config);

        let pool = cfg
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| ApiError::database_error(format!("Failed to create pool: {}", e)))?;

        Ok(pool)
    }
}

// ============================================================================
// POSTGRES VOTE STORE
// ============================================================================

#[derive(Clone)]
pub struct PgVoteStore {
    pool: Pool,
}

impl PgVoteStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    pub fn from_config(config: &DbConfig) -> ApiResult<Self> {
        Ok(Self::new(config.create_pool()?))
    }

    /// Create the `votes` table if it does not exist.
    pub async fn migrate(&self) -> ApiResult<()> {
        let client = self.pool.get().await?;
        client.batch_execute(CREATE_VOTES_TABLE).await?;
        tracing::info!("Votes table ready");
        Ok(())
    }

    async fn client(&self) -> StorageResult<deadpool_postgres::Object> {
        self.pool
            .get()
            .await
            .map_err(|e| StorageError::unavailable(e.to_string()))
    }
}

fn query_failed(err: tokio_postgres::Error) -> StorageError {
    StorageError::query(err.to_string())
}

fn vote_from_row(row: &Row) -> StorageResult<Vote> {
    Ok(Vote {
        id: row.try_get("id").map_err(query_failed)?,
        voter_id: row.try_get("user_id").map_err(query_failed)?,
        nomination: row.try_get("nomination").map_err(query_failed)?,
        choice: row.try_get("choice").map_err(query_failed)?,
        created_at: row.try_get("created_at").map_err(query_failed)?,
    })
}

#[async_trait]
impl VoteStore for PgVoteStore {
    async fn insert_vote(&self, vote: &NewVote) -> StorageResult<VoteOutcome> {
        let client = self.client().await?;
        let row = client
            .query_opt(INSERT_VOTE, &[&vote.voter_id, &vote.nomination, &vote.choice])
            .await
            .map_err(query_failed)?;

        match row {
            Some(row) => Ok(VoteOutcome::Recorded(vote_from_row(&row)?)),
            None => Ok(VoteOutcome::Duplicate),
        }
    }

    async fn find_vote(&self, voter_id: &str, nomination: &str) -> StorageResult<Option<Vote>> {
        let client = self.client().await?;
        let row = client
            .query_opt(FIND_VOTE, &[&voter_id, &nomination])
            .await
            .map_err(query_failed)?;
        row.as_ref().map(vote_from_row).transpose()
    }

    async fn choice_counts(&self, nomination: Option<&str>) -> StorageResult<Vec<ChoiceCount>> {
        let client = self.client().await?;
        let rows = client
            .query(CHOICE_COUNTS, &[&nomination])
            .await
            .map_err(query_failed)?;

        rows.iter()
            .map(|row| {
                let votes: i64 = row.try_get("votes").map_err(query_failed)?;
                Ok(ChoiceCount {
                    nomination: row.try_get("nomination").map_err(query_failed)?,
                    choice: row.try_get("choice").map_err(query_failed)?,
                    votes: votes.max(0) as u64,
                })
            })
            .collect()
    }

    async fn delete_all(&self) -> StorageResult<u64> {
        let client = self.client().await?;
        client
            .execute("DELETE FROM votes", &[])
            .await
            .map_err(query_failed)
    }

    async fn count(&self) -> StorageResult<u64> {
        let client = self.client().await?;
        let row = client
            .query_one("SELECT COUNT(*) FROM votes", &[])
            .await
            .map_err(query_failed)?;
        let count: i64 = row.try_get(0).map_err(query_failed)?;
        Ok(count.max(0) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_db_config_from_lookup() {
        let vars: HashMap<&str, &str> = [
            ("ECHORIA_DB_HOST", "db.internal"),
            ("ECHORIA_DB_PORT", "6543"),
            ("ECHORIA_DB_POOL_SIZE", "not-a-number"),
            ("ECHORIA_DB_TIMEOUT", "5"),
        ]
        .into_iter()
        .collect();
        let config = DbConfig::from_lookup(&|key: &str| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.host, "db.internal");
        assert_eq!(config.port, 6543);
        assert_eq!(config.max_size, 16);
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.dbname, "echoria");
    }

    #[tokio::test]
    async fn test_create_pool_is_lazy() {
        // Building the pool never connects, so this works without a server.
        let pool = DbConfig::default().create_pool().expect("pool");
        assert_eq!(pool.status().size, 0);
    }
}
