use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use log::info;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use super::{account_repository::AccountRepository, transaction_repository::TransactionRepository};
use crate::config::DatabaseConfig;
use crate::storage::traits::Connection;

/// DbConnection manages the SQLite pool shared by all repositories
#[derive(Clone)]
pub struct DbConnection {
    pool: Arc<SqlitePool>,
}

impl DbConnection {
    /// Open (creating if needed) the database described by `config`
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(&config.url)
            .with_context(|| format!("Invalid database url: {}", config.url))?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await?;

        Self::setup_schema(&pool).await?;
        info!("Database ready at {}", config.url);

        Ok(Self { pool: Arc::new(pool) })
    }

    /// Private in-memory database, used by tests.
    /// A single connection that never expires keeps the data alive.
    pub async fn new_in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
            .connect_with(options)
            .await?;

        Self::setup_schema(&pool).await?;
        Ok(Self { pool: Arc::new(pool) })
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Set up the required database schema
    async fn setup_schema(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS accounts (
                id TEXT PRIMARY KEY,
                owner_id TEXT NOT NULL,
                display_name TEXT NOT NULL,
                address TEXT NOT NULL DEFAULT '',
                group_id TEXT NOT NULL,
                balance INTEGER NOT NULL DEFAULT 0 CHECK (balance >= 0),
                target INTEGER NOT NULL CHECK (target > 0),
                status TEXT NOT NULL CHECK (status IN ('ACTIVE', 'INACTIVE')),
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        // Group listings and leaderboard tie-breaks order by creation time
        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_accounts_group_created
            ON accounts(group_id, created_at);
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS ledger_transactions (
                id TEXT PRIMARY KEY,
                account_id TEXT NOT NULL,
                kind TEXT NOT NULL CHECK (kind IN ('DEPOSIT', 'WITHDRAWAL')),
                nominal INTEGER NOT NULL CHECK (nominal > 0),
                note TEXT,
                withdrawal_scope TEXT CHECK (withdrawal_scope IN ('PARTIAL', 'FULL')),
                state TEXT NOT NULL CHECK (state IN ('PENDING', 'ACCEPTED', 'REJECTED')),
                requested_by TEXT NOT NULL,
                decided_by TEXT,
                rejection_reason TEXT,
                client_token TEXT,
                created_at TEXT NOT NULL,
                decided_at TEXT,
                FOREIGN KEY (account_id) REFERENCES accounts (id)
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_ledger_transactions_account_created
            ON ledger_transactions(account_id, created_at DESC);
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_ledger_transactions_state
            ON ledger_transactions(state);
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE UNIQUE INDEX IF NOT EXISTS idx_ledger_transactions_client_token
            ON ledger_transactions(account_id, client_token)
            WHERE client_token IS NOT NULL;
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }
}

impl Connection for DbConnection {
    type AccountRepository = AccountRepository;
    type TransactionRepository = TransactionRepository;

    fn create_account_repository(&self) -> Self::AccountRepository {
        AccountRepository::new(self.clone())
    }

    fn create_transaction_repository(&self) -> Self::TransactionRepository {
        TransactionRepository::new(self.clone())
    }
}

/// Fixed-width RFC 3339 text so stored timestamps sort chronologically
pub(crate) fn encode_timestamp(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn decode_timestamp(text: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(text)
        .with_context(|| format!("Invalid stored timestamp: {}", text))?
        .with_timezone(&Utc))
}
