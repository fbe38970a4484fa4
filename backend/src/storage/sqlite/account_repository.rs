use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row};

use super::connection::{decode_timestamp, encode_timestamp, DbConnection};
use crate::domain::models::account::{Account, AccountStatus};
use crate::storage::traits::AccountStorage;

const ACCOUNT_COLUMNS: &str =
    "id, owner_id, display_name, address, group_id, balance, target, status, created_at, updated_at";

/// Repository for account operations
#[derive(Clone)]
pub struct AccountRepository {
    db: DbConnection,
}

impl AccountRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }
}

pub(crate) fn account_from_row(row: &SqliteRow) -> Result<Account> {
    Ok(Account {
        id: row.try_get("id")?,
        owner_id: row.try_get("owner_id")?,
        display_name: row.try_get("display_name")?,
        address: row.try_get("address")?,
        group_id: row.try_get("group_id")?,
        balance: row.try_get("balance")?,
        target: row.try_get("target")?,
        status: row.try_get::<String, _>("status")?.parse::<AccountStatus>()?,
        created_at: decode_timestamp(&row.try_get::<String, _>("created_at")?)?,
        updated_at: decode_timestamp(&row.try_get::<String, _>("updated_at")?)?,
    })
}

#[async_trait]
impl AccountStorage for AccountRepository {
    async fn store_account(&self, account: &Account) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO accounts (id, owner_id, display_name, address, group_id, balance, target, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&account.id)
        .bind(&account.owner_id)
        .bind(&account.display_name)
        .bind(&account.address)
        .bind(&account.group_id)
        .bind(account.balance)
        .bind(account.target)
        .bind(account.status.as_str())
        .bind(encode_timestamp(&account.created_at))
        .bind(encode_timestamp(&account.updated_at))
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    async fn get_account(&self, account_id: &str) -> Result<Option<Account>> {
        let row = sqlx::query(&format!("SELECT {} FROM accounts WHERE id = ?", ACCOUNT_COLUMNS))
            .bind(account_id)
            .fetch_optional(self.db.pool())
            .await?;

        row.as_ref().map(account_from_row).transpose()
    }

    async fn list_accounts_by_group(&self, group_id: &str) -> Result<Vec<Account>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM accounts WHERE group_id = ? ORDER BY created_at ASC, id ASC",
            ACCOUNT_COLUMNS
        ))
        .bind(group_id)
        .fetch_all(self.db.pool())
        .await?;

        rows.iter().map(account_from_row).collect()
    }

    async fn next_account_sequence(&self, group_id: &str) -> Result<u32> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM accounts WHERE group_id = ?")
            .bind(group_id)
            .fetch_one(self.db.pool())
            .await?;
        Ok(count as u32 + 1)
    }

    async fn update_account_status(
        &self,
        account_id: &str,
        status: AccountStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET status = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(status.as_str())
        .bind(encode_timestamp(&updated_at))
        .bind(account_id)
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
