use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::debug;
use sqlx::{sqlite::SqliteRow, Row};

use super::account_repository::account_from_row;
use super::connection::{decode_timestamp, encode_timestamp, DbConnection};
use crate::domain::models::transaction::{
    Transaction, TransactionKind, TransactionState, WithdrawalScope,
};
use crate::storage::traits::{Decision, DecisionOutcome, TransactionStorage};

const TRANSACTION_COLUMNS: &str = "t.id, t.account_id, t.kind, t.nominal, t.note, t.withdrawal_scope, t.state, \
     t.requested_by, t.decided_by, t.rejection_reason, t.client_token, t.created_at, t.decided_at";

/// Repository for the append-only transaction log
#[derive(Clone)]
pub struct TransactionRepository {
    db: DbConnection,
}

impl TransactionRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }
}

fn transaction_from_row(row: &SqliteRow) -> Result<Transaction> {
    let decided_at: Option<String> = row.try_get("decided_at")?;
    let scope: Option<String> = row.try_get("withdrawal_scope")?;

    Ok(Transaction {
        id: row.try_get("id")?,
        account_id: row.try_get("account_id")?,
        kind: row.try_get::<String, _>("kind")?.parse::<TransactionKind>()?,
        nominal: row.try_get("nominal")?,
        note: row.try_get("note")?,
        withdrawal_scope: scope.map(|s| s.parse::<WithdrawalScope>()).transpose()?,
        state: row.try_get::<String, _>("state")?.parse::<TransactionState>()?,
        requested_by: row.try_get("requested_by")?,
        decided_by: row.try_get("decided_by")?,
        rejection_reason: row.try_get("rejection_reason")?,
        client_token: row.try_get("client_token")?,
        created_at: decode_timestamp(&row.try_get::<String, _>("created_at")?)?,
        decided_at: decided_at.as_deref().map(decode_timestamp).transpose()?,
    })
}

#[async_trait]
impl TransactionStorage for TransactionRepository {
    async fn store_transaction(&self, transaction: &Transaction) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO ledger_transactions (
                id, account_id, kind, nominal, note, withdrawal_scope, state,
                requested_by, decided_by, rejection_reason, client_token, created_at, decided_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&transaction.id)
        .bind(&transaction.account_id)
        .bind(transaction.kind.as_str())
        .bind(transaction.nominal)
        .bind(&transaction.note)
        .bind(transaction.withdrawal_scope.map(|s| s.as_str()))
        .bind(transaction.state.as_str())
        .bind(&transaction.requested_by)
        .bind(&transaction.decided_by)
        .bind(&transaction.rejection_reason)
        .bind(&transaction.client_token)
        .bind(encode_timestamp(&transaction.created_at))
        .bind(transaction.decided_at.as_ref().map(encode_timestamp))
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    async fn get_transaction(&self, transaction_id: &str) -> Result<Option<Transaction>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM ledger_transactions t WHERE t.id = ?",
            TRANSACTION_COLUMNS
        ))
        .bind(transaction_id)
        .fetch_optional(self.db.pool())
        .await?;

        row.as_ref().map(transaction_from_row).transpose()
    }

    async fn find_by_client_token(
        &self,
        account_id: &str,
        client_token: &str,
    ) -> Result<Option<Transaction>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM ledger_transactions t WHERE t.account_id = ? AND t.client_token = ?",
            TRANSACTION_COLUMNS
        ))
        .bind(account_id)
        .bind(client_token)
        .fetch_optional(self.db.pool())
        .await?;

        row.as_ref().map(transaction_from_row).transpose()
    }

    async fn list_transactions(
        &self,
        account_id: &str,
        limit: Option<u32>,
        after: Option<String>,
    ) -> Result<Vec<Transaction>> {
        // -1 means "no limit" to SQLite
        let limit = limit.map(i64::from).unwrap_or(-1);

        let cursor = match after {
            Some(after_id) => self
                .get_transaction(&after_id)
                .await?
                .filter(|t| t.account_id == account_id),
            None => None,
        };

        let rows = match cursor {
            Some(cursor) => {
                let cursor_created_at = encode_timestamp(&cursor.created_at);
                sqlx::query(&format!(
                    r#"
                    SELECT {} FROM ledger_transactions t
                    WHERE t.account_id = ?
                      AND (t.created_at < ? OR (t.created_at = ? AND t.id < ?))
                    ORDER BY t.created_at DESC, t.id DESC
                    LIMIT ?
                    "#,
                    TRANSACTION_COLUMNS
                ))
                .bind(account_id)
                .bind(&cursor_created_at)
                .bind(&cursor_created_at)
                .bind(&cursor.id)
                .bind(limit)
                .fetch_all(self.db.pool())
                .await?
            }
            None => {
                sqlx::query(&format!(
                    r#"
                    SELECT {} FROM ledger_transactions t
                    WHERE t.account_id = ?
                    ORDER BY t.created_at DESC, t.id DESC
                    LIMIT ?
                    "#,
                    TRANSACTION_COLUMNS
                ))
                .bind(account_id)
                .bind(limit)
                .fetch_all(self.db.pool())
                .await?
            }
        };

        rows.iter().map(transaction_from_row).collect()
    }

    async fn list_by_group_and_state(
        &self,
        group_id: &str,
        state: TransactionState,
    ) -> Result<Vec<Transaction>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {} FROM ledger_transactions t
            JOIN accounts a ON a.id = t.account_id
            WHERE a.group_id = ? AND t.state = ?
            ORDER BY t.created_at ASC, t.id ASC
            "#,
            TRANSACTION_COLUMNS
        ))
        .bind(group_id)
        .bind(state.as_str())
        .fetch_all(self.db.pool())
        .await?;

        rows.iter().map(transaction_from_row).collect()
    }

    async fn list_accepted_in_range(
        &self,
        group_id: &str,
        kind: Option<TransactionKind>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Transaction>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {} FROM ledger_transactions t
            JOIN accounts a ON a.id = t.account_id
            WHERE a.group_id = ?
              AND t.state = 'ACCEPTED'
              AND (? IS NULL OR t.kind = ?)
              AND t.created_at >= ? AND t.created_at < ?
            ORDER BY t.created_at ASC, t.id ASC
            "#,
            TRANSACTION_COLUMNS
        ))
        .bind(group_id)
        .bind(kind.map(|k| k.as_str()))
        .bind(kind.map(|k| k.as_str()))
        .bind(encode_timestamp(&start))
        .bind(encode_timestamp(&end))
        .fetch_all(self.db.pool())
        .await?;

        rows.iter().map(transaction_from_row).collect()
    }

    async fn apply_decision(&self, decision: &Decision) -> Result<DecisionOutcome> {
        let mut tx = self.db.pool().begin().await?;

        // Write before any read: the unit takes the write lock up front and
        // concurrent decisions queue on busy_timeout. Guarded on state so a
        // transaction is decided at most once.
        let updated = sqlx::query(
            r#"
            UPDATE ledger_transactions
            SET state = ?, decided_by = ?, decided_at = ?, rejection_reason = ?
            WHERE id = ? AND state = 'PENDING'
            "#,
        )
        .bind(decision.new_state.as_str())
        .bind(&decision.decided_by)
        .bind(encode_timestamp(&decision.decided_at))
        .bind(&decision.rejection_reason)
        .bind(&decision.transaction_id)
        .execute(&mut *tx)
        .await?;

        let row = sqlx::query(&format!(
            "SELECT {} FROM ledger_transactions t WHERE t.id = ?",
            TRANSACTION_COLUMNS
        ))
        .bind(&decision.transaction_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            tx.rollback().await?;
            return Ok(DecisionOutcome::NotFound);
        };
        let transaction = transaction_from_row(&row)?;

        if updated.rows_affected() == 0 {
            tx.rollback().await?;
            debug!(
                "Decision on {} skipped: already {}",
                transaction.id, transaction.state
            );
            return Ok(DecisionOutcome::StateConflict(transaction));
        }

        // Guarded on the resulting balance so it can never go negative
        let balance_updated = sqlx::query(
            r#"
            UPDATE accounts
            SET balance = balance + ?, updated_at = ?
            WHERE id = ? AND balance + ? >= 0
            "#,
        )
        .bind(decision.balance_delta)
        .bind(encode_timestamp(&decision.decided_at))
        .bind(&transaction.account_id)
        .bind(decision.balance_delta)
        .execute(&mut *tx)
        .await?;

        if balance_updated.rows_affected() == 0 {
            let available: Option<i64> =
                sqlx::query_scalar("SELECT balance FROM accounts WHERE id = ?")
                    .bind(&transaction.account_id)
                    .fetch_optional(&mut *tx)
                    .await?;
            tx.rollback().await?;
            return Ok(DecisionOutcome::InsufficientBalance {
                available: available.unwrap_or(0),
            });
        }

        let account_row = sqlx::query(
            r#"
            SELECT id, owner_id, display_name, address, group_id, balance, target, status, created_at, updated_at
            FROM accounts WHERE id = ?
            "#,
        )
        .bind(&transaction.account_id)
        .fetch_one(&mut *tx)
        .await?;
        let account = account_from_row(&account_row)?;

        tx.commit().await?;

        Ok(DecisionOutcome::Applied {
            transaction,
            account,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use crate::domain::models::account::{Account, AccountStatus};
    use crate::storage::sqlite::account_repository::AccountRepository;
    use crate::storage::traits::AccountStorage;
    use chrono::{Duration, SubsecRound};

    async fn setup_with_account(balance: i64) -> (TransactionRepository, AccountRepository) {
        with_account(DbConnection::new_in_memory().await.unwrap(), balance).await
    }

    async fn with_account(db: DbConnection, balance: i64) -> (TransactionRepository, AccountRepository) {
        let accounts = AccountRepository::new(db.clone());
        let now = Utc::now();
        accounts
            .store_account(&Account {
                id: "KCLG-0102-001".to_string(),
                owner_id: "u-1".to_string(),
                display_name: "Pak Budi".to_string(),
                address: String::new(),
                group_id: "0102".to_string(),
                balance,
                target: 500_000,
                status: AccountStatus::Active,
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap();
        (TransactionRepository::new(db), accounts)
    }

    fn pending(id: &str, kind: TransactionKind, nominal: i64, created_at: DateTime<Utc>) -> Transaction {
        Transaction {
            id: id.to_string(),
            account_id: "KCLG-0102-001".to_string(),
            kind,
            nominal,
            note: Some("setoran".to_string()),
            withdrawal_scope: match kind {
                TransactionKind::Withdrawal => Some(WithdrawalScope::Partial),
                TransactionKind::Deposit => None,
            },
            state: TransactionState::Pending,
            requested_by: "u-1".to_string(),
            decided_by: None,
            rejection_reason: None,
            client_token: None,
            created_at,
            decided_at: None,
        }
    }

    fn accept(transaction: &Transaction) -> Decision {
        Decision {
            transaction_id: transaction.id.clone(),
            new_state: TransactionState::Accepted,
            balance_delta: transaction.balance_delta(),
            decided_by: "rt-1".to_string(),
            decided_at: Utc::now(),
            rejection_reason: None,
        }
    }

    #[tokio::test]
    async fn test_store_and_get_round_trip() {
        let (repo, _) = setup_with_account(0).await;
        let stored = pending("dep-1", TransactionKind::Deposit, 5000, Utc::now().trunc_subsecs(6));
        repo.store_transaction(&stored).await.unwrap();

        let loaded = repo.get_transaction("dep-1").await.unwrap().unwrap();
        assert_eq!(loaded, stored);
    }

    #[tokio::test]
    async fn test_list_is_newest_first_with_cursor() {
        let (repo, _) = setup_with_account(0).await;
        let base = Utc::now();
        for i in 0..5 {
            let tx = pending(&format!("dep-{}", i), TransactionKind::Deposit, 1000, base + Duration::seconds(i));
            repo.store_transaction(&tx).await.unwrap();
        }

        let first_page = repo.list_transactions("KCLG-0102-001", Some(2), None).await.unwrap();
        let ids: Vec<&str> = first_page.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["dep-4", "dep-3"]);

        let second_page = repo
            .list_transactions("KCLG-0102-001", Some(2), Some("dep-3".to_string()))
            .await
            .unwrap();
        let ids: Vec<&str> = second_page.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["dep-2", "dep-1"]);

        let all = repo.list_transactions("KCLG-0102-001", None, None).await.unwrap();
        assert_eq!(all.len(), 5);
    }

    #[tokio::test]
    async fn test_apply_decision_updates_state_and_balance_together() {
        let (repo, accounts) = setup_with_account(0).await;
        let deposit = pending("dep-1", TransactionKind::Deposit, 50_000, Utc::now());
        repo.store_transaction(&deposit).await.unwrap();

        match repo.apply_decision(&accept(&deposit)).await.unwrap() {
            DecisionOutcome::Applied { transaction, account } => {
                assert_eq!(transaction.state, TransactionState::Accepted);
                assert_eq!(transaction.decided_by.as_deref(), Some("rt-1"));
                assert_eq!(account.balance, 50_000);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }

        let stored = repo.get_transaction("dep-1").await.unwrap().unwrap();
        assert_eq!(stored.state, TransactionState::Accepted);
        let account = accounts.get_account("KCLG-0102-001").await.unwrap().unwrap();
        assert_eq!(account.balance, 50_000);
    }

    #[tokio::test]
    async fn test_second_decision_is_a_state_conflict() {
        let (repo, accounts) = setup_with_account(0).await;
        let deposit = pending("dep-1", TransactionKind::Deposit, 10_000, Utc::now());
        repo.store_transaction(&deposit).await.unwrap();

        repo.apply_decision(&accept(&deposit)).await.unwrap();
        let outcome = repo.apply_decision(&accept(&deposit)).await.unwrap();
        assert!(matches!(outcome, DecisionOutcome::StateConflict(ref t) if t.state == TransactionState::Accepted));

        let account = accounts.get_account("KCLG-0102-001").await.unwrap().unwrap();
        assert_eq!(account.balance, 10_000);
    }

    #[tokio::test]
    async fn test_overdrawing_decision_writes_nothing() {
        let (repo, accounts) = setup_with_account(20_000).await;
        let withdrawal = pending("wd-1", TransactionKind::Withdrawal, 50_000, Utc::now());
        repo.store_transaction(&withdrawal).await.unwrap();

        let outcome = repo.apply_decision(&accept(&withdrawal)).await.unwrap();
        assert_eq!(outcome, DecisionOutcome::InsufficientBalance { available: 20_000 });

        let stored = repo.get_transaction("wd-1").await.unwrap().unwrap();
        assert_eq!(stored.state, TransactionState::Pending);
        let account = accounts.get_account("KCLG-0102-001").await.unwrap().unwrap();
        assert_eq!(account.balance, 20_000);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_decisions_on_file_database_all_apply() {
        let dir = tempfile::tempdir().unwrap();
        let db = DbConnection::new(&DatabaseConfig {
            url: format!("sqlite:{}", dir.path().join("ledger.db").display()),
            max_connections: 5,
        })
        .await
        .unwrap();
        let (repo, accounts) = with_account(db, 0).await;

        let base = Utc::now();
        let mut deposits = Vec::new();
        for i in 0..20 {
            let deposit = pending(&format!("dep-{}", i), TransactionKind::Deposit, 1000, base + Duration::milliseconds(i));
            repo.store_transaction(&deposit).await.unwrap();
            deposits.push(deposit);
        }

        let handles: Vec<_> = deposits
            .iter()
            .map(|deposit| {
                let repo = repo.clone();
                let decision = accept(deposit);
                tokio::spawn(async move { repo.apply_decision(&decision).await })
            })
            .collect();

        for handle in handles {
            let outcome = handle.await.unwrap().unwrap();
            assert!(matches!(outcome, DecisionOutcome::Applied { .. }), "{:?}", outcome);
        }

        let account = accounts.get_account("KCLG-0102-001").await.unwrap().unwrap();
        assert_eq!(account.balance, 20_000);
    }

    #[tokio::test]
    async fn test_unknown_transaction_decision() {
        let (repo, _) = setup_with_account(0).await;
        let ghost = pending("dep-404", TransactionKind::Deposit, 1000, Utc::now());
        assert_eq!(repo.apply_decision(&accept(&ghost)).await.unwrap(), DecisionOutcome::NotFound);
    }

    #[tokio::test]
    async fn test_client_token_lookup() {
        let (repo, _) = setup_with_account(0).await;
        let mut deposit = pending("dep-1", TransactionKind::Deposit, 1000, Utc::now());
        deposit.client_token = Some("tok-1".to_string());
        repo.store_transaction(&deposit).await.unwrap();

        let found = repo.find_by_client_token("KCLG-0102-001", "tok-1").await.unwrap();
        assert_eq!(found.map(|t| t.id), Some("dep-1".to_string()));
        assert!(repo.find_by_client_token("KCLG-0102-001", "tok-2").await.unwrap().is_none());

        let mut duplicate = pending("dep-2", TransactionKind::Deposit, 1000, Utc::now());
        duplicate.client_token = Some("tok-1".to_string());
        assert!(repo.store_transaction(&duplicate).await.is_err());
    }

    #[tokio::test]
    async fn test_accepted_range_filters_state_kind_and_time() {
        let (repo, _) = setup_with_account(100_000).await;
        let now = Utc::now();
        let inside = pending("dep-in", TransactionKind::Deposit, 5000, now);
        let outside = pending("dep-old", TransactionKind::Deposit, 7000, now - Duration::days(40));
        let withdrawal = pending("wd-in", TransactionKind::Withdrawal, 3000, now);
        let still_pending = pending("dep-pending", TransactionKind::Deposit, 9000, now);
        for tx in [&inside, &outside, &withdrawal, &still_pending] {
            repo.store_transaction(tx).await.unwrap();
        }
        for tx in [&inside, &outside, &withdrawal] {
            repo.apply_decision(&accept(tx)).await.unwrap();
        }

        let start = now - Duration::days(1);
        let end = now + Duration::days(1);
        let deposits = repo
            .list_accepted_in_range("0102", Some(TransactionKind::Deposit), start, end)
            .await
            .unwrap();
        assert_eq!(deposits.iter().map(|t| t.id.as_str()).collect::<Vec<_>>(), vec!["dep-in"]);

        let all_kinds = repo.list_accepted_in_range("0102", None, start, end).await.unwrap();
        assert_eq!(all_kinds.len(), 2);

        let pending_queue = repo
            .list_by_group_and_state("0102", TransactionState::Pending)
            .await
            .unwrap();
        assert_eq!(pending_queue.len(), 1);
        assert_eq!(pending_queue[0].id, "dep-pending");
    }
}
