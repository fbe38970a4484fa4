//! SQLite storage with scripted interference, for service tests.
//!
//! Every call is delegated to the real repositories. A [`Script`] can make
//! upcoming sequence reads fail, or let a competing operator accept a
//! transaction right before a rejection of it reaches the store.

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, Utc};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use crate::domain::models::{
    account::{Account, AccountStatus},
    transaction::{Transaction, TransactionKind, TransactionState},
};
use crate::storage::sqlite::{AccountRepository, DbConnection, TransactionRepository};
use crate::storage::traits::{
    AccountStorage, Connection, Decision, DecisionOutcome, TransactionStorage,
};

const COMPETING_OPERATOR: &str = "rt-02";

#[derive(Default)]
pub struct Script {
    failing_sequence_reads: AtomicU32,
    competing_top_up: Mutex<Option<i64>>,
}

impl Script {
    /// Fail the next `count` calls to `next_account_sequence`
    pub fn fail_sequence_reads(&self, count: u32) {
        self.failing_sequence_reads.store(count, Ordering::SeqCst);
    }

    /// Before the next rejection is stored, another operator tops the
    /// account up by `nominal` and accepts the transaction being rejected
    pub fn accept_before_next_rejection(&self, nominal: i64) {
        *self.competing_top_up.lock().unwrap() = Some(nominal);
    }

    fn take_sequence_failure(&self) -> bool {
        self.failing_sequence_reads
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    fn take_top_up(&self) -> Option<i64> {
        self.competing_top_up.lock().unwrap().take()
    }
}

#[derive(Clone)]
pub struct ScriptedConnection {
    inner: DbConnection,
    pub script: Arc<Script>,
}

impl ScriptedConnection {
    pub async fn new_in_memory() -> Result<Self> {
        Ok(Self {
            inner: DbConnection::new_in_memory().await?,
            script: Arc::new(Script::default()),
        })
    }
}

impl Connection for ScriptedConnection {
    type AccountRepository = ScriptedAccountRepository;
    type TransactionRepository = ScriptedTransactionRepository;

    fn create_account_repository(&self) -> Self::AccountRepository {
        ScriptedAccountRepository {
            inner: self.inner.create_account_repository(),
            script: self.script.clone(),
        }
    }

    fn create_transaction_repository(&self) -> Self::TransactionRepository {
        ScriptedTransactionRepository {
            inner: self.inner.create_transaction_repository(),
            script: self.script.clone(),
        }
    }
}

#[derive(Clone)]
pub struct ScriptedAccountRepository {
    inner: AccountRepository,
    script: Arc<Script>,
}

#[async_trait]
impl AccountStorage for ScriptedAccountRepository {
    async fn store_account(&self, account: &Account) -> Result<()> {
        self.inner.store_account(account).await
    }

    async fn get_account(&self, account_id: &str) -> Result<Option<Account>> {
        self.inner.get_account(account_id).await
    }

    async fn list_accounts_by_group(&self, group_id: &str) -> Result<Vec<Account>> {
        self.inner.list_accounts_by_group(group_id).await
    }

    async fn next_account_sequence(&self, group_id: &str) -> Result<u32> {
        if self.script.take_sequence_failure() {
            bail!("database is locked");
        }
        self.inner.next_account_sequence(group_id).await
    }

    async fn update_account_status(
        &self,
        account_id: &str,
        status: AccountStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<bool> {
        self.inner
            .update_account_status(account_id, status, updated_at)
            .await
    }
}

#[derive(Clone)]
pub struct ScriptedTransactionRepository {
    inner: TransactionRepository,
    script: Arc<Script>,
}

impl ScriptedTransactionRepository {
    async fn accept_competing(&self, transaction_id: &str, top_up: i64) -> Result<()> {
        let target = self
            .inner
            .get_transaction(transaction_id)
            .await?
            .ok_or_else(|| anyhow!("Unknown transaction {}", transaction_id))?;
        let now = Utc::now().trunc_subsecs(6);
        let deposit = Transaction {
            id: format!("dep-topup-{}", target.id),
            account_id: target.account_id.clone(),
            kind: TransactionKind::Deposit,
            nominal: top_up,
            note: None,
            withdrawal_scope: None,
            state: TransactionState::Pending,
            requested_by: COMPETING_OPERATOR.to_string(),
            decided_by: None,
            rejection_reason: None,
            client_token: None,
            created_at: now,
            decided_at: None,
        };
        self.inner.store_transaction(&deposit).await?;

        for accepted in [&deposit, &target] {
            let outcome = self
                .inner
                .apply_decision(&Decision {
                    transaction_id: accepted.id.clone(),
                    new_state: TransactionState::Accepted,
                    balance_delta: accepted.balance_delta(),
                    decided_by: COMPETING_OPERATOR.to_string(),
                    decided_at: now,
                    rejection_reason: None,
                })
                .await?;
            if !matches!(outcome, DecisionOutcome::Applied { .. }) {
                bail!("Competing accept of {} not applied: {:?}", accepted.id, outcome);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl TransactionStorage for ScriptedTransactionRepository {
    async fn store_transaction(&self, transaction: &Transaction) -> Result<()> {
        self.inner.store_transaction(transaction).await
    }

    async fn get_transaction(&self, transaction_id: &str) -> Result<Option<Transaction>> {
        self.inner.get_transaction(transaction_id).await
    }

    async fn find_by_client_token(
        &self,
        account_id: &str,
        client_token: &str,
    ) -> Result<Option<Transaction>> {
        self.inner.find_by_client_token(account_id, client_token).await
    }

    async fn list_transactions(
        &self,
        account_id: &str,
        limit: Option<u32>,
        after: Option<String>,
    ) -> Result<Vec<Transaction>> {
        self.inner.list_transactions(account_id, limit, after).await
    }

    async fn list_by_group_and_state(
        &self,
        group_id: &str,
        state: TransactionState,
    ) -> Result<Vec<Transaction>> {
        self.inner.list_by_group_and_state(group_id, state).await
    }

    async fn list_accepted_in_range(
        &self,
        group_id: &str,
        kind: Option<TransactionKind>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Transaction>> {
        self.inner
            .list_accepted_in_range(group_id, kind, start, end)
            .await
    }

    async fn apply_decision(&self, decision: &Decision) -> Result<DecisionOutcome> {
        if decision.new_state == TransactionState::Rejected {
            if let Some(top_up) = self.script.take_top_up() {
                self.accept_competing(&decision.transaction_id, top_up).await?;
            }
        }
        self.inner.apply_decision(decision).await
    }
}
