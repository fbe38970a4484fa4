//! # Storage Traits
//!
//! This module defines the storage abstraction traits that allow different
//! storage backends to be used interchangeably in the domain layer.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::models::{
    account::{Account, AccountStatus},
    transaction::{Transaction, TransactionKind, TransactionState},
};

/// Trait defining the interface for account storage operations
#[async_trait]
pub trait AccountStorage: Send + Sync {
    /// Store a new account; fails if the ID is already taken
    async fn store_account(&self, account: &Account) -> Result<()>;

    /// Retrieve a specific account by ID
    async fn get_account(&self, account_id: &str) -> Result<Option<Account>>;

    /// List the accounts of a group ordered by creation time (oldest first)
    async fn list_accounts_by_group(&self, group_id: &str) -> Result<Vec<Account>>;

    /// Next free sequence number for account IDs within a group
    async fn next_account_sequence(&self, group_id: &str) -> Result<u32>;

    /// Set the status of an account.
    /// Returns false if the account does not exist
    async fn update_account_status(
        &self,
        account_id: &str,
        status: AccountStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<bool>;
}

/// A state transition for a pending transaction, applied together with its
/// balance effect as one atomic unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub transaction_id: String,
    pub new_state: TransactionState,
    /// Signed change applied to the account balance (0 for rejections)
    pub balance_delta: i64,
    pub decided_by: String,
    pub decided_at: DateTime<Utc>,
    pub rejection_reason: Option<String>,
}

/// Result of [`TransactionStorage::apply_decision`].
#[derive(Debug, Clone, PartialEq)]
pub enum DecisionOutcome {
    /// Both the state transition and the balance change were committed
    Applied {
        transaction: Transaction,
        account: Account,
    },
    /// The transaction was no longer PENDING; nothing was written
    StateConflict(Transaction),
    /// The balance change would make the balance negative; nothing was written
    InsufficientBalance { available: i64 },
    /// Unknown transaction ID
    NotFound,
}

/// Trait defining the interface for transaction log storage operations
#[async_trait]
pub trait TransactionStorage: Send + Sync {
    /// Append a new transaction to the log
    async fn store_transaction(&self, transaction: &Transaction) -> Result<()>;

    /// Retrieve a specific transaction by ID
    async fn get_transaction(&self, transaction_id: &str) -> Result<Option<Transaction>>;

    /// Find a transaction previously submitted with the same client token
    async fn find_by_client_token(
        &self,
        account_id: &str,
        client_token: &str,
    ) -> Result<Option<Transaction>>;

    /// List an account's transactions, newest first, starting after the
    /// transaction with ID `after` when given
    async fn list_transactions(
        &self,
        account_id: &str,
        limit: Option<u32>,
        after: Option<String>,
    ) -> Result<Vec<Transaction>>;

    /// List transactions of all accounts in a group with the given state,
    /// oldest first
    async fn list_by_group_and_state(
        &self,
        group_id: &str,
        state: TransactionState,
    ) -> Result<Vec<Transaction>>;

    /// List ACCEPTED transactions of a group created within `[start, end)`,
    /// optionally restricted to one kind
    async fn list_accepted_in_range(
        &self,
        group_id: &str,
        kind: Option<TransactionKind>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Transaction>>;

    /// Atomically transition a PENDING transaction and adjust its account's
    /// balance. Implementations must guard on the current state and on the
    /// resulting balance staying non-negative.
    async fn apply_decision(&self, decision: &Decision) -> Result<DecisionOutcome>;
}

/// Trait defining the interface for storage connections
///
/// This trait abstracts away the specific connection type and provides
/// factory methods for creating repositories. This allows the domain
/// layer to work with any storage backend without knowing the implementation details.
pub trait Connection: Send + Sync + Clone + 'static {
    /// The type of AccountStorage this connection creates
    type AccountRepository: AccountStorage + Clone + 'static;

    /// The type of TransactionStorage this connection creates
    type TransactionRepository: TransactionStorage + Clone + 'static;

    /// Create a new account repository for this connection
    fn create_account_repository(&self) -> Self::AccountRepository;

    /// Create a new transaction repository for this connection
    fn create_transaction_repository(&self) -> Self::TransactionRepository;
}
