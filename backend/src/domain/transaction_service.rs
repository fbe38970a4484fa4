use log::{info, warn};
use std::sync::Arc;

use crate::config::{LedgerPolicy, StorePolicy};
use crate::domain::commands::transactions::{
    CreateTransactionCommand, PaginationInfo, TransactionListQuery, TransactionListResult,
};
use crate::domain::errors::{LedgerError, LedgerResult};
use crate::domain::models::{
    account::Account,
    actor::{Actor, Role},
    transaction::{Transaction, TransactionKind, TransactionState, WithdrawalScope},
};
use crate::domain::timestamp_now;
use crate::storage::call_policy::{read_with_retry, write_once};
use crate::storage::{AccountStorage, Connection, TransactionStorage};

const MAX_NOTE_LENGTH: usize = 256;
const DEFAULT_PAGE_SIZE: u32 = 20;
const MAX_PAGE_SIZE: u32 = 100;

/// Transaction log: creating requests and reading them back.
///
/// Creating a transaction never changes a balance. Requests stay PENDING
/// until an operator decides them through the approval workflow.
#[derive(Clone)]
pub struct TransactionService<C: Connection> {
    account_repository: C::AccountRepository,
    transaction_repository: C::TransactionRepository,
    policy: LedgerPolicy,
    store_policy: StorePolicy,
}

impl<C: Connection> TransactionService<C> {
    pub fn new(connection: Arc<C>, policy: LedgerPolicy, store_policy: StorePolicy) -> Self {
        Self {
            account_repository: connection.create_account_repository(),
            transaction_repository: connection.create_transaction_repository(),
            policy,
            store_policy,
        }
    }

    pub async fn create_transaction(
        &self,
        command: CreateTransactionCommand,
        actor: &Actor,
    ) -> LedgerResult<Transaction> {
        info!(
            "Creating {} of {} on account {} for {}",
            command.kind.as_str(),
            command.nominal,
            command.account_id,
            actor.id
        );

        if command.nominal <= 0 {
            return Err(LedgerError::validation("Nominal must be positive"));
        }
        let note = command
            .note
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string);
        if let Some(note) = &note {
            if note.chars().count() > MAX_NOTE_LENGTH {
                return Err(LedgerError::validation(format!(
                    "Note cannot exceed {} characters",
                    MAX_NOTE_LENGTH
                )));
            }
        }
        let client_token = command
            .client_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string);

        let account = self.load_account(&command.account_id).await?;
        if actor.role == Role::Resident && account.owner_id != actor.id {
            return Err(LedgerError::Forbidden(format!(
                "{} can only request transactions on their own account",
                actor.id
            )));
        }

        // A retried submission resolves to the transaction it already created
        if let Some(token) = &client_token {
            if let Some(existing) = self.find_by_client_token(&account.id, token).await? {
                info!(
                    "Client token {} already used by {}, returning it",
                    token, existing.id
                );
                return Ok(existing);
            }
        }

        if !account.is_active() {
            return Err(LedgerError::validation(format!(
                "Account {} is inactive",
                account.id
            )));
        }
        let withdrawal_scope = self.validate_amount(&command, &account)?;

        let now = timestamp_now();
        let transaction = Transaction {
            id: Transaction::generate_id(command.kind, now.timestamp_millis()),
            account_id: account.id.clone(),
            kind: command.kind,
            nominal: command.nominal,
            note,
            withdrawal_scope,
            state: TransactionState::Pending,
            requested_by: actor.id.clone(),
            decided_by: None,
            rejection_reason: None,
            client_token,
            created_at: now,
            decided_at: None,
        };

        let stored = write_once(
            &self.store_policy,
            "store_transaction",
            self.transaction_repository.store_transaction(&transaction),
        )
        .await;

        if let Err(e) = stored {
            // Two submissions with one token can race past the lookup above;
            // the unique index lets exactly one of them in.
            if let Some(token) = &transaction.client_token {
                if let Some(existing) = self.find_by_client_token(&account.id, token).await? {
                    warn!(
                        "Concurrent submission with client token {} resolved to {}",
                        token, existing.id
                    );
                    return Ok(existing);
                }
            }
            return Err(e.into());
        }

        info!(
            "Transaction {} created (PENDING) on account {}",
            transaction.id, transaction.account_id
        );
        Ok(transaction)
    }

    pub async fn get_transaction(&self, transaction_id: &str) -> LedgerResult<Transaction> {
        read_with_retry(&self.store_policy, "get_transaction", || {
            self.transaction_repository.get_transaction(transaction_id)
        })
        .await?
        .ok_or_else(|| LedgerError::transaction_not_found(transaction_id))
    }

    /// Page through an account's transactions, newest first.
    ///
    /// Fetches one row past the page to know whether more exist; the last ID
    /// of a full page is the cursor for the next one.
    pub async fn list_by_account(
        &self,
        account_id: &str,
        query: TransactionListQuery,
    ) -> LedgerResult<TransactionListResult> {
        self.load_account(account_id).await?;

        let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE);
        if limit == 0 || limit > MAX_PAGE_SIZE {
            return Err(LedgerError::validation(format!(
                "Limit must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }

        if let Some(after) = &query.after {
            let cursor = self.get_transaction(after).await;
            match cursor {
                Ok(cursor) if cursor.account_id == account_id => {}
                Ok(_) | Err(LedgerError::NotFound { .. }) => {
                    return Err(LedgerError::validation(format!("Unknown cursor: {}", after)))
                }
                Err(e) => return Err(e),
            }
        }

        let mut transactions = read_with_retry(&self.store_policy, "list_transactions", || {
            self.transaction_repository
                .list_transactions(account_id, Some(limit + 1), query.after.clone())
        })
        .await?;

        let has_more = transactions.len() > limit as usize;
        if has_more {
            transactions.truncate(limit as usize);
        }
        let next_cursor = if has_more {
            transactions.last().map(|t| t.id.clone())
        } else {
            None
        };

        Ok(TransactionListResult {
            transactions,
            pagination: PaginationInfo {
                has_more,
                next_cursor,
            },
        })
    }

    /// Operator work queue: every PENDING request in the group, oldest first
    pub async fn list_pending_by_group(&self, group_id: &str) -> LedgerResult<Vec<Transaction>> {
        Ok(
            read_with_retry(&self.store_policy, "list_pending_by_group", || {
                self.transaction_repository
                    .list_by_group_and_state(group_id, TransactionState::Pending)
            })
            .await?,
        )
    }

    /// Check the nominal against the account and resolve the withdrawal scope.
    fn validate_amount(
        &self,
        command: &CreateTransactionCommand,
        account: &Account,
    ) -> LedgerResult<Option<WithdrawalScope>> {
        match command.kind {
            TransactionKind::Deposit => {
                if command.withdrawal_scope.is_some() {
                    return Err(LedgerError::validation(
                        "Withdrawal scope is only valid for withdrawals",
                    ));
                }
                if command.nominal < self.policy.min_deposit {
                    return Err(LedgerError::validation(format!(
                        "Deposit must be at least {}",
                        self.policy.min_deposit
                    )));
                }
                if command.nominal > self.policy.max_deposit {
                    return Err(LedgerError::validation(format!(
                        "Deposit cannot exceed {}",
                        self.policy.max_deposit
                    )));
                }
                Ok(None)
            }
            TransactionKind::Withdrawal => {
                if command.nominal > account.balance {
                    return Err(LedgerError::validation(format!(
                        "Withdrawal of {} exceeds current balance {}",
                        command.nominal, account.balance
                    )));
                }
                let scope = command.withdrawal_scope.unwrap_or(WithdrawalScope::Partial);
                if scope == WithdrawalScope::Full && command.nominal != account.balance {
                    return Err(LedgerError::validation(format!(
                        "A full withdrawal must take the whole balance of {}",
                        account.balance
                    )));
                }
                Ok(Some(scope))
            }
        }
    }

    async fn load_account(&self, account_id: &str) -> LedgerResult<Account> {
        read_with_retry(&self.store_policy, "get_account", || {
            self.account_repository.get_account(account_id)
        })
        .await?
        .ok_or_else(|| LedgerError::account_not_found(account_id))
    }

    async fn find_by_client_token(
        &self,
        account_id: &str,
        token: &str,
    ) -> LedgerResult<Option<Transaction>> {
        Ok(
            read_with_retry(&self.store_policy, "find_by_client_token", || {
                self.transaction_repository
                    .find_by_client_token(account_id, token)
            })
            .await?,
        )
    }
}
