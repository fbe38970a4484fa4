//! Approval workflow: the PENDING -> ACCEPTED / REJECTED state machine.
//!
//! This is the only code path that changes an account balance. The state
//! transition and the balance change are committed by the store as one
//! atomic unit (see [`TransactionStorage::apply_decision`]), so concurrent
//! decisions on the same transaction apply at most once.
//!
//! Deciding an already-decided transaction the same way again returns it
//! unchanged, which makes client retries after an ambiguous failure safe.

use log::{error, info, warn};
use std::sync::Arc;

use crate::config::StorePolicy;
use crate::domain::account_service::require_operator;
use crate::domain::errors::{LedgerError, LedgerResult};
use crate::domain::models::{
    account::Account,
    actor::Actor,
    transaction::{Transaction, TransactionKind, TransactionState},
};
use crate::domain::notification::{LedgerEvent, NotificationSink};
use crate::domain::timestamp_now;
use crate::storage::call_policy::{read_with_retry, write_once};
use crate::storage::{AccountStorage, Connection, Decision, DecisionOutcome, TransactionStorage};

const MAX_REASON_LENGTH: usize = 256;

#[derive(Clone)]
pub struct ApprovalService<C: Connection> {
    account_repository: C::AccountRepository,
    transaction_repository: C::TransactionRepository,
    store_policy: StorePolicy,
    notifications: Arc<dyn NotificationSink>,
}

impl<C: Connection> ApprovalService<C> {
    pub fn new(
        connection: Arc<C>,
        store_policy: StorePolicy,
        notifications: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            account_repository: connection.create_account_repository(),
            transaction_repository: connection.create_transaction_repository(),
            store_policy,
            notifications,
        }
    }

    /// Accept a pending transaction and apply it to the balance.
    ///
    /// A withdrawal that no longer fits the balance is rejected on the spot
    /// with a system reason and `InsufficientBalance` is returned.
    pub async fn approve(&self, transaction_id: &str, actor: &Actor) -> LedgerResult<Transaction> {
        require_operator(actor, "approve transactions")?;
        info!("Approving transaction {} by {}", transaction_id, actor.id);

        let current = self.load_transaction(transaction_id).await?;
        match current.state {
            TransactionState::Accepted => {
                info!("Transaction {} already accepted, replaying", current.id);
                return Ok(current);
            }
            TransactionState::Rejected => {
                return Err(LedgerError::InvalidState {
                    id: current.id,
                    state: current.state,
                })
            }
            TransactionState::Pending => {}
        }

        if current.kind == TransactionKind::Withdrawal {
            let account = self.load_account(&current.account_id).await?;
            if current.nominal > account.balance {
                return self
                    .reject_for_insufficient_balance(&current, account.balance, actor)
                    .await;
            }
        }

        let decision = Decision {
            transaction_id: current.id.clone(),
            new_state: TransactionState::Accepted,
            balance_delta: current.balance_delta(),
            decided_by: actor.id.clone(),
            decided_at: timestamp_now(),
            rejection_reason: None,
        };

        match self.apply(&decision).await? {
            DecisionOutcome::Applied {
                transaction,
                account,
            } => {
                info!(
                    "Transaction {} accepted, account {} balance now {}",
                    transaction.id, account.id, account.balance
                );
                self.notify_approved(&transaction, &account);
                Ok(transaction)
            }
            DecisionOutcome::StateConflict(latest) => {
                settle_conflict(latest, TransactionState::Accepted)
            }
            DecisionOutcome::InsufficientBalance { available } => {
                // The balance moved between our check and the guarded update
                self.reject_for_insufficient_balance(&current, available, actor)
                    .await
            }
            DecisionOutcome::NotFound => Err(LedgerError::transaction_not_found(transaction_id)),
        }
    }

    /// Reject a pending transaction. The balance is never touched.
    pub async fn reject(
        &self,
        transaction_id: &str,
        actor: &Actor,
        reason: &str,
    ) -> LedgerResult<Transaction> {
        require_operator(actor, "reject transactions")?;

        let reason = reason.trim();
        if reason.is_empty() {
            return Err(LedgerError::validation("Rejection reason cannot be empty"));
        }
        if reason.chars().count() > MAX_REASON_LENGTH {
            return Err(LedgerError::validation(format!(
                "Rejection reason cannot exceed {} characters",
                MAX_REASON_LENGTH
            )));
        }
        info!("Rejecting transaction {} by {}", transaction_id, actor.id);

        let current = self.load_transaction(transaction_id).await?;
        match current.state {
            TransactionState::Rejected => {
                info!("Transaction {} already rejected, replaying", current.id);
                return Ok(current);
            }
            TransactionState::Accepted => {
                return Err(LedgerError::InvalidState {
                    id: current.id,
                    state: current.state,
                })
            }
            TransactionState::Pending => {}
        }

        let decision = rejection(&current, actor, reason.to_string());
        match self.apply(&decision).await? {
            DecisionOutcome::Applied {
                transaction,
                account,
            } => {
                info!("Transaction {} rejected: {}", transaction.id, reason);
                self.notify_rejected(&transaction, &account);
                Ok(transaction)
            }
            DecisionOutcome::StateConflict(latest) => {
                settle_conflict(latest, TransactionState::Rejected)
            }
            DecisionOutcome::InsufficientBalance { available } => Err(LedgerError::Storage(
                anyhow::anyhow!(
                    "Store refused a rejection of {} on balance grounds (available {})",
                    transaction_id,
                    available
                ),
            )),
            DecisionOutcome::NotFound => Err(LedgerError::transaction_not_found(transaction_id)),
        }
    }

    /// Record the automatic rejection and report the shortfall to the caller.
    ///
    /// A failure to record it is logged only: the transaction stays PENDING
    /// and the next decision attempt repeats the check. If another decision
    /// landed first, the approval settles against that instead.
    async fn reject_for_insufficient_balance(
        &self,
        transaction: &Transaction,
        available: i64,
        actor: &Actor,
    ) -> LedgerResult<Transaction> {
        warn!(
            "Withdrawal {} of {} exceeds balance {}, rejecting automatically",
            transaction.id, transaction.nominal, available
        );
        let reason = format!(
            "Rejected automatically: insufficient balance (requested {}, available {})",
            transaction.nominal, available
        );

        match self.apply(&rejection(transaction, actor, reason)).await {
            Ok(DecisionOutcome::Applied {
                transaction,
                account,
            }) => self.notify_rejected(&transaction, &account),
            Ok(DecisionOutcome::StateConflict(latest)) => {
                warn!(
                    "Transaction {} was decided concurrently ({}), automatic rejection skipped",
                    latest.id, latest.state
                );
                return settle_conflict(latest, TransactionState::Accepted);
            }
            Ok(other) => warn!(
                "Automatic rejection of {} not applied: {:?}",
                transaction.id, other
            ),
            Err(e) => error!(
                "Failed to record automatic rejection of {}: {}",
                transaction.id, e
            ),
        }

        Err(LedgerError::InsufficientBalance {
            requested: transaction.nominal,
            available,
        })
    }

    async fn apply(&self, decision: &Decision) -> LedgerResult<DecisionOutcome> {
        Ok(write_once(
            &self.store_policy,
            "apply_decision",
            self.transaction_repository.apply_decision(decision),
        )
        .await?)
    }

    async fn load_transaction(&self, transaction_id: &str) -> LedgerResult<Transaction> {
        read_with_retry(&self.store_policy, "get_transaction", || {
            self.transaction_repository.get_transaction(transaction_id)
        })
        .await?
        .ok_or_else(|| LedgerError::transaction_not_found(transaction_id))
    }

    async fn load_account(&self, account_id: &str) -> LedgerResult<Account> {
        read_with_retry(&self.store_policy, "get_account", || {
            self.account_repository.get_account(account_id)
        })
        .await?
        .ok_or_else(|| LedgerError::account_not_found(account_id))
    }

    fn notify_approved(&self, transaction: &Transaction, account: &Account) {
        self.notifications.notify(LedgerEvent::Approved {
            recipient_id: account.owner_id.clone(),
            account_id: account.id.clone(),
            transaction_id: transaction.id.clone(),
            kind: transaction.kind,
            nominal: transaction.nominal,
            balance: account.balance,
        });

        if transaction.kind == TransactionKind::Deposit && account.has_reached_target() {
            info!(
                "Account {} reached its target of {}",
                account.id, account.target
            );
            self.notifications.notify(LedgerEvent::GoalReached {
                recipient_id: account.owner_id.clone(),
                account_id: account.id.clone(),
                balance: account.balance,
                target: account.target,
            });
        }
    }

    fn notify_rejected(&self, transaction: &Transaction, account: &Account) {
        self.notifications.notify(LedgerEvent::Rejected {
            recipient_id: account.owner_id.clone(),
            account_id: account.id.clone(),
            transaction_id: transaction.id.clone(),
            reason: transaction.rejection_reason.clone().unwrap_or_default(),
        });
    }
}

fn rejection(transaction: &Transaction, actor: &Actor, reason: String) -> Decision {
    Decision {
        transaction_id: transaction.id.clone(),
        new_state: TransactionState::Rejected,
        balance_delta: 0,
        decided_by: actor.id.clone(),
        decided_at: timestamp_now(),
        rejection_reason: Some(reason),
    }
}

/// Another decision won the race. Matching it is a replay; anything else is stale.
fn settle_conflict(latest: Transaction, wanted: TransactionState) -> LedgerResult<Transaction> {
    if latest.state == wanted {
        Ok(latest)
    } else {
        Err(LedgerError::InvalidState {
            id: latest.id,
            state: latest.state,
        })
    }
}
