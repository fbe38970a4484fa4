//! Error taxonomy surfaced by every ledger operation.
//!
//! None of these are retried by the core. Callers react to them:
//! validation errors are shown immediately, `NotFound` and `InvalidState`
//! mean the client state is stale and should be refreshed.

use crate::domain::models::transaction::TransactionState;

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
    #[error("Transaction {id} is {state}, only PENDING transactions can be decided")]
    InvalidState { id: String, state: TransactionState },
    #[error("Insufficient balance: requested {requested}, available {available}")]
    InsufficientBalance { requested: i64, available: i64 },
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl LedgerError {
    pub fn validation(message: impl Into<String>) -> Self {
        LedgerError::Validation(message.into())
    }

    pub fn account_not_found(id: &str) -> Self {
        LedgerError::NotFound {
            entity: "Account",
            id: id.to_string(),
        }
    }

    pub fn transaction_not_found(id: &str) -> Self {
        LedgerError::NotFound {
            entity: "Transaction",
            id: id.to_string(),
        }
    }

    /// Short machine-readable name used in API error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            LedgerError::Validation(_) => "validation",
            LedgerError::NotFound { .. } => "not_found",
            LedgerError::InvalidState { .. } => "invalid_state",
            LedgerError::InsufficientBalance { .. } => "insufficient_balance",
            LedgerError::Forbidden(_) => "forbidden",
            LedgerError::Storage(_) => "storage",
        }
    }
}

pub type LedgerResult<T> = std::result::Result<T, LedgerError>;
