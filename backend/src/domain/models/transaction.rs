//! Domain model for a deposit or withdrawal request.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Deposit => "DEPOSIT",
            TransactionKind::Withdrawal => "WITHDRAWAL",
        }
    }

    fn id_prefix(&self) -> &'static str {
        match self {
            TransactionKind::Deposit => "dep",
            TransactionKind::Withdrawal => "wd",
        }
    }
}

impl FromStr for TransactionKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DEPOSIT" => Ok(TransactionKind::Deposit),
            "WITHDRAWAL" => Ok(TransactionKind::Withdrawal),
            other => Err(anyhow::anyhow!("Unknown transaction kind: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WithdrawalScope {
    Partial,
    Full,
}

impl WithdrawalScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            WithdrawalScope::Partial => "PARTIAL",
            WithdrawalScope::Full => "FULL",
        }
    }
}

impl FromStr for WithdrawalScope {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PARTIAL" => Ok(WithdrawalScope::Partial),
            "FULL" => Ok(WithdrawalScope::Full),
            other => Err(anyhow::anyhow!("Unknown withdrawal scope: {}", other)),
        }
    }
}

/// Lifecycle state. PENDING is the only non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionState {
    Pending,
    Accepted,
    Rejected,
}

impl TransactionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionState::Pending => "PENDING",
            TransactionState::Accepted => "ACCEPTED",
            TransactionState::Rejected => "REJECTED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, TransactionState::Pending)
    }
}

impl fmt::Display for TransactionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionState {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(TransactionState::Pending),
            "ACCEPTED" => Ok(TransactionState::Accepted),
            "REJECTED" => Ok(TransactionState::Rejected),
            other => Err(anyhow::anyhow!("Unknown transaction state: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub account_id: String,
    pub kind: TransactionKind,
    pub nominal: i64,
    pub note: Option<String>,
    pub withdrawal_scope: Option<WithdrawalScope>,
    pub state: TransactionState,
    pub requested_by: String,
    pub decided_by: Option<String>,
    pub rejection_reason: Option<String>,
    pub client_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
}

impl Transaction {
    /// Generate a unique transaction ID based on kind and creation time.
    /// Format: <dep|wd>-<timestamp_ms>-<random_suffix>
    /// Example: dep-1625846400123-af3c91d2
    pub fn generate_id(kind: TransactionKind, timestamp_ms: i64) -> String {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        format!("{}-{}-{}", kind.id_prefix(), timestamp_ms, &suffix[..8])
    }

    /// Signed effect this transaction has on the balance once accepted.
    pub fn balance_delta(&self) -> i64 {
        match self.kind {
            TransactionKind::Deposit => self.nominal,
            TransactionKind::Withdrawal => -self.nominal,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.state == TransactionState::Pending
    }
}
