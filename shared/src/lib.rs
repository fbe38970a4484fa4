use serde::{Deserialize, Serialize};
use std::fmt;

/// Savings account ("kencleng") as exposed over the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Account ID in format "KCLG-<group>-<sequence>", e.g. "KCLG-0102-001"
    pub id: String,
    /// ID of the resident who owns this account
    pub owner_id: String,
    pub display_name: String,
    pub address: String,
    /// Block (RT) identifier the account belongs to
    pub group_id: String,
    /// Current balance in the smallest currency unit
    pub balance: i64,
    /// Savings goal in the smallest currency unit
    pub target: i64,
    pub status: AccountStatus,
    pub created_at: String, // RFC 3339 timestamp
    pub updated_at: String, // RFC 3339 timestamp
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountStatus {
    Active,
    Inactive,
}

/// A deposit or withdrawal request and its approval state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub account_id: String,
    pub kind: TransactionKind,
    /// Requested amount, always positive
    pub nominal: i64,
    pub note: Option<String>,
    /// Only present for withdrawals
    pub withdrawal_scope: Option<WithdrawalScope>,
    pub state: TransactionState,
    pub requested_by: String,
    pub decided_by: Option<String>,
    pub rejection_reason: Option<String>,
    pub client_token: Option<String>,
    pub created_at: String,         // RFC 3339 timestamp
    pub decided_at: Option<String>, // RFC 3339 timestamp
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WithdrawalScope {
    Partial,
    Full,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionState {
    Pending,
    Accepted,
    Rejected,
}

/// Reporting window used by leaderboards and totals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Week,
    Month,
    Year,
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Period::Week => write!(f, "week"),
            Period::Month => write!(f, "month"),
            Period::Year => write!(f, "year"),
        }
    }
}

/// Request for creating a new savings account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateAccountRequest {
    pub owner_id: String,
    pub display_name: String,
    #[serde(default)]
    pub address: String,
    pub group_id: String,
    pub target: i64,
}

/// Request for activating or deactivating an account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateAccountStatusRequest {
    pub status: AccountStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountListResponse {
    pub accounts: Vec<Account>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub account_id: String,
    pub balance: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressResponse {
    pub account_id: String,
    pub balance: i64,
    pub target: i64,
    /// Percentage of the target saved, 0..=100
    pub progress: u8,
}

/// Text payload carried by an account's QR card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountCard {
    pub account_id: String,
    pub owner_id: String,
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountCardResponse {
    pub card: AccountCard,
    /// Encoded text to render into a QR image
    pub payload: String,
}

/// Scanned card text to resolve back to its account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolveCardRequest {
    pub payload: String,
}

/// Request for creating a deposit or withdrawal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTransactionRequest {
    pub account_id: String,
    pub kind: TransactionKind,
    pub nominal: i64,
    pub note: Option<String>,
    pub withdrawal_scope: Option<WithdrawalScope>,
    /// Client-generated token; resubmitting the same token returns the original transaction
    pub client_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectTransactionRequest {
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionListRequest {
    /// Cursor for pagination - transaction ID to start after
    pub after: Option<String>,
    /// Maximum number of transactions to return
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionListResponse {
    pub transactions: Vec<Transaction>,
    pub pagination: PaginationInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginationInfo {
    pub has_more: bool,
    pub next_cursor: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingTransactionsResponse {
    pub group_id: String,
    pub transactions: Vec<Transaction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub account_id: String,
    pub display_name: String,
    pub total_accepted: i64,
    pub transaction_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardResponse {
    pub group_id: String,
    pub period: Period,
    pub window_start: String,
    pub window_end: String,
    pub entries: Vec<LeaderboardEntry>,
}

/// Accepted deposit and withdrawal sums for a group within a period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodTotals {
    pub group_id: String,
    pub period: Period,
    pub window_start: String,
    pub window_end: String,
    pub deposit_total: i64,
    pub deposit_count: u32,
    pub withdrawal_total: i64,
    pub withdrawal_count: u32,
    pub net: i64,
}

/// Transactions of one account that fall on the same local calendar day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyTransactionGroup {
    pub date: String, // YYYY-MM-DD
    pub deposit_total: i64,
    pub withdrawal_total: i64,
    pub transactions: Vec<Transaction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyHistoryResponse {
    pub account_id: String,
    pub days: Vec<DailyTransactionGroup>,
}

/// Error body returned by every failing endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Machine-readable error kind, e.g. "validation" or "invalid_state"
    pub kind: String,
    pub message: String,
}
