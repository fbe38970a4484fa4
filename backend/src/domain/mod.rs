//! # Domain Module
//!
//! Business rules of the savings ledger. Services are generic over the
//! storage [`Connection`](crate::storage::Connection) and never touch SQL.
//!
//! - `account_service`: opening accounts, status, balance projection reads
//! - `transaction_service`: requesting deposits and withdrawals, history
//! - `approval_service`: PENDING -> ACCEPTED / REJECTED, the only balance writer
//! - `reporting_service`: leaderboards, period totals, progress, daily history

use chrono::{DateTime, SubsecRound, Utc};

pub mod account_card;
pub mod account_service;
pub mod approval_service;
pub mod commands;
pub mod errors;
pub mod models;
pub mod notification;
pub mod reporting_service;
pub mod transaction_service;

pub use account_service::AccountService;
pub use approval_service::ApprovalService;
pub use errors::{LedgerError, LedgerResult};
pub use reporting_service::ReportingService;
pub use transaction_service::TransactionService;

/// Current time at the precision the store keeps (microseconds)
pub(crate) fn timestamp_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}
