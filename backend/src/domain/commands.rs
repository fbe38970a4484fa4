//! Domain-level command and query types
//! These structs are used by services inside the domain layer and are **not**
//! exposed over the public API. The REST layer is responsible for mapping the
//! public DTOs defined in the `shared` crate to these internal types.

pub mod accounts {
    /// Input for opening a new savings account.
    #[derive(Debug, Clone)]
    pub struct CreateAccountCommand {
        pub owner_id: String,
        pub display_name: String,
        pub address: String,
        pub group_id: String,
        pub target: i64,
    }
}

pub mod transactions {
    use crate::domain::models::transaction::{
        Transaction as DomainTransaction, TransactionKind, WithdrawalScope,
    };

    /// Input for requesting a deposit or withdrawal.
    #[derive(Debug, Clone)]
    pub struct CreateTransactionCommand {
        pub account_id: String,
        pub kind: TransactionKind,
        pub nominal: i64,
        pub note: Option<String>,
        pub withdrawal_scope: Option<WithdrawalScope>,
        pub client_token: Option<String>,
    }

    /// Query parameters for listing an account's transactions.
    #[derive(Debug, Clone, Default)]
    pub struct TransactionListQuery {
        pub after: Option<String>,
        pub limit: Option<u32>,
    }

    /// Generic pagination info returned by list queries.
    #[derive(Debug, Clone, PartialEq)]
    pub struct PaginationInfo {
        pub has_more: bool,
        pub next_cursor: Option<String>,
    }

    /// Result of listing transactions.
    #[derive(Debug, Clone)]
    pub struct TransactionListResult {
        pub transactions: Vec<DomainTransaction>,
        pub pagination: PaginationInfo,
    }
}

pub mod reporting {
    use crate::domain::models::{period::PeriodWindow, transaction::Transaction};
    use chrono::NaiveDate;
    use shared::Period;

    #[derive(Debug, Clone, PartialEq)]
    pub struct LeaderboardEntry {
        pub account_id: String,
        pub display_name: String,
        pub total_accepted: i64,
        pub transaction_count: u32,
    }

    #[derive(Debug, Clone)]
    pub struct LeaderboardResult {
        pub group_id: String,
        pub period: Period,
        pub window: PeriodWindow,
        pub entries: Vec<LeaderboardEntry>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub struct PeriodTotalsResult {
        pub group_id: String,
        pub period: Period,
        pub window: PeriodWindow,
        pub deposit_total: i64,
        pub deposit_count: u32,
        pub withdrawal_total: i64,
        pub withdrawal_count: u32,
    }

    impl PeriodTotalsResult {
        pub fn net(&self) -> i64 {
            self.deposit_total - self.withdrawal_total
        }
    }

    /// One local calendar day of an account's history.
    #[derive(Debug, Clone)]
    pub struct DailyGroup {
        pub date: NaiveDate,
        pub deposit_total: i64,
        pub withdrawal_total: i64,
        pub transactions: Vec<Transaction>,
    }
}
