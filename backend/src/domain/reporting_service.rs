//! Read-only aggregation over ACCEPTED transactions.
//!
//! Nothing here writes to the store. Period windows are computed in the
//! community's local time from a caller-supplied `now`, so every report is
//! reproducible through its `*_at` variant.

use chrono::{DateTime, Utc};
use log::debug;
use std::collections::HashMap;
use std::sync::Arc;

use shared::Period;

use crate::config::{LedgerPolicy, StorePolicy};
use crate::domain::commands::reporting::{
    DailyGroup, LeaderboardEntry, LeaderboardResult, PeriodTotalsResult,
};
use crate::domain::errors::{LedgerError, LedgerResult};
use crate::domain::models::{
    account::Account,
    period::{local_date, PeriodWindow},
    transaction::{TransactionKind, TransactionState},
};
use crate::domain::timestamp_now;
use crate::storage::call_policy::read_with_retry;
use crate::storage::{AccountStorage, Connection, TransactionStorage};

#[derive(Clone)]
pub struct ReportingService<C: Connection> {
    account_repository: C::AccountRepository,
    transaction_repository: C::TransactionRepository,
    policy: LedgerPolicy,
    store_policy: StorePolicy,
}

impl<C: Connection> ReportingService<C> {
    pub fn new(connection: Arc<C>, policy: LedgerPolicy, store_policy: StorePolicy) -> Self {
        Self {
            account_repository: connection.create_account_repository(),
            transaction_repository: connection.create_transaction_repository(),
            policy,
            store_policy,
        }
    }

    pub async fn leaderboard(&self, group_id: &str, period: Period) -> LedgerResult<LeaderboardResult> {
        self.leaderboard_at(group_id, period, timestamp_now()).await
    }

    /// Rank the group's accounts by accepted deposits inside the window
    /// containing `now`. Accounts without deposits in the window are left
    /// out; ties go to the account opened first.
    pub async fn leaderboard_at(
        &self,
        group_id: &str,
        period: Period,
        now: DateTime<Utc>,
    ) -> LedgerResult<LeaderboardResult> {
        let window = PeriodWindow::containing(period, now, self.policy.utc_offset());
        let accounts = self.group_accounts(group_id).await?;
        let deposits = read_with_retry(&self.store_policy, "leaderboard", || {
            self.transaction_repository.list_accepted_in_range(
                group_id,
                Some(TransactionKind::Deposit),
                window.start,
                window.end,
            )
        })
        .await?;

        let mut totals: HashMap<&str, (i64, u32)> = HashMap::new();
        for deposit in &deposits {
            let entry = totals.entry(deposit.account_id.as_str()).or_insert((0, 0));
            entry.0 += deposit.nominal;
            entry.1 += 1;
        }

        let mut ranked: Vec<(&Account, i64, u32)> = accounts
            .iter()
            .filter_map(|account| {
                totals
                    .get(account.id.as_str())
                    .map(|(total, count)| (account, *total, *count))
            })
            .collect();
        ranked.sort_by(|a, b| {
            b.1.cmp(&a.1)
                .then_with(|| a.0.created_at.cmp(&b.0.created_at))
                .then_with(|| a.0.id.cmp(&b.0.id))
        });

        debug!(
            "Leaderboard for group {} ({}): {} ranked accounts",
            group_id,
            period,
            ranked.len()
        );

        Ok(LeaderboardResult {
            group_id: group_id.to_string(),
            period,
            window,
            entries: ranked
                .into_iter()
                .map(|(account, total, count)| LeaderboardEntry {
                    account_id: account.id.clone(),
                    display_name: account.display_name.clone(),
                    total_accepted: total,
                    transaction_count: count,
                })
                .collect(),
        })
    }

    pub async fn period_totals(&self, group_id: &str, period: Period) -> LedgerResult<PeriodTotalsResult> {
        self.period_totals_at(group_id, period, timestamp_now()).await
    }

    pub async fn period_totals_at(
        &self,
        group_id: &str,
        period: Period,
        now: DateTime<Utc>,
    ) -> LedgerResult<PeriodTotalsResult> {
        let window = PeriodWindow::containing(period, now, self.policy.utc_offset());
        let accepted = read_with_retry(&self.store_policy, "period_totals", || {
            self.transaction_repository
                .list_accepted_in_range(group_id, None, window.start, window.end)
        })
        .await?;

        let mut result = PeriodTotalsResult {
            group_id: group_id.to_string(),
            period,
            window,
            deposit_total: 0,
            deposit_count: 0,
            withdrawal_total: 0,
            withdrawal_count: 0,
        };
        for transaction in &accepted {
            match transaction.kind {
                TransactionKind::Deposit => {
                    result.deposit_total += transaction.nominal;
                    result.deposit_count += 1;
                }
                TransactionKind::Withdrawal => {
                    result.withdrawal_total += transaction.nominal;
                    result.withdrawal_count += 1;
                }
            }
        }
        Ok(result)
    }

    /// Account together with its progress towards the target
    pub async fn progress(&self, account_id: &str) -> LedgerResult<(Account, u8)> {
        let account = self.load_account(account_id).await?;
        let ratio = progress_ratio(account.balance, account.target);
        Ok((account, ratio))
    }

    pub async fn progress_ratio(&self, account_id: &str) -> LedgerResult<u8> {
        Ok(self.progress(account_id).await?.1)
    }

    /// Accepted and pending transactions grouped by local calendar day,
    /// newest day first. Day totals count accepted transactions only.
    pub async fn daily_history(&self, account_id: &str) -> LedgerResult<Vec<DailyGroup>> {
        self.load_account(account_id).await?;
        let offset = self.policy.utc_offset();

        let transactions = read_with_retry(&self.store_policy, "daily_history", || {
            self.transaction_repository
                .list_transactions(account_id, None, None)
        })
        .await?;

        let mut days: Vec<DailyGroup> = Vec::new();
        for transaction in transactions
            .into_iter()
            .filter(|t| t.state != TransactionState::Rejected)
        {
            let date = local_date(transaction.created_at, offset);
            let starts_new_day = days.last().map_or(true, |day| day.date != date);
            if starts_new_day {
                days.push(DailyGroup {
                    date,
                    deposit_total: 0,
                    withdrawal_total: 0,
                    transactions: Vec::new(),
                });
            }
            let Some(day) = days.last_mut() else {
                continue;
            };
            if transaction.state == TransactionState::Accepted {
                match transaction.kind {
                    TransactionKind::Deposit => day.deposit_total += transaction.nominal,
                    TransactionKind::Withdrawal => day.withdrawal_total += transaction.nominal,
                }
            }
            day.transactions.push(transaction);
        }
        Ok(days)
    }

    async fn group_accounts(&self, group_id: &str) -> LedgerResult<Vec<Account>> {
        Ok(read_with_retry(&self.store_policy, "list_accounts", || {
            self.account_repository.list_accounts_by_group(group_id)
        })
        .await?)
    }

    async fn load_account(&self, account_id: &str) -> LedgerResult<Account> {
        read_with_retry(&self.store_policy, "get_account", || {
            self.account_repository.get_account(account_id)
        })
        .await?
        .ok_or_else(|| LedgerError::account_not_found(account_id))
    }
}

/// Percentage of `target` covered by `balance`, rounded half up and capped at 100.
/// A non-positive target yields 0.
pub fn progress_ratio(balance: i64, target: i64) -> u8 {
    if target <= 0 || balance <= 0 {
        return 0;
    }
    let (balance, target) = (balance as i128, target as i128);
    let percent = (200 * balance + target) / (2 * target);
    percent.min(100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    use crate::domain::test_support::{operator, TestLedger};

    #[test]
    fn test_progress_ratio_boundaries() {
        assert_eq!(progress_ratio(50_000, 500_000), 10);
        assert_eq!(progress_ratio(500_000, 500_000), 100);
        assert_eq!(progress_ratio(1_000_000, 500_000), 100);
        assert_eq!(progress_ratio(0, 500_000), 0);
        assert_eq!(progress_ratio(10_000, 0), 0);
        assert_eq!(progress_ratio(10_000, -5), 0);
    }

    #[test]
    fn test_progress_ratio_rounds_half_up() {
        assert_eq!(progress_ratio(1, 200), 1); // 0.5%
        assert_eq!(progress_ratio(1, 201), 0); // 0.497%
        assert_eq!(progress_ratio(199, 200), 100); // 99.5%
        assert_eq!(progress_ratio(i64::MAX, i64::MAX), 100);
    }

    #[tokio::test]
    async fn test_monthly_leaderboard_orders_by_total() {
        let ledger = TestLedger::new().await;
        let ani = ledger.open_named_account("0102", "Ani", 500_000).await;
        let budi = ledger.open_named_account("0102", "Budi", 500_000).await;
        let citra = ledger.open_named_account("0102", "Citra", 500_000).await;
        ledger.open_named_account("0102", "Dewi", 500_000).await;

        ledger.deposit(&ani.id, 20_000).await;
        ledger.deposit(&ani.id, 10_000).await;
        ledger.deposit(&budi.id, 50_000).await;
        ledger.deposit(&citra.id, 10_000).await;
        let pending = ledger
            .request(&citra.id, TransactionKind::Deposit, 90_000, None)
            .await;
        ledger
            .approvals
            .reject(&pending.id, &operator(), "Tidak ada uang")
            .await
            .unwrap();

        let board = ledger.reporting.leaderboard("0102", Period::Month).await.unwrap();
        let totals: Vec<i64> = board.entries.iter().map(|e| e.total_accepted).collect();
        assert_eq!(totals, vec![50_000, 30_000, 10_000]);
        assert_eq!(board.entries[0].display_name, "Budi");
        assert_eq!(board.entries[1].transaction_count, 2);
        assert!(board.window.contains(timestamp_now()));
    }

    #[tokio::test]
    async fn test_leaderboard_ties_go_to_older_account() {
        let ledger = TestLedger::new().await;
        let older = ledger.open_named_account("0102", "Eka", 500_000).await;
        let newer = ledger.open_named_account("0102", "Fajar", 500_000).await;
        ledger.deposit(&newer.id, 15_000).await;
        ledger.deposit(&older.id, 15_000).await;

        let board = ledger.reporting.leaderboard("0102", Period::Week).await.unwrap();
        let ids: Vec<&str> = board.entries.iter().map(|e| e.account_id.as_str()).collect();
        assert_eq!(ids, vec![older.id.as_str(), newer.id.as_str()]);
    }

    #[tokio::test]
    async fn test_leaderboard_is_limited_to_the_window() {
        let ledger = TestLedger::new().await;
        let account = ledger.open_account("0102", 500_000).await;
        ledger.deposit(&account.id, 10_000).await;

        let now = timestamp_now();
        let next_month = ledger
            .reporting
            .leaderboard_at("0102", Period::Month, now + Duration::days(40))
            .await
            .unwrap();
        assert!(next_month.entries.is_empty());

        let first = ledger
            .reporting
            .leaderboard_at("0102", Period::Year, now)
            .await
            .unwrap();
        let second = ledger
            .reporting
            .leaderboard_at("0102", Period::Year, now)
            .await
            .unwrap();
        assert_eq!(first.entries, second.entries);
        assert_eq!(first.entries.len(), 1);
    }

    #[tokio::test]
    async fn test_period_totals_count_accepted_only() {
        let ledger = TestLedger::new().await;
        let account = ledger.open_account("0102", 500_000).await;
        ledger.deposit(&account.id, 40_000).await;
        ledger.deposit(&account.id, 10_000).await;
        let withdrawal = ledger
            .request(&account.id, TransactionKind::Withdrawal, 15_000, None)
            .await;
        ledger.approvals.approve(&withdrawal.id, &operator()).await.unwrap();
        ledger
            .request(&account.id, TransactionKind::Deposit, 99_000, None)
            .await;

        let totals = ledger
            .reporting
            .period_totals("0102", Period::Month)
            .await
            .unwrap();
        assert_eq!(totals.deposit_total, 50_000);
        assert_eq!(totals.deposit_count, 2);
        assert_eq!(totals.withdrawal_total, 15_000);
        assert_eq!(totals.withdrawal_count, 1);
        assert_eq!(totals.net(), 35_000);
    }

    #[tokio::test]
    async fn test_daily_history_skips_rejected() {
        let ledger = TestLedger::new().await;
        let account = ledger.open_account("0102", 500_000).await;
        ledger.deposit(&account.id, 40_000).await;
        let pending = ledger
            .request(&account.id, TransactionKind::Deposit, 5_000, None)
            .await;
        let rejected = ledger
            .request(&account.id, TransactionKind::Deposit, 7_000, None)
            .await;
        ledger
            .approvals
            .reject(&rejected.id, &operator(), "Salah nominal")
            .await
            .unwrap();

        let days = ledger.reporting.daily_history(&account.id).await.unwrap();
        let transactions: Vec<&str> = days
            .iter()
            .flat_map(|d| d.transactions.iter().map(|t| t.id.as_str()))
            .collect();

        assert!(transactions.contains(&pending.id.as_str()));
        assert!(!transactions.contains(&rejected.id.as_str()));
        assert_eq!(transactions.len(), 2);
        let deposit_total: i64 = days.iter().map(|d| d.deposit_total).sum();
        assert_eq!(deposit_total, 40_000);
    }

    #[tokio::test]
    async fn test_reports_on_unknown_account() {
        let ledger = TestLedger::new().await;
        assert!(matches!(
            ledger.reporting.progress_ratio("KCLG-0102-404").await,
            Err(LedgerError::NotFound { .. })
        ));
        assert!(matches!(
            ledger.reporting.daily_history("KCLG-0102-404").await,
            Err(LedgerError::NotFound { .. })
        ));
    }
}
