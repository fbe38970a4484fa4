use crate::domain::commands::reporting::{DailyGroup, LeaderboardResult, PeriodTotalsResult};
use shared::{
    DailyHistoryResponse, DailyTransactionGroup, LeaderboardEntry, LeaderboardResponse,
    PeriodTotals,
};

use super::{format_timestamp, TransactionMapper};

pub struct ReportMapper;

impl ReportMapper {
    pub fn to_leaderboard_dto(result: LeaderboardResult) -> LeaderboardResponse {
        LeaderboardResponse {
            group_id: result.group_id,
            period: result.period,
            window_start: format_timestamp(&result.window.start),
            window_end: format_timestamp(&result.window.end),
            entries: result
                .entries
                .into_iter()
                .map(|entry| LeaderboardEntry {
                    account_id: entry.account_id,
                    display_name: entry.display_name,
                    total_accepted: entry.total_accepted,
                    transaction_count: entry.transaction_count,
                })
                .collect(),
        }
    }

    pub fn to_totals_dto(result: PeriodTotalsResult) -> PeriodTotals {
        PeriodTotals {
            net: result.net(),
            window_start: format_timestamp(&result.window.start),
            window_end: format_timestamp(&result.window.end),
            group_id: result.group_id,
            period: result.period,
            deposit_total: result.deposit_total,
            deposit_count: result.deposit_count,
            withdrawal_total: result.withdrawal_total,
            withdrawal_count: result.withdrawal_count,
        }
    }

    pub fn to_history_dto(account_id: &str, days: Vec<DailyGroup>) -> DailyHistoryResponse {
        DailyHistoryResponse {
            account_id: account_id.to_string(),
            days: days
                .into_iter()
                .map(|day| DailyTransactionGroup {
                    date: day.date.format("%Y-%m-%d").to_string(),
                    deposit_total: day.deposit_total,
                    withdrawal_total: day.withdrawal_total,
                    transactions: TransactionMapper::to_dto_list(day.transactions),
                })
                .collect(),
        }
    }
}
