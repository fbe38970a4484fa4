//! Conversions between `shared` DTOs and domain types.

pub mod account_mapper;
pub mod report_mapper;
pub mod transaction_mapper;

pub use account_mapper::AccountMapper;
pub use report_mapper::ReportMapper;
pub use transaction_mapper::TransactionMapper;

use chrono::{DateTime, SecondsFormat, Utc};

pub(crate) fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}
