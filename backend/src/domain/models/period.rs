//! Reporting windows (week / month / year) in a community's local time.
use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use shared::Period;

/// Half-open `[start, end)` interval in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl PeriodWindow {
    /// Window of the given period that contains `now`, with boundaries at
    /// local midnight for `offset`. Weeks start on Monday.
    pub fn containing(period: Period, now: DateTime<Utc>, offset: FixedOffset) -> Self {
        let today = local_date(now, offset);
        let (start, end) = match period {
            Period::Week => {
                let start = today - Duration::days(today.weekday().num_days_from_monday() as i64);
                (start, start + Duration::days(7))
            }
            Period::Month => {
                let start = first_of_month(today);
                (start, first_of_month(start + Duration::days(32)))
            }
            Period::Year => {
                let start = first_of_year(today);
                (start, first_of_year(start + Duration::days(366)))
            }
        };

        Self {
            start: local_midnight_utc(start, offset),
            end: local_midnight_utc(end, offset),
        }
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant < self.end
    }
}

/// Calendar date of `instant` as seen from `offset`.
pub fn local_date(instant: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    instant.with_timezone(&offset).date_naive()
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.day0() as i64)
}

fn first_of_year(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.ordinal0() as i64)
}

fn local_midnight_utc(date: NaiveDate, offset: FixedOffset) -> DateTime<Utc> {
    let local = date.and_time(NaiveTime::MIN);
    let utc = local - Duration::seconds(offset.local_minus_utc() as i64);
    Utc.from_utc_datetime(&utc)
}
