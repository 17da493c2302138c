//! Dashboard read models and the calendar arithmetic behind them.
//!
//! Everything here is plain data plus pure date computation; the reporting
//! service fills these shapes from repository aggregates.

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::activity::{Review, Tip};
use super::restaurant::{RestaurantId, StaffId, StaffMember};

/// A recorded payout transfer to a staff member.
#[derive(Debug, Clone, PartialEq)]
pub struct Transfer {
    /// Stable identifier.
    pub id: Uuid,
    /// Paying restaurant.
    pub restaurant_id: RestaurantId,
    /// Receiving staff member.
    pub staff_id: Option<StaffId>,
    /// Amount in cents.
    pub amount_cents: i32,
    /// Processing status; transfers recorded here are `sent`.
    pub status: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl Transfer {
    /// Build a sent transfer with a fresh identifier.
    pub fn new_sent(restaurant_id: RestaurantId, staff_id: StaffId, amount_cents: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            restaurant_id,
            staff_id: Some(staff_id),
            amount_cents,
            status: "sent".to_owned(),
            created_at: Utc::now(),
        }
    }
}

/// A staff member with an associated cent amount (tip total or pending payout).
#[derive(Debug, Clone, PartialEq)]
pub struct StaffAmount {
    /// The staff member.
    pub staff: StaffMember,
    /// Amount in cents.
    pub amount_cents: i64,
}

/// Day-by-day tip totals for the current month aligned with the previous one.
///
/// `labels` are day numbers (`"1"`, `"2"`, ...); both series share the label
/// length, padding the shorter month with zeroes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DailyComparison {
    /// Day-of-month labels.
    pub labels: Vec<String>,
    /// Cent totals for the current month.
    pub current: Vec<i64>,
    /// Cent totals for the previous month.
    pub previous: Vec<i64>,
}

/// The admin dashboard's overview payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Overview {
    /// Tip total since local midnight, in cents.
    pub tips_today_cents: i64,
    /// Tip total since the start of the ISO week, in cents.
    pub tips_week_cents: i64,
    /// Tip total since the start of the month, in cents.
    pub tips_month_cents: i64,
    /// Mean review rating; 0 when unreviewed.
    pub rating_avg: f64,
    /// Review count.
    pub reviews_count: u64,
    /// Top staff by tip total, best first, at most three.
    pub top_tipped: Vec<StaffAmount>,
    /// Top active staff by mean rating, best first, at most three.
    pub top_rated: Vec<StaffMember>,
    /// Active staff with their pending payout amounts.
    pub staff_pending: Vec<StaffAmount>,
    /// Current-vs-previous month daily tip totals.
    pub daily: DailyComparison,
    /// Most recent reviews, newest first.
    pub recent_reviews: Vec<Review>,
}

/// Per-staff drill-down payload.
#[derive(Debug, Clone, PartialEq)]
pub struct StaffDetail {
    /// The staff member.
    pub staff: StaffMember,
    /// Tip total since midnight, in cents.
    pub tips_today_cents: i64,
    /// Tip total since the start of the ISO week, in cents.
    pub tips_week_cents: i64,
    /// Mean review rating; 0 when unreviewed.
    pub rating_avg: f64,
    /// Most recent tips, newest first.
    pub last_tips: Vec<Tip>,
    /// Most recent reviews, newest first.
    pub last_reviews: Vec<Review>,
}

/// Payouts page payload: pending amounts plus recent transfers.
#[derive(Debug, Clone, PartialEq)]
pub struct PayoutsView {
    /// Active staff with pending amounts (tips minus sent transfers, >= 0).
    pub rows: Vec<StaffAmount>,
    /// Most recent transfers, newest first.
    pub transfers: Vec<Transfer>,
}

/// Inclusive start instants for the dashboard's standard periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodStarts {
    /// Midnight today (UTC).
    pub today: DateTime<Utc>,
    /// Midnight on Monday of the current ISO week.
    pub week: DateTime<Utc>,
    /// Midnight on the first of the current month.
    pub month: DateTime<Utc>,
}

impl PeriodStarts {
    /// Derive the period starts for the given instant.
    pub fn at(now: DateTime<Utc>) -> Self {
        let date = now.date_naive();
        let today = start_of_day(date);
        let week = start_of_day(
            date - Duration::days(i64::from(date.weekday().num_days_from_monday())),
        );
        let month = start_of_day(first_of_month(date.year(), date.month()));
        Self { today, week, month }
    }
}

/// Half-open `[start, end)` range covering a whole calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthRange {
    /// First instant of the month.
    pub start: DateTime<Utc>,
    /// First instant of the following month.
    pub end: DateTime<Utc>,
    /// Number of days in the month.
    pub days: u32,
}

impl MonthRange {
    /// The month containing the given instant.
    pub fn containing(now: DateTime<Utc>) -> Self {
        let date = now.date_naive();
        Self::of(date.year(), date.month())
    }

    /// The month preceding this one.
    pub fn previous(&self) -> Self {
        let date = self.start.date_naive();
        if date.month() == 1 {
            Self::of(date.year() - 1, 12)
        } else {
            Self::of(date.year(), date.month() - 1)
        }
    }

    fn of(year: i32, month: u32) -> Self {
        let start_date = first_of_month(year, month);
        let end_date = if month == 12 {
            first_of_month(year + 1, 1)
        } else {
            first_of_month(year, month + 1)
        };
        let days = u32::try_from((end_date - start_date).num_days()).unwrap_or(31);
        Self {
            start: start_of_day(start_date),
            end: start_of_day(end_date),
            days,
        }
    }

    /// Zero-based day index of an instant inside this month, if it falls
    /// within the range.
    pub fn day_index(&self, at: DateTime<Utc>) -> Option<usize> {
        if at < self.start || at >= self.end {
            return None;
        }
        let days = (at.date_naive() - self.start.date_naive()).num_days();
        usize::try_from(days).ok()
    }
}

/// Fold timestamped cent amounts into per-day totals for a month.
pub fn daily_totals(range: &MonthRange, rows: &[(DateTime<Utc>, i64)]) -> Vec<i64> {
    let mut totals = vec![0_i64; range.days as usize];
    for (at, cents) in rows {
        if let Some(idx) = range.day_index(*at) {
            if let Some(slot) = totals.get_mut(idx) {
                *slot += cents;
            }
        }
    }
    totals
}

/// Align current and previous month series under shared day labels.
pub fn daily_comparison(current: Vec<i64>, previous: Vec<i64>) -> DailyComparison {
    let len = current.len().max(previous.len());
    let pad = |mut series: Vec<i64>| {
        series.resize(len, 0);
        series
    };
    DailyComparison {
        labels: (1..=len).map(|d| d.to_string()).collect(),
        current: pad(current),
        previous: pad(previous),
    }
}

fn first_of_month(year: i32, month: u32) -> NaiveDate {
    // Only called with month 1..=12; fall back to today on the impossible.
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or_else(|| Utc::now().date_naive())
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).unwrap_or_default())
}
