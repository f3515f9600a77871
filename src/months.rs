use chrono::{DateTime, Datelike, Local, Months, NaiveDate, TimeZone, Utc};

use crate::error::{MoneyboxError, Result};

const MONTH_FORMAT: &str = "%Y-%m";

fn local_datetime(millis: i64) -> DateTime<Local> {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .unwrap_or_default()
        .with_timezone(&Local)
}

pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// `yyyy-MM` bucket of a timestamp in the local zone.
pub fn month_key(millis: i64) -> String {
    local_datetime(millis).format(MONTH_FORMAT).to_string()
}

pub fn local_date(millis: i64) -> NaiveDate {
    local_datetime(millis).date_naive()
}

pub fn parse_month(key: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(&format!("{key}-01"), "%Y-%m-%d")
        .map_err(|_| MoneyboxError::InvalidInput(format!("bad month '{key}', expected YYYY-MM")))
}

pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| MoneyboxError::InvalidInput(format!("bad date '{raw}', expected YYYY-MM-DD")))
}

/// Local midnight of `date` as epoch millis.
pub fn date_to_millis(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .and_then(|dt| Local.from_local_datetime(&dt).earliest())
        .map(|dt| dt.timestamp_millis())
        .unwrap_or(0)
}

fn shift(date: NaiveDate, offset: i32) -> Option<NaiveDate> {
    if offset >= 0 {
        date.checked_add_months(Months::new(offset as u32))
    } else {
        date.checked_sub_months(Months::new(offset.unsigned_abs()))
    }
}

pub fn add_months(key: &str, offset: i32) -> Result<String> {
    let base = parse_month(key)?;
    shift(base, offset)
        .map(|d| d.format(MONTH_FORMAT).to_string())
        .ok_or_else(|| MoneyboxError::InvalidInput(format!("month out of range: {key} {offset:+}")))
}

pub fn month_sequence(start: &str, count: usize, step: i32) -> Result<Vec<String>> {
    (0..count)
        .map(|i| add_months(start, i as i32 * step))
        .collect()
}

/// Same wall-clock time `offset` calendar months later, clamped to month end.
pub fn add_months_to_millis(millis: i64, offset: i32) -> i64 {
    let dt = local_datetime(millis).naive_local();
    shift(dt.date(), offset)
        .and_then(|d| Local.from_local_datetime(&d.and_time(dt.time())).earliest())
        .map(|d| d.timestamp_millis())
        .unwrap_or(millis)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BudgetCycle {
    pub start: NaiveDate,
    pub end_inclusive: NaiveDate,
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let first = NaiveDate::from_ymd_opt(year, month, 1);
    let next = first.and_then(|d| d.checked_add_months(Months::new(1)));
    match (first, next) {
        (Some(a), Some(b)) => (b - a).num_days() as u32,
        _ => 28,
    }
}

fn cycle_start_in(month: NaiveDate, start_day: u32) -> NaiveDate {
    let day = start_day.min(days_in_month(month.year(), month.month()));
    NaiveDate::from_ymd_opt(month.year(), month.month(), day).unwrap_or(month)
}

/// The budget cycle containing `today` for a cycle that starts on `start_day`.
pub fn budget_cycle(today: NaiveDate, start_day: u32) -> BudgetCycle {
    let start_day = start_day.clamp(1, 31);
    let this_month = today.with_day(1).unwrap_or(today);
    let candidate = cycle_start_in(this_month, start_day);
    let start = if today >= candidate {
        candidate
    } else {
        shift(this_month, -1)
            .map(|m| cycle_start_in(m, start_day))
            .unwrap_or(candidate)
    };
    let next_month = shift(start.with_day(1).unwrap_or(start), 1).unwrap_or(start);
    let next_start = cycle_start_in(next_month, start_day);
    BudgetCycle {
        start,
        end_inclusive: next_start.pred_opt().unwrap_or(next_start),
    }
}

impl BudgetCycle {
    pub fn total_days(&self) -> i64 {
        ((self.end_inclusive - self.start).num_days() + 1).max(1)
    }

    pub fn days_remaining(&self, today: NaiveDate) -> i64 {
        if today > self.end_inclusive {
            0
        } else if today < self.start {
            self.total_days()
        } else {
            (self.end_inclusive - today).num_days() + 1
        }
    }

    /// Half-open millis range `[start, day after end)`.
    pub fn millis_range(&self) -> (i64, i64) {
        let end = self.end_inclusive.succ_opt().unwrap_or(self.end_inclusive);
        (date_to_millis(self.start), date_to_millis(end))
    }
}
