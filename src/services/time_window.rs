//! Millisecond boundaries for the calendar windows used by the analytics
//! queries. All windows are inclusive on both ends and computed at call time.

use chrono::{
    DateTime, Datelike, Duration, Local, LocalResult, Month, NaiveDate, NaiveDateTime, NaiveTime,
    TimeZone,
};
use serde::Serialize;

use crate::errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeWindow {
    pub start_millis: i64,
    pub end_millis: i64,
}

impl TimeWindow {
    pub fn contains(&self, timing: i64) -> bool {
        timing >= self.start_millis && timing <= self.end_millis
    }
}

const DATE_FORMATS: [&str; 2] = ["%m/%d/%Y", "%Y-%m-%d"];

fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999).unwrap_or(NaiveTime::MIN)
}

pub fn parse_month(value: i64) -> Result<Month, AppError> {
    u8::try_from(value)
        .ok()
        .and_then(|m| Month::try_from(m).ok())
        .ok_or(AppError::UnsupportedMonth(value))
}

/// Accepts `MM/dd/yyyy` or `yyyy-MM-dd`.
pub fn parse_date(value: &str) -> Result<NaiveDate, AppError> {
    let trimmed = value.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
        .ok_or_else(|| AppError::Validation(format!("Invalid date (expected MM/dd/yyyy or yyyy-MM-dd): {}", value)))
}

pub fn days_in_month(year: i32, month: Month) -> u32 {
    let m = month.number_from_month();
    let (next_year, next_month) = if m == 12 { (year + 1, 1) } else { (year, m + 1) };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first_of_next| first_of_next.pred_opt())
        .map(|last| last.day())
        .unwrap_or(28)
}

/// Resolves a wall-clock time in `tz`. A time inside a DST gap moves forward
/// to the first valid instant; an ambiguous one takes the earlier instant.
fn resolve_local<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> Result<DateTime<Tz>, AppError> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Ok(dt),
        LocalResult::Ambiguous(earliest, _) => Ok(earliest),
        LocalResult::None => (1..=4)
            .filter_map(|half_hours| {
                tz.from_local_datetime(&(naive + Duration::minutes(30 * half_hours)))
                    .earliest()
            })
            .next()
            .ok_or_else(|| AppError::Validation(format!("Unrepresentable local time: {}", naive))),
    }
}

fn local_millis<Tz: TimeZone>(tz: &Tz, date: NaiveDate, time: NaiveTime) -> Result<i64, AppError> {
    resolve_local(tz, date.and_time(time)).map(|dt| dt.timestamp_millis())
}

pub fn month_window(month: Month) -> Result<TimeWindow, AppError> {
    month_window_in(month, Local::now().year(), &Local)
}

pub fn month_window_in<Tz: TimeZone>(month: Month, year: i32, tz: &Tz) -> Result<TimeWindow, AppError> {
    let m = month.number_from_month();
    let first = NaiveDate::from_ymd_opt(year, m, 1)
        .ok_or_else(|| AppError::Validation(format!("Invalid year: {}", year)))?;
    let last = NaiveDate::from_ymd_opt(year, m, days_in_month(year, month))
        .ok_or_else(|| AppError::Validation(format!("Invalid year: {}", year)))?;

    Ok(TimeWindow {
        start_millis: local_millis(tz, first, NaiveTime::MIN)?,
        end_millis: local_millis(tz, last, end_of_day())?,
    })
}

pub fn day_window(date: NaiveDate) -> Result<TimeWindow, AppError> {
    day_window_in(date, &Local)
}

pub fn day_window_in<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> Result<TimeWindow, AppError> {
    Ok(TimeWindow {
        start_millis: local_millis(tz, date, NaiveTime::MIN)?,
        end_millis: local_millis(tz, date, end_of_day())?,
    })
}

pub fn trailing_days_window(days: i64) -> Result<TimeWindow, AppError> {
    trailing_days_window_in(days, Local::now().date_naive(), &Local)
}

/// Start is local midnight of `today - days`. End is midnight of the same
/// date read as UTC, not the end of that day, so the window only spans the
/// zone offset (and is empty west of UTC).
pub fn trailing_days_window_in<Tz: TimeZone>(
    days: i64,
    today: NaiveDate,
    tz: &Tz,
) -> Result<TimeWindow, AppError> {
    if days <= 0 {
        return Err(AppError::Validation(format!(
            "Number of days must be positive: {}",
            days
        )));
    }
    let date = Duration::try_days(days)
        .and_then(|span| today.checked_sub_signed(span))
        .ok_or_else(|| AppError::Validation(format!("Number of days out of range: {}", days)))?;
    let midnight = date.and_time(NaiveTime::MIN);

    Ok(TimeWindow {
        start_millis: resolve_local(tz, midnight)?.timestamp_millis(),
        end_millis: midnight.and_utc().timestamp_millis(),
    })
}
