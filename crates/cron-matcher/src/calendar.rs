//! Calendar arithmetic over naive and zoned timestamps.
//!
//! Calendar operations work on the local wall-clock reading. Operations that
//! produce a new timestamp re-resolve the reading against the timestamp's
//! zone (if any), so results landing in a transition gap move forward to the
//! end of the gap and results landing in an overlap pick per
//! [`Disambiguation`]. Sub-day [`add`] on a zoned timestamp is the exception:
//! it moves along the absolute timeline and only re-picks the overlap side.
//!
//! Day-of-month searches ([`last_weekday`], [`nth_weekday`],
//! [`last_weekday_of_month`], [`next_weekday_to`]) take the calendar date and
//! return a day-of-month; they never touch a zone.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike, Weekday};

use crate::error::CronError;
use crate::timestamp::{
    project, resolve_local, Disambiguation, Projection, TimeUnit, Timestamp,
};

const LAST_NANOSECOND: u32 = 999_999_999;

/// Whether `year` has a 29 February.
pub fn is_leap_year(year: i32) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

/// Number of days in `month` (1-12) of `year`.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        2 if is_leap_year(year) => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

// ── Period boundaries ───────────────────────────────────────────────────────

/// Reset every field finer than `unit` to its minimum.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use cron_matcher::calendar::beginning_of;
/// use cron_matcher::{TimeUnit, Timestamp};
///
/// let ts = Timestamp::from(
///     NaiveDate::from_ymd_opt(2016, 3, 14).unwrap().and_hms_milli_opt(1, 45, 45, 123).unwrap(),
/// );
/// let start = beginning_of(&ts, TimeUnit::Year).unwrap();
/// assert_eq!(start.naive_local().to_string(), "2016-01-01 00:00:00");
/// ```
///
/// # Errors
///
/// Returns [`CronError::UnresolvableLocalTime`] if a zoned result cannot be
/// placed on the zone's timeline.
pub fn beginning_of(ts: &Timestamp, unit: TimeUnit) -> Result<Timestamp, CronError> {
    let local = ts.naive_local();
    let date = local.date();
    let bounded = match unit {
        TimeUnit::Year => {
            NaiveDate::from_ymd_opt(date.year(), 1, 1).and_then(|d| d.and_hms_opt(0, 0, 0))
        }
        TimeUnit::Month => date.with_day(1).and_then(|d| d.and_hms_opt(0, 0, 0)),
        TimeUnit::Day => date.and_hms_opt(0, 0, 0),
        TimeUnit::Hour => date.and_hms_opt(local.hour(), 0, 0),
        TimeUnit::Minute => date.and_hms_opt(local.hour(), local.minute(), 0),
        TimeUnit::Second => date.and_hms_opt(local.hour(), local.minute(), local.second()),
    };
    let bounded = bounded.ok_or_else(|| out_of_range("beginning_of", local))?;
    ts.with_local(bounded, fold_side(ts))
}

/// Raise every field finer than `unit` to its maximum.
///
/// The day maximum is the month's real length; the sub-second maximum is
/// 999 999 999 nanoseconds.
///
/// # Errors
///
/// Returns [`CronError::UnresolvableLocalTime`] if a zoned result cannot be
/// placed on the zone's timeline.
pub fn end_of(ts: &Timestamp, unit: TimeUnit) -> Result<Timestamp, CronError> {
    let local = ts.naive_local();
    let date = local.date();
    let last_of_month = days_in_month(date.year(), date.month());
    let bounded = match unit {
        TimeUnit::Year => NaiveDate::from_ymd_opt(date.year(), 12, 31)
            .and_then(|d| d.and_hms_nano_opt(23, 59, 59, LAST_NANOSECOND)),
        TimeUnit::Month => date
            .with_day(last_of_month)
            .and_then(|d| d.and_hms_nano_opt(23, 59, 59, LAST_NANOSECOND)),
        TimeUnit::Day => date.and_hms_nano_opt(23, 59, 59, LAST_NANOSECOND),
        TimeUnit::Hour => date.and_hms_nano_opt(local.hour(), 59, 59, LAST_NANOSECOND),
        TimeUnit::Minute => {
            date.and_hms_nano_opt(local.hour(), local.minute(), 59, LAST_NANOSECOND)
        }
        TimeUnit::Second => date.and_hms_nano_opt(
            local.hour(),
            local.minute(),
            local.second(),
            LAST_NANOSECOND,
        ),
    };
    let bounded = bounded.ok_or_else(|| out_of_range("end_of", local))?;
    ts.with_local(bounded, fold_side(ts))
}

/// Occurrence of a repeated hour that `ts` sits on, so its period boundaries
/// stay on the same side of the transition.
fn fold_side(ts: &Timestamp) -> Disambiguation {
    match ts {
        Timestamp::Zoned(instant) => match project(instant) {
            Projection::AmbiguousLater(_) => Disambiguation::Later,
            _ => Disambiguation::Earlier,
        },
        Timestamp::Naive(_) => Disambiguation::Earlier,
    }
}

// ── Day-of-month searches ───────────────────────────────────────────────────

/// Day-of-month of the last `weekday` in `date`'s month.
pub fn last_weekday(date: NaiveDate, weekday: Weekday) -> u32 {
    let last = days_in_month(date.year(), date.month());
    let last_wd = last_day_weekday(date, last);
    let back = (last_wd.num_days_from_monday() + 7 - weekday.num_days_from_monday()) % 7;
    last - back
}

/// Day-of-month of the `n`-th (1-indexed) `weekday` in `date`'s month.
///
/// Returns `None` when `n` is zero or the month has fewer than `n` such days.
///
/// # Examples
///
/// ```
/// use chrono::{NaiveDate, Weekday};
/// use cron_matcher::calendar::nth_weekday;
///
/// let feb = NaiveDate::from_ymd_opt(2026, 2, 10).unwrap();
/// assert_eq!(nth_weekday(feb, Weekday::Tue, 3), Some(17));
/// assert_eq!(nth_weekday(feb, Weekday::Tue, 5), None);
/// ```
pub fn nth_weekday(date: NaiveDate, weekday: Weekday, n: u8) -> Option<u32> {
    if n == 0 {
        return None;
    }
    let first_wd = date.with_day(1)?.weekday();
    let ahead = (weekday.num_days_from_monday() + 7 - first_wd.num_days_from_monday()) % 7;
    let day = 1 + ahead + 7 * (u32::from(n) - 1);
    (day <= days_in_month(date.year(), date.month())).then_some(day)
}

/// Day-of-month of the last Monday–Friday in `date`'s month.
pub fn last_weekday_of_month(date: NaiveDate) -> u32 {
    let last = days_in_month(date.year(), date.month());
    match last_day_weekday(date, last) {
        Weekday::Sat => last - 1,
        Weekday::Sun => last - 2,
        _ => last,
    }
}

/// Day-of-month of the Monday–Friday nearest to `date` without leaving its month.
///
/// A Saturday moves back to Friday unless that leaves the month, in which
/// case it moves forward to Monday; a Sunday moves forward to Monday unless
/// that leaves the month, in which case it moves back to Friday.
pub fn next_weekday_to(date: NaiveDate) -> u32 {
    match date.weekday() {
        Weekday::Sun => match date.succ_opt() {
            Some(next) if next.month() == date.month() => next.day(),
            _ => date.day() - 2,
        },
        Weekday::Sat => match date.pred_opt() {
            Some(prev) if prev.month() == date.month() => prev.day(),
            _ => date.day() + 2,
        },
        _ => date.day(),
    }
}

/// Weekday of day `last` in `date`'s month, derived without building a new date.
fn last_day_weekday(date: NaiveDate, last: u32) -> Weekday {
    let mut weekday = date.weekday();
    for _ in 0..(last - date.day()) % 7 {
        weekday = weekday.succ();
    }
    weekday
}

// ── Month and year stepping ─────────────────────────────────────────────────

/// Shift forward by one year, as a count of 365 or 366 days.
///
/// The count is 366 exactly when the year-long span passes over a
/// 29 February. Starting on 29 February lands on 28 February.
///
/// # Errors
///
/// Returns [`CronError::OutOfRange`] if the result is outside chrono's range.
pub fn inc_year(ts: &Timestamp) -> Result<Timestamp, CronError> {
    shift_year(ts, true, Disambiguation::Earlier)
}

/// Shift back by one year, as a count of 365 or 366 days.
///
/// # Errors
///
/// Returns [`CronError::OutOfRange`] if the result is outside chrono's range.
pub fn dec_year(ts: &Timestamp) -> Result<Timestamp, CronError> {
    shift_year(ts, false, Disambiguation::Earlier)
}

/// Move to the first day of the next month, keeping the time of day.
///
/// # Errors
///
/// Returns [`CronError::OutOfRange`] if the result is outside chrono's range.
pub fn inc_month(ts: &Timestamp) -> Result<Timestamp, CronError> {
    let date = ts.date_naive();
    let days = days_in_month(date.year(), date.month()) + 1 - date.day();
    add(ts, i64::from(days), TimeUnit::Day, Disambiguation::Earlier)
}

/// Step back by the length of the current month, keeping the time of day.
///
/// # Errors
///
/// Returns [`CronError::OutOfRange`] if the result is outside chrono's range.
pub fn dec_month(ts: &Timestamp) -> Result<Timestamp, CronError> {
    let date = ts.date_naive();
    let days = days_in_month(date.year(), date.month());
    add(ts, -i64::from(days), TimeUnit::Day, Disambiguation::Earlier)
}

/// The date `k` days before the last day of the month, at `ts`'s time of day.
///
/// # Errors
///
/// Returns [`CronError::OutOfRange`] if the result is outside chrono's range.
pub fn nth_day_before_month_end(ts: &Timestamp, k: u32) -> Result<Timestamp, CronError> {
    let date = ts.date_naive();
    let target = i64::from(days_in_month(date.year(), date.month())) - i64::from(k);
    add(
        ts,
        target - i64::from(date.day()),
        TimeUnit::Day,
        Disambiguation::Earlier,
    )
}

fn shift_year(
    ts: &Timestamp,
    forward: bool,
    policy: Disambiguation,
) -> Result<Timestamp, CronError> {
    let days = year_span_days(ts.date_naive(), forward);
    add(
        ts,
        if forward { days } else { -days },
        TimeUnit::Day,
        policy,
    )
}

/// 366 when the year-long span from `date` crosses a 29 February, else 365.
fn year_span_days(date: NaiveDate, forward: bool) -> i64 {
    const LEAP_DAY_ORDINAL: u32 = 60;
    let crosses_leap_day = if forward {
        (is_leap_year(date.year()) && date.ordinal() < LEAP_DAY_ORDINAL)
            || (is_leap_year(date.year() + 1) && date.month() > 2)
    } else {
        (is_leap_year(date.year()) && date.ordinal() >= LEAP_DAY_ORDINAL)
            || (is_leap_year(date.year() - 1) && date.month() <= 2)
    };
    if crosses_leap_day {
        366
    } else {
        365
    }
}

// ── add ─────────────────────────────────────────────────────────────────────

/// Add a signed `amount` of `unit` to `ts`.
///
/// Seconds, minutes and hours on a zoned timestamp move along the absolute
/// timeline, so crossing a transition gap still elapses exactly the requested
/// amount; a result whose label occurs twice is re-picked per `on_ambiguity`.
/// Days (and naive timestamps) shift the wall-clock reading, which is then
/// resolved in the zone: inside a gap it moves forward to the first instant
/// after the gap; inside an overlap it picks per `on_ambiguity`. Years are
/// stepped with [`inc_year`] / [`dec_year`] day counts.
///
/// # Errors
///
/// Returns [`CronError::UnsupportedUnit`] for [`TimeUnit::Month`] (use
/// [`inc_month`] / [`dec_month`]), or [`CronError::OutOfRange`] if the result
/// is outside chrono's range.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use cron_matcher::calendar::add;
/// use cron_matcher::{Disambiguation, TimeUnit, Timestamp};
///
/// // One second before New York springs forward.
/// let local = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap().and_hms_opt(1, 59, 59).unwrap();
/// let ts = Timestamp::from_local(local, "America/New_York", Disambiguation::Earlier).unwrap();
/// let next = add(&ts, 1, TimeUnit::Second, Disambiguation::Earlier).unwrap();
/// assert_eq!(next.naive_local().to_string(), "2024-03-10 03:00:00");
/// ```
pub fn add(
    ts: &Timestamp,
    amount: i64,
    unit: TimeUnit,
    on_ambiguity: Disambiguation,
) -> Result<Timestamp, CronError> {
    let seconds_per_unit = match unit {
        TimeUnit::Second => 1,
        TimeUnit::Minute => 60,
        TimeUnit::Hour => 3_600,
        TimeUnit::Day => 86_400,
        TimeUnit::Year => return add_years(ts, amount, on_ambiguity),
        TimeUnit::Month => {
            return Err(CronError::UnsupportedUnit(
                "months have no fixed length; use inc_month or dec_month".to_string(),
            ))
        }
    };

    let local = ts.naive_local();
    let delta = amount
        .checked_mul(seconds_per_unit)
        .and_then(chrono::Duration::try_seconds)
        .ok_or_else(|| out_of_range("add", local))?;

    match ts {
        Timestamp::Zoned(instant) if unit != TimeUnit::Day => {
            let moved = instant
                .checked_add_signed(delta)
                .ok_or_else(|| out_of_range("add", local))?;
            match project(&moved) {
                Projection::AmbiguousEarlier(_) | Projection::AmbiguousLater(_) => {
                    resolve_local(&moved.timezone(), moved.naive_local(), on_ambiguity)
                        .map(Timestamp::Zoned)
                }
                _ => Ok(Timestamp::Zoned(moved)),
            }
        }
        _ => {
            let shifted = local
                .checked_add_signed(delta)
                .ok_or_else(|| out_of_range("add", local))?;
            ts.with_local(shifted, on_ambiguity)
        }
    }
}

fn add_years(
    ts: &Timestamp,
    amount: i64,
    on_ambiguity: Disambiguation,
) -> Result<Timestamp, CronError> {
    let mut current = *ts;
    for _ in 0..amount.unsigned_abs() {
        current = shift_year(&current, amount > 0, on_ambiguity)?;
    }
    Ok(current)
}

fn out_of_range(operation: &str, local: NaiveDateTime) -> CronError {
    CronError::OutOfRange(format!("{} from '{}'", operation, local))
}

// ── Tests ───────────────────────────────────────────────────────────────────
