//! Timestamps as seen by the matcher: floating local time or a zoned instant.
//!
//! A [`Timestamp`] is either a naive wall-clock reading (pure calendar math,
//! no transitions) or an instant in an IANA zone. Zoned timestamps expose the
//! same calendar fields through their local wall-clock projection, and every
//! operation that produces a new wall-clock reading goes back through
//! [`resolve_local`] so gaps and overlaps are handled in one place.
//!
//! # Functions
//!
//! - [`resolve_local`] — Turn a wall-clock reading into an instant in a zone
//! - [`project`] — Classify a zoned instant against its own wall-clock label

use chrono::{
    DateTime, Datelike, LocalResult, NaiveDate, NaiveDateTime, Offset, TimeZone, Timelike, Utc,
    Weekday,
};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::CronError;

const SECONDS_PER_DAY: i64 = 86_400;

// ── Units and policies ──────────────────────────────────────────────────────

/// Calendar unit used for truncation and offsetting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeUnit {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
}

/// Which instant to pick when a wall-clock reading occurs twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Disambiguation {
    /// The first occurrence (before the clocks were turned back).
    #[default]
    Earlier,
    /// The second occurrence (after the clocks were turned back).
    Later,
    /// Accept either; resolves to the earlier instant so a single value is returned.
    Both,
}

/// How a zoned instant relates to its own wall-clock label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    /// The label occurs exactly once in the zone.
    Unambiguous(DateTime<Tz>),
    /// The label occurs twice and this is the first occurrence.
    AmbiguousEarlier(DateTime<Tz>),
    /// The label occurs twice and this is the second occurrence.
    AmbiguousLater(DateTime<Tz>),
    /// The label does not resolve back to this instant.
    InGap,
}

// ── Timestamp ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timestamp {
    Naive(NaiveDateTime),
    Zoned(DateTime<Tz>),
}

impl From<NaiveDateTime> for Timestamp {
    fn from(local: NaiveDateTime) -> Self {
        Timestamp::Naive(local)
    }
}

impl From<DateTime<Tz>> for Timestamp {
    fn from(instant: DateTime<Tz>) -> Self {
        Timestamp::Zoned(instant)
    }
}

impl Timestamp {
    /// Place a wall-clock reading in an IANA zone.
    ///
    /// # Errors
    ///
    /// Returns [`CronError::InvalidTimezone`] if `timezone` is not a valid IANA
    /// name, or [`CronError::UnresolvableLocalTime`] if the reading cannot be
    /// mapped onto the zone's timeline.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use cron_matcher::{Disambiguation, Timestamp};
    ///
    /// // 01:30 happens twice in New York on 2024-11-03.
    /// let local = NaiveDate::from_ymd_opt(2024, 11, 3)
    ///     .unwrap()
    ///     .and_hms_opt(1, 30, 0)
    ///     .unwrap();
    /// let first = Timestamp::from_local(local, "America/New_York", Disambiguation::Earlier).unwrap();
    /// let second = Timestamp::from_local(local, "America/New_York", Disambiguation::Later).unwrap();
    /// assert_eq!(first.naive_local(), second.naive_local());
    /// assert_eq!(first.utc_offset_seconds(), Some(-4 * 3600));
    /// assert_eq!(second.utc_offset_seconds(), Some(-5 * 3600));
    /// ```
    pub fn from_local(
        local: NaiveDateTime,
        timezone: &str,
        policy: Disambiguation,
    ) -> Result<Self, CronError> {
        let tz = parse_timezone(timezone)?;
        resolve_local(&tz, local, policy).map(Timestamp::Zoned)
    }

    /// Parse an RFC 3339 string and express that instant in an IANA zone.
    ///
    /// # Errors
    ///
    /// Returns [`CronError::InvalidDatetime`] if the string cannot be parsed,
    /// or [`CronError::InvalidTimezone`] if the zone name is unknown.
    pub fn parse_in_zone(datetime: &str, timezone: &str) -> Result<Self, CronError> {
        let tz = parse_timezone(timezone)?;
        let instant = DateTime::parse_from_rfc3339(datetime)
            .map_err(|e| CronError::InvalidDatetime(format!("'{}': {}", datetime, e)))?;
        Ok(Timestamp::Zoned(instant.with_timezone(&tz)))
    }

    /// The wall-clock reading; for zoned timestamps, in their own zone.
    pub fn naive_local(&self) -> NaiveDateTime {
        match self {
            Timestamp::Naive(local) => *local,
            Timestamp::Zoned(instant) => instant.naive_local(),
        }
    }

    pub fn date_naive(&self) -> NaiveDate {
        self.naive_local().date()
    }

    pub fn timezone(&self) -> Option<Tz> {
        match self {
            Timestamp::Naive(_) => None,
            Timestamp::Zoned(instant) => Some(instant.timezone()),
        }
    }

    /// Offset from UTC in seconds, for zoned timestamps only.
    pub fn utc_offset_seconds(&self) -> Option<i32> {
        match self {
            Timestamp::Naive(_) => None,
            Timestamp::Zoned(instant) => Some(instant.offset().fix().local_minus_utc()),
        }
    }

    pub fn year(&self) -> i32 {
        self.naive_local().year()
    }

    pub fn month(&self) -> u32 {
        self.naive_local().month()
    }

    pub fn day(&self) -> u32 {
        self.naive_local().day()
    }

    pub fn hour(&self) -> u32 {
        self.naive_local().hour()
    }

    pub fn minute(&self) -> u32 {
        self.naive_local().minute()
    }

    pub fn second(&self) -> u32 {
        self.naive_local().second()
    }

    pub fn nanosecond(&self) -> u32 {
        self.naive_local().nanosecond()
    }

    pub fn weekday(&self) -> Weekday {
        self.naive_local().weekday()
    }

    /// Replace the wall-clock reading, keeping the kind (and zone) of `self`.
    ///
    /// # Errors
    ///
    /// Returns [`CronError::UnresolvableLocalTime`] if a zoned reading cannot be
    /// placed on the zone's timeline.
    pub fn with_local(
        &self,
        local: NaiveDateTime,
        policy: Disambiguation,
    ) -> Result<Self, CronError> {
        match self {
            Timestamp::Naive(_) => Ok(Timestamp::Naive(local)),
            Timestamp::Zoned(instant) => {
                resolve_local(&instant.timezone(), local, policy).map(Timestamp::Zoned)
            }
        }
    }
}

// ── Resolution against a zone ───────────────────────────────────────────────

/// Map a wall-clock reading onto an instant in `tz`.
///
/// Readings that occur twice are resolved per `policy`. Readings skipped by a
/// forward transition resolve to the first instant after the gap.
///
/// # Errors
///
/// Returns [`CronError::UnresolvableLocalTime`] if the reading falls in a gap
/// that cannot be bracketed by the offsets on either side of it.
pub fn resolve_local(
    tz: &Tz,
    local: NaiveDateTime,
    policy: Disambiguation,
) -> Result<DateTime<Tz>, CronError> {
    match tz.from_local_datetime(&local) {
        LocalResult::Single(instant) => Ok(instant),
        LocalResult::Ambiguous(a, b) => {
            let (earlier, later) = if a <= b { (a, b) } else { (b, a) };
            let chosen = match policy {
                Disambiguation::Earlier | Disambiguation::Both => earlier,
                Disambiguation::Later => later,
            };
            debug!(
                timezone = tz.name(),
                %local,
                ?policy,
                offset = chosen.offset().fix().local_minus_utc(),
                "resolved ambiguous local time"
            );
            Ok(chosen)
        }
        LocalResult::None => first_instant_after_gap(tz, local),
    }
}

/// Classify a zoned instant against its own wall-clock label.
pub fn project(instant: &DateTime<Tz>) -> Projection {
    let tz = instant.timezone();
    match tz.from_local_datetime(&instant.naive_local()) {
        LocalResult::Single(only) => Projection::Unambiguous(only),
        LocalResult::Ambiguous(a, b) => {
            let (earlier, later) = if a <= b { (a, b) } else { (b, a) };
            if earlier == *instant {
                Projection::AmbiguousEarlier(earlier)
            } else if later == *instant {
                Projection::AmbiguousLater(later)
            } else {
                Projection::InGap
            }
        }
        LocalResult::None => Projection::InGap,
    }
}

/// Find the transition instant that ends the gap containing `local`.
///
/// The offsets a day either side of the reading bracket the transition: every
/// whole second before it reads below `local`, every second from it onward
/// reads above `local`, so a bisection over UTC seconds lands on it exactly.
fn first_instant_after_gap(tz: &Tz, local: NaiveDateTime) -> Result<DateTime<Tz>, CronError> {
    let unresolvable =
        || CronError::UnresolvableLocalTime(format!("'{}' in {}", local, tz.name()));

    let probe = local.and_utc().timestamp();
    let offset_at = |secs: i64| -> Option<i64> {
        let utc = DateTime::<Utc>::from_timestamp(secs, 0)?;
        Some(i64::from(
            tz.offset_from_utc_datetime(&utc.naive_utc())
                .fix()
                .local_minus_utc(),
        ))
    };
    let before = offset_at(probe - SECONDS_PER_DAY).ok_or_else(unresolvable)?;
    let after = offset_at(probe + SECONDS_PER_DAY).ok_or_else(unresolvable)?;
    if after <= before {
        return Err(unresolvable());
    }

    let reading_at = |secs: i64| -> Option<NaiveDateTime> {
        DateTime::<Utc>::from_timestamp(secs, 0).map(|utc| utc.with_timezone(tz).naive_local())
    };

    // `lo` reads before the gap, `hi` reads after it.
    let mut lo = probe - after;
    let mut hi = probe - before + 1;
    while hi - lo > 1 {
        let mid = lo + (hi - lo) / 2;
        if reading_at(mid).ok_or_else(unresolvable)? >= local {
            hi = mid;
        } else {
            lo = mid;
        }
    }

    let first = DateTime::<Utc>::from_timestamp(hi, 0)
        .ok_or_else(unresolvable)?
        .with_timezone(tz);
    debug!(
        timezone = tz.name(),
        %local,
        resolved = %first.naive_local(),
        "normalized local time out of transition gap"
    );
    Ok(first)
}

/// Parse an IANA timezone string into `Tz`.
pub(crate) fn parse_timezone(s: &str) -> Result<Tz, CronError> {
    s.parse::<Tz>()
        .map_err(|_| CronError::InvalidTimezone(format!("'{}'", s)))
}

// ── Tests ───────────────────────────────────────────────────────────────────
