//! Decide whether a timestamp satisfies a schedule.
//!
//! Evaluation is an AND over constraints and an OR over each field's
//! conditions, both short-circuiting in list order. Conditions that need
//! month-level knowledge (last day, nth weekday, nearest weekday) defer to
//! [`crate::calendar`].
//!
//! # Functions
//!
//! - [`matches`] — Evaluate a [`Schedule`], rejecting `@reboot`
//! - [`matches_conditions`] — Evaluate any sequence of constraints
//! - [`matches_field`] — Evaluate one field's condition set

use std::num::NonZeroU32;

use chrono::Datelike;
use tracing::{debug, warn};

use crate::calendar;
use crate::condition::{AmbiguityHint, Condition, Constraint, Field, Schedule, StepBase};
use crate::error::CronError;
use crate::timestamp::{project, Projection, Timestamp};

/// Check `timestamp` against `schedule`.
///
/// # Errors
///
/// Returns [`CronError::UnsupportedSchedule`] for [`Schedule::Reboot`],
/// whatever the timestamp.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use cron_matcher::{matches, Condition, CronExpression, Schedule, Timestamp};
///
/// // "0 22-2 * * *": on the hour, from 22:00 through 02:00.
/// let schedule = Schedule::from(CronExpression {
///     minute: vec![Condition::Value(0)],
///     hour: vec![Condition::Range(22, 2)],
///     ..Default::default()
/// });
/// let at = |h| {
///     Timestamp::from(NaiveDate::from_ymd_opt(2026, 1, 5).unwrap().and_hms_opt(h, 0, 0).unwrap())
/// };
/// assert!(matches(&schedule, &at(23)).unwrap());
/// assert!(matches(&schedule, &at(1)).unwrap());
/// assert!(!matches(&schedule, &at(12)).unwrap());
/// assert!(matches(&Schedule::Reboot, &at(0)).is_err());
/// ```
pub fn matches(schedule: &Schedule, timestamp: &Timestamp) -> Result<bool, CronError> {
    match schedule {
        Schedule::Reboot => {
            warn!("refusing to match @reboot schedule against a calendar time");
            Err(CronError::UnsupportedSchedule(
                "@reboot has no calendar time to match".to_string(),
            ))
        }
        Schedule::Cron(expression) => Ok(matches_conditions(
            &expression.to_condition_list(),
            timestamp,
        )),
    }
}

/// Check `timestamp` against every constraint, stopping at the first failure.
///
/// An empty sequence matches.
pub fn matches_conditions<'a, I>(conditions: I, timestamp: &Timestamp) -> bool
where
    I: IntoIterator<Item = &'a Constraint>,
{
    conditions
        .into_iter()
        .all(|constraint| match constraint {
            Constraint::Field(field, conditions) => matches_field(*field, conditions, timestamp),
            Constraint::Ambiguity(hint) => matches_ambiguity(*hint, timestamp),
        })
}

/// Check one field of `timestamp` against its condition set.
///
/// Succeeds on the first matching condition; an empty set never matches.
pub fn matches_field(field: Field, conditions: &[Condition], timestamp: &Timestamp) -> bool {
    conditions
        .iter()
        .any(|condition| matches_condition(field, condition, timestamp))
}

fn matches_condition(field: Field, condition: &Condition, timestamp: &Timestamp) -> bool {
    let date = timestamp.date_naive();
    match *condition {
        Condition::Wildcard => true,
        Condition::Value(n) => field_values(field, timestamp).any(|v| v == i64::from(n)),
        Condition::Range(from, to) => {
            field_values(field, timestamp).any(|v| in_range(v, from, to))
        }
        Condition::Step(base, divisor) => field_values(field, timestamp)
            // Sunday-as-0 only stands in for literal and range tests.
            .filter(|&v| !(field == Field::Weekday && v == 0))
            .any(|v| matches_step(v, base, divisor)),
        Condition::LastDayOfMonth => {
            let last = calendar::days_in_month(date.year(), date.month());
            field_values(field, timestamp).any(|v| v == i64::from(last))
        }
        Condition::LastWeekdayOccurrence(weekday) => {
            date.day() == calendar::last_weekday(date, weekday)
        }
        Condition::NthWeekdayOccurrence(weekday, n) => {
            calendar::nth_weekday(date, weekday, n) == Some(date.day())
        }
        Condition::NearestWeekdayTo(day) => {
            let last = calendar::days_in_month(date.year(), date.month());
            date.with_day(day.min(last))
                .is_some_and(|target| calendar::next_weekday_to(target) == date.day())
        }
        Condition::LastWeekdayOfMonth => date.day() == calendar::last_weekday_of_month(date),
    }
}

/// Candidate values of `field`; Sunday yields both 7 and 0.
fn field_values(field: Field, timestamp: &Timestamp) -> impl Iterator<Item = i64> {
    let value = match field {
        Field::Second => i64::from(timestamp.second()),
        Field::Minute => i64::from(timestamp.minute()),
        Field::Hour => i64::from(timestamp.hour()),
        Field::Day => i64::from(timestamp.day()),
        Field::Month => i64::from(timestamp.month()),
        Field::Weekday => i64::from(timestamp.weekday().number_from_monday()),
        Field::Year => i64::from(timestamp.year()),
    };
    let sunday_alias = (field == Field::Weekday && value == 7).then_some(0);
    std::iter::once(value).chain(sunday_alias)
}

fn in_range(value: i64, from: u32, to: u32) -> bool {
    let (from, to) = (i64::from(from), i64::from(to));
    if from <= to {
        from <= value && value <= to
    } else {
        value >= from || value <= to
    }
}

fn matches_step(value: i64, base: StepBase, divisor: NonZeroU32) -> bool {
    let divisor = i64::from(divisor.get());
    match base {
        StepBase::Wildcard => value % divisor == 0,
        StepBase::Range(from, to) => {
            in_range(value, from, to) && (value - i64::from(from)) % divisor == 0
        }
    }
}

fn matches_ambiguity(hint: AmbiguityHint, timestamp: &Timestamp) -> bool {
    let instant = match timestamp {
        Timestamp::Naive(_) => return true,
        Timestamp::Zoned(instant) => instant,
    };
    match project(instant) {
        Projection::Unambiguous(_) => true,
        Projection::AmbiguousEarlier(_) => hint.prior,
        Projection::AmbiguousLater(_) => hint.subsequent,
        Projection::InGap => {
            debug!(%instant, "zoned timestamp does not resolve from its local time");
            false
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::CronExpression;
    use chrono::{NaiveDate, TimeZone, Weekday};
    use chrono_tz::Tz;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> Timestamp {
        Timestamp::Naive(
            NaiveDate::from_ymd_opt(y, m, d)
                .unwrap()
                .and_hms_opt(h, min, s)
                .unwrap(),
        )
    }

    fn step(base: StepBase, divisor: u32) -> Condition {
        Condition::Step(base, NonZeroU32::new(divisor).unwrap())
    }

    fn new_york_utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> Timestamp {
        let tz: Tz = "America/New_York".parse().unwrap();
        let utc = NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap();
        Timestamp::Zoned(tz.from_utc_datetime(&utc))
    }

    // ── matches tests ───────────────────────────────────────────────────

    #[test]
    fn test_reboot_is_rejected() {
        let err = matches(&Schedule::Reboot, &at(2026, 1, 1, 0, 0, 0)).unwrap_err();
        assert!(matches!(err, CronError::UnsupportedSchedule(_)));
        assert!(err.to_string().contains("Unsupported schedule"));
    }

    #[test]
    fn test_empty_condition_list_matches() {
        let empty: Vec<Constraint> = Vec::new();
        assert!(matches_conditions(&empty, &at(2026, 1, 1, 0, 0, 0)));
    }

    #[test]
    fn test_empty_condition_set_never_matches() {
        assert!(!matches_field(Field::Hour, &[], &at(2026, 1, 1, 0, 0, 0)));
    }

    #[test]
    fn test_failing_constraint_stops_evaluation() {
        let evaluated = std::cell::Cell::new(0);
        let constraints = [
            Constraint::Field(Field::Hour, vec![Condition::Value(5)]),
            Constraint::Field(Field::Minute, vec![Condition::Wildcard]),
        ];
        let lazy = constraints.iter().inspect(|_| evaluated.set(evaluated.get() + 1));
        assert!(!matches_conditions(lazy, &at(2026, 1, 1, 4, 0, 0)));
        assert_eq!(evaluated.get(), 1);
    }

    #[test]
    fn test_non_extended_expression_ignores_seconds() {
        let schedule = Schedule::from(CronExpression {
            second: vec![Condition::Value(0)],
            minute: vec![Condition::Value(30)],
            ..Default::default()
        });
        assert!(matches(&schedule, &at(2026, 1, 1, 4, 30, 17)).unwrap());

        let extended = Schedule::from(CronExpression {
            extended: true,
            second: vec![Condition::Value(0)],
            minute: vec![Condition::Value(30)],
            ..Default::default()
        });
        assert!(!matches(&extended, &at(2026, 1, 1, 4, 30, 17)).unwrap());
        assert!(matches(&extended, &at(2026, 1, 1, 4, 30, 0)).unwrap());
    }

    // ── numeric condition tests ─────────────────────────────────────────

    #[test]
    fn test_wrapping_hour_range() {
        let range = [Condition::Range(10, 2)];
        let matched: Vec<u32> = (0..24)
            .filter(|&h| matches_field(Field::Hour, &range, &at(2026, 1, 1, h, 0, 0)))
            .collect();
        assert_eq!(matched, (0..=2).chain(10..24).collect::<Vec<_>>());
    }

    #[test]
    fn test_step_over_wildcard_seconds() {
        let every_fourth = [step(StepBase::Wildcard, 4)];
        let matched: Vec<u32> = (0..60)
            .filter(|&s| matches_field(Field::Second, &every_fourth, &at(2026, 1, 1, 0, 0, s)))
            .collect();
        assert_eq!(matched, (0..60).step_by(4).collect::<Vec<_>>());
    }

    #[test]
    fn test_step_over_range() {
        let conditions = [step(StepBase::Range(10, 30), 5)];
        let matched: Vec<u32> = (0..60)
            .filter(|&m| matches_field(Field::Minute, &conditions, &at(2026, 1, 1, 0, m, 0)))
            .collect();
        assert_eq!(matched, vec![10, 15, 20, 25, 30]);
    }

    #[test]
    fn test_value_list_is_or() {
        let conditions = [Condition::Value(1), Condition::Value(15)];
        assert!(matches_field(Field::Day, &conditions, &at(2026, 3, 15, 0, 0, 0)));
        assert!(!matches_field(Field::Day, &conditions, &at(2026, 3, 14, 0, 0, 0)));
    }

    #[test]
    fn test_year_field() {
        let conditions = [Condition::Range(2025, 2027)];
        assert!(matches_field(Field::Year, &conditions, &at(2026, 3, 15, 0, 0, 0)));
        assert!(!matches_field(Field::Year, &conditions, &at(2024, 3, 15, 0, 0, 0)));
    }

    // ── weekday tests ───────────────────────────────────────────────────

    #[test]
    fn test_sunday_is_zero_and_seven() {
        // 2026-03-15 is a Sunday.
        let sunday = at(2026, 3, 15, 12, 0, 0);
        assert!(matches_field(Field::Weekday, &[Condition::Value(0)], &sunday));
        assert!(matches_field(Field::Weekday, &[Condition::Value(7)], &sunday));
        assert!(!matches_field(Field::Weekday, &[Condition::Value(1)], &sunday));
    }

    #[test]
    fn test_weekday_range_wrapping_through_sunday() {
        // Saturday through Monday, 14-16 March 2026.
        let conditions = [Condition::Range(6, 1)];
        for day in [14, 15, 16] {
            assert!(matches_field(Field::Weekday, &conditions, &at(2026, 3, day, 0, 0, 0)));
        }
        assert!(!matches_field(Field::Weekday, &conditions, &at(2026, 3, 17, 0, 0, 0)));
    }

    #[test]
    fn test_weekday_step_skips_zero_alias() {
        // `*/2` over ISO numbering: Tue, Thu, Sat. Sunday (7) is odd and must not
        // sneak in through its 0 alias.
        let conditions = [step(StepBase::Wildcard, 2)];
        assert!(!matches_field(Field::Weekday, &conditions, &at(2026, 3, 15, 0, 0, 0)));
        assert!(matches_field(Field::Weekday, &conditions, &at(2026, 3, 17, 0, 0, 0)));
        assert!(!matches_field(Field::Weekday, &conditions, &at(2026, 3, 16, 0, 0, 0)));
    }

    #[test]
    fn test_last_weekday_occurrence() {
        // Last Friday of March 2026 is the 27th.
        let conditions = [Condition::LastWeekdayOccurrence(Weekday::Fri)];
        assert!(matches_field(Field::Weekday, &conditions, &at(2026, 3, 27, 0, 0, 0)));
        assert!(!matches_field(Field::Weekday, &conditions, &at(2026, 3, 20, 0, 0, 0)));
    }

    #[test]
    fn test_nth_weekday_occurrence() {
        // Third Tuesday of February 2026 is the 17th.
        let conditions = [Condition::NthWeekdayOccurrence(Weekday::Tue, 3)];
        assert!(matches_field(Field::Weekday, &conditions, &at(2026, 2, 17, 0, 0, 0)));
        assert!(!matches_field(Field::Weekday, &conditions, &at(2026, 2, 10, 0, 0, 0)));
        // A fifth Tuesday does not exist in February 2026.
        let fifth = [Condition::NthWeekdayOccurrence(Weekday::Tue, 5)];
        assert!(!matches_field(Field::Weekday, &fifth, &at(2026, 2, 3, 0, 0, 0)));
    }

    // ── day-of-month special tests ──────────────────────────────────────

    #[test]
    fn test_last_day_of_month() {
        let conditions = [Condition::LastDayOfMonth];
        assert!(matches_field(Field::Day, &conditions, &at(2024, 2, 29, 0, 0, 0)));
        assert!(matches_field(Field::Day, &conditions, &at(2023, 2, 28, 0, 0, 0)));
        assert!(!matches_field(Field::Day, &conditions, &at(2024, 2, 28, 0, 0, 0)));
    }

    #[test]
    fn test_nearest_weekday_to() {
        // 2026-03-15 is a Sunday: 15W fires on Monday the 16th.
        let conditions = [Condition::NearestWeekdayTo(15)];
        assert!(matches_field(Field::Day, &conditions, &at(2026, 3, 16, 0, 0, 0)));
        assert!(!matches_field(Field::Day, &conditions, &at(2026, 3, 15, 0, 0, 0)));
    }

    #[test]
    fn test_nearest_weekday_clamps_to_month_end() {
        // 31W in May 2026: the 31st is a Sunday, so Friday the 29th.
        let conditions = [Condition::NearestWeekdayTo(31)];
        assert!(matches_field(Field::Day, &conditions, &at(2026, 5, 29, 0, 0, 0)));
        // April has 30 days; the 30th (a Thursday) stands in for the 31st.
        assert!(matches_field(Field::Day, &conditions, &at(2026, 4, 30, 0, 0, 0)));
    }

    #[test]
    fn test_last_weekday_of_month() {
        // October 2026 ends on a Saturday.
        let conditions = [Condition::LastWeekdayOfMonth];
        assert!(matches_field(Field::Day, &conditions, &at(2026, 10, 30, 0, 0, 0)));
        assert!(!matches_field(Field::Day, &conditions, &at(2026, 10, 31, 0, 0, 0)));
    }

    // ── ambiguity tests ─────────────────────────────────────────────────

    #[test]
    fn test_ambiguity_naive_always_matches() {
        let list = [Constraint::Ambiguity(AmbiguityHint::NONE)];
        assert!(matches_conditions(&list, &at(2024, 11, 3, 1, 30, 0)));
    }

    #[test]
    fn test_ambiguity_unambiguous_always_matches() {
        let list = [Constraint::Ambiguity(AmbiguityHint::NONE)];
        assert!(matches_conditions(&list, &new_york_utc(2024, 7, 1, 12, 0)));
    }

    #[test]
    fn test_ambiguity_prior_and_subsequent() {
        // 01:30 local occurs at 05:30 UTC (EDT) and again at 06:30 UTC (EST).
        let first = new_york_utc(2024, 11, 3, 5, 30);
        let second = new_york_utc(2024, 11, 3, 6, 30);

        let prior = [Constraint::Ambiguity(AmbiguityHint::PRIOR)];
        assert!(matches_conditions(&prior, &first));
        assert!(!matches_conditions(&prior, &second));

        let subsequent = [Constraint::Ambiguity(AmbiguityHint::SUBSEQUENT)];
        assert!(!matches_conditions(&subsequent, &first));
        assert!(matches_conditions(&subsequent, &second));

        let both = [Constraint::Ambiguity(AmbiguityHint::BOTH)];
        assert!(matches_conditions(&both, &first));
        assert!(matches_conditions(&both, &second));

        let none = [Constraint::Ambiguity(AmbiguityHint::NONE)];
        assert!(!matches_conditions(&none, &first));
        assert!(!matches_conditions(&none, &second));
    }
}
