//! Structured schedules: the condition lists an upstream cron parser produces.
//!
//! A [`ConditionList`] is an AND of [`Constraint`]s; each field constraint is
//! an OR over its [`Condition`]s. [`CronExpression`] is the field-by-field
//! record a parser fills in, and [`Schedule`] adds the `@reboot` marker that
//! the matcher refuses to evaluate.

use std::num::NonZeroU32;

use chrono::Weekday;
use serde::{Deserialize, Serialize};

/// Calendar field a set of conditions applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Second,
    Minute,
    Hour,
    Day,
    Month,
    /// ISO day of week, 1 (Monday) through 7 (Sunday); 0 also denotes Sunday.
    Weekday,
    Year,
}

/// Domain a [`Condition::Step`] divides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepBase {
    Wildcard,
    Range(u32, u32),
}

/// One accepted value pattern for a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    /// `*`
    Wildcard,
    /// `n`
    Value(u32),
    /// `from-to`, inclusive. `from > to` wraps past the field maximum.
    Range(u32, u32),
    /// `*/d` or `from-to/d`
    Step(StepBase, NonZeroU32),
    /// `L` in the day field.
    LastDayOfMonth,
    /// `wL` in the weekday field.
    LastWeekdayOccurrence(Weekday),
    /// `w#n` in the weekday field.
    NthWeekdayOccurrence(Weekday, u8),
    /// `dW` in the day field.
    NearestWeekdayTo(u32),
    /// `LW` in the day field.
    LastWeekdayOfMonth,
}

/// Which occurrence of a repeated wall-clock time a schedule accepts.
///
/// Defaults to [`AmbiguityHint::PRIOR`], so a repeated time fires once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AmbiguityHint {
    /// Accept the first occurrence (before clocks go back).
    pub prior: bool,
    /// Accept the second occurrence (after clocks go back).
    pub subsequent: bool,
}

impl AmbiguityHint {
    pub const NONE: Self = Self {
        prior: false,
        subsequent: false,
    };
    pub const PRIOR: Self = Self {
        prior: true,
        subsequent: false,
    };
    pub const SUBSEQUENT: Self = Self {
        prior: false,
        subsequent: true,
    };
    pub const BOTH: Self = Self {
        prior: true,
        subsequent: true,
    };
}

impl Default for AmbiguityHint {
    fn default() -> Self {
        Self::PRIOR
    }
}

/// One conjunct of a [`ConditionList`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Constraint {
    /// The field's value must satisfy at least one condition.
    Field(Field, Vec<Condition>),
    /// Zoned timestamps on a repeated wall-clock time must be an accepted occurrence.
    Ambiguity(AmbiguityHint),
}

pub type ConditionList = Vec<Constraint>;

/// A parsed cron expression, one condition set per field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CronExpression {
    /// Whether the expression carries a seconds field.
    pub extended: bool,
    pub second: Vec<Condition>,
    pub minute: Vec<Condition>,
    pub hour: Vec<Condition>,
    pub day: Vec<Condition>,
    pub month: Vec<Condition>,
    pub weekday: Vec<Condition>,
    pub year: Vec<Condition>,
    pub on_ambiguity: AmbiguityHint,
}

impl Default for CronExpression {
    fn default() -> Self {
        Self {
            extended: false,
            second: vec![Condition::Wildcard],
            minute: vec![Condition::Wildcard],
            hour: vec![Condition::Wildcard],
            day: vec![Condition::Wildcard],
            month: vec![Condition::Wildcard],
            weekday: vec![Condition::Wildcard],
            year: vec![Condition::Wildcard],
            on_ambiguity: AmbiguityHint::default(),
        }
    }
}

impl CronExpression {
    /// Flatten into the ordered list the matcher evaluates.
    ///
    /// Seconds are only constrained for extended expressions.
    pub fn to_condition_list(&self) -> ConditionList {
        let mut list = Vec::with_capacity(8);
        if self.extended {
            list.push(Constraint::Field(Field::Second, self.second.clone()));
        }
        list.extend([
            Constraint::Field(Field::Minute, self.minute.clone()),
            Constraint::Field(Field::Hour, self.hour.clone()),
            Constraint::Field(Field::Day, self.day.clone()),
            Constraint::Field(Field::Month, self.month.clone()),
            Constraint::Field(Field::Weekday, self.weekday.clone()),
            Constraint::Field(Field::Year, self.year.clone()),
            Constraint::Ambiguity(self.on_ambiguity),
        ]);
        list
    }
}

/// A schedule as handed over by the parser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Schedule {
    /// `@reboot`: fires once at process start, never on a calendar time.
    Reboot,
    Cron(CronExpression),
}

impl From<CronExpression> for Schedule {
    fn from(expression: CronExpression) -> Self {
        Schedule::Cron(expression)
    }
}
