//! Render structured schedules back into cron text.

use std::fmt;

use crate::condition::{Condition, CronExpression, Schedule, StepBase};

impl fmt::Display for StepBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepBase::Wildcard => f.write_str("*"),
            StepBase::Range(from, to) => write!(f, "{from}-{to}"),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Wildcard => f.write_str("*"),
            Condition::Value(n) => write!(f, "{n}"),
            Condition::Range(from, to) => write!(f, "{from}-{to}"),
            Condition::Step(base, divisor) => write!(f, "{base}/{divisor}"),
            Condition::LastDayOfMonth => f.write_str("L"),
            Condition::LastWeekdayOccurrence(weekday) => {
                write!(f, "{}L", weekday.number_from_monday())
            }
            Condition::NthWeekdayOccurrence(weekday, n) => {
                write!(f, "{}#{n}", weekday.number_from_monday())
            }
            Condition::NearestWeekdayTo(day) => write!(f, "{day}W"),
            Condition::LastWeekdayOfMonth => f.write_str("LW"),
        }
    }
}

/// Comma-separated condition set.
struct FieldText<'a>(&'a [Condition]);

impl fmt::Display for FieldText<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, condition) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{condition}")?;
        }
        Ok(())
    }
}

impl fmt::Display for CronExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.extended {
            write!(f, "{} ", FieldText(&self.second))?;
        }
        write!(
            f,
            "{} {} {} {} {}",
            FieldText(&self.minute),
            FieldText(&self.hour),
            FieldText(&self.day),
            FieldText(&self.month),
            FieldText(&self.weekday),
        )?;
        if self.year.as_slice() != [Condition::Wildcard] {
            write!(f, " {}", FieldText(&self.year))?;
        }
        Ok(())
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Schedule::Reboot => f.write_str("@reboot"),
            Schedule::Cron(expression) => write!(f, "{expression}"),
        }
    }
}
