//! # cron-matcher
//!
//! Deterministic cron schedule matching.
//!
//! Decides whether a single timestamp satisfies a structured, already-parsed
//! cron schedule, and provides the calendar arithmetic the decision needs:
//! period truncation, leap-safe month and year stepping, weekday searches
//! within a month, and offsetting that survives daylight-saving gaps and
//! overlaps.
//!
//! ## Modules
//!
//! - [`matcher`] — Schedule + timestamp → match / no match
//! - [`calendar`] — Truncation, stepping, weekday searches, zone-aware `add`
//! - [`condition`] — Fields, conditions, condition lists, cron expressions
//! - [`timestamp`] — Naive and zoned timestamps, gap/overlap resolution
//! - [`compose`] — Cron text rendering of schedules
//! - [`error`] — Error types

pub mod calendar;
pub mod compose;
pub mod condition;
pub mod error;
pub mod matcher;
pub mod timestamp;

pub use condition::{
    AmbiguityHint, Condition, ConditionList, Constraint, CronExpression, Field, Schedule, StepBase,
};
pub use error::CronError;
pub use matcher::{matches, matches_conditions, matches_field};
pub use timestamp::{Disambiguation, Projection, TimeUnit, Timestamp};
