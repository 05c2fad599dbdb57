//! Error types for cron-matcher operations.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CronError {
    #[error("Unsupported schedule: {0}")]
    UnsupportedSchedule(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid datetime: {0}")]
    InvalidDatetime(String),

    #[error("Unsupported unit: {0}")]
    UnsupportedUnit(String),

    #[error("Unresolvable local time: {0}")]
    UnresolvableLocalTime(String),

    #[error("Out of range: {0}")]
    OutOfRange(String),
}

pub type Result<T> = std::result::Result<T, CronError>;
