use thiserror::Error;

/// Errors rejected before a solve is attempted.
///
/// These are distinct from [`crate::validation::ValidationError`], which is
/// produced *after* a schedule exists and is surfaced as data rather than
/// thrown.
#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("malformed availability for worker {worker_id}: {reason}")]
    MalformedAvailability { worker_id: String, reason: String },

    #[error("negative capacity for role {role:?}: {value}")]
    NegativeCapacity { role: String, value: i64 },

    #[error("unknown role: {0}")]
    UnknownRole(String),

    #[error("end date {end} is before start date {start}")]
    InvalidDateRange {
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },

    #[error("request carries no workers")]
    EmptyWorkerSet,

    #[error("solver configuration is invalid: {0}")]
    InvalidConfig(String),
}

pub type ScheduleResult<T> = Result<T, ScheduleError>;
