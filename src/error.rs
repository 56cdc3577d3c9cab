//! Domain error types shared by the timetable core.

use thiserror::Error;

/// Validation and lookup failures raised by the scheduling core.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    /// A time interval did not match `H:MM-H:MM` or `HH:MM-HH:MM`.
    #[error("malformed time slot '{value}'")]
    MalformedTimeSlot { value: String },

    #[error("unknown day '{value}'")]
    UnknownDay { value: String },

    #[error("unknown activity type '{value}'")]
    UnknownActivity { value: String },

    /// A session record failed field validation.
    #[error("invalid session: {message}")]
    InvalidSession { message: String },

    #[error("invalid calendar: {message}")]
    InvalidCalendar { message: String },

    #[error("schedule {id} not found")]
    ScheduleNotFound { id: i64 },

    #[error("session {id} not found")]
    SessionNotFound { id: i64 },

    #[error("group {group_num} of level {level} not found")]
    GroupNotFound { level: u32, group_num: u32 },

    #[error("invalid group request: {message}")]
    InvalidGroup { message: String },

    /// The write would clash with existing state (duplicate ids, existing schedule).
    #[error("conflict: {message}")]
    Conflict { message: String },
}

impl ScheduleError {
    pub fn malformed_slot(value: impl Into<String>) -> Self {
        ScheduleError::MalformedTimeSlot {
            value: value.into(),
        }
    }

    pub fn invalid_session(message: impl Into<String>) -> Self {
        ScheduleError::InvalidSession {
            message: message.into(),
        }
    }

    /// Returns true for errors caused by a missing record rather than bad input.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ScheduleError::ScheduleNotFound { .. }
                | ScheduleError::SessionNotFound { .. }
                | ScheduleError::GroupNotFound { .. }
        )
    }
}

pub type ScheduleResult<T> = Result<T, ScheduleError>;
