use crate::catalog::{Course, Section};
use crate::error::ScheduleError;
use crate::session::Session;
use crate::session_validation;
use crate::timetable::Timetable;
use polars::prelude::PolarsError;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("dataframe conversion error: {0}")]
    DataFrame(#[from] PolarsError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[cfg(feature = "sqlite")]
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Schedule(#[from] ScheduleError),
    #[error("invalid data: {0}")]
    InvalidData(String),
    #[error("no timetable stored")]
    NotFound,
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Whole-timetable snapshot storage.
pub trait ScheduleStore {
    fn save_timetable(&self, timetable: &Timetable) -> PersistenceResult<()>;
    fn load_timetable(&self) -> PersistenceResult<Option<Timetable>>;
}

/// Query-level contract used by grid rendering and schedule generation.
///
/// Reads hand back plain records; `insert_sessions` files the given sessions
/// under `schedule_id`, taking the cohort from that schedule.
pub trait SessionSource {
    fn fetch_sessions(&self, level: u32, group_num: u32) -> PersistenceResult<Vec<Session>>;
    fn fetch_courses(&self) -> PersistenceResult<Vec<Course>>;
    fn fetch_sections(&self) -> PersistenceResult<Vec<Section>>;
    fn insert_sessions(&mut self, schedule_id: i64, sessions: &[Session])
    -> PersistenceResult<()>;
}

pub fn validate_sessions(sessions: &[Session]) -> PersistenceResult<()> {
    session_validation::validate_session_collection(sessions)
        .map_err(|err| PersistenceError::InvalidData(err.to_string()))
}

pub mod file;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use file::{
    load_sessions_from_csv, load_timetable_from_json, save_sessions_to_csv,
    save_timetable_to_json,
};
