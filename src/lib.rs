pub mod calculations;
pub mod calendar;
pub mod catalog;
pub mod config;
pub mod error;
#[cfg(feature = "http_api")]
pub mod http_api;
pub mod logging;
pub mod persistence;
pub mod session;
pub(crate) mod session_validation;
pub mod timeslot;
pub mod timetable;

pub use calculations::greedy_allocation::{GreedyAllocator, allocate};
pub use calculations::grid_projection::{
    DOUBLE_ROW_MINUTES, GridCell, GridProjector, ProjectedCell, ProjectedGrid, WeekGrid, project,
    project_groups,
};
pub use calendar::{WeekCalendar, WeekCalendarConfig};
pub use catalog::{Catalog, Course, Section};
pub use config::{AppConfig, ConfigError};
pub use error::{ScheduleError, ScheduleResult};
#[cfg(feature = "sqlite")]
pub use persistence::sqlite::SqliteScheduleStore;
pub use persistence::{
    PersistenceError, ScheduleStore, SessionSource, load_sessions_from_csv,
    load_timetable_from_json, save_sessions_to_csv, save_timetable_to_json, validate_sessions,
};
pub use session::{ActivityType, RawSession, Session, ingest_sessions};
pub use session_validation::{SessionConflict, find_conflicts};
pub use timeslot::{Day, TimeSlot};
pub use timetable::{
    GenerationSummary, ScheduleRecord, Timetable, generate_schedule, render_group_grid,
};
