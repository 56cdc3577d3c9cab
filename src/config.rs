//! Runtime configuration read from the environment.

use crate::calendar::{WeekCalendar, WeekCalendarConfig};
use crate::error::ScheduleError;
use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

pub const HTTP_ADDR_VAR: &str = "SMART_SCHEDULE_HTTP_ADDR";
pub const DATABASE_VAR: &str = "SMART_SCHEDULE_DB";
pub const CALENDAR_VAR: &str = "SMART_SCHEDULE_CALENDAR";

const DEFAULT_HTTP_ADDR: &str = "0.0.0.0:3000";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} is not a valid socket address: {value}")]
    InvalidAddress { var: &'static str, value: String },

    #[error("failed to read calendar file {path}: {source}")]
    CalendarIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse calendar file {path}: {source}")]
    CalendarParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("calendar file {path} is invalid: {source}")]
    CalendarInvalid {
        path: PathBuf,
        #[source]
        source: ScheduleError,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub http_addr: SocketAddr,
    /// SQLite file holding the timetable, if persistence is enabled.
    pub database_path: Option<PathBuf>,
    pub calendar_path: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Builds the config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_addr = lookup(HTTP_ADDR_VAR)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_HTTP_ADDR.to_string());
        let http_addr = raw_addr
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidAddress {
                var: HTTP_ADDR_VAR,
                value: raw_addr.clone(),
            })?;

        let path_var = |var: &str| {
            lookup(var)
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
        };

        Ok(Self {
            http_addr,
            database_path: path_var(DATABASE_VAR),
            calendar_path: path_var(CALENDAR_VAR),
        })
    }

    /// Loads the configured calendar, falling back to the built-in axes.
    pub fn load_calendar(&self) -> Result<WeekCalendar, ConfigError> {
        let Some(path) = &self.calendar_path else {
            return Ok(WeekCalendar::default());
        };
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::CalendarIo {
            path: path.clone(),
            source,
        })?;
        let config: WeekCalendarConfig =
            serde_json::from_str(&text).map_err(|source| ConfigError::CalendarParse {
                path: path.clone(),
                source,
            })?;
        WeekCalendar::from_config(&config).map_err(|source| ConfigError::CalendarInvalid {
            path: path.clone(),
            source,
        })
    }
}
