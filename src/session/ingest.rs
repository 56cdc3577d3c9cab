//! Normalization boundary for session payloads coming from the external store.
//!
//! Older tables and clients disagree on field names (`group_num`, `group`,
//! `grp`, camelCase variants) and on whether numbers arrive as numbers or
//! strings. Everything past this module only sees [`Session`].

use super::{ActivityType, Session};
use crate::error::{ScheduleError, ScheduleResult};
use crate::timeslot::{Day, TimeSlot};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

const ID_KEYS: &[&str] = &["id", "session_id", "sessionId"];
const SCHEDULE_KEYS: &[&str] = &["schedule_id", "scheduleId"];
const DAY_KEYS: &[&str] = &["day", "day_of_week", "dayOfWeek"];
const SLOT_KEYS: &[&str] = &["time_slot", "timeSlot", "time"];
const CODE_KEYS: &[&str] = &["course_code", "courseCode", "code"];
const NAME_KEYS: &[&str] = &["course_name", "courseName", "name"];
const SECTION_KEYS: &[&str] = &["section_num", "sectionNum", "section"];
const ACTIVITY_KEYS: &[&str] = &["activity_type", "activityType", "activity", "type"];
const LEVEL_KEYS: &[&str] = &["level", "lvl", "student_level"];
const GROUP_KEYS: &[&str] = &["group_num", "groupNum", "group", "grp"];
const ROOM_KEYS: &[&str] = &["room", "room_num", "location"];
const INSTRUCTOR_KEYS: &[&str] = &["instructor", "instructor_name", "faculty"];

/// Envelope keys that may hold a session list, in lookup order.
pub const SESSION_LIST_KEYS: &[&str] = &["sessions", "schedule", "data"];

/// A session payload with legacy field names resolved but values not yet validated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSession {
    pub id: Option<i64>,
    pub schedule_id: Option<i64>,
    pub day: Option<String>,
    pub time_slot: Option<String>,
    pub course_code: Option<String>,
    pub course_name: Option<String>,
    pub section_num: Option<i64>,
    pub activity_type: Option<String>,
    pub level: Option<i64>,
    pub group_num: Option<i64>,
    pub room: Option<String>,
    pub instructor: Option<String>,
}

impl RawSession {
    pub fn from_map(map: &Map<String, Value>) -> ScheduleResult<Self> {
        Ok(Self {
            id: number_field(map, ID_KEYS)?,
            schedule_id: number_field(map, SCHEDULE_KEYS)?,
            day: text_field(map, DAY_KEYS),
            time_slot: text_field(map, SLOT_KEYS),
            course_code: text_field(map, CODE_KEYS),
            course_name: text_field(map, NAME_KEYS),
            section_num: number_field(map, SECTION_KEYS)?,
            activity_type: text_field(map, ACTIVITY_KEYS),
            level: number_field(map, LEVEL_KEYS)?,
            group_num: number_field(map, GROUP_KEYS)?,
            room: text_field(map, ROOM_KEYS),
            instructor: text_field(map, INSTRUCTOR_KEYS),
        })
    }

    pub fn from_value(value: &Value) -> ScheduleResult<Self> {
        match value {
            Value::Object(map) => Self::from_map(map),
            other => Err(ScheduleError::invalid_session(format!(
                "expected a session object, got {other}"
            ))),
        }
    }

    /// Validates the resolved fields and produces a canonical [`Session`].
    pub fn normalize(self) -> ScheduleResult<Session> {
        let day: Day = self
            .day
            .as_deref()
            .ok_or_else(|| ScheduleError::invalid_session("missing day"))?
            .parse()?;

        let raw_slot = self
            .time_slot
            .ok_or_else(|| ScheduleError::invalid_session("missing time slot"))?;
        let time_slot = TimeSlot::parse(&raw_slot)?.to_string();

        let course_code = self
            .course_code
            .ok_or_else(|| ScheduleError::invalid_session("missing course code"))?;

        let section_num = match self.section_num {
            Some(value) => to_u32("section_num", value)?,
            None => return Err(ScheduleError::invalid_session("missing section number")),
        };

        let activity_type = self
            .activity_type
            .as_deref()
            .filter(|value| !is_general_activity(value))
            .map(str::parse::<ActivityType>)
            .transpose()?;

        Ok(Session {
            id: self.id,
            schedule_id: self.schedule_id,
            day,
            time_slot,
            course_code,
            course_name: self.course_name.unwrap_or_default(),
            section_num,
            activity_type,
            level: self.level.map(|v| to_u32("level", v)).transpose()?,
            group_num: self.group_num.map(|v| to_u32("group_num", v)).transpose()?,
            room: self.room,
            instructor: self.instructor,
        })
    }
}

impl<'de> Deserialize<'de> for RawSession {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let map = Map::deserialize(deserializer)?;
        RawSession::from_map(&map).map_err(serde::de::Error::custom)
    }
}

/// Accepts either a bare array of sessions or a `{success, sessions: [...]}` envelope.
pub fn ingest_sessions(payload: &Value) -> ScheduleResult<Vec<Session>> {
    let items = match payload {
        Value::Array(items) => items,
        Value::Object(map) => SESSION_LIST_KEYS
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_array))
            .ok_or_else(|| ScheduleError::invalid_session("payload has no session list"))?,
        other => {
            return Err(ScheduleError::invalid_session(format!(
                "expected session list, got {other}"
            )));
        }
    };

    items
        .iter()
        .map(|item| RawSession::from_value(item)?.normalize())
        .collect()
}

fn is_general_activity(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || value.eq_ignore_ascii_case("general")
}

fn lookup<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| map.get(*key))
        .find(|value| match value {
            Value::Null => false,
            Value::String(s) => !s.trim().is_empty(),
            _ => true,
        })
}

fn text_field(map: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    lookup(map, keys).map(|value| match value {
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    })
}

fn number_field(map: &Map<String, Value>, keys: &[&str]) -> ScheduleResult<Option<i64>> {
    let Some(value) = lookup(map, keys) else {
        return Ok(None);
    };
    let parsed = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    parsed.map(Some).ok_or_else(|| {
        ScheduleError::invalid_session(format!("field '{}' must be an integer, got {value}", keys[0]))
    })
}

fn to_u32(field: &str, value: i64) -> ScheduleResult<u32> {
    u32::try_from(value)
        .map_err(|_| ScheduleError::invalid_session(format!("{field} out of range: {value}")))
}
