use crate::error::{ScheduleError, ScheduleResult};
use crate::timeslot::{Day, TimeSlot};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod ingest;

pub use ingest::{RawSession, SESSION_LIST_KEYS, ingest_sessions};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ActivityType {
    Lecture,
    Tutorial,
    Lab,
}

impl ActivityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::Lecture => "Lecture",
            ActivityType::Tutorial => "Tutorial",
            ActivityType::Lab => "Lab",
        }
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityType {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lecture" | "lec" => Ok(ActivityType::Lecture),
            "tutorial" | "tut" => Ok(ActivityType::Tutorial),
            "lab" | "laboratory" => Ok(ActivityType::Lab),
            _ => Err(ScheduleError::UnknownActivity {
                value: s.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for ActivityType {
    type Error = ScheduleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ActivityType> for String {
    fn from(value: ActivityType) -> Self {
        value.as_str().to_string()
    }
}

/// One scheduled occurrence of a course activity for a cohort.
///
/// `time_slot` is kept as the raw `H:MM-H:MM` text coming from the store;
/// consumers parse it through [`Session::parsed_slot`] so malformed data is
/// reported where it is used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule_id: Option<i64>,
    pub day: Day,
    pub time_slot: String,
    pub course_code: String,
    #[serde(default)]
    pub course_name: String,
    pub section_num: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_type: Option<ActivityType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_num: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructor: Option<String>,
}

impl Session {
    pub fn new(
        day: Day,
        time_slot: impl Into<String>,
        course_code: impl Into<String>,
        course_name: impl Into<String>,
        section_num: u32,
    ) -> Self {
        Self {
            id: None,
            schedule_id: None,
            day,
            time_slot: time_slot.into(),
            course_code: course_code.into(),
            course_name: course_name.into(),
            section_num,
            activity_type: None,
            level: None,
            group_num: None,
            room: None,
            instructor: None,
        }
    }

    pub fn with_cohort(mut self, level: u32, group_num: u32) -> Self {
        self.level = Some(level);
        self.group_num = Some(group_num);
        self
    }

    pub fn with_activity(mut self, activity: ActivityType) -> Self {
        self.activity_type = Some(activity);
        self
    }

    pub fn parsed_slot(&self) -> ScheduleResult<TimeSlot> {
        TimeSlot::parse(&self.time_slot)
    }

    pub fn belongs_to(&self, level: u32, group_num: u32) -> bool {
        self.level == Some(level) && self.group_num == Some(group_num)
    }

    /// Two sessions are the same activity when course, section and activity agree.
    pub fn same_activity(&self, other: &Session) -> bool {
        self.course_code == other.course_code
            && self.section_num == other.section_num
            && self.activity_type == other.activity_type
    }
}
