use super::{PersistenceError, PersistenceResult};
use crate::{
    calendar::{WeekCalendar, WeekCalendarConfig},
    catalog::Catalog,
    session::{ActivityType, Session},
    timeslot::Day,
    timetable::{ScheduleRecord, Timetable},
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::path::Path;
use tracing::info;

#[derive(Serialize, Deserialize)]
struct TimetableSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    calendar: Option<WeekCalendarConfig>,
    #[serde(default)]
    catalog: Catalog,
    #[serde(default)]
    schedules: Vec<ScheduleRecord>,
    #[serde(default)]
    groups: BTreeMap<u32, BTreeSet<u32>>,
    sessions: Vec<Session>,
}

impl TimetableSnapshot {
    fn from_timetable(timetable: &Timetable) -> PersistenceResult<Self> {
        super::validate_sessions(timetable.sessions())?;
        Ok(Self {
            calendar: Some(timetable.calendar().to_config()),
            catalog: timetable.catalog().clone(),
            schedules: timetable.schedules().to_vec(),
            groups: timetable.all_groups().clone(),
            sessions: timetable.sessions().to_vec(),
        })
    }

    fn into_timetable(self) -> PersistenceResult<Timetable> {
        super::validate_sessions(&self.sessions)?;
        let calendar = match self.calendar {
            Some(config) => WeekCalendar::from_config(&config)?,
            None => WeekCalendar::default(),
        };
        Ok(Timetable::from_parts(
            calendar,
            self.catalog,
            self.schedules,
            self.groups,
            self.sessions,
        )?)
    }
}

pub fn save_timetable_to_json<P: AsRef<Path>>(
    timetable: &Timetable,
    path: P,
) -> PersistenceResult<()> {
    let snapshot = TimetableSnapshot::from_timetable(timetable)?;
    let file = File::create(path.as_ref())?;
    serde_json::to_writer_pretty(file, &snapshot)?;
    info!(path = %path.as_ref().display(), sessions = snapshot.sessions.len(), "saved timetable");
    Ok(())
}

pub fn load_timetable_from_json<P: AsRef<Path>>(path: P) -> PersistenceResult<Timetable> {
    let file = File::open(path)?;
    let snapshot: TimetableSnapshot = serde_json::from_reader(file)?;
    snapshot.into_timetable()
}

#[derive(Default, Serialize, Deserialize)]
struct SessionCsvRecord {
    id: Option<i64>,
    schedule_id: Option<i64>,
    day: String,
    time_slot: String,
    course_code: String,
    course_name: String,
    section_num: u32,
    activity_type: Option<String>,
    level: Option<u32>,
    group_num: Option<u32>,
    room: Option<String>,
    instructor: Option<String>,
}

impl From<&Session> for SessionCsvRecord {
    fn from(session: &Session) -> Self {
        Self {
            id: session.id,
            schedule_id: session.schedule_id,
            day: session.day.to_string(),
            time_slot: session.time_slot.clone(),
            course_code: session.course_code.clone(),
            course_name: session.course_name.clone(),
            section_num: session.section_num,
            activity_type: session.activity_type.map(|a| a.to_string()),
            level: session.level,
            group_num: session.group_num,
            room: session.room.clone(),
            instructor: session.instructor.clone(),
        }
    }
}

impl SessionCsvRecord {
    fn into_session(self) -> PersistenceResult<Session> {
        let day: Day = self.day.parse()?;
        let activity_type = self
            .activity_type
            .filter(|value| !value.trim().is_empty())
            .map(|value| value.parse::<ActivityType>())
            .transpose()?;
        Ok(Session {
            id: self.id,
            schedule_id: self.schedule_id,
            day,
            time_slot: self.time_slot,
            course_code: self.course_code,
            course_name: self.course_name,
            section_num: self.section_num,
            activity_type,
            level: self.level,
            group_num: self.group_num,
            room: self.room.filter(|r| !r.is_empty()),
            instructor: self.instructor.filter(|i| !i.is_empty()),
        })
    }
}

/// Writes sessions as flat CSV rows, one per session.
pub fn save_sessions_to_csv<P: AsRef<Path>>(sessions: &[Session], path: P) -> PersistenceResult<()> {
    super::validate_sessions(sessions)?;
    let mut writer = csv::Writer::from_path(path)?;
    for session in sessions {
        writer.serialize(SessionCsvRecord::from(session))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn load_sessions_from_csv<P: AsRef<Path>>(path: P) -> PersistenceResult<Vec<Session>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut sessions = Vec::new();
    for record in reader.deserialize::<SessionCsvRecord>() {
        sessions.push(record?.into_session()?);
    }
    if sessions.is_empty() {
        return Err(PersistenceError::InvalidData(
            "csv file contains no sessions".into(),
        ));
    }
    super::validate_sessions(&sessions)?;
    Ok(sessions)
}
