use crate::calculations::greedy_allocation::GreedyAllocator;
use crate::calculations::grid_projection::{GridProjector, ProjectedGrid};
use crate::calendar::WeekCalendar;
use crate::catalog::{Catalog, Course, Section};
use crate::error::{ScheduleError, ScheduleResult};
use crate::persistence::{PersistenceResult, SessionSource};
use crate::session::Session;
use crate::session_validation::{self, SessionConflict};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{info, warn};

/// A timetable for one cohort. Students only see it once published.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRecord {
    pub id: i64,
    pub level: u32,
    pub group_num: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub published: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationSummary {
    pub schedule_id: i64,
    pub generated: usize,
    pub grid_cells: usize,
    pub conflicts: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Timetable {
    calendar: WeekCalendar,
    catalog: Catalog,
    schedules: Vec<ScheduleRecord>,
    groups: BTreeMap<u32, BTreeSet<u32>>,
    sessions: Vec<Session>,
    next_schedule_id: i64,
    next_session_id: i64,
}

impl Default for Timetable {
    fn default() -> Self {
        Self::new()
    }
}

impl Timetable {
    pub fn new() -> Self {
        Self::with_calendar(WeekCalendar::default())
    }

    pub fn with_calendar(calendar: WeekCalendar) -> Self {
        Self {
            calendar,
            catalog: Catalog::new(),
            schedules: Vec::new(),
            groups: BTreeMap::new(),
            sessions: Vec::new(),
            next_schedule_id: 1,
            next_session_id: 1,
        }
    }

    /// Rebuilds a timetable from stored parts, re-validating every session.
    pub fn from_parts(
        calendar: WeekCalendar,
        catalog: Catalog,
        schedules: Vec<ScheduleRecord>,
        groups: BTreeMap<u32, BTreeSet<u32>>,
        sessions: Vec<Session>,
    ) -> ScheduleResult<Self> {
        session_validation::validate_session_collection(&sessions)?;
        let next_schedule_id = next_id_after(schedules.iter().map(|s| s.id), "schedule")?;
        let next_session_id = next_id_after(sessions.iter().filter_map(|s| s.id), "session")?;
        let mut timetable = Self {
            calendar,
            catalog,
            schedules,
            groups,
            sessions,
            next_schedule_id,
            next_session_id,
        };
        for schedule in timetable.schedules.clone() {
            timetable.register_group(schedule.level, schedule.group_num);
        }
        for session in &mut timetable.sessions {
            if session.id.is_none() {
                session.id = Some(timetable.next_session_id);
                timetable.next_session_id += 1;
            }
        }
        Ok(timetable)
    }

    pub fn calendar(&self) -> &WeekCalendar {
        &self.calendar
    }

    pub fn set_calendar(&mut self, calendar: WeekCalendar) {
        self.calendar = calendar;
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn schedules(&self) -> &[ScheduleRecord] {
        &self.schedules
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn all_groups(&self) -> &BTreeMap<u32, BTreeSet<u32>> {
        &self.groups
    }

    // Catalog

    pub fn upsert_course(&mut self, course: Course) {
        info!(course = %course.course_code, "upserting course");
        self.catalog.upsert_course(course);
    }

    /// Removes a course and every session scheduled for it.
    pub fn remove_course(&mut self, course_code: &str) -> Option<(Course, usize)> {
        let course = self.catalog.remove_course(course_code)?;
        let removed = self.delete_course_sessions(course_code);
        Some((course, removed))
    }

    pub fn upsert_section(&mut self, section: Section) {
        self.catalog.upsert_section(section);
    }

    pub fn remove_section(&mut self, section_num: u32) -> Option<Section> {
        self.catalog.remove_section(section_num)
    }

    // Schedules

    pub fn create_schedule(
        &mut self,
        level: u32,
        group_num: u32,
        name: impl Into<String>,
    ) -> ScheduleResult<i64> {
        if let Some(existing) = self.schedule_for(level, group_num) {
            return Err(ScheduleError::Conflict {
                message: format!(
                    "schedule {} already exists for level {level} group {group_num}",
                    existing.id
                ),
            });
        }
        let id = self.next_schedule_id;
        self.next_schedule_id += 1;
        self.register_group(level, group_num);
        let linked = self.link_orphan_sessions(id, level, group_num);
        self.schedules.push(ScheduleRecord {
            id,
            level,
            group_num,
            name: name.into(),
            published: false,
        });
        info!(schedule_id = id, level, group_num, linked, "created schedule");
        Ok(id)
    }

    /// Files the cohort's schedule-less sessions under `schedule_id`.
    fn link_orphan_sessions(&mut self, schedule_id: i64, level: u32, group_num: u32) -> usize {
        let mut linked = 0;
        for session in &mut self.sessions {
            if session.schedule_id.is_none() && session.belongs_to(level, group_num) {
                session.schedule_id = Some(schedule_id);
                linked += 1;
            }
        }
        linked
    }

    pub fn find_schedule(&self, schedule_id: i64) -> Option<&ScheduleRecord> {
        self.schedules.iter().find(|s| s.id == schedule_id)
    }

    pub fn schedule_for(&self, level: u32, group_num: u32) -> Option<&ScheduleRecord> {
        self.schedules
            .iter()
            .find(|s| s.level == level && s.group_num == group_num)
    }

    pub fn publish(&mut self, schedule_id: i64) -> ScheduleResult<()> {
        self.set_published(schedule_id, true)
    }

    pub fn unpublish(&mut self, schedule_id: i64) -> ScheduleResult<()> {
        self.set_published(schedule_id, false)
    }

    fn set_published(&mut self, schedule_id: i64, published: bool) -> ScheduleResult<()> {
        let record = self
            .schedules
            .iter_mut()
            .find(|s| s.id == schedule_id)
            .ok_or(ScheduleError::ScheduleNotFound { id: schedule_id })?;
        record.published = published;
        info!(schedule_id, published, "schedule visibility changed");
        Ok(())
    }

    // Groups

    fn register_group(&mut self, level: u32, group_num: u32) {
        self.groups.entry(level).or_default().insert(group_num);
    }

    pub fn groups(&self, level: u32) -> Vec<u32> {
        self.groups
            .get(&level)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Replaces the group set of `level` with `1..=count`.
    ///
    /// Groups above `count` lose their schedules and sessions in the same call.
    pub fn create_groups(&mut self, level: u32, count: u32) -> ScheduleResult<Vec<u32>> {
        if count == 0 {
            return Err(ScheduleError::InvalidGroup {
                message: format!("level {level} needs at least one group"),
            });
        }
        let dropped: Vec<u32> = self
            .groups(level)
            .into_iter()
            .filter(|group| *group > count)
            .collect();
        for group in &dropped {
            self.drop_group_contents(level, *group);
        }
        self.groups.insert(level, (1..=count).collect());
        info!(level, count, dropped = dropped.len(), "replaced group set");
        Ok(self.groups(level))
    }

    /// Deletes a group together with its schedules and sessions.
    pub fn delete_group(&mut self, level: u32, group_num: u32) -> ScheduleResult<usize> {
        let exists = self
            .groups
            .get(&level)
            .is_some_and(|set| set.contains(&group_num));
        if !exists {
            return Err(ScheduleError::GroupNotFound { level, group_num });
        }
        let removed = self.drop_group_contents(level, group_num);
        if let Some(set) = self.groups.get_mut(&level) {
            set.remove(&group_num);
            if set.is_empty() {
                self.groups.remove(&level);
            }
        }
        info!(level, group_num, removed, "deleted group");
        Ok(removed)
    }

    fn drop_group_contents(&mut self, level: u32, group_num: u32) -> usize {
        self.schedules
            .retain(|s| !(s.level == level && s.group_num == group_num));
        self.delete_group_sessions(level, group_num)
    }

    // Sessions

    /// Validates and stores a session, returning its id.
    ///
    /// A session filed under a schedule takes that schedule's cohort; one
    /// without a schedule must name its level and group.
    pub fn add_session(&mut self, mut session: Session) -> ScheduleResult<i64> {
        session_validation::validate_session(&session)?;
        self.stamp_cohort(&mut session)?;

        let id = match session.id {
            Some(id) if self.find_session(id).is_some() => {
                return Err(ScheduleError::Conflict {
                    message: format!("session {id} already exists"),
                });
            }
            Some(id) => {
                self.next_session_id = self.next_session_id.max(next_id_after([id], "session")?);
                id
            }
            None => {
                let id = self.next_session_id;
                self.next_session_id += 1;
                id
            }
        };
        session.id = Some(id);
        if let (Some(level), Some(group)) = (session.level, session.group_num) {
            self.register_group(level, group);
        }
        self.sessions.push(session);
        Ok(id)
    }

    fn stamp_cohort(&self, session: &mut Session) -> ScheduleResult<()> {
        if let Some(schedule_id) = session.schedule_id {
            let record = self
                .find_schedule(schedule_id)
                .ok_or(ScheduleError::ScheduleNotFound { id: schedule_id })?;
            session.level = Some(record.level);
            session.group_num = Some(record.group_num);
            return Ok(());
        }
        match (session.level, session.group_num) {
            (Some(level), Some(group_num)) => {
                session.schedule_id = self.schedule_for(level, group_num).map(|s| s.id);
                Ok(())
            }
            _ => Err(ScheduleError::invalid_session(format!(
                "session {} on {} needs a schedule_id or a level and group",
                session.course_code, session.day
            ))),
        }
    }

    pub fn update_session(&mut self, session_id: i64, mut session: Session) -> ScheduleResult<()> {
        session_validation::validate_session(&session)?;
        self.stamp_cohort(&mut session)?;
        let slot = self
            .sessions
            .iter_mut()
            .find(|s| s.id == Some(session_id))
            .ok_or(ScheduleError::SessionNotFound { id: session_id })?;
        session.id = Some(session_id);
        *slot = session;
        Ok(())
    }

    pub fn find_session(&self, session_id: i64) -> Option<&Session> {
        self.sessions.iter().find(|s| s.id == Some(session_id))
    }

    pub fn delete_session(&mut self, session_id: i64) -> ScheduleResult<Session> {
        let idx = self
            .sessions
            .iter()
            .position(|s| s.id == Some(session_id))
            .ok_or(ScheduleError::SessionNotFound { id: session_id })?;
        Ok(self.sessions.remove(idx))
    }

    pub fn delete_course_sessions(&mut self, course_code: &str) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|s| s.course_code != course_code);
        let removed = before - self.sessions.len();
        info!(course = course_code, removed, "deleted course sessions");
        removed
    }

    pub fn delete_group_sessions(&mut self, level: u32, group_num: u32) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|s| !s.belongs_to(level, group_num));
        before - self.sessions.len()
    }

    pub fn sessions_for(&self, level: u32, group_num: u32) -> Vec<Session> {
        self.sessions
            .iter()
            .filter(|s| s.belongs_to(level, group_num))
            .cloned()
            .collect()
    }

    /// Sessions a student may see: only those under a published schedule.
    pub fn published_sessions_for(&self, level: u32, group_num: u32) -> Vec<Session> {
        match self.schedule_for(level, group_num) {
            Some(record) if record.published => self
                .sessions
                .iter()
                .filter(|s| s.schedule_id == Some(record.id))
                .cloned()
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn render_grid(&self, level: u32, group_num: u32) -> ScheduleResult<ProjectedGrid> {
        let sessions = self.sessions_for(level, group_num);
        project_sessions(&self.calendar, &sessions)
    }

    pub fn render_published_grid(
        &self,
        level: u32,
        group_num: u32,
    ) -> ScheduleResult<ProjectedGrid> {
        let sessions = self.published_sessions_for(level, group_num);
        project_sessions(&self.calendar, &sessions)
    }

    /// Fills the schedule's grid from the catalog and stores the result.
    pub fn generate(&mut self, schedule_id: i64) -> ScheduleResult<GenerationSummary> {
        if self.find_schedule(schedule_id).is_none() {
            return Err(ScheduleError::ScheduleNotFound { id: schedule_id });
        }
        let slots = self.calendar.rendering_slots();
        let days = self.calendar.days().to_vec();
        let generated =
            GreedyAllocator::new(self.catalog.courses(), self.catalog.sections()).execute(&days, &slots);
        let count = generated.len();
        self.insert_schedule_sessions(schedule_id, &generated)?;
        let conflicts = self.conflicts().len();
        if conflicts > 0 {
            warn!(schedule_id, conflicts, "generated schedule overlaps existing sessions");
        }
        info!(schedule_id, generated = count, "generated schedule");
        Ok(GenerationSummary {
            schedule_id,
            generated: count,
            grid_cells: days.len() * slots.len(),
            conflicts,
        })
    }

    /// Inserts every session under `schedule_id`, or none if any is invalid.
    pub fn insert_schedule_sessions(
        &mut self,
        schedule_id: i64,
        sessions: &[Session],
    ) -> ScheduleResult<()> {
        let record = self
            .find_schedule(schedule_id)
            .cloned()
            .ok_or(ScheduleError::ScheduleNotFound { id: schedule_id })?;
        let mut staged = Vec::with_capacity(sessions.len());
        for session in sessions {
            session_validation::validate_session(session)?;
            let mut session = session.clone();
            session.id = None;
            session.schedule_id = Some(record.id);
            session.level = Some(record.level);
            session.group_num = Some(record.group_num);
            staged.push(session);
        }
        for session in staged {
            self.add_session(session)?;
        }
        Ok(())
    }

    pub fn conflicts(&self) -> Vec<SessionConflict> {
        session_validation::find_conflicts(&self.sessions)
    }

    /// Per-instructor session count and teaching minutes, sorted by instructor.
    pub fn teaching_load(&self) -> PolarsResult<DataFrame> {
        let mut load: BTreeMap<&str, (u32, u32)> = BTreeMap::new();
        for session in &self.sessions {
            let instructor = session.instructor.as_deref().unwrap_or("unassigned");
            let minutes = session
                .parsed_slot()
                .map(|slot| u32::from(slot.duration_minutes()))
                .unwrap_or(0);
            let entry = load.entry(instructor).or_insert((0, 0));
            entry.0 += 1;
            entry.1 += minutes;
        }

        let instructors: Vec<&str> = load.keys().copied().collect();
        let counts: Vec<u32> = load.values().map(|(count, _)| *count).collect();
        let minutes: Vec<u32> = load.values().map(|(_, minutes)| *minutes).collect();

        DataFrame::new(vec![
            Series::new(PlSmallStr::from_static("instructor"), instructors).into_column(),
            Series::new(PlSmallStr::from_static("sessions"), counts).into_column(),
            Series::new(PlSmallStr::from_static("minutes"), minutes).into_column(),
        ])
    }
}

/// Id following the largest of `ids`; ids must be positive and leave room for a successor.
fn next_id_after(ids: impl IntoIterator<Item = i64>, what: &str) -> ScheduleResult<i64> {
    let mut max = 0;
    for id in ids {
        if id < 1 {
            return Err(ScheduleError::invalid_session(format!(
                "{what} id {id} must be positive"
            )));
        }
        max = max.max(id);
    }
    max.checked_add(1).ok_or_else(|| {
        ScheduleError::invalid_session(format!("{what} id {max} leaves no room for new ids"))
    })
}

fn project_sessions(calendar: &WeekCalendar, sessions: &[Session]) -> ScheduleResult<ProjectedGrid> {
    let slots = calendar.rendering_slots();
    let grid = GridProjector::new(sessions).project_week(calendar.days(), &slots)?;
    Ok(grid.to_projected())
}

impl SessionSource for Timetable {
    fn fetch_sessions(&self, level: u32, group_num: u32) -> PersistenceResult<Vec<Session>> {
        Ok(self.sessions_for(level, group_num))
    }

    fn fetch_courses(&self) -> PersistenceResult<Vec<Course>> {
        Ok(self.catalog.courses().to_vec())
    }

    fn fetch_sections(&self) -> PersistenceResult<Vec<Section>> {
        Ok(self.catalog.sections().to_vec())
    }

    fn insert_sessions(
        &mut self,
        schedule_id: i64,
        sessions: &[Session],
    ) -> PersistenceResult<()> {
        self.insert_schedule_sessions(schedule_id, sessions)?;
        Ok(())
    }
}

/// Fetches a cohort's sessions from any source and projects them onto the calendar.
pub fn render_group_grid<S: SessionSource + ?Sized>(
    source: &S,
    calendar: &WeekCalendar,
    level: u32,
    group_num: u32,
) -> PersistenceResult<ProjectedGrid> {
    let sessions = source.fetch_sessions(level, group_num)?;
    Ok(project_sessions(calendar, &sessions)?)
}

/// Runs the allocator over a source's catalog and writes the result back to it.
pub fn generate_schedule<S: SessionSource + ?Sized>(
    source: &mut S,
    calendar: &WeekCalendar,
    schedule_id: i64,
) -> PersistenceResult<Vec<Session>> {
    let courses = source.fetch_courses()?;
    let sections = source.fetch_sections()?;
    let slots = calendar.rendering_slots();
    let generated = GreedyAllocator::new(&courses, &sections).execute(calendar.days(), &slots);
    source.insert_sessions(schedule_id, &generated)?;
    Ok(generated)
}
