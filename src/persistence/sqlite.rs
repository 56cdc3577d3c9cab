use super::{PersistenceError, PersistenceResult, ScheduleStore, SessionSource};
use crate::calendar::{WeekCalendar, WeekCalendarConfig};
use crate::catalog::{Catalog, Course, Section};
use crate::error::ScheduleError;
use crate::session::{ActivityType, Session};
use crate::timeslot::Day;
use crate::timetable::{ScheduleRecord, Timetable};
use rusqlite::{Connection, OptionalExtension, Row, Transaction, params};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};
use tracing::info;

const SESSION_COLUMNS: &str = "id, schedule_id, day, time_slot, course_code, course_name, \
     section_num, activity_type, level, group_num, room, instructor";

pub struct SqliteScheduleStore {
    connection: Mutex<Connection>,
}

impl SqliteScheduleStore {
    pub fn new<P: AsRef<std::path::Path>>(path: P) -> PersistenceResult<Self> {
        let connection = Connection::open(path)?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    pub fn in_memory() -> PersistenceResult<Self> {
        let connection = Connection::open_in_memory()?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn initialize_schema(connection: &Connection) -> PersistenceResult<()> {
        let ddl = r#"
            PRAGMA foreign_keys = ON;
            CREATE TABLE IF NOT EXISTS calendar (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                calendar_json TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS courses (
                position INTEGER PRIMARY KEY,
                course_code TEXT NOT NULL UNIQUE,
                course_name TEXT NOT NULL,
                lecture_hours INTEGER NOT NULL DEFAULT 0,
                tutorial_hours INTEGER NOT NULL DEFAULT 0,
                lab_hours INTEGER NOT NULL DEFAULT 0,
                is_elective INTEGER NOT NULL DEFAULT 0,
                level INTEGER
            );
            CREATE TABLE IF NOT EXISTS sections (
                position INTEGER PRIMARY KEY,
                section_num INTEGER NOT NULL UNIQUE,
                capacity INTEGER NOT NULL DEFAULT 0
            );
            CREATE TABLE IF NOT EXISTS cohort_groups (
                level INTEGER NOT NULL,
                group_num INTEGER NOT NULL,
                PRIMARY KEY (level, group_num)
            );
            CREATE TABLE IF NOT EXISTS schedules (
                id INTEGER PRIMARY KEY,
                level INTEGER NOT NULL,
                group_num INTEGER NOT NULL,
                name TEXT NOT NULL DEFAULT '',
                published INTEGER NOT NULL DEFAULT 0,
                UNIQUE (level, group_num)
            );
            CREATE TABLE IF NOT EXISTS sessions (
                id INTEGER PRIMARY KEY,
                schedule_id INTEGER,
                day TEXT NOT NULL,
                time_slot TEXT NOT NULL,
                course_code TEXT NOT NULL,
                course_name TEXT NOT NULL,
                section_num INTEGER NOT NULL,
                activity_type TEXT,
                level INTEGER,
                group_num INTEGER,
                room TEXT,
                instructor TEXT
            );
        "#;
        connection.execute_batch(ddl)?;
        Ok(())
    }

    fn lock(&self) -> PersistenceResult<MutexGuard<'_, Connection>> {
        self.connection
            .lock()
            .map_err(|_| PersistenceError::InvalidData("sqlite connection mutex poisoned".into()))
    }

    pub fn save_course(&self, course: &Course) -> PersistenceResult<()> {
        let conn = self.lock()?;
        Self::upsert_course(&conn, course)?;
        Ok(())
    }

    pub fn save_section(&self, section: &Section) -> PersistenceResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO sections (section_num, capacity) VALUES (?1, ?2)
             ON CONFLICT(section_num) DO UPDATE SET capacity = excluded.capacity",
            params![section.section_num, section.capacity],
        )?;
        Ok(())
    }

    /// Creates the schedule row for a cohort and returns its id.
    ///
    /// A cohort has at most one schedule. Sessions already stored for the
    /// cohort without a schedule are filed under the new one.
    pub fn create_schedule(
        &self,
        level: u32,
        group_num: u32,
        name: &str,
    ) -> PersistenceResult<i64> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let existing: Option<i64> = tx
            .query_row(
                "SELECT id FROM schedules WHERE level = ?1 AND group_num = ?2",
                params![level, group_num],
                |row| row.get(0),
            )
            .optional()?;
        if let Some(existing) = existing {
            return Err(ScheduleError::Conflict {
                message: format!(
                    "schedule {existing} already exists for level {level} group {group_num}"
                ),
            }
            .into());
        }
        tx.execute(
            "INSERT OR IGNORE INTO cohort_groups (level, group_num) VALUES (?1, ?2)",
            params![level, group_num],
        )?;
        tx.execute(
            "INSERT INTO schedules (level, group_num, name, published) VALUES (?1, ?2, ?3, 0)",
            params![level, group_num, name],
        )?;
        let id = tx.last_insert_rowid();
        tx.execute(
            "UPDATE sessions SET schedule_id = ?1 \
             WHERE schedule_id IS NULL AND level = ?2 AND group_num = ?3",
            params![id, level, group_num],
        )?;
        tx.commit()?;
        Ok(id)
    }

    /// Removes a group with its schedules and sessions in one transaction.
    pub fn delete_group(&self, level: u32, group_num: u32) -> PersistenceResult<usize> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let removed = tx.execute(
            "DELETE FROM sessions WHERE level = ?1 AND group_num = ?2",
            params![level, group_num],
        )?;
        tx.execute(
            "DELETE FROM schedules WHERE level = ?1 AND group_num = ?2",
            params![level, group_num],
        )?;
        tx.execute(
            "DELETE FROM cohort_groups WHERE level = ?1 AND group_num = ?2",
            params![level, group_num],
        )?;
        tx.commit()?;
        Ok(removed)
    }

    pub fn delete_course_sessions(&self, course_code: &str) -> PersistenceResult<usize> {
        let conn = self.lock()?;
        Ok(conn.execute(
            "DELETE FROM sessions WHERE course_code = ?1",
            params![course_code],
        )?)
    }

    fn upsert_course(conn: &Connection, course: &Course) -> rusqlite::Result<usize> {
        conn.execute(
            "INSERT INTO courses (course_code, course_name, lecture_hours, tutorial_hours, \
             lab_hours, is_elective, level) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(course_code) DO UPDATE SET course_name = excluded.course_name, \
             lecture_hours = excluded.lecture_hours, tutorial_hours = excluded.tutorial_hours, \
             lab_hours = excluded.lab_hours, is_elective = excluded.is_elective, \
             level = excluded.level",
            params![
                course.course_code,
                course.course_name,
                course.lecture_hours,
                course.tutorial_hours,
                course.lab_hours,
                course.is_elective,
                course.level
            ],
        )
    }

    fn insert_session_row(tx: &Transaction, session: &Session) -> rusqlite::Result<usize> {
        tx.execute(
            "INSERT INTO sessions (id, schedule_id, day, time_slot, course_code, course_name, \
             section_num, activity_type, level, group_num, room, instructor) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                session.id,
                session.schedule_id,
                session.day.as_str(),
                session.time_slot,
                session.course_code,
                session.course_name,
                session.section_num,
                session.activity_type.map(|a| a.as_str()),
                session.level,
                session.group_num,
                session.room,
                session.instructor
            ],
        )
    }

    fn save_catalog(tx: &Transaction, catalog: &Catalog) -> PersistenceResult<()> {
        tx.execute("DELETE FROM courses", [])?;
        tx.execute("DELETE FROM sections", [])?;
        for course in catalog.courses() {
            Self::upsert_course(tx, course)?;
        }
        let mut stmt = tx.prepare("INSERT INTO sections (section_num, capacity) VALUES (?1, ?2)")?;
        for section in catalog.sections() {
            stmt.execute(params![section.section_num, section.capacity])?;
        }
        Ok(())
    }

    fn load_catalog(conn: &Connection) -> PersistenceResult<Catalog> {
        let mut catalog = Catalog::new();
        for course in Self::query_courses(conn)? {
            catalog.upsert_course(course);
        }
        for section in Self::query_sections(conn)? {
            catalog.upsert_section(section);
        }
        Ok(catalog)
    }

    fn query_courses(conn: &Connection) -> PersistenceResult<Vec<Course>> {
        let mut stmt = conn.prepare(
            "SELECT course_code, course_name, lecture_hours, tutorial_hours, lab_hours, \
             is_elective, level FROM courses ORDER BY position ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Course {
                course_code: row.get(0)?,
                course_name: row.get(1)?,
                lecture_hours: row.get(2)?,
                tutorial_hours: row.get(3)?,
                lab_hours: row.get(4)?,
                is_elective: row.get(5)?,
                level: row.get(6)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn query_sections(conn: &Connection) -> PersistenceResult<Vec<Section>> {
        let mut stmt =
            conn.prepare("SELECT section_num, capacity FROM sections ORDER BY position ASC")?;
        let rows = stmt.query_map([], |row| {
            Ok(Section {
                section_num: row.get(0)?,
                capacity: row.get(1)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn session_from_row(row: &Row<'_>) -> rusqlite::Result<(Session, String, Option<String>)> {
        let day: String = row.get(2)?;
        let activity: Option<String> = row.get(7)?;
        let session = Session {
            id: row.get(0)?,
            schedule_id: row.get(1)?,
            day: Day::Sunday,
            time_slot: row.get(3)?,
            course_code: row.get(4)?,
            course_name: row.get(5)?,
            section_num: row.get(6)?,
            activity_type: None,
            level: row.get(8)?,
            group_num: row.get(9)?,
            room: row.get(10)?,
            instructor: row.get(11)?,
        };
        Ok((session, day, activity))
    }

    /// Runs a session query and resolves the text-typed columns.
    fn query_sessions<P: rusqlite::Params>(
        conn: &Connection,
        filter: &str,
        params: P,
    ) -> PersistenceResult<Vec<Session>> {
        let sql = format!("SELECT {SESSION_COLUMNS} FROM sessions {filter} ORDER BY id ASC");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params, Self::session_from_row)?;
        let mut sessions = Vec::new();
        for row in rows {
            let (mut session, day, activity) = row?;
            session.day = day.parse()?;
            session.activity_type = activity
                .as_deref()
                .map(str::parse::<ActivityType>)
                .transpose()?;
            sessions.push(session);
        }
        Ok(sessions)
    }

    fn query_schedules(conn: &Connection) -> PersistenceResult<Vec<ScheduleRecord>> {
        let mut stmt = conn
            .prepare("SELECT id, level, group_num, name, published FROM schedules ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok(ScheduleRecord {
                id: row.get(0)?,
                level: row.get(1)?,
                group_num: row.get(2)?,
                name: row.get(3)?,
                published: row.get(4)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn query_groups(conn: &Connection) -> PersistenceResult<BTreeMap<u32, BTreeSet<u32>>> {
        let mut stmt = conn.prepare("SELECT level, group_num FROM cohort_groups")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, u32>(0)?, row.get::<_, u32>(1)?)))?;
        let mut groups: BTreeMap<u32, BTreeSet<u32>> = BTreeMap::new();
        for row in rows {
            let (level, group_num) = row?;
            groups.entry(level).or_default().insert(group_num);
        }
        Ok(groups)
    }
}

impl ScheduleStore for SqliteScheduleStore {
    fn save_timetable(&self, timetable: &Timetable) -> PersistenceResult<()> {
        super::validate_sessions(timetable.sessions())?;
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let calendar_json = serde_json::to_string(&timetable.calendar().to_config())?;
        tx.execute("DELETE FROM calendar", [])?;
        tx.execute(
            "INSERT INTO calendar (id, calendar_json) VALUES (1, ?1)",
            params![calendar_json],
        )?;

        Self::save_catalog(&tx, timetable.catalog())?;

        tx.execute("DELETE FROM cohort_groups", [])?;
        for (level, groups) in timetable.all_groups() {
            for group_num in groups {
                tx.execute(
                    "INSERT INTO cohort_groups (level, group_num) VALUES (?1, ?2)",
                    params![level, group_num],
                )?;
            }
        }

        tx.execute("DELETE FROM schedules", [])?;
        for record in timetable.schedules() {
            tx.execute(
                "INSERT INTO schedules (id, level, group_num, name, published) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    record.id,
                    record.level,
                    record.group_num,
                    record.name,
                    record.published
                ],
            )?;
        }

        tx.execute("DELETE FROM sessions", [])?;
        for session in timetable.sessions() {
            Self::insert_session_row(&tx, session)?;
        }

        tx.commit()?;
        info!(sessions = timetable.sessions().len(), "saved timetable to sqlite");
        Ok(())
    }

    fn load_timetable(&self) -> PersistenceResult<Option<Timetable>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare("SELECT calendar_json FROM calendar WHERE id = 1")?;
        let calendar_json: Option<String> = stmt.query_row([], |row| row.get(0)).optional()?;
        let Some(calendar_json) = calendar_json else {
            return Ok(None);
        };
        let config: WeekCalendarConfig = serde_json::from_str(&calendar_json)?;
        let calendar = WeekCalendar::from_config(&config)?;

        let catalog = Self::load_catalog(&conn)?;
        let schedules = Self::query_schedules(&conn)?;
        let groups = Self::query_groups(&conn)?;
        let sessions = Self::query_sessions(&conn, "", [])?;
        super::validate_sessions(&sessions)?;

        let timetable = Timetable::from_parts(calendar, catalog, schedules, groups, sessions)?;
        Ok(Some(timetable))
    }
}

impl SessionSource for SqliteScheduleStore {
    fn fetch_sessions(&self, level: u32, group_num: u32) -> PersistenceResult<Vec<Session>> {
        let conn = self.lock()?;
        Self::query_sessions(
            &conn,
            "WHERE level = ?1 AND group_num = ?2",
            params![level, group_num],
        )
    }

    fn fetch_courses(&self) -> PersistenceResult<Vec<Course>> {
        let conn = self.lock()?;
        Self::query_courses(&conn)
    }

    fn fetch_sections(&self) -> PersistenceResult<Vec<Section>> {
        let conn = self.lock()?;
        Self::query_sections(&conn)
    }

    fn insert_sessions(
        &mut self,
        schedule_id: i64,
        sessions: &[Session],
    ) -> PersistenceResult<()> {
        for session in sessions {
            crate::session_validation::validate_session(session)?;
        }
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let cohort: Option<(u32, u32)> = tx
            .query_row(
                "SELECT level, group_num FROM schedules WHERE id = ?1",
                params![schedule_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        let (level, group_num) = cohort.ok_or(ScheduleError::ScheduleNotFound { id: schedule_id })?;

        for session in sessions {
            let mut row = session.clone();
            row.id = None;
            row.schedule_id = Some(schedule_id);
            row.level = Some(level);
            row.group_num = Some(group_num);
            Self::insert_session_row(&tx, &row)?;
        }
        tx.commit()?;
        info!(schedule_id, inserted = sessions.len(), "inserted sessions");
        Ok(())
    }
}
