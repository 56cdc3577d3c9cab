use crate::error::{ScheduleError, ScheduleResult};
use crate::session::Session;
use crate::timeslot::TimeSlot;
use serde::Serialize;
use std::collections::HashSet;

/// Two sessions of one cohort that occupy overlapping time on the same day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionConflict {
    pub level: Option<u32>,
    pub group_num: Option<u32>,
    pub first: Session,
    pub second: Session,
}

pub fn validate_session(session: &Session) -> ScheduleResult<()> {
    if session.course_code.trim().is_empty() {
        return Err(ScheduleError::invalid_session(format!(
            "session on {} at {} requires a non-empty course_code",
            session.day, session.time_slot
        )));
    }

    session.parsed_slot()?;

    if session.section_num == 0 {
        return Err(ScheduleError::invalid_session(format!(
            "session {} on {} at {} has section number 0",
            session.course_code, session.day, session.time_slot
        )));
    }

    Ok(())
}

pub fn validate_session_collection(sessions: &[Session]) -> ScheduleResult<()> {
    let mut seen_ids = HashSet::with_capacity(sessions.len());
    for session in sessions {
        if let Some(id) = session.id {
            if !seen_ids.insert(id) {
                return Err(ScheduleError::Conflict {
                    message: format!("duplicate session id {id}"),
                });
            }
        }
        validate_session(session)?;
    }
    Ok(())
}

/// Reports overlapping sessions per (level, group, day).
///
/// Repeats of the same activity (same course, section and activity type) are
/// not conflicts. Sessions with malformed time slots are skipped here;
/// [`validate_session`] is where they are rejected.
pub fn find_conflicts(sessions: &[Session]) -> Vec<SessionConflict> {
    let parsed: Vec<(&Session, TimeSlot)> = sessions
        .iter()
        .filter_map(|session| session.parsed_slot().ok().map(|slot| (session, slot)))
        .collect();

    let mut conflicts = Vec::new();
    for (i, (a, slot_a)) in parsed.iter().enumerate() {
        for (b, slot_b) in &parsed[i + 1..] {
            if a.day != b.day || a.level != b.level || a.group_num != b.group_num {
                continue;
            }
            if a.same_activity(b) || !slot_a.overlaps(slot_b) {
                continue;
            }
            conflicts.push(SessionConflict {
                level: a.level,
                group_num: a.group_num,
                first: (*a).clone(),
                second: (*b).clone(),
            });
        }
    }
    conflicts
}
