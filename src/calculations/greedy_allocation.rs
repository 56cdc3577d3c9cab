use crate::catalog::{Course, Section};
use crate::session::Session;
use crate::timeslot::{Day, TimeSlot};
use tracing::debug;

/// Round-robin filler behind "AI schedule generation".
///
/// Walks days (outer) and slots (inner), handing each cell the next course;
/// the section advances only after a full pass over the courses. Nothing is
/// checked: instructor availability, room capacity, weekly hour totals and
/// existing sessions are all ignored.
pub struct GreedyAllocator<'a> {
    courses: &'a [Course],
    sections: &'a [Section],
}

impl<'a> GreedyAllocator<'a> {
    pub fn new(courses: &'a [Course], sections: &'a [Section]) -> Self {
        Self { courses, sections }
    }

    pub fn execute(&self, days: &[Day], slots: &[TimeSlot]) -> Vec<Session> {
        let mut sessions = Vec::new();
        let mut course_idx = 0;
        let mut section_idx = 0;

        for day in days {
            for slot in slots {
                if course_idx >= self.courses.len() || section_idx >= self.sections.len() {
                    continue;
                }
                let course = &self.courses[course_idx];
                let section = &self.sections[section_idx];
                sessions.push(Session::new(
                    *day,
                    slot.to_string(),
                    course.course_code.clone(),
                    course.course_name.clone(),
                    section.section_num,
                ));

                course_idx += 1;
                if course_idx >= self.courses.len() {
                    course_idx = 0;
                    section_idx += 1;
                }
            }
        }

        debug!(
            courses = self.courses.len(),
            sections = self.sections.len(),
            cells = days.len() * slots.len(),
            emitted = sessions.len(),
            "greedy allocation finished"
        );
        sessions
    }
}

pub fn allocate(
    courses: &[Course],
    sections: &[Section],
    days: &[Day],
    slots: &[TimeSlot],
) -> Vec<Session> {
    GreedyAllocator::new(courses, sections).execute(days, slots)
}
