use serde::{Deserialize, Serialize};

/// A course offered in the catalog. Read, never modified, by the allocator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub course_code: String,
    pub course_name: String,
    /// Weekly lecture hours required by the course.
    #[serde(default)]
    pub lecture_hours: u8,
    #[serde(default)]
    pub tutorial_hours: u8,
    #[serde(default)]
    pub lab_hours: u8,
    #[serde(default)]
    pub is_elective: bool,
    /// Student level the course is normally taken at, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
}

impl Course {
    pub fn new(course_code: impl Into<String>, course_name: impl Into<String>) -> Self {
        Self {
            course_code: course_code.into(),
            course_name: course_name.into(),
            lecture_hours: 0,
            tutorial_hours: 0,
            lab_hours: 0,
            is_elective: false,
            level: None,
        }
    }

    pub fn is_required(&self) -> bool {
        !self.is_elective
    }
}

/// A teaching section with its seat capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub section_num: u32,
    #[serde(default)]
    pub capacity: u32,
}

impl Section {
    pub fn new(section_num: u32, capacity: u32) -> Self {
        Self {
            section_num,
            capacity,
        }
    }
}

/// Ordered course and section lists. Insertion order is preserved because
/// schedule generation walks both lists in order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    courses: Vec<Course>,
    #[serde(default)]
    sections: Vec<Section>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn courses(&self) -> &[Course] {
        &self.courses
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn find_course(&self, course_code: &str) -> Option<&Course> {
        self.courses.iter().find(|c| c.course_code == course_code)
    }

    /// Replaces a course with the same code in place, or appends it.
    pub fn upsert_course(&mut self, course: Course) {
        match self
            .courses
            .iter_mut()
            .find(|c| c.course_code == course.course_code)
        {
            Some(existing) => *existing = course,
            None => self.courses.push(course),
        }
    }

    pub fn remove_course(&mut self, course_code: &str) -> Option<Course> {
        let idx = self
            .courses
            .iter()
            .position(|c| c.course_code == course_code)?;
        Some(self.courses.remove(idx))
    }

    pub fn upsert_section(&mut self, section: Section) {
        match self
            .sections
            .iter_mut()
            .find(|s| s.section_num == section.section_num)
        {
            Some(existing) => *existing = section,
            None => self.sections.push(section),
        }
    }

    pub fn remove_section(&mut self, section_num: u32) -> Option<Section> {
        let idx = self
            .sections
            .iter()
            .position(|s| s.section_num == section_num)?;
        Some(self.sections.remove(idx))
    }
}
