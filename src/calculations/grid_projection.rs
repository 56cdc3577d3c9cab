use crate::error::ScheduleResult;
use crate::session::Session;
use crate::timeslot::{Day, TimeSlot};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Sessions lasting at least this long occupy two grid rows.
pub const DOUBLE_ROW_MINUTES: u16 = 100;

/// Outcome of projecting the session list onto one (day, slot) cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridCell<'a> {
    /// The session starts in this cell and is drawn here.
    Anchor { session: &'a Session, row_span: u8 },
    /// An anchor above already spans this cell; emit nothing.
    Covered,
    Empty,
}

impl<'a> GridCell<'a> {
    pub fn render(&self) -> bool {
        !matches!(self, GridCell::Covered)
    }

    pub fn row_span(&self) -> u8 {
        match self {
            GridCell::Anchor { row_span, .. } => *row_span,
            GridCell::Covered => 0,
            GridCell::Empty => 1,
        }
    }

    pub fn entry(&self) -> Option<&'a Session> {
        match self {
            GridCell::Anchor { session, .. } => Some(*session),
            _ => None,
        }
    }

    pub fn to_projected(&self) -> ProjectedCell {
        ProjectedCell {
            render: self.render(),
            row_span: self.row_span(),
            entry: self.entry().cloned(),
        }
    }
}

/// Owned, serializable form of a [`GridCell`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectedCell {
    pub render: bool,
    pub row_span: u8,
    pub entry: Option<Session>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridRow<'a> {
    pub slot: TimeSlot,
    pub cells: Vec<(Day, GridCell<'a>)>,
}

/// Full weekly grid in slot-major, then day, order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeekGrid<'a> {
    pub days: Vec<Day>,
    pub rows: Vec<GridRow<'a>>,
}

impl<'a> WeekGrid<'a> {
    pub fn cell(&self, day: Day, slot: &TimeSlot) -> Option<&GridCell<'a>> {
        self.rows
            .iter()
            .find(|row| row.slot == *slot)
            .and_then(|row| row.cells.iter().find(|(d, _)| *d == day))
            .map(|(_, cell)| cell)
    }

    /// Cells a table renderer must emit, skipping the ones covered by a row span.
    pub fn rendered_cells(&self) -> impl Iterator<Item = (&TimeSlot, Day, &GridCell<'a>)> {
        self.rows.iter().flat_map(|row| {
            row.cells
                .iter()
                .filter(|(_, cell)| cell.render())
                .map(move |(day, cell)| (&row.slot, *day, cell))
        })
    }

    pub fn anchored_sessions(&self) -> usize {
        self.rendered_cells()
            .filter(|(_, _, cell)| cell.entry().is_some())
            .count()
    }

    pub fn to_projected(&self) -> ProjectedGrid {
        ProjectedGrid {
            days: self.days.clone(),
            rows: self
                .rows
                .iter()
                .map(|row| ProjectedRow {
                    slot: row.slot,
                    cells: row.cells.iter().map(|(_, cell)| cell.to_projected()).collect(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectedRow {
    pub slot: TimeSlot,
    pub cells: Vec<ProjectedCell>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectedGrid {
    pub days: Vec<Day>,
    pub rows: Vec<ProjectedRow>,
}

pub struct GridProjector<'a> {
    sessions: &'a [Session],
}

impl<'a> GridProjector<'a> {
    pub fn new(sessions: &'a [Session]) -> Self {
        Self { sessions }
    }

    /// Decides what to draw at (`day`, `canonical_slot`).
    ///
    /// Only the start of `canonical_slot` is compared. Every session on `day`
    /// has its time slot parsed up front, so a malformed entry fails the cell
    /// instead of silently disappearing. Sessions are scanned in input order
    /// and the first anchor or interior overlap wins.
    pub fn project(&self, day: Day, canonical_slot: &TimeSlot) -> ScheduleResult<GridCell<'a>> {
        let candidates = self
            .sessions
            .iter()
            .filter(|session| session.day == day)
            .map(|session| session.parsed_slot().map(|slot| (session, slot)))
            .collect::<ScheduleResult<Vec<_>>>()?;

        let current_start = canonical_slot.start_minutes();
        for (idx, &(session, slot)) in candidates.iter().enumerate() {
            if slot.start_minutes() == current_start {
                Self::warn_on_shared_anchor(session, &candidates[idx + 1..], current_start);
                let row_span = if slot.duration_minutes() >= DOUBLE_ROW_MINUTES {
                    2
                } else {
                    1
                };
                return Ok(GridCell::Anchor { session, row_span });
            }
            if slot.covers_interior(current_start) {
                return Ok(GridCell::Covered);
            }
        }
        Ok(GridCell::Empty)
    }

    /// Projects every (slot, day) cell of the week.
    pub fn project_week(&self, days: &[Day], slots: &[TimeSlot]) -> ScheduleResult<WeekGrid<'a>> {
        let mut rows = Vec::with_capacity(slots.len());
        for slot in slots {
            let mut cells = Vec::with_capacity(days.len());
            for day in days {
                cells.push((*day, self.project(*day, slot)?));
            }
            rows.push(GridRow { slot: *slot, cells });
        }
        let grid = WeekGrid {
            days: days.to_vec(),
            rows,
        };
        debug!(
            sessions = self.sessions.len(),
            anchored = grid.anchored_sessions(),
            "projected weekly grid"
        );
        Ok(grid)
    }

    fn warn_on_shared_anchor(anchor: &Session, rest: &[(&Session, TimeSlot)], start: u16) {
        for (other, slot) in rest {
            if slot.start_minutes() == start {
                warn!(
                    day = %anchor.day,
                    kept = %anchor.course_code,
                    shadowed = %other.course_code,
                    "two sessions start in the same grid cell; keeping the first"
                );
            }
        }
    }
}

/// Projects a single cell; see [`GridProjector::project`].
pub fn project<'a>(
    sessions: &'a [Session],
    day: Day,
    canonical_slot: &TimeSlot,
) -> ScheduleResult<GridCell<'a>> {
    GridProjector::new(sessions).project(day, canonical_slot)
}

/// Projects many cohorts at once. Each entry is an independent session list.
pub fn project_groups<'a, K>(
    groups: &'a [(K, Vec<Session>)],
    days: &[Day],
    slots: &[TimeSlot],
) -> Vec<(&'a K, ScheduleResult<WeekGrid<'a>>)>
where
    K: Sync,
{
    groups
        .par_iter()
        .map(|(key, sessions)| (key, GridProjector::new(sessions).project_week(days, slots)))
        .collect()
}
