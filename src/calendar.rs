use crate::error::{ScheduleError, ScheduleResult};
use crate::timeslot::{Day, TimeSlot};
use serde::{Deserialize, Serialize};

/// Canonical grid axes: teaching days as columns, time slots as rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeekCalendar {
    days: Vec<Day>,
    slots: Vec<TimeSlot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekCalendarConfig {
    days: Vec<Day>,
    slots: Vec<String>,
}

impl Default for WeekCalendar {
    fn default() -> Self {
        let mut slots: Vec<TimeSlot> = (8u16..=15)
            .filter_map(|hour| TimeSlot::new(hour * 60, hour * 60 + 50).ok())
            .collect();
        // Double blocks used by labs and back-to-back lectures.
        slots.extend(TimeSlot::new(8 * 60, 9 * 60 + 50));
        slots.extend(TimeSlot::new(10 * 60, 11 * 60 + 50));
        Self {
            days: Day::ALL.to_vec(),
            slots,
        }
    }
}

impl WeekCalendar {
    /// Slot length shown on the rendered grid.
    pub const RENDER_SLOT_MINUTES: u16 = 50;
    pub const FIRST_RENDER_START: u16 = 8 * 60;
    pub const LAST_RENDER_START: u16 = 14 * 60;

    pub fn new<I, J>(days: I, slots: J) -> ScheduleResult<Self>
    where
        I: IntoIterator<Item = Day>,
        J: IntoIterator<Item = TimeSlot>,
    {
        let mut unique_days: Vec<Day> = Vec::new();
        for day in days {
            if !unique_days.contains(&day) {
                unique_days.push(day);
            }
        }
        let mut unique_slots: Vec<TimeSlot> = Vec::new();
        for slot in slots {
            if !unique_slots.contains(&slot) {
                unique_slots.push(slot);
            }
        }
        if unique_days.is_empty() {
            return Err(ScheduleError::InvalidCalendar {
                message: "calendar requires at least one day".into(),
            });
        }
        if unique_slots.is_empty() {
            return Err(ScheduleError::InvalidCalendar {
                message: "calendar requires at least one time slot".into(),
            });
        }
        Ok(Self {
            days: unique_days,
            slots: unique_slots,
        })
    }

    pub fn from_config(config: &WeekCalendarConfig) -> ScheduleResult<Self> {
        let slots = config
            .slots
            .iter()
            .map(|raw| TimeSlot::parse(raw))
            .collect::<ScheduleResult<Vec<_>>>()?;
        Self::new(config.days.iter().copied(), slots)
    }

    pub fn to_config(&self) -> WeekCalendarConfig {
        WeekCalendarConfig::from(self)
    }

    pub fn days(&self) -> &[Day] {
        &self.days
    }

    pub fn slots(&self) -> &[TimeSlot] {
        &self.slots
    }

    /// Rows shown on the weekly grid: 50-minute slots starting between 08:00 and 14:00.
    pub fn rendering_slots(&self) -> Vec<TimeSlot> {
        self.slots
            .iter()
            .copied()
            .filter(|slot| Self::is_rendered(slot))
            .collect()
    }

    pub fn is_rendered(slot: &TimeSlot) -> bool {
        slot.duration_minutes() == Self::RENDER_SLOT_MINUTES
            && (Self::FIRST_RENDER_START..=Self::LAST_RENDER_START)
                .contains(&slot.start_minutes())
    }
}

impl WeekCalendarConfig {
    pub fn new<I, J, S>(days: I, slots: J) -> Self
    where
        I: IntoIterator<Item = Day>,
        J: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            days: days.into_iter().collect(),
            slots: slots.into_iter().map(Into::into).collect(),
        }
    }

    pub fn days(&self) -> &[Day] {
        &self.days
    }

    pub fn slots(&self) -> &[String] {
        &self.slots
    }
}

impl Default for WeekCalendarConfig {
    fn default() -> Self {
        WeekCalendarConfig::from(&WeekCalendar::default())
    }
}

impl From<&WeekCalendar> for WeekCalendarConfig {
    fn from(calendar: &WeekCalendar) -> Self {
        Self {
            days: calendar.days.clone(),
            slots: calendar.slots.iter().map(ToString::to_string).collect(),
        }
    }
}
