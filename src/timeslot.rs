use crate::error::{ScheduleError, ScheduleResult};
use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Teaching days of the week, in grid column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Day {
    Sunday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
}

impl Day {
    pub const ALL: [Day; 5] = [
        Day::Sunday,
        Day::Monday,
        Day::Tuesday,
        Day::Wednesday,
        Day::Thursday,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Day::Sunday => "Sunday",
            Day::Monday => "Monday",
            Day::Tuesday => "Tuesday",
            Day::Wednesday => "Wednesday",
            Day::Thursday => "Thursday",
        }
    }

    /// Position of the day on the canonical axis.
    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Day {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sunday" | "sun" => Ok(Day::Sunday),
            "monday" | "mon" => Ok(Day::Monday),
            "tuesday" | "tue" => Ok(Day::Tuesday),
            "wednesday" | "wed" => Ok(Day::Wednesday),
            "thursday" | "thu" => Ok(Day::Thursday),
            _ => Err(ScheduleError::UnknownDay {
                value: s.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for Day {
    type Error = ScheduleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Day> for String {
    fn from(day: Day) -> Self {
        day.as_str().to_string()
    }
}

impl From<Day> for Weekday {
    fn from(day: Day) -> Self {
        match day {
            Day::Sunday => Weekday::Sun,
            Day::Monday => Weekday::Mon,
            Day::Tuesday => Weekday::Tue,
            Day::Wednesday => Weekday::Wed,
            Day::Thursday => Weekday::Thu,
        }
    }
}

/// Half-open interval `[start, end)` in minutes since midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeSlot {
    start: u16,
    end: u16,
}

impl TimeSlot {
    pub fn new(start_minutes: u16, end_minutes: u16) -> ScheduleResult<Self> {
        if end_minutes <= start_minutes || end_minutes > 24 * 60 {
            return Err(ScheduleError::malformed_slot(format!(
                "{}-{}",
                format_clock(start_minutes),
                format_clock(end_minutes)
            )));
        }
        Ok(Self {
            start: start_minutes,
            end: end_minutes,
        })
    }

    /// Parses `H:MM-H:MM` or `HH:MM-HH:MM`.
    pub fn parse(value: &str) -> ScheduleResult<Self> {
        let malformed = || ScheduleError::malformed_slot(value);
        let (start_s, end_s) = value.split_once('-').ok_or_else(malformed)?;
        let start = parse_clock(start_s.trim()).ok_or_else(malformed)?;
        let end = parse_clock(end_s.trim()).ok_or_else(malformed)?;
        if end <= start {
            return Err(malformed());
        }
        Ok(Self { start, end })
    }

    pub fn start_minutes(&self) -> u16 {
        self.start
    }

    pub fn end_minutes(&self) -> u16 {
        self.end
    }

    pub fn duration_minutes(&self) -> u16 {
        self.end - self.start
    }

    pub fn overlaps(&self, other: &TimeSlot) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// True when `minute` falls strictly inside the interval, excluding its start.
    pub fn covers_interior(&self, minute: u16) -> bool {
        self.start < minute && minute < self.end
    }
}

fn parse_clock(s: &str) -> Option<u16> {
    let (hours_s, minutes_s) = s.split_once(':')?;
    if hours_s.is_empty() || hours_s.len() > 2 || minutes_s.len() != 2 {
        return None;
    }
    if !hours_s.bytes().chain(minutes_s.bytes()).all(|b| b.is_ascii_digit()) {
        return None;
    }
    let hours: u16 = hours_s.parse().ok()?;
    let minutes: u16 = minutes_s.parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    Some(hours * 60 + minutes)
}

fn format_clock(minutes: u16) -> String {
    format!("{}:{:02}", minutes / 60, minutes % 60)
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", format_clock(self.start), format_clock(self.end))
    }
}

impl FromStr for TimeSlot {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TimeSlot::parse(s)
    }
}

impl TryFrom<String> for TimeSlot {
    type Error = ScheduleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        TimeSlot::parse(&value)
    }
}

impl From<TimeSlot> for String {
    fn from(slot: TimeSlot) -> Self {
        slot.to_string()
    }
}
