use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use super::slots::{format_label, parse_time_of_day, same_minute, slot_key};
use crate::error::ConfigError;

/// Teaching day shown as one row of the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Day {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
}

impl Day {
    pub const WEEK: [Day; 5] = [
        Day::Monday,
        Day::Tuesday,
        Day::Wednesday,
        Day::Thursday,
        Day::Friday,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Day::Monday => "Monday",
            Day::Tuesday => "Tuesday",
            Day::Wednesday => "Wednesday",
            Day::Thursday => "Thursday",
            Day::Friday => "Friday",
        }
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Day {
    type Err = ();

    /// Accepts full English day names, ignoring case and surrounding whitespace
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Day::WEEK
            .into_iter()
            .find(|day| day.name().eq_ignore_ascii_case(trimmed))
            .ok_or(())
    }
}

/// One fixed column of the grid
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotDefinition {
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub label: String,
}

impl SlotDefinition {
    /// "HH:MM" key sessions are matched against
    pub fn key(&self) -> String {
        slot_key(self.start)
    }
}

/// Ordered slot boundaries of a teaching day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotConfig {
    slots: Vec<SlotDefinition>,
}

impl SlotConfig {
    /// Builds slots from their start boundaries; each slot ends where the next
    /// one starts and the last one ends at `day_end`.
    pub fn from_boundaries<S: AsRef<str>>(boundaries: &[S], day_end: &str) -> Result<Self, ConfigError> {
        let mut starts = Vec::with_capacity(boundaries.len());
        for raw in boundaries {
            let raw = raw.as_ref();
            starts.push(parse_time_of_day(raw).ok_or_else(|| ConfigError::BadSlotTime(raw.to_string()))?);
        }
        let end = parse_time_of_day(day_end).ok_or_else(|| ConfigError::BadSlotTime(day_end.to_string()))?;

        if starts.is_empty() {
            return Err(ConfigError::SlotOrder);
        }

        let mut ends: Vec<NaiveTime> = starts.iter().skip(1).copied().collect();
        ends.push(end);

        let slots: Vec<SlotDefinition> = starts
            .into_iter()
            .zip(ends)
            .map(|(start, end)| SlotDefinition {
                start,
                end,
                label: format_label(start, end),
            })
            .collect();

        if slots.iter().any(|slot| slot.start >= slot.end) {
            return Err(ConfigError::SlotOrder);
        }

        Ok(SlotConfig { slots })
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SlotDefinition> {
        self.slots.iter()
    }

    pub fn get(&self, index: usize) -> Option<&SlotDefinition> {
        self.slots.get(index)
    }

    /// Index of the slot starting at `time`, compared at minute precision
    pub fn position(&self, time: NaiveTime) -> Option<usize> {
        self.slots.iter().position(|slot| same_minute(slot.start, time))
    }

    /// Display range covered by `span` slots starting at `index`
    pub fn span_label(&self, index: usize, span: usize) -> String {
        let last = (index + span.max(1) - 1).min(self.slots.len().saturating_sub(1));
        match (self.slots.get(index), self.slots.get(last)) {
            (Some(first), Some(last)) => format_label(first.start, last.end),
            _ => String::new(),
        }
    }
}

/// One scheduled class or lab occurrence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub day: Day,
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub course_id: String,
    pub room: String,
    pub title: String,
    pub section: Option<String>,
}

/// What a (day, slot) position holds after layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Occupancy {
    Empty,
    Cell { session: Session, span: usize },
    /// Merged into the cell at slot index `by`
    Absorbed { by: usize },
}

impl Occupancy {
    pub fn session(&self) -> Option<&Session> {
        match self {
            Occupancy::Cell { session, .. } => Some(session),
            _ => None,
        }
    }

    pub fn span(&self) -> usize {
        match self {
            Occupancy::Cell { span, .. } => *span,
            Occupancy::Empty => 1,
            Occupancy::Absorbed { .. } => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnplacedReason {
    /// Start time is not one of the slot boundaries
    NoMatchingSlot,
    /// Day is not part of the displayed week
    DayNotShown,
    /// A later session took the same start slot
    Displaced,
    /// Start slot was absorbed by an earlier session's span
    Overlapped,
}

/// Session that produced no visible cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Unplaced {
    pub session: Session,
    pub reason: UnplacedReason,
}

/// Day by slot layout of a week
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    pub(super) slots: SlotConfig,
    pub(super) days: Vec<Day>,
    pub(super) cells: BTreeMap<Day, Vec<Occupancy>>,
    pub(super) unplaced: Vec<Unplaced>,
}

impl Grid {
    pub fn slots(&self) -> &SlotConfig {
        &self.slots
    }

    pub fn unplaced(&self) -> &[Unplaced] {
        &self.unplaced
    }

    /// Occupancy of every slot of `day`, or None if the day isn't displayed
    pub fn row(&self, day: Day) -> Option<&[Occupancy]> {
        self.cells.get(&day).map(Vec::as_slice)
    }

    /// Looks up a cell by its "HH:MM" slot key
    pub fn get(&self, day: Day, key: &str) -> Option<&Occupancy> {
        let time = parse_time_of_day(key)?;
        let index = self.slots.position(time)?;
        self.cells.get(&day)?.get(index)
    }

    /// Number of visible cells holding a session
    pub fn placed_count(&self) -> usize {
        self.cells
            .values()
            .flatten()
            .filter(|occupancy| occupancy.session().is_some())
            .count()
    }
}
