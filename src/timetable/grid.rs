use std::collections::BTreeMap;

use tracing::{debug, warn};

use super::slots::truncate_to_minute;
use super::types::{Day, Grid, Occupancy, Session, SlotConfig, Unplaced, UnplacedReason};

/// A visible cell of a rendered row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowCell<'a> {
    pub slot_index: usize,
    pub span: usize,
    pub session: Option<&'a Session>,
}

/// One day of the grid with absorbed slots left out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridRow<'a> {
    pub day: Day,
    pub cells: Vec<RowCell<'a>>,
}

/// Builds the Monday to Friday grid
pub fn build_grid(sessions: &[Session], slots: &SlotConfig) -> Grid {
    build_grid_for_days(sessions, slots, &Day::WEEK)
}

/// Lays `sessions` out on a `days` by `slots` grid.
///
/// Each session is assigned to the slot whose boundary equals its start time
/// and then extended over every following slot that starts before it ends.
/// Sessions that end up without a visible cell are listed in
/// [`Grid::unplaced`].
pub fn build_grid_for_days(sessions: &[Session], slots: &SlotConfig, days: &[Day]) -> Grid {
    let slot_count = slots.len();
    let mut assigned: BTreeMap<Day, Vec<Option<Session>>> = days
        .iter()
        .map(|day| (*day, vec![None; slot_count]))
        .collect();
    let mut unplaced = Vec::new();

    for session in sessions {
        let Some(row) = assigned.get_mut(&session.day) else {
            debug!(course = %session.course_id, day = %session.day, "day not displayed");
            unplaced.push(Unplaced {
                session: session.clone(),
                reason: UnplacedReason::DayNotShown,
            });
            continue;
        };

        let Some(index) = slots.position(session.start) else {
            warn!(
                course = %session.course_id,
                day = %session.day,
                start = %session.start,
                "session start matches no slot boundary"
            );
            unplaced.push(Unplaced {
                session: session.clone(),
                reason: UnplacedReason::NoMatchingSlot,
            });
            continue;
        };

        if let Some(previous) = row[index].replace(session.clone()) {
            warn!(
                kept = %session.course_id,
                dropped = %previous.course_id,
                day = %session.day,
                "two sessions start in the same slot"
            );
            unplaced.push(Unplaced {
                session: previous,
                reason: UnplacedReason::Displaced,
            });
        }
    }

    let mut cells = BTreeMap::new();
    for (day, mut row) in assigned {
        let mut layout = vec![Occupancy::Empty; slot_count];
        let mut index = 0;
        while index < slot_count {
            let Some(session) = row[index].take() else {
                index += 1;
                continue;
            };

            let span = span_from(&session, slots, index);
            for absorbed in index + 1..index + span {
                if let Some(hidden) = row[absorbed].take() {
                    warn!(
                        hidden = %hidden.course_id,
                        by = %session.course_id,
                        day = %day,
                        "session hidden under a longer session"
                    );
                    unplaced.push(Unplaced {
                        session: hidden,
                        reason: UnplacedReason::Overlapped,
                    });
                }
                layout[absorbed] = Occupancy::Absorbed { by: index };
            }
            layout[index] = Occupancy::Cell { session, span };
            index += span;
        }
        cells.insert(day, layout);
    }

    Grid {
        slots: slots.clone(),
        days: days.to_vec(),
        cells,
        unplaced,
    }
}

/// Slots covered by a session starting at slot `index`: its own plus every
/// following one that begins before the session ends.
fn span_from(session: &Session, slots: &SlotConfig, index: usize) -> usize {
    let end = truncate_to_minute(session.end);
    1 + slots
        .iter()
        .skip(index + 1)
        .take_while(|slot| slot.start < end)
        .count()
}

impl Grid {
    /// Rows in display order, each holding only the cells that render
    pub fn rows(&self) -> Vec<GridRow<'_>> {
        self.days
            .iter()
            .filter_map(|day| {
                let row = self.cells.get(day)?;
                let cells = row
                    .iter()
                    .enumerate()
                    .filter_map(|(slot_index, occupancy)| match occupancy {
                        Occupancy::Absorbed { .. } => None,
                        Occupancy::Empty => Some(RowCell {
                            slot_index,
                            span: 1,
                            session: None,
                        }),
                        Occupancy::Cell { session, span } => Some(RowCell {
                            slot_index,
                            span: *span,
                            session: Some(session),
                        }),
                    })
                    .collect();
                Some(GridRow { day: *day, cells })
            })
            .collect()
    }
}
