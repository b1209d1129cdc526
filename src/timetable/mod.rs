pub mod types;
pub mod slots;
pub mod grid;

pub use types::{Day, Grid, Session, SlotConfig, Unplaced};
pub use slots::default_slots;
pub use grid::build_grid;

use crate::parser::{parse_sessions, RejectedSession, TimetableEnvelope};

/// A built grid together with what the API sent that could not be used
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timetable {
    pub grid: Grid,
    pub rejected: Vec<RejectedSession>,
    pub source: Option<String>,
}

impl Timetable {
    pub fn from_envelope(envelope: &TimetableEnvelope, slots: &SlotConfig) -> Self {
        let parsed = parse_sessions(&envelope.data);
        Timetable {
            grid: build_grid(&parsed.sessions, slots),
            rejected: parsed.rejected,
            source: envelope.source.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::decode_envelope;
    use crate::timetable::types::Occupancy;

    #[test]
    fn envelope_to_grid() {
        let envelope = decode_envelope(
            r#"{"source":"cache","data":[
                {"course_id":"CD252IA","title":"DBMS","day_of_week":"Monday",
                 "start_time":"09:00:00","end_time":"10:00:00","room_number":"PG-101"},
                {"course_id":"CS354TA","title":"TOC","day_of_week":"Funday",
                 "start_time":"09:00:00","end_time":"10:00:00","room_number":"PG-102"}
            ]}"#,
        )
        .unwrap();

        let timetable = Timetable::from_envelope(&envelope, &default_slots());
        assert_eq!(timetable.source.as_deref(), Some("cache"));
        assert_eq!(timetable.rejected.len(), 1);
        assert_eq!(timetable.rejected[0].course_id, "CS354TA");

        match timetable.grid.get(Day::Monday, "09:00") {
            Some(Occupancy::Cell { session, span }) => {
                assert_eq!(session.course_id, "CD252IA");
                assert_eq!(*span, 1);
            }
            other => panic!("expected CD252IA at Monday 09:00, got {other:?}"),
        }
    }

    #[test]
    fn zero_length_session_is_placed_from_envelope() {
        let envelope = decode_envelope(
            r#"{"data":[
                {"course_id":"CD252IA","title":"DBMS","day_of_week":"Monday",
                 "start_time":"09:00:00","end_time":"09:00:00","room_number":"PG-101"}
            ]}"#,
        )
        .unwrap();

        let timetable = Timetable::from_envelope(&envelope, &default_slots());
        assert!(timetable.rejected.is_empty());
        assert_eq!(timetable.grid.placed_count(), 1);
        assert_eq!(
            timetable.grid.get(Day::Monday, "09:00").map(Occupancy::span),
            Some(1)
        );
    }
}
