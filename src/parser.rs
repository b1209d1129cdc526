use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

use crate::error::SessionRejection;
use crate::timetable::slots::parse_time_of_day;
use crate::timetable::{Day, Session};

/// One row of `GET /student/timetable` as the API sends it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireSession {
    pub course_id: String,
    pub title: String,
    #[serde(default)]
    pub section_name: Option<String>,
    pub day_of_week: String,
    pub start_time: String,
    pub end_time: String,
    pub room_number: String,
}

/// Response body of the timetable endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimetableEnvelope {
    /// "cache" or "database"
    #[serde(default)]
    pub source: Option<String>,
    /// Required; an explicit `null` means the student has no sessions
    #[serde(deserialize_with = "null_as_empty")]
    pub data: Vec<WireSession>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<WireSession>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<WireSession>>::deserialize(deserializer)?.unwrap_or_default())
}

/// A wire session that failed validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedSession {
    pub course_id: String,
    pub reason: SessionRejection,
}

/// Validated sessions plus the ones that were dropped
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedSessions {
    pub sessions: Vec<Session>,
    pub rejected: Vec<RejectedSession>,
}

impl WireSession {
    /// Checks day name and times and converts to a [`Session`]
    pub fn to_session(&self) -> Result<Session, SessionRejection> {
        let day: Day = self
            .day_of_week
            .parse()
            .map_err(|_| SessionRejection::UnknownDay(self.day_of_week.clone()))?;
        let start = parse_time_of_day(&self.start_time)
            .ok_or_else(|| SessionRejection::BadTime(self.start_time.clone()))?;
        let end = parse_time_of_day(&self.end_time)
            .ok_or_else(|| SessionRejection::BadTime(self.end_time.clone()))?;

        let section = self
            .section_name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        Ok(Session {
            day,
            start,
            end,
            course_id: self.course_id.trim().to_string(),
            room: self.room_number.trim().to_string(),
            title: self.title.trim().to_string(),
            section,
        })
    }
}

/// Decodes a response body, failing on any shape mismatch
pub fn decode_envelope(body: &str) -> Result<TimetableEnvelope, serde_json::Error> {
    serde_json::from_str(body)
}

/// Validates every wire session, keeping the good ones in input order
pub fn parse_sessions(wire: &[WireSession]) -> ParsedSessions {
    let mut parsed = ParsedSessions::default();

    for item in wire {
        match item.to_session() {
            Ok(session) => {
                if session.end <= session.start {
                    warn!(
                        course = %item.course_id,
                        start = %item.start_time,
                        end = %item.end_time,
                        "session does not end after it starts"
                    );
                }
                parsed.sessions.push(session);
            }
            Err(reason) => {
                warn!(course = %item.course_id, %reason, "dropping session");
                parsed.rejected.push(RejectedSession {
                    course_id: item.course_id.clone(),
                    reason,
                });
            }
        }
    }

    parsed
}

/// Loads a saved timetable response from disk
pub fn load_envelope<P: AsRef<Path>>(path: P) -> Result<TimetableEnvelope, Box<dyn std::error::Error>> {
    let body = std::fs::read_to_string(path)?;
    Ok(decode_envelope(&body)?)
}
