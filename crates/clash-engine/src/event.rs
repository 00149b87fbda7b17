//! Scheduled lectures and exams, and the candidate slots checked against them.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Which collection an event lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Lecture,
    Exam,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Lecture => f.write_str("lecture"),
            EventKind::Exam => f.write_str("exam"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExamCategory {
    #[serde(alias = "Mid")]
    Mid,
    #[serde(alias = "Final")]
    Final,
    #[serde(alias = "Practical")]
    Practical,
    #[serde(alias = "Assignment")]
    Assignment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExamStatus {
    #[serde(alias = "Proper")]
    Proper,
    #[serde(alias = "Repeat")]
    Repeat,
}

/// Opaque identifier, unique within one kind's collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct EventId(pub String);

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EventId {
    fn from(s: &str) -> Self {
        EventId(s.to_string())
    }
}

impl From<String> for EventId {
    fn from(s: String) -> Self {
        EventId(s)
    }
}

impl From<u64> for EventId {
    fn from(n: u64) -> Self {
        EventId(n.to_string())
    }
}

impl<'de> Deserialize<'de> for EventId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        wire::RawId::deserialize(deserializer).map(|raw| EventId(raw.into_string()))
    }
}

/// Identity of a stored event: the same `(kind, id)` is the same event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventRef {
    pub kind: EventKind,
    pub id: EventId,
}

impl EventRef {
    pub fn new(kind: EventKind, id: impl Into<EventId>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }
}

/// Kind-specific payload of a [`ScheduledEvent`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum EventDetail {
    Lecture,
    Exam {
        exam_category: ExamCategory,
        exam_status: ExamStatus,
    },
}

impl EventDetail {
    pub fn kind(&self) -> EventKind {
        match self {
            EventDetail::Lecture => EventKind::Lecture,
            EventDetail::Exam { .. } => EventKind::Exam,
        }
    }
}

/// A lecture or exam occupying a venue and a lecturer on one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledEvent {
    pub id: EventId,
    pub date: NaiveDate,
    #[serde(alias = "starttime", with = "wire::time")]
    pub start_time: NaiveTime,
    #[serde(alias = "endtime", with = "wire::time")]
    pub end_time: NaiveTime,
    #[serde(default, alias = "vid", with = "wire::opt_id")]
    pub venue_id: Option<String>,
    #[serde(default, alias = "lid", with = "wire::opt_id")]
    pub lecturer_id: Option<String>,
    #[serde(default, alias = "cid", with = "wire::opt_id")]
    pub course_id: Option<String>,
    #[serde(flatten)]
    pub detail: EventDetail,
}

impl ScheduledEvent {
    pub fn kind(&self) -> EventKind {
        self.detail.kind()
    }

    pub fn event_ref(&self) -> EventRef {
        EventRef {
            kind: self.kind(),
            id: self.id.clone(),
        }
    }

    pub fn start_at(&self) -> NaiveDateTime {
        self.date.and_time(self.start_time)
    }

    pub fn end_at(&self) -> NaiveDateTime {
        self.date.and_time(self.end_time)
    }

    pub fn venue(&self) -> Option<&str> {
        assigned(&self.venue_id)
    }

    pub fn lecturer(&self) -> Option<&str> {
        assigned(&self.lecturer_id)
    }
}

impl fmt::Display for ScheduledEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} #{} on {} {}-{}",
            self.kind(),
            self.id,
            self.date,
            self.start_time.format("%H:%M"),
            self.end_time.format("%H:%M"),
        )?;
        if let Some(course) = assigned(&self.course_id) {
            write!(f, " course {}", course)?;
        }
        if let Some(venue) = self.venue() {
            write!(f, " in {}", venue)?;
        }
        if let Some(lecturer) = self.lecturer() {
            write!(f, " by {}", lecturer)?;
        }
        Ok(())
    }
}

/// A proposed slot, not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub date: NaiveDate,
    #[serde(alias = "starttime", with = "wire::time")]
    pub start_time: NaiveTime,
    #[serde(alias = "endtime", with = "wire::time")]
    pub end_time: NaiveTime,
    #[serde(default, alias = "vid", with = "wire::opt_id")]
    pub venue_id: Option<String>,
    #[serde(default, alias = "lid", with = "wire::opt_id")]
    pub lecturer_id: Option<String>,
    #[serde(default, alias = "cid", with = "wire::opt_id")]
    pub course_id: Option<String>,
}

impl Candidate {
    pub fn new(date: NaiveDate, start_time: NaiveTime, end_time: NaiveTime) -> Self {
        Self {
            date,
            start_time,
            end_time,
            venue_id: None,
            lecturer_id: None,
            course_id: None,
        }
    }

    pub fn with_venue(mut self, venue_id: impl Into<String>) -> Self {
        self.venue_id = Some(venue_id.into());
        self
    }

    pub fn with_lecturer(mut self, lecturer_id: impl Into<String>) -> Self {
        self.lecturer_id = Some(lecturer_id.into());
        self
    }

    pub fn with_course(mut self, course_id: impl Into<String>) -> Self {
        self.course_id = Some(course_id.into());
        self
    }

    pub fn start_at(&self) -> NaiveDateTime {
        self.date.and_time(self.start_time)
    }

    pub fn end_at(&self) -> NaiveDateTime {
        self.date.and_time(self.end_time)
    }

    pub fn venue(&self) -> Option<&str> {
        assigned(&self.venue_id)
    }

    pub fn lecturer(&self) -> Option<&str> {
        assigned(&self.lecturer_id)
    }

    /// Turn the candidate into a stored event once it has passed validation.
    pub fn into_event(self, id: EventId, detail: EventDetail) -> ScheduledEvent {
        ScheduledEvent {
            id,
            date: self.date,
            start_time: self.start_time,
            end_time: self.end_time,
            venue_id: self.venue_id,
            lecturer_id: self.lecturer_id,
            course_id: self.course_id,
            detail,
        }
    }
}

impl From<&ScheduledEvent> for Candidate {
    fn from(event: &ScheduledEvent) -> Self {
        Self {
            date: event.date,
            start_time: event.start_time,
            end_time: event.end_time,
            venue_id: event.venue_id.clone(),
            lecturer_id: event.lecturer_id.clone(),
            course_id: event.course_id.clone(),
        }
    }
}

/// An id counts as assigned unless it is null or empty. No trimming.
pub(crate) fn assigned(id: &Option<String>) -> Option<&str> {
    id.as_deref().filter(|s| !s.is_empty())
}

/// Serde helpers for the row shapes the forms and the hosted store produce.
pub(crate) mod wire {
    use serde::{Deserialize, Deserializer, Serializer};

    /// Ids arrive as strings or as integer primary keys.
    #[derive(Deserialize)]
    #[serde(untagged)]
    pub enum RawId {
        Text(String),
        Int(i64),
    }

    impl RawId {
        pub fn into_string(self) -> String {
            match self {
                RawId::Text(s) => s,
                RawId::Int(n) => n.to_string(),
            }
        }
    }

    pub mod opt_id {
        use super::*;

        pub fn serialize<S: Serializer>(v: &Option<String>, s: S) -> Result<S::Ok, S::Error> {
            match v {
                Some(id) => s.serialize_some(id),
                None => s.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
            Ok(Option::<RawId>::deserialize(d)?.map(RawId::into_string))
        }
    }

    /// `HH:MM:SS` out, `HH:MM:SS` or `HH:MM` in.
    pub mod time {
        use chrono::NaiveTime;

        use super::*;

        pub fn serialize<S: Serializer>(t: &NaiveTime, s: S) -> Result<S::Ok, S::Error> {
            s.collect_str(&t.format("%H:%M:%S"))
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveTime, D::Error> {
            let raw = String::deserialize(d)?;
            crate::event::parse_time(&raw).map_err(serde::de::Error::custom)
        }
    }
}

/// Parse a time of day written as `HH:MM:SS` or `HH:MM`.
pub fn parse_time(s: &str) -> std::result::Result<NaiveTime, String> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .map_err(|e| format!("Invalid time '{}': {}", s, e))
}
