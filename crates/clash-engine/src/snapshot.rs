//! JSON snapshot of both event collections.
//!
//! A snapshot is the shape the hosted store exports: one array of lecture rows
//! and one array of exam rows. Rows carry no kind tag; the array they sit in
//! decides it.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::event::{wire, EventDetail, EventId, EventKind, ExamCategory, ExamStatus, ScheduledEvent};

/// One row of either collection, as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRow {
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
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exam_category: Option<ExamCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exam_status: Option<ExamStatus>,
}

impl EventRow {
    /// Attach the collection's kind.
    ///
    /// # Errors
    /// `StoreError::Decode` when an exam row lacks its category or status.
    pub fn into_event(self, kind: EventKind) -> Result<ScheduledEvent, StoreError> {
        let detail = match kind {
            EventKind::Lecture => EventDetail::Lecture,
            EventKind::Exam => {
                let exam_category = self.exam_category.ok_or_else(|| {
                    StoreError::Decode(format!("exam {} has no exam_category", self.id))
                })?;
                let exam_status = self.exam_status.ok_or_else(|| {
                    StoreError::Decode(format!("exam {} has no exam_status", self.id))
                })?;
                EventDetail::Exam {
                    exam_category,
                    exam_status,
                }
            }
        };

        Ok(ScheduledEvent {
            id: self.id,
            date: self.date,
            start_time: self.start_time,
            end_time: self.end_time,
            venue_id: self.venue_id,
            lecturer_id: self.lecturer_id,
            course_id: self.course_id,
            detail,
        })
    }
}

impl From<&ScheduledEvent> for EventRow {
    fn from(e: &ScheduledEvent) -> Self {
        let (exam_category, exam_status) = match e.detail {
            EventDetail::Lecture => (None, None),
            EventDetail::Exam {
                exam_category,
                exam_status,
            } => (Some(exam_category), Some(exam_status)),
        };
        Self {
            id: e.id.clone(),
            date: e.date,
            start_time: e.start_time,
            end_time: e.end_time,
            venue_id: e.venue_id.clone(),
            lecturer_id: e.lecturer_id.clone(),
            course_id: e.course_id.clone(),
            exam_category,
            exam_status,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct SnapshotRows {
    #[serde(default)]
    lectures: Vec<EventRow>,
    #[serde(default)]
    exams: Vec<EventRow>,
}

/// Both collections, each in stored order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub lectures: Vec<ScheduledEvent>,
    pub exams: Vec<ScheduledEvent>,
}

impl Snapshot {
    /// Parse `{ "lectures": [...], "exams": [...] }`. Either array may be omitted.
    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        let rows: SnapshotRows = serde_json::from_str(json)
            .map_err(|e| StoreError::Decode(format!("invalid snapshot JSON: {}", e)))?;
        Self::from_rows(rows.lectures, rows.exams)
    }

    pub fn from_rows(lectures: Vec<EventRow>, exams: Vec<EventRow>) -> Result<Self, StoreError> {
        Ok(Self {
            lectures: rows_into_events(lectures, EventKind::Lecture)?,
            exams: rows_into_events(exams, EventKind::Exam)?,
        })
    }

    pub fn to_json_pretty(&self) -> Result<String, StoreError> {
        let rows = SnapshotRows {
            lectures: self.lectures.iter().map(EventRow::from).collect(),
            exams: self.exams.iter().map(EventRow::from).collect(),
        };
        serde_json::to_string_pretty(&rows)
            .map_err(|e| StoreError::Decode(format!("cannot serialize snapshot: {}", e)))
    }

    /// Lectures followed by exams.
    pub fn events(&self) -> impl Iterator<Item = &ScheduledEvent> {
        self.lectures.iter().chain(self.exams.iter())
    }
}

/// Convert a JSON array of rows from one collection.
pub fn rows_into_events(
    rows: Vec<EventRow>,
    kind: EventKind,
) -> Result<Vec<ScheduledEvent>, StoreError> {
    rows.into_iter().map(|row| row.into_event(kind)).collect()
}
