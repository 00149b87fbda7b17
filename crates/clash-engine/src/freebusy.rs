//! Compute free time slots for a venue or lecturer.
//!
//! Clips each busy interval to a teaching-day window, sorts them, and sweeps
//! once to collect the gaps.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::detector::validate_interval;
use crate::error::Result;
use crate::event::ScheduledEvent;

/// A free time slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreeSlot {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub duration_minutes: i64,
}

/// The venue or lecturer whose day is being inspected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "lowercase")]
pub enum Resource {
    Venue(String),
    Lecturer(String),
}

impl Resource {
    /// Whether `event` occupies this resource. Unassigned ids never match.
    pub fn is_used_by(&self, event: &ScheduledEvent) -> bool {
        match self {
            Resource::Venue(id) => event.venue() == Some(id.as_str()),
            Resource::Lecturer(id) => event.lecturer() == Some(id.as_str()),
        }
    }
}

const DEFAULT_DAY_START: NaiveTime = match NaiveTime::from_hms_opt(8, 0, 0) {
    Some(t) => t,
    None => panic!("invalid default day start"),
};

const DEFAULT_DAY_END: NaiveTime = match NaiveTime::from_hms_opt(18, 0, 0) {
    Some(t) => t,
    None => panic!("invalid default day end"),
};

/// Time-of-day range searched for free slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    start: NaiveTime,
    end: NaiveTime,
}

impl TimeWindow {
    /// # Errors
    /// `ClashError::InvalidInterval` when `start >= end`.
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self> {
        validate_interval(start, end)?;
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveTime {
        self.start
    }

    pub fn end(&self) -> NaiveTime {
        self.end
    }
}

impl Default for TimeWindow {
    /// 08:00 to 18:00.
    fn default() -> Self {
        Self {
            start: DEFAULT_DAY_START,
            end: DEFAULT_DAY_END,
        }
    }
}

impl FreeSlot {
    fn between(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self {
            start,
            end,
            duration_minutes: (end - start).num_minutes(),
        }
    }
}

/// Busy intervals of `events` clipped to the window, sorted by start.
///
/// Events with `start >= end` hold no busy time and are dropped.
fn busy_intervals<'a>(
    events: impl IntoIterator<Item = &'a ScheduledEvent>,
    window_start: NaiveDateTime,
    window_end: NaiveDateTime,
) -> Vec<(NaiveDateTime, NaiveDateTime)> {
    let mut busy: Vec<_> = events
        .into_iter()
        .map(|e| (e.start_at(), e.end_at()))
        .filter(|&(start, end)| start < end && start < window_end && end > window_start)
        .map(|(start, end)| (start.max(window_start), end.min(window_end)))
        .collect();
    busy.sort_unstable();
    busy
}

/// Sweep sorted busy intervals and emit every gap left in the window.
///
/// The cursor only moves forward, so overlapping and adjacent intervals
/// collapse without a separate merge step.
fn gaps(
    busy: &[(NaiveDateTime, NaiveDateTime)],
    window_start: NaiveDateTime,
    window_end: NaiveDateTime,
) -> Vec<FreeSlot> {
    let mut free = Vec::new();
    let mut cursor = window_start;
    for &(start, end) in busy {
        if cursor < start {
            free.push(FreeSlot::between(cursor, start));
        }
        cursor = cursor.max(end);
    }
    if cursor < window_end {
        free.push(FreeSlot::between(cursor, window_end));
    }
    free
}

/// Find free time slots within a window, treating every given event as busy.
///
/// Returns free slots sorted by start time.
pub fn find_free_slots(
    events: &[&ScheduledEvent],
    window_start: NaiveDateTime,
    window_end: NaiveDateTime,
) -> Vec<FreeSlot> {
    let busy = busy_intervals(events.iter().copied(), window_start, window_end);
    gaps(&busy, window_start, window_end)
}

/// Free slots of one venue or lecturer on `date`.
///
/// Events on other dates or not using `resource` are ignored, so the full
/// day's fetch from both collections can be passed in unchanged.
pub fn free_slots_for(
    resource: &Resource,
    date: NaiveDate,
    window: TimeWindow,
    events: &[ScheduledEvent],
) -> Vec<FreeSlot> {
    let (window_start, window_end) = (date.and_time(window.start), date.and_time(window.end));
    let busy = busy_intervals(
        events
            .iter()
            .filter(|e| e.date == date && resource.is_used_by(e)),
        window_start,
        window_end,
    );
    gaps(&busy, window_start, window_end)
}
