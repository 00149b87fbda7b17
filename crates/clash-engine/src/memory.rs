//! In-memory event store.
//!
//! Holds both collections in insertion order behind one lock. Suitable for
//! tests, the CLI (loaded from a [`Snapshot`]), and any deployment that keeps
//! the timetable in process. Because the clash check and the write can run
//! under the same write lock, [`InMemoryEventStore::insert_if_clear`] and
//! [`InMemoryEventStore::update_if_clear`] cannot race with each other.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::{debug, info};

use crate::detector::{detect_clashes, validate_interval};
use crate::error::{ClashError, Result, StoreError};
use crate::event::{Candidate, EventDetail, EventId, EventKind, EventRef, ScheduledEvent};
use crate::snapshot::Snapshot;
use crate::store::{EventStore, EventWriter};

#[derive(Debug, Default)]
struct Collections {
    lectures: Vec<ScheduledEvent>,
    exams: Vec<ScheduledEvent>,
    last_lecture_id: u64,
    last_exam_id: u64,
    offline: bool,
}

impl Collections {
    fn of(&self, kind: EventKind) -> &Vec<ScheduledEvent> {
        match kind {
            EventKind::Lecture => &self.lectures,
            EventKind::Exam => &self.exams,
        }
    }

    fn of_mut(&mut self, kind: EventKind) -> &mut Vec<ScheduledEvent> {
        match kind {
            EventKind::Lecture => &mut self.lectures,
            EventKind::Exam => &mut self.exams,
        }
    }

    fn last_id_mut(&mut self, kind: EventKind) -> &mut u64 {
        match kind {
            EventKind::Lecture => &mut self.last_lecture_id,
            EventKind::Exam => &mut self.last_exam_id,
        }
    }

    fn allocate_id(&mut self, kind: EventKind) -> std::result::Result<EventId, StoreError> {
        let last = self.last_id_mut(kind);
        *last = last
            .checked_add(1)
            .ok_or_else(|| StoreError::Query(format!("{} id space exhausted", kind)))?;
        Ok(EventId::from(*last))
    }

    /// Keep generated ids above any numeric id already present.
    fn reserve_id(&mut self, kind: EventKind, id: &EventId) {
        if let Ok(n) = id.0.parse::<u64>() {
            let last = self.last_id_mut(kind);
            *last = (*last).max(n);
        }
    }

    fn on_date(&self, date: NaiveDate) -> impl Iterator<Item = &ScheduledEvent> {
        self.lectures
            .iter()
            .chain(self.exams.iter())
            .filter(move |e| e.date == date)
    }

    fn position(&self, event: &EventRef) -> Option<usize> {
        self.of(event.kind).iter().position(|e| e.id == event.id)
    }

    fn insert(&mut self, candidate: Candidate, detail: EventDetail) -> Result<ScheduledEvent> {
        let kind = detail.kind();
        let id = self.allocate_id(kind)?;
        let event = candidate.into_event(id, detail);
        self.of_mut(kind).push(event.clone());
        Ok(event)
    }

    fn replace(&mut self, event: ScheduledEvent) -> Result<ScheduledEvent> {
        let event_ref = event.event_ref();
        let index = self
            .position(&event_ref)
            .ok_or(ClashError::NotFound(event_ref.clone()))?;
        Ok(std::mem::replace(
            &mut self.of_mut(event_ref.kind)[index],
            event,
        ))
    }
}

/// Thread-safe in-memory store of lecture and exam events.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEventStore {
    data: Arc<RwLock<Collections>>,
}

impl InMemoryEventStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load both collections, keeping their order and ids.
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let mut data = Collections::default();
        for event in snapshot.lectures.into_iter().chain(snapshot.exams) {
            let kind = event.kind();
            data.reserve_id(kind, &event.id);
            data.of_mut(kind).push(event);
        }
        info!(
            lectures = data.lectures.len(),
            exams = data.exams.len(),
            "loaded event snapshot"
        );
        Self {
            data: Arc::new(RwLock::new(data)),
        }
    }

    /// Copy of both collections as they are now.
    pub fn snapshot(&self) -> std::result::Result<Snapshot, StoreError> {
        let data = self.read()?;
        Ok(Snapshot {
            lectures: data.lectures.clone(),
            exams: data.exams.clone(),
        })
    }

    /// Simulate losing the connection: while unavailable every fetch fails.
    pub fn set_available(&self, available: bool) {
        let mut data = match self.data.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        data.offline = !available;
    }

    fn read(&self) -> std::result::Result<RwLockReadGuard<'_, Collections>, StoreError> {
        let data = self
            .data
            .read()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".to_string()))?;
        if data.offline {
            return Err(StoreError::Unavailable("store is offline".to_string()));
        }
        Ok(data)
    }

    fn write(&self) -> std::result::Result<RwLockWriteGuard<'_, Collections>, StoreError> {
        let data = self
            .data
            .write()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".to_string()))?;
        if data.offline {
            return Err(StoreError::Unavailable("store is offline".to_string()));
        }
        Ok(data)
    }

    pub fn get(&self, event: &EventRef) -> Result<ScheduledEvent> {
        let data = self.read()?;
        data.position(event)
            .map(|i| data.of(event.kind)[i].clone())
            .ok_or_else(|| ClashError::NotFound(event.clone()))
    }

    pub fn count(&self, kind: EventKind) -> Result<usize> {
        Ok(self.read()?.of(kind).len())
    }

    /// Store a new event without checking for clashes.
    pub fn insert_unchecked(&self, candidate: Candidate, detail: EventDetail) -> Result<ScheduledEvent> {
        let event = self.write()?.insert(candidate, detail)?;
        debug!(event = %event, "event inserted");
        Ok(event)
    }

    /// Replace an event without checking for clashes.
    pub fn update_unchecked(&self, event: ScheduledEvent) -> Result<ScheduledEvent> {
        let previous = self.write()?.replace(event)?;
        debug!(event = %previous.id, "event updated");
        Ok(previous)
    }

    pub fn remove(&self, event: &EventRef) -> Result<ScheduledEvent> {
        let mut data = self.write()?;
        let index = data
            .position(event)
            .ok_or_else(|| ClashError::NotFound(event.clone()))?;
        let removed = data.of_mut(event.kind).remove(index);
        debug!(event = %removed, "event removed");
        Ok(removed)
    }

    /// Check and insert under one write lock.
    ///
    /// # Errors
    /// - `ClashError::InvalidInterval` for a malformed candidate.
    /// - `ClashError::Clashes` carrying the report when the slot is taken;
    ///   nothing is written.
    pub fn insert_if_clear(&self, candidate: Candidate, detail: EventDetail) -> Result<ScheduledEvent> {
        validate_interval(candidate.start_time, candidate.end_time)?;

        let mut data = self.write()?;
        let report = detect_clashes(&candidate, None, data.on_date(candidate.date));
        if !report.is_clear() {
            return Err(ClashError::Clashes(report));
        }
        let event = data.insert(candidate, detail)?;
        debug!(event = %event, "event inserted after clash check");
        Ok(event)
    }

    /// Check the edited event against every other event and replace it under
    /// one write lock. Returns the version it replaced.
    pub fn update_if_clear(&self, event: ScheduledEvent) -> Result<ScheduledEvent> {
        validate_interval(event.start_time, event.end_time)?;

        let mut data = self.write()?;
        let own = event.event_ref();
        if data.position(&own).is_none() {
            return Err(ClashError::NotFound(own));
        }
        let candidate = Candidate::from(&event);
        let report = detect_clashes(&candidate, Some(&own), data.on_date(candidate.date));
        if !report.is_clear() {
            return Err(ClashError::Clashes(report));
        }
        let previous = data.replace(event)?;
        debug!(event = %own.id, "event updated after clash check");
        Ok(previous)
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn fetch_events_on_date(
        &self,
        kind: EventKind,
        date: NaiveDate,
    ) -> std::result::Result<Vec<ScheduledEvent>, StoreError> {
        let data = self.read()?;
        Ok(data
            .of(kind)
            .iter()
            .filter(|e| e.date == date)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl EventWriter for InMemoryEventStore {
    async fn insert(&self, candidate: Candidate, detail: EventDetail) -> Result<ScheduledEvent> {
        self.insert_unchecked(candidate, detail)
    }

    async fn update(&self, event: ScheduledEvent) -> Result<ScheduledEvent> {
        self.update_unchecked(event)
    }

    async fn delete(&self, event: &EventRef) -> Result<ScheduledEvent> {
        self.remove(event)
    }
}
