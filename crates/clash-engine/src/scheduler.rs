//! Validate-then-persist flow used by the scheduling forms.
//!
//! The check and the write are two separate store calls, so two operators
//! submitting the same slot at once can both pass. Use
//! [`InMemoryEventStore::insert_if_clear`](crate::memory::InMemoryEventStore::insert_if_clear)
//! where the store can run both under one lock.

use tracing::info;

use crate::detector::ClashDetector;
use crate::error::{ClashError, Result};
use crate::event::{Candidate, EventDetail, EventRef, ScheduledEvent};
use crate::store::{EventStore, EventWriter};

pub struct Scheduler<S> {
    detector: ClashDetector<S>,
}

impl<S: EventStore + EventWriter> Scheduler<S> {
    pub fn new(store: S) -> Self {
        Self {
            detector: ClashDetector::new(store),
        }
    }

    pub fn detector(&self) -> &ClashDetector<S> {
        &self.detector
    }

    /// Schedule a new lecture or exam if nothing clashes with it.
    ///
    /// # Errors
    /// `ClashError::Clashes` with the report when the slot is taken, or any
    /// error from [`ClashDetector::check`] or the store write.
    pub async fn create(&self, candidate: Candidate, detail: EventDetail) -> Result<ScheduledEvent> {
        let report = self.detector.check(&candidate, None).await?;
        if !report.is_clear() {
            return Err(ClashError::Clashes(report));
        }
        let event = self.detector.store().insert(candidate, detail).await?;
        info!(event = %event, "event scheduled");
        Ok(event)
    }

    /// Save an edited event, checking it against every event but its own
    /// stored record. Returns the version it replaced.
    pub async fn reschedule(&self, event: ScheduledEvent) -> Result<ScheduledEvent> {
        let own = event.event_ref();
        let report = self
            .detector
            .check(&Candidate::from(&event), Some(&own))
            .await?;
        if !report.is_clear() {
            return Err(ClashError::Clashes(report));
        }
        let previous = self.detector.store().update(event).await?;
        info!(event = %own.id, kind = %own.kind, "event rescheduled");
        Ok(previous)
    }

    /// Delete an event. Removing time never creates a clash, so nothing is checked.
    pub async fn cancel(&self, event: &EventRef) -> Result<ScheduledEvent> {
        let removed = self.detector.store().delete(event).await?;
        info!(event = %removed, "event cancelled");
        Ok(removed)
    }
}
