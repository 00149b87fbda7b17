//! Ports to the event store that owns the lecture and exam collections.
//!
//! The detector only ever reads through [`EventStore`]. Writes go through
//! [`EventWriter`], which the [`Scheduler`](crate::scheduler::Scheduler) uses
//! after a check has passed.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::{Result, StoreError};
use crate::event::{Candidate, EventDetail, EventKind, EventRef, ScheduledEvent};

/// Read access to the scheduled events.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` so a detector can be shared between
/// request handlers.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Every event of `kind` whose date is `date`, in the store's natural order.
    ///
    /// # Errors
    /// Must return a [`StoreError`] when the data cannot be read. An empty list
    /// means "nothing scheduled", never "could not check".
    async fn fetch_events_on_date(
        &self,
        kind: EventKind,
        date: NaiveDate,
    ) -> std::result::Result<Vec<ScheduledEvent>, StoreError>;
}

/// Write access used once a slot has been validated.
#[async_trait]
pub trait EventWriter: Send + Sync {
    /// Persist a new event and return it with its assigned id.
    async fn insert(&self, candidate: Candidate, detail: EventDetail) -> Result<ScheduledEvent>;

    /// Replace the stored event with the same `(kind, id)` and return the
    /// version it replaced.
    ///
    /// # Errors
    /// `ClashError::NotFound` when no such event exists.
    async fn update(&self, event: ScheduledEvent) -> Result<ScheduledEvent>;

    /// Remove an event and return what was stored.
    async fn delete(&self, event: &EventRef) -> Result<ScheduledEvent>;
}

#[async_trait]
impl<T: EventStore + ?Sized> EventStore for Arc<T> {
    async fn fetch_events_on_date(
        &self,
        kind: EventKind,
        date: NaiveDate,
    ) -> std::result::Result<Vec<ScheduledEvent>, StoreError> {
        (**self).fetch_events_on_date(kind, date).await
    }
}

#[async_trait]
impl<T: EventWriter + ?Sized> EventWriter for Arc<T> {
    async fn insert(&self, candidate: Candidate, detail: EventDetail) -> Result<ScheduledEvent> {
        (**self).insert(candidate, detail).await
    }

    async fn update(&self, event: ScheduledEvent) -> Result<ScheduledEvent> {
        (**self).update(event).await
    }

    async fn delete(&self, event: &EventRef) -> Result<ScheduledEvent> {
        (**self).delete(event).await
    }
}
