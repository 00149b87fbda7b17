//! Venue and lecturer clash detection.
//!
//! A candidate slot clashes with a stored event when both fall on the same
//! date, their intervals overlap, and they share an assigned venue or an
//! assigned lecturer. Course ids never take part.

use chrono::{NaiveDate, NaiveTime};
use tracing::{debug, warn};

use crate::error::{ClashError, Result, StoreError};
use crate::event::{Candidate, EventKind, EventRef, ScheduledEvent};
use crate::freebusy::{self, FreeSlot, Resource, TimeWindow};
use crate::overlap::{overlap_minutes, overlaps};
use crate::report::{ClashReport, ClashType};
use crate::store::EventStore;

/// Reject an interval whose start is not strictly before its end.
pub fn validate_interval(start: NaiveTime, end: NaiveTime) -> Result<()> {
    if start < end {
        Ok(())
    } else {
        Err(ClashError::InvalidInterval { start, end })
    }
}

/// Compare a candidate against events already known to share its date.
///
/// Events matching `exclude` by `(kind, id)` are skipped. Every other event
/// whose interval overlaps the candidate's adds one `VENUE` entry when the
/// assigned venues are equal and one `LECTURER` entry when the assigned
/// lecturers are equal. Entries follow the order of `events`.
///
/// Ids compare exactly; only a null or empty id is unassigned. Stored events
/// with `start_time >= end_time` are compared as they are.
pub fn detect_clashes<'a, I>(
    candidate: &Candidate,
    exclude: Option<&EventRef>,
    events: I,
) -> ClashReport
where
    I: IntoIterator<Item = &'a ScheduledEvent>,
{
    let start = candidate.start_at();
    let end = candidate.end_at();
    let mut report = ClashReport::new();

    for existing in events {
        if exclude.is_some_and(|ex| ex.kind == existing.kind() && ex.id == existing.id) {
            continue;
        }
        if !overlaps(start, end, existing.start_at(), existing.end_at()) {
            continue;
        }

        if let (Some(mine), Some(theirs)) = (candidate.venue(), existing.venue()) {
            if mine == theirs {
                report.push(ClashType::Venue, existing.clone());
            }
        }
        if let (Some(mine), Some(theirs)) = (candidate.lecturer(), existing.lecturer()) {
            if mine == theirs {
                report.push(ClashType::Lecturer, existing.clone());
            }
        }
    }

    report
}

/// Checks candidate slots against whatever the store holds at call time.
///
/// Stateless between calls: every check does a fresh fetch of both
/// collections. Nothing is cached and nothing is written.
#[derive(Debug, Clone)]
pub struct ClashDetector<S> {
    store: S,
}

impl<S: EventStore> ClashDetector<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Lectures then exams on `date`, fetched concurrently.
    ///
    /// # Errors
    /// `ClashError::StoreUnavailable` if either fetch fails.
    pub async fn fetch_day(&self, date: NaiveDate) -> Result<Vec<ScheduledEvent>> {
        let (mut lectures, exams) = futures::try_join!(
            self.fetch(EventKind::Lecture, date),
            self.fetch(EventKind::Exam, date),
        )?;
        lectures.extend(exams);
        Ok(lectures)
    }

    async fn fetch(
        &self,
        kind: EventKind,
        date: NaiveDate,
    ) -> std::result::Result<Vec<ScheduledEvent>, StoreError> {
        self.store
            .fetch_events_on_date(kind, date)
            .await
            .inspect_err(|e| warn!(%kind, %date, error = %e, "event fetch failed"))
    }

    /// Every stored event the candidate would collide with.
    ///
    /// `exclude` names the candidate's own stored record when an existing
    /// event is being edited.
    ///
    /// # Errors
    /// - `ClashError::InvalidInterval` if `start_time >= end_time`; the store is
    ///   not queried.
    /// - `ClashError::StoreUnavailable` if the same-day events could not be read.
    ///   A failed read is never reported as an empty report.
    #[tracing::instrument(
        name = "check_clash",
        skip_all,
        fields(date = %candidate.date, venue = ?candidate.venue(), lecturer = ?candidate.lecturer())
    )]
    pub async fn check(
        &self,
        candidate: &Candidate,
        exclude: Option<&EventRef>,
    ) -> Result<ClashReport> {
        validate_interval(candidate.start_time, candidate.end_time)?;

        let day = self.fetch_day(candidate.date).await?;
        let report = detect_clashes(candidate, exclude, &day);

        for clash in &report {
            debug!(
                clash_type = %clash.clash_type,
                with = %clash.with,
                overlap_minutes = overlap_minutes(
                    candidate.start_at(),
                    candidate.end_at(),
                    clash.with.start_at(),
                    clash.with.end_at(),
                ),
                "clash found"
            );
        }
        debug!(compared = day.len(), clashes = report.len(), "clash check finished");

        Ok(report)
    }

    /// Free intervals for a venue or lecturer on `date` inside `window`.
    ///
    /// # Errors
    /// `ClashError::StoreUnavailable` if the same-day events could not be read.
    pub async fn free_slots(
        &self,
        resource: &Resource,
        date: NaiveDate,
        window: TimeWindow,
    ) -> Result<Vec<FreeSlot>> {
        let day = self.fetch_day(date).await?;
        Ok(freebusy::free_slots_for(resource, date, window, &day))
    }
}
