//! Error types for clash-engine operations.

use chrono::NaiveTime;
use thiserror::Error;

use crate::event::EventRef;
use crate::report::ClashReport;

/// Failure reported by an [`EventStore`](crate::store::EventStore) implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("event store unavailable: {0}")]
    Unavailable(String),

    #[error("event store query failed: {0}")]
    Query(String),

    #[error("malformed event record: {0}")]
    Decode(String),
}

#[derive(Error, Debug)]
pub enum ClashError {
    #[error("Invalid interval: start {start} is not before end {end}")]
    InvalidInterval { start: NaiveTime, end: NaiveTime },

    /// The same-day fetch failed, so the slot could not be verified.
    #[error("Could not verify clashes: {0}")]
    StoreUnavailable(#[from] StoreError),

    #[error("Slot clashes with {} scheduled event(s)", .0.len())]
    Clashes(ClashReport),

    #[error("No {} with id {} exists", .0.kind, .0.id)]
    NotFound(EventRef),
}

pub type Result<T> = std::result::Result<T, ClashError>;
