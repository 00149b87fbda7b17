//! # clash-engine
//!
//! Venue and lecturer clash detection for university lecture and exam timetables.
//!
//! Before a lecture or exam is saved, the scheduling forms ask the
//! [`ClashDetector`] whether the proposed slot collides with anything already
//! booked on the same date. A clash is an overlapping interval that shares an
//! assigned venue or an assigned lecturer. Back-to-back slots do not clash.
//!
//! ## Modules
//!
//! - [`event`] — lectures, exams, and candidate slots
//! - [`overlap`] — same-day interval overlap predicate
//! - [`detector`] — fetch the day's events and report clashes
//! - [`report`] — clash report returned to the forms
//! - [`store`] — read/write ports to the event store
//! - [`memory`] — in-memory store with atomic check-and-write
//! - [`snapshot`] — JSON export of both collections
//! - [`scheduler`] — validate-then-persist flow
//! - [`freebusy`] — free slots for a venue or lecturer
//! - [`error`] — Error types

pub mod detector;
pub mod error;
pub mod event;
pub mod freebusy;
pub mod memory;
pub mod overlap;
pub mod report;
pub mod scheduler;
pub mod snapshot;
pub mod store;

pub use detector::{detect_clashes, ClashDetector};
pub use error::{ClashError, StoreError};
pub use event::{
    Candidate, EventDetail, EventId, EventKind, EventRef, ExamCategory, ExamStatus, ScheduledEvent,
};
pub use freebusy::{find_free_slots, FreeSlot, Resource, TimeWindow};
pub use memory::InMemoryEventStore;
pub use overlap::overlaps;
pub use report::{Clash, ClashReport, ClashType};
pub use scheduler::Scheduler;
pub use snapshot::{EventRow, Snapshot};
pub use store::{EventStore, EventWriter};
