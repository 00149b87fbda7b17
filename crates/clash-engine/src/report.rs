//! The result of a clash check.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::event::ScheduledEvent;

/// Dimension on which a candidate collides with an existing event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ClashType {
    Venue,
    Lecturer,
}

impl fmt::Display for ClashType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClashType::Venue => f.write_str("VENUE"),
            ClashType::Lecturer => f.write_str("LECTURER"),
        }
    }
}

/// One collision between the candidate and a stored event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clash {
    #[serde(rename = "type")]
    pub clash_type: ClashType,
    pub with: ScheduledEvent,
}

/// Every collision found for one candidate, in fetch order.
///
/// An event matching on both venue and lecturer appears twice, once per
/// dimension. An empty report means the slot can be scheduled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClashReport {
    clashes: Vec<Clash>,
}

impl ClashReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, clash_type: ClashType, with: ScheduledEvent) {
        self.clashes.push(Clash { clash_type, with });
    }

    pub fn is_clear(&self) -> bool {
        self.clashes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.clashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clashes.is_empty()
    }

    pub fn clashes(&self) -> &[Clash] {
        &self.clashes
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Clash> {
        self.clashes.iter()
    }

    /// Conflicting events on one dimension, in report order.
    pub fn of_type(&self, clash_type: ClashType) -> impl Iterator<Item = &ScheduledEvent> + '_ {
        self.clashes
            .iter()
            .filter(move |c| c.clash_type == clash_type)
            .map(|c| &c.with)
    }

    /// Operator-facing text: one line per conflict, venue clashes first.
    pub fn summary(&self) -> String {
        if self.is_clear() {
            return "No clashes".to_string();
        }

        let mut out = String::new();
        for (clash_type, heading) in [
            (ClashType::Venue, "Venue already booked"),
            (ClashType::Lecturer, "Lecturer already busy"),
        ] {
            let mut events = self.of_type(clash_type).peekable();
            if events.peek().is_none() {
                continue;
            }
            out.push_str(heading);
            out.push_str(":\n");
            for event in events {
                out.push_str("  - ");
                out.push_str(&event.to_string());
                out.push('\n');
            }
        }
        out
    }
}

impl fmt::Display for ClashReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

impl<'a> IntoIterator for &'a ClashReport {
    type Item = &'a Clash;
    type IntoIter = std::slice::Iter<'a, Clash>;

    fn into_iter(self) -> Self::IntoIter {
        self.clashes.iter()
    }
}

impl IntoIterator for ClashReport {
    type Item = Clash;
    type IntoIter = std::vec::IntoIter<Clash>;

    fn into_iter(self) -> Self::IntoIter {
        self.clashes.into_iter()
    }
}
