use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

// ---------------------------------------------------------------------------
// TicketId
// ---------------------------------------------------------------------------

/// Tracker-assigned ticket number (the GitHub issue number).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketId(pub u64);

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TicketId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().trim_start_matches('#').parse().map(TicketId)
    }
}

// ---------------------------------------------------------------------------
// Ticket
// ---------------------------------------------------------------------------

/// Snapshot of an open ticket as fetched from the tracker.
///
/// The engine never mutates a `Ticket`; every change goes out as an
/// [`Action`](crate::action::Action).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub id: TicketId,
    pub title: String,
    #[serde(default)]
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub labels: BTreeSet<String>,
}

impl Ticket {
    pub fn has_label(&self, name: &str) -> bool {
        self.labels.contains(name)
    }
}

// ---------------------------------------------------------------------------
// TicketFilter
// ---------------------------------------------------------------------------

/// Narrows which open tickets the source returns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketFilter {
    /// Only tickets carrying all of these labels. Empty means no restriction.
    #[serde(default)]
    pub labels: Vec<String>,
}
