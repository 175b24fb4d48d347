//! Instructions the engine hands to the tracker, and the seams that carry
//! them out.
//!
//! The engine only ever produces `Action`s. A [`TicketSource`] feeds it
//! tickets and an [`ActionSink`] executes what it decides; dry runs swap in
//! [`DryRun`], which logs instead of dispatching.

use crate::error::Result;
use crate::types::{Ticket, TicketFilter, TicketId};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    /// Open a new ticket, e.g. the next occurrence of a recurring one.
    CreateTicket {
        source: TicketId,
        title: String,
        body: String,
        labels: Vec<String>,
    },
    AddLabels {
        ticket: TicketId,
        labels: Vec<String>,
    },
    PostComment {
        ticket: TicketId,
        body: String,
    },
}

impl Action {
    /// The ticket this action concerns (for creates, the one being cloned).
    pub fn ticket(&self) -> TicketId {
        match self {
            Action::CreateTicket { source, .. } => *source,
            Action::AddLabels { ticket, .. } | Action::PostComment { ticket, .. } => *ticket,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::CreateTicket { .. } => "create ticket",
            Action::AddLabels { .. } => "add labels",
            Action::PostComment { .. } => "post comment",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::CreateTicket { source, title, .. } => {
                write!(f, "create '{title}' (from #{source})")
            }
            Action::AddLabels { ticket, labels } => {
                write!(f, "label #{ticket} with {}", labels.join(", "))
            }
            Action::PostComment { ticket, body } => write!(f, "comment on #{ticket}: {body}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Created { id: TicketId },
    Applied,
    /// Not dispatched (dry run).
    Skipped,
}

// ---------------------------------------------------------------------------
// Collaborator seams
// ---------------------------------------------------------------------------

pub trait TicketSource {
    fn list_open_tickets(&self, filter: &TicketFilter) -> Result<Vec<Ticket>>;
}

pub trait ActionSink {
    fn apply(&self, action: &Action) -> Result<Outcome>;
}

/// Sink that logs every instruction and dispatches nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRun;

impl ActionSink for DryRun {
    fn apply(&self, action: &Action) -> Result<Outcome> {
        match action {
            Action::CreateTicket {
                source,
                title,
                body,
                labels,
            } => tracing::info!(
                source = %source,
                title = %title,
                body = %body,
                labels = ?labels,
                "dry run: would create ticket"
            ),
            Action::AddLabels { ticket, labels } => {
                tracing::info!(number = %ticket, labels = ?labels, "dry run: would add labels")
            }
            Action::PostComment { ticket, body } => {
                tracing::info!(number = %ticket, body = %body, "dry run: would post comment")
            }
        }
        Ok(Outcome::Skipped)
    }
}
