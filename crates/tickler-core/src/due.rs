use crate::error::{Result, TicklerError};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::Serialize;
use std::collections::BTreeSet;

/// `todo` is applied from this many days out.
const TODO_WITHIN_DAYS: i64 = 7;
/// `due` is applied from this many days out.
const DUE_WITHIN_DAYS: i64 = 1;

/// (minimum staleness, maximum days remaining) pairs for the upcoming notice.
/// The closer the deadline, the sooner an untouched ticket is nudged again.
const NUDGE_STEPS: [(i64, i64); 3] = [(30 * 24, 7), (7 * 24, 2), (24, 1)];

// ---------------------------------------------------------------------------
// NotificationDecision
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NotificationDecision {
    pub due_in_days: i64,
    pub labels_to_add: BTreeSet<String>,
    pub comment: Option<String>,
}

impl NotificationDecision {
    pub fn is_noop(&self) -> bool {
        self.labels_to_add.is_empty() && self.comment.is_none()
    }
}

// ---------------------------------------------------------------------------
// Notifier
// ---------------------------------------------------------------------------

pub struct Notifier {
    todo_label: String,
    due_label: String,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new("todo", "due")
    }
}

pub fn parse_due(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|source| {
        TicklerError::InvalidDate {
            value: value.to_string(),
            source,
        }
    })
}

/// The instant a due date falls due: UTC midnight at its start.
pub fn due_instant(due: NaiveDate) -> DateTime<Utc> {
    due.and_time(NaiveTime::MIN).and_utc()
}

/// Whole days from `now` until the due instant, counted in whole hours and
/// truncated toward zero. Zero within a day either side of the due instant,
/// negative once more than a day has passed.
pub fn days_until(due: NaiveDate, now: DateTime<Utc>) -> i64 {
    (due_instant(due) - now).num_hours() / 24
}

fn plural_days(n: i64) -> String {
    if n == 1 {
        "1 day".to_string()
    } else {
        format!("{n} days")
    }
}

impl Notifier {
    pub fn new(todo_label: impl Into<String>, due_label: impl Into<String>) -> Self {
        Self {
            todo_label: todo_label.into(),
            due_label: due_label.into(),
        }
    }

    pub fn evaluate(
        &self,
        due: &str,
        now: DateTime<Utc>,
        last_update: DateTime<Utc>,
        current_labels: &BTreeSet<String>,
    ) -> Result<NotificationDecision> {
        let due = parse_due(due)?;
        Ok(self.decide(due, now, last_update, current_labels))
    }

    pub fn decide(
        &self,
        due: NaiveDate,
        now: DateTime<Utc>,
        last_update: DateTime<Utc>,
        current_labels: &BTreeSet<String>,
    ) -> NotificationDecision {
        let due_in_days = days_until(due, now);
        let due_at = due_instant(due);

        let mut labels_to_add = BTreeSet::new();
        if due_in_days <= TODO_WITHIN_DAYS && !current_labels.contains(&self.todo_label) {
            labels_to_add.insert(self.todo_label.clone());
        }
        if due_in_days <= DUE_WITHIN_DAYS && !current_labels.contains(&self.due_label) {
            labels_to_add.insert(self.due_label.clone());
        }

        // Touching the ticket bumps `last_update`, which silences these until
        // it goes stale again.
        let untouched_since_due = last_update < due_at;
        let comment = match due_in_days {
            d if d < 0 => untouched_since_due
                .then(|| format!("This issue is overdue by {}", plural_days(-d))),
            0 => untouched_since_due.then(|| "This issue is due today".to_string()),
            d => {
                let stale = now - last_update;
                NUDGE_STEPS
                    .iter()
                    .any(|&(hours, within)| stale >= Duration::hours(hours) && d <= within)
                    .then(|| format!("This issue is due in {}", plural_days(d)))
            }
        };

        NotificationDecision {
            due_in_days,
            labels_to_add,
            comment,
        }
    }
}
