use crate::action::{Action, ActionSink, Outcome, TicketSource};
use crate::config::Config;
use crate::directive::{self, DirectiveSet};
use crate::due::{NotificationDecision, Notifier};
use crate::error::{Result, TicklerError};
use crate::recurrence::{RecurrenceDecision, Scheduler};
use crate::template::Templater;
use crate::types::{Ticket, TicketFilter, TicketId};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

// ---------------------------------------------------------------------------
// TicketPlan
// ---------------------------------------------------------------------------

/// A directive that could not be evaluated. Only its own path is skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectiveFailure {
    pub directive: &'static str,
    pub message: String,
}

/// Everything the engine decided about one ticket.
#[derive(Debug, Clone, Serialize)]
pub struct TicketPlan {
    pub ticket: TicketId,
    pub directives: DirectiveSet,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<RecurrenceDecision>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification: Option<NotificationDecision>,
    pub actions: Vec<Action>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<DirectiveFailure>,
}

// ---------------------------------------------------------------------------
// RunReport
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunError {
    pub ticket: TicketId,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub tickets: usize,
    pub applied: usize,
    pub skipped: usize,
    pub created: Vec<TicketId>,
    pub errors: Vec<RunError>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

pub struct Engine {
    scheduler: Scheduler,
    notifier: Notifier,
    legacy_prefix_lines: bool,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

impl Engine {
    pub fn new(config: &Config) -> Self {
        Self {
            scheduler: Scheduler::new(Duration::hours(i64::from(config.recurrence.window_hours))),
            notifier: Notifier::new(&config.labels.todo, &config.labels.due),
            legacy_prefix_lines: config.directives.legacy_prefix_lines,
        }
    }

    fn directives(&self, body: &str) -> DirectiveSet {
        let set = directive::extract(body);
        if set.is_empty() && self.legacy_prefix_lines {
            return directive::extract_legacy(body);
        }
        set
    }

    /// Decide what to do with `ticket` at `now`. Pure: nothing is dispatched.
    pub fn plan(&self, ticket: &Ticket, now: DateTime<Utc>) -> TicketPlan {
        let directives = self.directives(&ticket.body);
        let mut plan = TicketPlan {
            ticket: ticket.id,
            directives,
            recurrence: None,
            notification: None,
            actions: Vec::new(),
            failures: Vec::new(),
        };

        if let Some(rule) = plan.directives.rrule() {
            match self.scheduler.evaluate(rule, ticket.created_at, now) {
                Ok(decision) => {
                    match decision {
                        RecurrenceDecision::CloneNow { occurrence } => {
                            tracing::info!(number = %ticket.id, %occurrence, "cloning recurring ticket");
                            plan.actions.push(self.clone_action(ticket, &plan.directives, now));
                        }
                        RecurrenceDecision::NotYet { next: Some(next) } => {
                            tracing::info!(number = %ticket.id, %next, "next recurring occurrence");
                        }
                        RecurrenceDecision::NotYet { next: None } => {
                            tracing::info!(number = %ticket.id, "recurrence rule exhausted");
                        }
                    }
                    plan.recurrence = Some(decision);
                }
                Err(e) => plan.fail(ticket.id, directive::RRULE, e),
            }
        }

        if let Some(due) = plan.directives.due() {
            match self
                .notifier
                .evaluate(due, now, ticket.updated_at, &ticket.labels)
            {
                Ok(decision) => {
                    tracing::info!(number = %ticket.id, due_in_days = decision.due_in_days, "processing due ticket");
                    if !decision.labels_to_add.is_empty() {
                        plan.actions.push(Action::AddLabels {
                            ticket: ticket.id,
                            labels: decision.labels_to_add.iter().cloned().collect(),
                        });
                    }
                    if let Some(body) = &decision.comment {
                        plan.actions.push(Action::PostComment {
                            ticket: ticket.id,
                            body: body.clone(),
                        });
                    }
                    plan.notification = Some(decision);
                }
                Err(e) => plan.fail(ticket.id, directive::DUE, e),
            }
        }

        plan
    }

    fn clone_action(&self, original: &Ticket, directives: &DirectiveSet, now: DateTime<Utc>) -> Action {
        let rendered = Templater::new(now).render(original, directives);
        Action::CreateTicket {
            source: original.id,
            title: rendered.title,
            body: format!("{}\nCloned from #{}", rendered.body, original.id),
            labels: rendered.labels,
        }
    }

    /// Plan and dispatch every ticket in order. Failures are recorded per
    /// ticket and never stop the pass.
    pub fn process<'a>(
        &self,
        tickets: impl IntoIterator<Item = &'a Ticket>,
        sink: &dyn ActionSink,
        now: DateTime<Utc>,
    ) -> RunReport {
        let mut report = RunReport::default();
        for ticket in tickets {
            report.tickets += 1;
            tracing::info!(number = %ticket.id, title = %ticket.title, "considering ticket");

            let plan = self.plan(ticket, now);
            for failure in &plan.failures {
                report.errors.push(RunError {
                    ticket: ticket.id,
                    message: failure.message.clone(),
                });
            }
            for action in &plan.actions {
                match sink.apply(action) {
                    Ok(Outcome::Created { id }) => {
                        tracing::info!(number = %ticket.id, created = %id, "created ticket");
                        report.applied += 1;
                        report.created.push(id);
                    }
                    Ok(Outcome::Applied) => report.applied += 1,
                    Ok(Outcome::Skipped) => report.skipped += 1,
                    Err(e) => {
                        let err = TicklerError::ActionFailed {
                            ticket: ticket.id,
                            action: action.as_str(),
                            source: Box::new(e),
                        };
                        tracing::error!(number = %ticket.id, error = %err, "action failed");
                        report.errors.push(RunError {
                            ticket: ticket.id,
                            message: err.to_string(),
                        });
                    }
                }
            }
        }
        report
    }

    /// List open tickets from `source` and process them. Only a listing
    /// failure is returned as an error.
    pub fn run(
        &self,
        source: &dyn TicketSource,
        sink: &dyn ActionSink,
        filter: &TicketFilter,
        now: DateTime<Utc>,
    ) -> Result<RunReport> {
        let tickets = source.list_open_tickets(filter)?;
        Ok(self.process(&tickets, sink, now))
    }
}

impl TicketPlan {
    fn fail(&mut self, ticket: TicketId, directive: &'static str, err: TicklerError) {
        tracing::error!(number = %ticket, directive, error = %err, "skipping directive");
        self.failures.push(DirectiveFailure {
            directive,
            message: err.to_string(),
        });
    }
}
