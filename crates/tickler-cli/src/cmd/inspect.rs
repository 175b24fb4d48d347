use crate::output::{print_json, print_table};
use anyhow::Context;
use chrono::{DateTime, Utc};
use std::io::Read;
use std::path::{Path, PathBuf};
use tickler_core::config::Config;
use tickler_core::engine::{Engine, TicketPlan};
use tickler_core::recurrence::RecurrenceDecision;
use tickler_core::types::{Ticket, TicketId};

pub struct InspectArgs {
    pub file: PathBuf,
    pub number: u64,
    pub title: String,
    pub created: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
    pub labels: Vec<String>,
    pub now: DateTime<Utc>,
}

fn read_body(file: &Path) -> anyhow::Result<String> {
    if file == Path::new("-") {
        let mut body = String::new();
        std::io::stdin()
            .read_to_string(&mut body)
            .context("failed to read issue body from stdin")?;
        return Ok(body);
    }
    std::fs::read_to_string(file).with_context(|| format!("failed to read {}", file.display()))
}

pub fn run(config: &Config, args: InspectArgs, json: bool) -> anyhow::Result<()> {
    let created_at = args.created.unwrap_or(args.now);
    let ticket = Ticket {
        id: TicketId(args.number),
        title: args.title,
        body: read_body(&args.file)?,
        created_at,
        updated_at: args.updated.unwrap_or(created_at),
        labels: args
            .labels
            .iter()
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect(),
    };
    if ticket.updated_at < ticket.created_at {
        anyhow::bail!("--updated must not be earlier than --created");
    }

    let plan = Engine::new(config).plan(&ticket, args.now);

    if json {
        print_json(&plan)?;
    } else {
        print_plan(&plan);
    }

    if !plan.failures.is_empty() {
        anyhow::bail!(
            "{} directive(s) could not be evaluated",
            plan.failures.len()
        );
    }
    Ok(())
}

fn print_plan(plan: &TicketPlan) {
    if plan.directives.is_empty() {
        println!("No directives.");
    } else {
        let rows = plan
            .directives
            .values
            .iter()
            .map(|(k, v)| vec![k.clone(), v.clone()])
            .collect();
        print_table(&["DIRECTIVE", "VALUE"], rows);
    }

    match &plan.recurrence {
        Some(RecurrenceDecision::CloneNow { occurrence }) => {
            println!("\nRecurrence: clone now (occurrence {occurrence})");
        }
        Some(RecurrenceDecision::NotYet { next: Some(next) }) => {
            println!("\nRecurrence: next occurrence {next}");
        }
        Some(RecurrenceDecision::NotYet { next: None }) => {
            println!("\nRecurrence: rule exhausted");
        }
        None => {}
    }
    if let Some(n) = &plan.notification {
        println!("\nDue in {} day(s)", n.due_in_days);
    }

    if plan.actions.is_empty() {
        println!("\nNo actions.");
    } else {
        println!("\nActions:");
        for action in &plan.actions {
            println!("  - {action}");
        }
    }

    for failure in &plan.failures {
        println!("\n[error] {}: {}", failure.directive, failure.message);
    }
}
