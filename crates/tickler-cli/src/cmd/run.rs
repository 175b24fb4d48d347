use crate::output::{print_json, print_table};
use anyhow::Context;
use chrono::{DateTime, Utc};
use tickler_core::action::{ActionSink, DryRun};
use tickler_core::config::Config;
use tickler_core::engine::{Engine, RunReport};
use tickler_core::github::{GithubClient, RepoRef};
use tickler_core::types::TicketFilter;

pub fn run(
    config: &Config,
    token: &str,
    repository: &str,
    dry_run: bool,
    now: DateTime<Utc>,
    json: bool,
) -> anyhow::Result<()> {
    let repo: RepoRef = repository.parse()?;
    let client = GithubClient::new(&config.github, token, repo)
        .context("failed to create github client")?;
    let sink: &dyn ActionSink = if dry_run { &DryRun } else { &client };
    let filter = TicketFilter {
        labels: config.github.labels.clone(),
    };

    tracing::info!(repository = %client.repo(), dry_run, %now, "starting run");
    let report = Engine::new(config)
        .run(&client, sink, &filter, now)
        .with_context(|| format!("failed to list open issues in {}", client.repo()))?;

    if json {
        print_json(&report)?;
    } else {
        print_summary(&report, dry_run);
    }

    if !report.is_success() {
        anyhow::bail!(
            "{} error(s) while processing {} issue(s)",
            report.errors.len(),
            report.tickets
        );
    }
    Ok(())
}

fn print_summary(report: &RunReport, dry_run: bool) {
    let mode = if dry_run { " (dry run)" } else { "" };
    println!(
        "Processed {} issue(s){mode}: {} applied, {} skipped, {} created",
        report.tickets,
        report.applied,
        report.skipped,
        report.created.len()
    );
    if !report.created.is_empty() {
        let ids: Vec<String> = report.created.iter().map(|id| format!("#{id}")).collect();
        println!("Created: {}", ids.join(", "));
    }
    if !report.errors.is_empty() {
        println!();
        let rows = report
            .errors
            .iter()
            .map(|e| vec![format!("#{}", e.ticket), e.message.clone()])
            .collect();
        print_table(&["ISSUE", "ERROR"], rows);
    }
}
