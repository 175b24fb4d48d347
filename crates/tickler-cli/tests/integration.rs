#![allow(deprecated)]
use assert_cmd::Command;
use mockito::Matcher;
use predicates::prelude::*;
use serde_json::{json, Value};
use tempfile::TempDir;

const NOW: &str = "2024-01-08T10:00:00Z";

fn tickler(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("tickler").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("TICKLER_CONFIG")
        .env_remove("GITHUB_TOKEN")
        .env_remove("GITHUB_REPOSITORY")
        .env_remove("RUST_LOG");
    cmd
}

fn write(dir: &TempDir, name: &str, content: &str) -> String {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path.display().to_string()
}

fn stdout_json(output: &std::process::Output) -> Value {
    serde_json::from_slice(&output.stdout).unwrap()
}

// ---------------------------------------------------------------------------
// tickler inspect
// ---------------------------------------------------------------------------

#[test]
fn inspect_weekly_issue_plans_a_clone() {
    let dir = TempDir::new().unwrap();
    let body = write(
        &dir,
        "body.md",
        "Weekly sync\n---\nrrule: FREQ=WEEKLY\nlabels: chore, sync\n",
    );

    let output = tickler(&dir)
        .args(["inspect", &body, "--json", "--number", "42", "--title", "Weekly sync"])
        .args(["--created", "2024-01-01T09:00:00Z", "--now", NOW])
        .output()
        .unwrap();
    assert!(output.status.success());

    let plan = stdout_json(&output);
    assert_eq!(plan["recurrence"]["decision"], "clone_now");
    let action = &plan["actions"][0];
    assert_eq!(action["kind"], "create_ticket");
    assert_eq!(action["labels"], json!(["chore", "sync"]));
    assert!(action["body"].as_str().unwrap().contains("Cloned from #42"));
}

#[test]
fn inspect_overdue_issue_labels_and_comments() {
    let dir = TempDir::new().unwrap();
    let body = write(&dir, "body.md", "Renew cert\r\n--\r\ndue: 2024-01-01\r\n");

    tickler(&dir)
        .args(["inspect", &body, "--number", "7"])
        .args(["--created", "2023-12-01T00:00:00Z", "--updated", "2023-12-31T12:00:00Z"])
        .args(["--now", NOW])
        .assert()
        .success()
        .stdout(predicate::str::contains("due        2024-01-01"))
        .stdout(predicate::str::contains("label #7 with due, todo"))
        .stdout(predicate::str::contains("This issue is overdue by 7 days"));
}

#[test]
fn inspect_respects_existing_labels() {
    let dir = TempDir::new().unwrap();
    let body = write(&dir, "body.md", "x\n---\ndue: 2024-01-08\n");

    let output = tickler(&dir)
        .args(["inspect", &body, "--json", "--labels", "todo,due"])
        .args(["--created", "2024-01-07T09:00:00Z", "--now", NOW])
        .output()
        .unwrap();
    let plan = stdout_json(&output);
    assert_eq!(plan["notification"]["due_in_days"], 0);
    assert_eq!(
        plan["actions"],
        json!([{ "kind": "post_comment", "ticket": 0, "body": "This issue is due today" }])
    );
}

#[test]
fn inspect_reads_stdin() {
    let dir = TempDir::new().unwrap();
    tickler(&dir)
        .args(["inspect", "-", "--now", NOW])
        .write_stdin("Nothing special here\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("No directives."))
        .stdout(predicate::str::contains("No actions."));
}

#[test]
fn inspect_bad_rule_fails_but_reports_due_path() {
    let dir = TempDir::new().unwrap();
    let body = write(&dir, "body.md", "x\n---\nrrule: fortnightly\ndue: 2024-01-10\n");

    tickler(&dir)
        .args(["inspect", &body, "--now", NOW])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Due in 1 day(s)"))
        .stdout(predicate::str::contains("[error] rrule"))
        .stderr(predicate::str::contains("1 directive(s) could not be evaluated"));
}

#[test]
fn inspect_templates_title_with_now() {
    let dir = TempDir::new().unwrap();
    let body = write(&dir, "body.md", "Notes for {{now \"%F\"}}\n---\nrrule: FREQ=DAILY\n");

    let output = tickler(&dir)
        .args(["inspect", &body, "--json", "--title", "Standup {{now \"%b %d\"}}"])
        .args(["--created", "2024-01-07T10:00:00Z", "--now", NOW])
        .output()
        .unwrap();
    let plan = stdout_json(&output);
    assert_eq!(plan["actions"][0]["title"], "Standup Jan 08");
    assert_eq!(
        plan["actions"][0]["body"],
        "Notes for 2024-01-08\n\nCloned from #0"
    );
}

#[test]
fn inspect_missing_file_fails() {
    let dir = TempDir::new().unwrap();
    tickler(&dir)
        .args(["inspect", "nope.md"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read nope.md"));
}

// ---------------------------------------------------------------------------
// tickler config
// ---------------------------------------------------------------------------

#[test]
fn config_show_prints_defaults() {
    let dir = TempDir::new().unwrap();
    tickler(&dir)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("window_hours: 24"))
        .stdout(predicate::str::contains("todo: todo"));
}

#[test]
fn config_is_discovered_from_working_directory() {
    let dir = TempDir::new().unwrap();
    write(&dir, ".tickler.yaml", "labels:\n  due: urgent\n");
    tickler(&dir)
        .args(["config", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains(".tickler.yaml"));

    let body = write(&dir, "body.md", "x\n---\ndue: 2024-01-08\n");
    tickler(&dir)
        .args(["inspect", &body, "--now", NOW])
        .assert()
        .success()
        .stdout(predicate::str::contains("label #0 with todo, urgent"));
}

#[test]
fn invalid_config_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "bad.yaml", "recurrence:\n  window_hours: 0\n");
    tickler(&dir)
        .args(["config", "show", "--config", &path])
        .assert()
        .failure()
        .stderr(predicate::str::contains("window_hours must be at least 1"));
}

// ---------------------------------------------------------------------------
// tickler run (against a mock GitHub)
// ---------------------------------------------------------------------------

fn issues_json() -> String {
    json!([
        {
            "number": 42,
            "title": "Weekly sync",
            "body": "Weekly sync\n---\nrrule: FREQ=WEEKLY\nlabels: chore, sync",
            "created_at": "2024-01-01T09:00:00Z",
            "updated_at": "2024-01-01T09:00:00Z",
            "labels": []
        },
        {
            "number": 43,
            "title": "Just a note",
            "body": null,
            "created_at": "2024-01-01T09:00:00Z",
            "updated_at": "2024-01-05T09:00:00Z",
            "labels": [{ "name": "todo" }]
        }
    ])
    .to_string()
}

fn mock_config(dir: &TempDir, server: &mockito::Server) -> String {
    write(
        dir,
        "tickler.yaml",
        &format!("github:\n  api_base: {}\n", server.url()),
    )
}

#[test]
fn run_dry_run_lists_but_never_writes() {
    let dir = TempDir::new().unwrap();
    let mut server = mockito::Server::new();
    let list = server
        .mock("GET", "/repos/acme/widgets/issues")
        .match_query(Matcher::UrlEncoded("state".into(), "open".into()))
        .match_header("authorization", "Bearer secret")
        .with_status(200)
        .with_body(issues_json())
        .create();
    let writes = server
        .mock("POST", Matcher::Any)
        .expect(0)
        .create();

    let config = mock_config(&dir, &server);
    tickler(&dir)
        .args(["run", "--dry-run", "--config", &config, "--now", NOW])
        .args(["--token", "secret", "--repository", "acme/widgets"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Processed 2 issue(s) (dry run): 0 applied, 1 skipped, 0 created",
        ))
        .stderr(predicate::str::contains("dry run: would create ticket"));

    list.assert();
    writes.assert();
}

#[test]
fn run_creates_the_next_occurrence() {
    let dir = TempDir::new().unwrap();
    let mut server = mockito::Server::new();
    let _list = server
        .mock("GET", "/repos/acme/widgets/issues")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(issues_json())
        .create();
    let create = server
        .mock("POST", "/repos/acme/widgets/issues")
        .match_body(Matcher::PartialJson(json!({
            "title": "Weekly sync",
            "body": "Weekly sync\n\nCloned from #42",
            "labels": ["chore", "sync"]
        })))
        .with_status(201)
        .with_body(r#"{"number": 77}"#)
        .create();

    let config = mock_config(&dir, &server);
    let output = tickler(&dir)
        .args(["run", "--json", "--config", &config, "--now", NOW])
        .env("GITHUB_TOKEN", "secret")
        .env("GITHUB_REPOSITORY", "acme/widgets")
        .output()
        .unwrap();
    assert!(output.status.success());

    create.assert();
    let report = stdout_json(&output);
    assert_eq!(report["tickets"], 2);
    assert_eq!(report["created"], json!([77]));
    assert_eq!(report["errors"], json!([]));
}

#[test]
fn run_reports_failed_actions_with_nonzero_exit() {
    let dir = TempDir::new().unwrap();
    let mut server = mockito::Server::new();
    let _list = server
        .mock("GET", "/repos/acme/widgets/issues")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(issues_json())
        .create();
    let _create = server
        .mock("POST", "/repos/acme/widgets/issues")
        .with_status(500)
        .with_body("boom")
        .create();

    let config = mock_config(&dir, &server);
    tickler(&dir)
        .args(["run", "--config", &config, "--now", NOW])
        .args(["--token", "secret", "--repository", "acme/widgets"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("create ticket failed for #42"))
        .stderr(predicate::str::contains("1 error(s) while processing 2 issue(s)"));
}

#[test]
fn run_fails_when_listing_fails() {
    let dir = TempDir::new().unwrap();
    let mut server = mockito::Server::new();
    let _list = server
        .mock("GET", "/repos/acme/widgets/issues")
        .match_query(Matcher::Any)
        .with_status(401)
        .with_body(r#"{"message":"Bad credentials"}"#)
        .create();

    let config = mock_config(&dir, &server);
    tickler(&dir)
        .args(["run", "--config", &config])
        .args(["--token", "wrong", "--repository", "acme/widgets"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to list open issues in acme/widgets"))
        .stderr(predicate::str::contains("401"));
}

#[test]
fn run_rejects_malformed_repository() {
    let dir = TempDir::new().unwrap();
    tickler(&dir)
        .args(["run", "--token", "t", "--repository", "widgets"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected owner/name"));
}
