use crate::action::{Action, ActionSink, Outcome, TicketSource};
use crate::config::GithubConfig;
use crate::error::{Result, TicklerError};
use crate::types::{Ticket, TicketFilter, TicketId};
use chrono::{DateTime, Utc};
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::fmt;
use std::time::Duration;

const PER_PAGE: usize = 100;
const ERROR_BODY_LIMIT: usize = 512;

// ---------------------------------------------------------------------------
// RepoRef
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl std::str::FromStr for RepoRef {
    type Err = TicklerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().split_once('/') {
            Some((owner, name))
                if !owner.is_empty() && !name.is_empty() && !name.contains('/') =>
            {
                Ok(Self {
                    owner: owner.to_string(),
                    name: name.to_string(),
                })
            }
            _ => Err(TicklerError::InvalidRepository(s.to_string())),
        }
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct GithubLabel {
    name: String,
}

#[derive(Debug, Deserialize)]
struct GithubIssue {
    number: u64,
    title: String,
    #[serde(default)]
    body: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(default)]
    labels: Vec<GithubLabel>,
    #[serde(default)]
    pull_request: Option<serde_json::Value>,
}

impl From<GithubIssue> for Ticket {
    fn from(issue: GithubIssue) -> Self {
        Ticket {
            id: TicketId(issue.number),
            title: issue.title,
            body: issue.body.unwrap_or_default(),
            created_at: issue.created_at,
            updated_at: issue.updated_at,
            labels: issue.labels.into_iter().map(|l| l.name).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CreatedIssue {
    number: u64,
}

// ---------------------------------------------------------------------------
// GithubClient
// ---------------------------------------------------------------------------

/// Issues REST client for a single repository.
pub struct GithubClient {
    http: Client,
    api_base: String,
    repo: RepoRef,
}

fn truncate_for_error(body: &str) -> String {
    if body.chars().count() <= ERROR_BODY_LIMIT {
        return body.to_string();
    }
    let cut: String = body.chars().take(ERROR_BODY_LIMIT).collect();
    format!("{cut}...")
}

impl GithubClient {
    pub fn new(config: &GithubConfig, token: &str, repo: RepoRef) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("tickler"));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "x-github-api-version",
            HeaderValue::from_static("2022-11-28"),
        );
        let auth = HeaderValue::from_str(&format!("Bearer {}", token.trim()))
            .map_err(|_| TicklerError::Config("token is not a valid header value".to_string()))?;
        headers.insert(AUTHORIZATION, auth);

        let http = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()?;
        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            repo,
        })
    }

    pub fn repo(&self) -> &RepoRef {
        &self.repo
    }

    fn issues_url(&self) -> String {
        format!(
            "{}/repos/{}/{}/issues",
            self.api_base, self.repo.owner, self.repo.name
        )
    }

    fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.send()?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(TicklerError::Api {
                status: status.as_u16(),
                body: truncate_for_error(&body),
            });
        }
        Ok(response.json()?)
    }

    /// All open issues (pull requests excluded), following pagination.
    pub fn list_open_issues(&self, filter: &TicketFilter) -> Result<Vec<Ticket>> {
        let labels = filter.labels.join(",");
        let per_page = PER_PAGE.to_string();
        let mut tickets = Vec::new();
        let mut page = 1_u32;
        loop {
            let page_value = page.to_string();
            let mut request = self.http.get(self.issues_url()).query(&[
                ("state", "open"),
                ("per_page", per_page.as_str()),
                ("page", page_value.as_str()),
            ]);
            if !labels.is_empty() {
                request = request.query(&[("labels", labels.as_str())]);
            }
            let chunk: Vec<GithubIssue> = self.send_json(request)?;
            let chunk_len = chunk.len();
            tickets.extend(
                chunk
                    .into_iter()
                    .filter(|issue| issue.pull_request.is_none())
                    .map(Ticket::from),
            );
            if chunk_len < PER_PAGE {
                break;
            }
            page = page.saturating_add(1);
        }
        tracing::debug!(repo = %self.repo, count = tickets.len(), "listed open issues");
        Ok(tickets)
    }

    pub fn create_ticket(&self, title: &str, body: &str, labels: &[String]) -> Result<TicketId> {
        let payload = json!({ "title": title, "body": body, "labels": labels });
        let created: CreatedIssue =
            self.send_json(self.http.post(self.issues_url()).json(&payload))?;
        Ok(TicketId(created.number))
    }

    pub fn add_labels(&self, ticket: TicketId, labels: &[String]) -> Result<()> {
        let url = format!("{}/{}/labels", self.issues_url(), ticket);
        let _: serde_json::Value =
            self.send_json(self.http.post(url).json(&json!({ "labels": labels })))?;
        Ok(())
    }

    pub fn post_comment(&self, ticket: TicketId, body: &str) -> Result<()> {
        let url = format!("{}/{}/comments", self.issues_url(), ticket);
        let _: serde_json::Value =
            self.send_json(self.http.post(url).json(&json!({ "body": body })))?;
        Ok(())
    }
}

impl TicketSource for GithubClient {
    fn list_open_tickets(&self, filter: &TicketFilter) -> Result<Vec<Ticket>> {
        self.list_open_issues(filter)
    }
}

impl ActionSink for GithubClient {
    fn apply(&self, action: &Action) -> Result<Outcome> {
        match action {
            Action::CreateTicket {
                title,
                body,
                labels,
                ..
            } => {
                let id = self.create_ticket(title, body, labels)?;
                Ok(Outcome::Created { id })
            }
            Action::AddLabels { ticket, labels } => {
                self.add_labels(*ticket, labels)?;
                Ok(Outcome::Applied)
            }
            Action::PostComment { ticket, body } => {
                self.post_comment(*ticket, body)?;
                Ok(Outcome::Applied)
            }
        }
    }
}
