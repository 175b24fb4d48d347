use crate::types::TicketId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TicklerError {
    #[error("invalid rrule '{rule}': {reason}")]
    InvalidRule { rule: String, reason: String },

    #[error("invalid due date '{value}': expected YYYY-MM-DD")]
    InvalidDate {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("template render failed: {0}")]
    TemplateRender(String),

    #[error("{action} failed for #{ticket}: {source}")]
    ActionFailed {
        ticket: TicketId,
        action: &'static str,
        #[source]
        source: Box<TicklerError>,
    },

    #[error("invalid repository '{0}': expected owner/name")]
    InvalidRepository(String),

    #[error("invalid config: {0}")]
    Config(String),

    #[error("github api returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TicklerError>;
