//! Rendering of a recurring ticket into its next occurrence.
//!
//! Title and body are Handlebars templates rendered in strict mode with no
//! HTML escaping. Besides the template data (`number`, `title`, `labels`,
//! `directives`) the following helpers are available:
//!
//! - `{{now}}` / `{{now "%Y-%m-%d"}}`: render time, RFC 3339 by default
//! - `{{upper s}}`, `{{lower s}}`
//!
//! A field that fails to render keeps its literal text.

use crate::directive::DirectiveSet;
use crate::error::TicklerError;
use crate::types::Ticket;
use chrono::{DateTime, SecondsFormat, Utc};
use handlebars::{handlebars_helper, Handlebars, RenderErrorReason};
use serde::Serialize;
use std::fmt::Write as _;

handlebars_helper!(upper: |s: str| s.to_uppercase());
handlebars_helper!(lower: |s: str| s.to_lowercase());

// ---------------------------------------------------------------------------
// RenderedOccurrence
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedOccurrence {
    pub title: String,
    pub body: String,
    pub labels: Vec<String>,
}

#[derive(Serialize)]
struct TemplateData<'a> {
    number: u64,
    title: &'a str,
    labels: &'a [String],
    directives: &'a std::collections::BTreeMap<String, String>,
}

// ---------------------------------------------------------------------------
// Templater
// ---------------------------------------------------------------------------

pub struct Templater {
    registry: Handlebars<'static>,
}

impl Templater {
    /// Build a templater whose `now` helper reports `now`.
    pub fn new(now: DateTime<Utc>) -> Self {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);
        registry.register_escape_fn(handlebars::no_escape);
        registry.register_helper("upper", Box::new(upper));
        registry.register_helper("lower", Box::new(lower));
        registry.register_helper(
            "now",
            Box::new(
                move |h: &handlebars::Helper,
                      _: &Handlebars,
                      _: &handlebars::Context,
                      _: &mut handlebars::RenderContext,
                      out: &mut dyn handlebars::Output| {
                    let rendered = match h.param(0).and_then(|v| v.value().as_str()) {
                        Some(fmt) => {
                            let mut s = String::new();
                            write!(s, "{}", now.format(fmt)).map_err(|_| {
                                RenderErrorReason::Other(format!("invalid time format '{fmt}'"))
                            })?;
                            s
                        }
                        None => now.to_rfc3339_opts(SecondsFormat::Secs, true),
                    };
                    out.write(&rendered)?;
                    Ok(())
                },
            ),
        );
        Self { registry }
    }

    /// Render one template string against `data`.
    pub fn render_str<T: Serialize>(&self, template: &str, data: &T) -> Result<String, TicklerError> {
        self.registry
            .render_template(template, data)
            .map_err(|e| TicklerError::TemplateRender(e.to_string()))
    }

    /// Render the next occurrence of `original`. Each field falls back to its
    /// literal text independently when its template cannot be rendered.
    pub fn render(&self, original: &Ticket, directives: &DirectiveSet) -> RenderedOccurrence {
        let labels = directives.labels();
        let data = TemplateData {
            number: original.id.0,
            title: &original.title,
            labels: &labels,
            directives: &directives.values,
        };

        let title = self.render_or_literal("title", &original.title, &data, original);
        let body = self.render_or_literal("body", &directives.residual, &data, original);

        RenderedOccurrence {
            title,
            body,
            labels,
        }
    }

    fn render_or_literal(
        &self,
        field: &str,
        template: &str,
        data: &TemplateData<'_>,
        original: &Ticket,
    ) -> String {
        match self.render_str(template, data) {
            Ok(rendered) => rendered,
            Err(e) => {
                tracing::warn!(number = %original.id, field, error = %e, "template fell back to literal text");
                template.to_string()
            }
        }
    }
}
