use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::OnceLock;

pub const RRULE: &str = "rrule";
pub const DUE: &str = "due";
pub const LABELS: &str = "labels";

static MARKER_RE: OnceLock<Regex> = OnceLock::new();

fn marker_re() -> &'static Regex {
    MARKER_RE.get_or_init(|| Regex::new(r"(?m)^-?--$").unwrap())
}

// ---------------------------------------------------------------------------
// DirectiveSet
// ---------------------------------------------------------------------------

/// Directives parsed from the trailing `key: value` block of a ticket body,
/// together with the prose that precedes the block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DirectiveSet {
    pub values: BTreeMap<String, String>,
    pub residual: String,
}

impl DirectiveSet {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn rrule(&self) -> Option<&str> {
        self.get(RRULE)
    }

    pub fn due(&self) -> Option<&str> {
        self.get(DUE)
    }

    /// Labels from the `labels` directive, comma separated, blanks dropped.
    pub fn labels(&self) -> Vec<String> {
        self.get(LABELS)
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

// ---------------------------------------------------------------------------
// extract
// ---------------------------------------------------------------------------

/// Split `body` at its last `--` / `---` marker line into directives and the
/// residual prose.
///
/// Without a marker the set is empty and `residual` is the body unchanged.
/// With one, `residual` is the trimmed prose plus a single trailing newline.
pub fn extract(body: &str) -> DirectiveSet {
    let body = body.replace("\r\n", "\n");
    let Some(marker) = marker_re().find_iter(&body).last() else {
        return DirectiveSet {
            values: BTreeMap::new(),
            residual: body,
        };
    };

    let mut values = BTreeMap::new();
    for line in body[marker.end()..].split('\n') {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        values.insert(key.trim().to_lowercase(), value.trim().to_string());
    }

    DirectiveSet {
        values,
        residual: format!("{}\n", body[..marker.start()].trim()),
    }
}

/// Read the older prefix-line form: `RRULE:`, `Due:` and `Labels:` at the
/// start of a line anywhere in the body. Matching lines are removed from the
/// residual.
pub fn extract_legacy(body: &str) -> DirectiveSet {
    let body = body.replace("\r\n", "\n");
    let mut values = BTreeMap::new();
    let mut kept = Vec::new();

    for line in body.split('\n') {
        let field = [("RRULE:", RRULE), ("Due:", DUE), ("Labels:", LABELS)]
            .into_iter()
            .find_map(|(prefix, key)| line.strip_prefix(prefix).map(|rest| (key, rest)));
        match field {
            Some((key, rest)) => {
                values.insert(key.to_string(), rest.trim().to_string());
            }
            None => kept.push(line),
        }
    }

    if values.is_empty() {
        return DirectiveSet {
            values,
            residual: body,
        };
    }
    DirectiveSet {
        values,
        residual: format!("{}\n", kept.join("\n").trim()),
    }
}
