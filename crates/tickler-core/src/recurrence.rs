use crate::error::{Result, TicklerError};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc};
use rrule::{RRule, RRuleSet, Unvalidated};
use serde::Serialize;

// ---------------------------------------------------------------------------
// Recurrence
// ---------------------------------------------------------------------------

/// An anchored series of occurrences.
pub trait Recurrence {
    /// Latest occurrence `<= at`, if any.
    fn latest_at_or_before(&self, at: DateTime<Utc>) -> Option<DateTime<Utc>>;

    /// Earliest occurrence `> at`, or `None` once the series is exhausted.
    fn earliest_after(&self, at: DateTime<Utc>) -> Option<DateTime<Utc>>;
}

/// RFC 5545 recurrence rule expanded by the `rrule` crate.
#[derive(Debug, Clone)]
pub struct RRuleRecurrence {
    set: RRuleSet,
}

/// True when `part` is the property or parameter `key` (`KEY=`, `KEY:` or
/// `KEY;`), ignoring case.
fn is_property(part: &str, key: &str) -> bool {
    let part = part.trim_start();
    part.get(..key.len())
        .is_some_and(|p| p.eq_ignore_ascii_case(key))
        && matches!(part.as_bytes().get(key.len()), Some(b'=' | b':' | b';'))
}

/// Reduce `text` to the bare `FREQ=...;...` parts, dropping the `RRULE:`
/// prefix and any start date, whether given as a `DTSTART:` line or as a
/// `DTSTART=` part.
fn rule_parts(text: &str) -> std::result::Result<Vec<&str>, String> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !is_property(l, "DTSTART"))
        .collect();
    let [line] = lines[..] else {
        return Err(format!("expected one rule line, found {}", lines.len()));
    };
    let line = match line.get(..6) {
        Some(prefix) if prefix.eq_ignore_ascii_case("RRULE:") => &line[6..],
        _ => line,
    };
    Ok(line
        .split(';')
        .map(str::trim)
        .filter(|p| !p.is_empty() && !is_property(p, "DTSTART"))
        .collect())
}

fn rule_field<'a>(parts: &[&'a str], name: &str) -> Option<&'a str> {
    parts.iter().find_map(|p| {
        p.split_once('=')
            .filter(|(k, _)| k.trim().eq_ignore_ascii_case(name))
            .map(|(_, v)| v.trim())
    })
}

/// Length of one period for frequencies that have a fixed length in UTC.
fn fixed_period(freq: &str) -> Option<Duration> {
    match freq.to_ascii_uppercase().as_str() {
        "SECONDLY" => Some(Duration::seconds(1)),
        "MINUTELY" => Some(Duration::minutes(1)),
        "HOURLY" => Some(Duration::hours(1)),
        "DAILY" => Some(Duration::days(1)),
        "WEEKLY" => Some(Duration::weeks(1)),
        _ => None,
    }
}

fn parse_until(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim_end_matches(['Z', 'z']);
    NaiveDateTime::parse_from_str(value, "%Y%m%dT%H%M%S")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y%m%d")
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })
        .map(|dt| dt.and_utc())
}

/// Latest start on the rule's own period grid that lies strictly before
/// `horizon`. Starting there yields the same occurrences from the new start
/// onward. Rules with a `COUNT`, with calendar-length periods, or whose
/// `UNTIL` precedes the new start keep `anchor`.
fn fast_forward(parts: &[&str], anchor: DateTime<Utc>, horizon: DateTime<Utc>) -> DateTime<Utc> {
    if rule_field(parts, "COUNT").is_some() {
        return anchor;
    }
    let Some(period) = rule_field(parts, "FREQ").and_then(fixed_period) else {
        return anchor;
    };
    let interval = rule_field(parts, "INTERVAL")
        .and_then(|v| v.parse::<i64>().ok())
        .filter(|i| *i > 0)
        .unwrap_or(1);
    let step = period.num_seconds() * interval;
    let gap = (horizon - anchor).num_seconds();
    if gap <= 0 {
        return anchor;
    }
    let start = anchor + Duration::seconds((gap - 1) / step * step);
    match rule_field(parts, "UNTIL") {
        Some(until) if !parse_until(until).is_some_and(|u| u >= start) => anchor,
        _ => start,
    }
}

impl RRuleRecurrence {
    /// Parse `text` (with or without an `RRULE:` prefix) and anchor it at
    /// `anchor`. Any DTSTART in the text is ignored.
    pub fn parse(text: &str, anchor: DateTime<Utc>) -> Result<Self> {
        Self::parse_from(text, anchor, anchor)
    }

    /// Like [`parse`](Self::parse), but expansion may start from the last
    /// period before `horizon`. Occurrences earlier than that are dropped;
    /// every later one is kept.
    pub fn parse_from(text: &str, anchor: DateTime<Utc>, horizon: DateTime<Utc>) -> Result<Self> {
        let invalid = |reason: String| TicklerError::InvalidRule {
            rule: text.to_string(),
            reason,
        };

        let parts = rule_parts(text).map_err(invalid)?;
        let rule: RRule<Unvalidated> = parts.join(";").parse().map_err(|e| invalid(format!("{e}")))?;
        let anchor = anchor.with_nanosecond(0).unwrap_or(anchor);
        let dt_start = fast_forward(&parts, anchor, horizon).with_timezone(&rrule::Tz::UTC);
        let set = rule.build(dt_start).map_err(|e| invalid(format!("{e}")))?;
        Ok(Self { set })
    }

    fn occurrences(&self) -> impl Iterator<Item = DateTime<Utc>> + '_ {
        (&self.set).into_iter().map(|dt| dt.with_timezone(&Utc))
    }
}

impl Recurrence for RRuleRecurrence {
    fn latest_at_or_before(&self, at: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.occurrences().take_while(|o| *o <= at).last()
    }

    fn earliest_after(&self, at: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.occurrences().find(|o| *o > at)
    }
}

// ---------------------------------------------------------------------------
// RecurrenceDecision
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum RecurrenceDecision {
    CloneNow { occurrence: DateTime<Utc> },
    NotYet { next: Option<DateTime<Utc>> },
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Decides whether a recurring ticket is due for a fresh occurrence.
///
/// An occurrence counts if it falls within `window` before `now`. The tool is
/// meant to run at least once per window, so each occurrence is cloned once.
#[derive(Debug, Clone, Copy)]
pub struct Scheduler {
    window: Duration,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(Duration::hours(24))
    }
}

impl Scheduler {
    pub fn new(window: Duration) -> Self {
        Self { window }
    }

    pub fn evaluate(
        &self,
        rule_text: &str,
        anchor: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<RecurrenceDecision> {
        // Only occurrences inside the window matter, so expansion can skip
        // the periods before it.
        let rule = RRuleRecurrence::parse_from(rule_text, anchor, now - self.window)?;
        Ok(self.decide(&rule, now))
    }

    pub fn decide(&self, rule: &impl Recurrence, now: DateTime<Utc>) -> RecurrenceDecision {
        if let Some(occurrence) = rule.latest_at_or_before(now) {
            if now - occurrence <= self.window {
                return RecurrenceDecision::CloneNow { occurrence };
            }
        }
        RecurrenceDecision::NotYet {
            next: rule.earliest_after(now),
        }
    }
}
