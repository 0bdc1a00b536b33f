// Domain normalizer: pulls the reported URL out of an issue body and reduces
// it to a hostname suitable for grouping.

use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

use crate::types::{Issue, IssueRecord, IssueState, parse_timestamp};

/// `URL: <value>` or `**URL**: <value>`, newline-terminated.
static URL_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\*\*)?URL(?:\*\*)?:\s+([^\r\n]+)\r?\n").expect("URL line pattern is valid")
});

/// What the report form writes when the reporter left the URL blank.
const NO_URL_PLACEHOLDER: &str = "None";

/// Extract the raw value of the first `URL:` line in an issue body.
///
/// Returns `None` when no such line exists or the value is blank.
pub fn extract_domain(body: &str) -> Option<String> {
    let caps = URL_LINE_RE.captures(body)?;
    let value = caps.get(1)?.as_str().trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Reduce a URL-ish string to its hostname.
///
/// Grammar: `[scheme "://"] ["www."]* host [(":" | "/") rest]`, where `host`
/// is the longest run containing neither `:` nor `/`. An empty host, or the
/// form's "None" placeholder, yields `None`.
pub fn hostname_from_domain(domain: &str) -> Option<String> {
    let mut rest = domain.trim();
    if let Some(idx) = rest.rfind("://") {
        rest = rest[idx + 3..].trim_start();
    }
    while let Some(stripped) = rest.strip_prefix("www.") {
        rest = stripped.trim_start();
    }
    let end = rest.find([':', '/']).unwrap_or(rest.len());
    let host = rest[..end].trim();
    if host.is_empty() || host == NO_URL_PLACEHOLDER {
        None
    } else {
        Some(host.to_string())
    }
}

/// Build a normalized [`Issue`] from a cached row.
///
/// Rows without a parseable `created_at` or a known `state` cannot take part
/// in any aggregate and are skipped.
pub fn normalize_issue(record: &IssueRecord) -> Option<Issue> {
    let Some(created_at) = record.created_at.as_deref().and_then(parse_timestamp) else {
        warn!(issue = record.number, "Skipping cached issue without a valid created_at");
        return None;
    };
    let Some(state) = record.state.as_deref().and_then(IssueState::parse) else {
        warn!(issue = record.number, state = ?record.state, "Skipping cached issue with unknown state");
        return None;
    };

    let domain = record.body.as_deref().and_then(extract_domain);
    let hostname = domain.as_deref().and_then(hostname_from_domain);

    Some(Issue {
        id: record.number,
        created_at,
        closed_at: record.closed_at.as_deref().and_then(parse_timestamp),
        state,
        domain,
        hostname,
    })
}

/// Normalize every cached row, dropping the ones [`normalize_issue`] rejects.
pub fn normalize_issues(records: &[IssueRecord]) -> Vec<Issue> {
    records.iter().filter_map(normalize_issue).collect()
}
