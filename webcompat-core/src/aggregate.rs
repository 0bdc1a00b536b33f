// Top-N hostname counts over the issue set.

use chrono::{DateTime, Duration, Utc};
use indexmap::IndexMap;

use crate::types::{Issue, IssueState};

/// Count issues per hostname and keep the `limit` largest groups.
///
/// Issues without a hostname are skipped. The result is ordered by
/// descending count; equal counts keep the order in which each hostname
/// was first encountered.
pub fn top_hostnames<'a, I>(issues: I, limit: usize) -> IndexMap<String, usize>
where
    I: IntoIterator<Item = &'a Issue>,
{
    let mut counts: IndexMap<&str, usize> = IndexMap::new();
    for issue in issues {
        if let Some(host) = issue.hostname.as_deref() {
            *counts.entry(host).or_default() += 1;
        }
    }

    let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked
        .into_iter()
        .take(limit)
        .map(|(host, n)| (host.to_string(), n))
        .collect()
}

/// Hostnames with the most currently open issues.
pub fn top_open_hostnames(issues: &[Issue], limit: usize) -> IndexMap<String, usize> {
    top_hostnames(
        issues.iter().filter(|i| i.state == IssueState::Open),
        limit,
    )
}

/// Hostnames with the most issues filed in the `days` before `now`,
/// open or closed. The window's lower bound is inclusive; a window reaching
/// past the earliest representable instant covers everything.
pub fn top_recent_hostnames(
    issues: &[Issue],
    now: DateTime<Utc>,
    days: i64,
    limit: usize,
) -> IndexMap<String, usize> {
    let since = Duration::try_days(days)
        .and_then(|span| now.checked_sub_signed(span))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    top_hostnames(issues.iter().filter(|i| i.created_at >= since), limit)
}
