// Cross-reference linker: finds issue-tracker links on Bugzilla defects and
// ranks the still-open defects by how many user reports point at them.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::types::{Defect, Issue, LinkEdge};

/// Statuses for which a defect is still being worked on.
pub const OPEN_STATUSES: [&str; 4] = ["UNCONFIRMED", "NEW", "ASSIGNED", "REOPENED"];

/// How many hostnames the `most_reported` summary lists.
const MOST_REPORTED_LIMIT: usize = 3;

static ISSUE_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{2,}").expect("issue id pattern is valid"));

pub fn is_open_status(status: &str) -> bool {
    OPEN_STATUSES.contains(&status)
}

/// Issue number referenced by a cross-reference URL.
///
/// The URL must contain `marker`; the id is its first run of two or more
/// digits.
pub fn extract_issue_id(url: &str, marker: &str) -> Option<u64> {
    if !url.contains(marker) {
        return None;
    }
    ISSUE_ID_RE.find(url)?.as_str().parse().ok()
}

/// All distinct defect → issue edges, in first-seen order.
pub fn link_edges(defects: &[Defect], marker: &str) -> Vec<LinkEdge> {
    let mut seen = HashSet::new();
    let mut edges = Vec::new();
    for defect in defects {
        for url in &defect.cross_references {
            let Some(issue_id) = extract_issue_id(url, marker) else {
                continue;
            };
            let edge = LinkEdge {
                defect_id: defect.id,
                issue_id,
            };
            if seen.insert(edge) {
                edges.push(edge);
            }
        }
    }
    edges
}

/// A defect with many duplicate user reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateDefect {
    pub id: u64,
    /// Number of distinct issues linking to this defect.
    pub wc_dupes: usize,
    pub component: String,
    pub summary: String,
    /// `"host (n), host (n), host (n)"` over the linked issues.
    pub most_reported: String,
}

/// Format the most frequent hostnames as `"host (n), ..."`.
///
/// Ordered by descending count; equal counts keep first-seen order.
pub fn most_reported<'a, I>(hostnames: I, limit: usize) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts: IndexMap<&str, usize> = IndexMap::new();
    for host in hostnames {
        *counts.entry(host).or_default() += 1;
    }
    let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked
        .into_iter()
        .take(limit)
        .map(|(host, n)| format!("{host} ({n})"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Rank open defects by their number of linked issues and keep the top `limit`.
///
/// Edges to defects outside [`OPEN_STATUSES`] are dropped. Hostnames come
/// from the issue set; links to issues we never fetched still count, they
/// just contribute no hostname. Ties keep first-seen defect order.
pub fn rank_duplicates(
    defects: &[Defect],
    issues: &[Issue],
    marker: &str,
    limit: usize,
) -> Vec<DuplicateDefect> {
    let mut open_defects: HashMap<u64, &Defect> = HashMap::new();
    for defect in defects.iter().filter(|d| is_open_status(&d.status)) {
        open_defects.entry(defect.id).or_insert(defect);
    }

    let mut hostnames: HashMap<u64, &str> = HashMap::new();
    for issue in issues {
        if let Some(host) = issue.hostname.as_deref() {
            hostnames.entry(issue.id).or_insert(host);
        }
    }

    let edges = link_edges(defects, marker);
    let mut per_defect: IndexMap<u64, Vec<Option<&str>>> = IndexMap::new();
    for edge in edges
        .iter()
        .filter(|e| open_defects.contains_key(&e.defect_id))
    {
        per_defect
            .entry(edge.defect_id)
            .or_default()
            .push(hostnames.get(&edge.issue_id).copied());
    }

    debug!(
        edges = edges.len(),
        open_linked = per_defect.len(),
        "Linked defects to issues"
    );

    let mut ranked: Vec<(u64, Vec<Option<&str>>)> = per_defect.into_iter().collect();
    ranked.sort_by(|a, b| b.1.len().cmp(&a.1.len()));

    ranked
        .into_iter()
        .take(limit)
        .filter_map(|(defect_id, hosts)| {
            let defect = open_defects.get(&defect_id)?;
            Some(DuplicateDefect {
                id: defect_id,
                wc_dupes: hosts.len(),
                component: defect.component.clone(),
                summary: defect.summary.clone(),
                most_reported: most_reported(hosts.into_iter().flatten(), MOST_REPORTED_LIMIT),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::types::IssueState;

    const MARKER: &str = "webcompat";

    fn defect(id: u64, status: &str, see_also: &[&str]) -> Defect {
        Defect {
            id,
            summary: format!("summary {id}"),
            component: "Desktop".to_string(),
            status: status.to_string(),
            resolution: String::new(),
            creation_time: Utc::now(),
            last_resolved: None,
            cross_references: see_also.iter().map(ToString::to_string).collect(),
            whiteboard: String::new(),
            keywords: Vec::new(),
        }
    }

    fn issue(id: u64, hostname: Option<&str>) -> Issue {
        Issue {
            id,
            created_at: Utc::now(),
            closed_at: None,
            state: IssueState::Open,
            domain: hostname.map(ToString::to_string),
            hostname: hostname.map(ToString::to_string),
        }
    }

    fn wc(n: u64) -> String {
        format!("https://webcompat.com/issues/{n}")
    }

    #[test]
    fn extract_id_requires_marker_and_two_digits() {
        assert_eq!(extract_issue_id("https://webcompat.com/issues/1234", MARKER), Some(1234));
        assert_eq!(
            extract_issue_id("https://github.com/webcompat/web-bugs/issues/77", MARKER),
            Some(77)
        );
        assert_eq!(extract_issue_id("https://webcompat.com/issues/7", MARKER), None);
        assert_eq!(extract_issue_id("https://bugs.chromium.org/p/1234", MARKER), None);
    }

    #[test]
    fn extract_id_takes_first_digit_run() {
        assert_eq!(
            extract_issue_id("https://webcompat.com/issues/42#comment-99", MARKER),
            Some(42)
        );
    }

    #[test]
    fn oversized_id_is_dropped() {
        let url = format!("https://webcompat.com/issues/{}", "9".repeat(40));
        assert_eq!(extract_issue_id(&url, MARKER), None);
    }

    #[test]
    fn edges_are_deduplicated() {
        let a = wc(100);
        let bugs = vec![
            defect(1, "NEW", &[&a, &a, "https://webcompat.com/issues/100?x=1"]),
            defect(2, "NEW", &[&a]),
        ];
        let edges = link_edges(&bugs, MARKER);
        assert_eq!(
            edges,
            vec![
                LinkEdge { defect_id: 1, issue_id: 100 },
                LinkEdge { defect_id: 2, issue_id: 100 },
            ]
        );
    }

    #[test]
    fn two_defects_same_issue_count_once_each() {
        let a = wc(100);
        let bugs = vec![defect(1, "NEW", &[&a, &a]), defect(2, "ASSIGNED", &[&a])];
        let ranked = rank_duplicates(&bugs, &[issue(100, Some("example.com"))], MARKER, 10);
        assert_eq!(ranked.len(), 2);
        assert!(ranked.iter().all(|d| d.wc_dupes == 1));
        assert_eq!(ranked[0].most_reported, "example.com (1)");
    }

    #[test]
    fn resolved_defects_are_not_ranked() {
        let bugs = vec![
            defect(1, "RESOLVED", &[&wc(10), &wc(11)]),
            defect(2, "REOPENED", &[&wc(12)]),
        ];
        let ranked = rank_duplicates(&bugs, &[], MARKER, 10);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].id, 2);
        assert_eq!(ranked[0].most_reported, "");
    }

    #[test]
    fn ranking_by_count_with_stable_ties() {
        let bugs = vec![
            defect(1, "NEW", &[&wc(10)]),
            defect(2, "NEW", &[&wc(20), &wc(21), &wc(22)]),
            defect(3, "NEW", &[&wc(30)]),
        ];
        let ranked = rank_duplicates(&bugs, &[], MARKER, 10);
        let ids: Vec<_> = ranked.iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![2, 1, 3]);
        assert_eq!(ranked[0].wc_dupes, 3);
        assert_eq!(ranked[0].summary, "summary 2");
        assert_eq!(ranked[0].component, "Desktop");
    }

    #[test]
    fn ranking_truncates_to_limit() {
        let bugs: Vec<Defect> = (1..=15).map(|i| defect(i, "NEW", &[&wc(100 + i)])).collect();
        assert_eq!(rank_duplicates(&bugs, &[], MARKER, 10).len(), 10);
    }

    #[test]
    fn most_reported_hostname_summary() {
        let bugs = vec![defect(
            1,
            "NEW",
            &[&wc(10), &wc(11), &wc(12), &wc(13), &wc(14), &wc(15), &wc(16)],
        )];
        let issues = vec![
            issue(10, Some("b.test")),
            issue(11, Some("a.test")),
            issue(12, Some("a.test")),
            issue(13, Some("c.test")),
            issue(14, Some("d.test")),
            issue(15, None),
            issue(16, Some("b.test")),
        ];
        let ranked = rank_duplicates(&bugs, &issues, MARKER, 10);
        assert_eq!(ranked[0].wc_dupes, 7);
        assert_eq!(ranked[0].most_reported, "b.test (2), a.test (2), c.test (1)");
    }

    #[test]
    fn most_reported_empty_input() {
        assert_eq!(most_reported(std::iter::empty(), 3), "");
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(100))]

            #[test]
            fn edges_never_repeat(refs in prop::collection::vec((1u64..5, 10u64..20), 0..40)) {
                let bugs: Vec<Defect> = (1u64..5)
                    .map(|id| {
                        let urls: Vec<String> = refs
                            .iter()
                            .filter(|(d, _)| *d == id)
                            .map(|(_, i)| wc(*i))
                            .collect();
                        let url_refs: Vec<&str> = urls.iter().map(String::as_str).collect();
                        defect(id, "NEW", &url_refs)
                    })
                    .collect();
                let edges = link_edges(&bugs, MARKER);
                let unique: HashSet<_> = edges.iter().collect();
                prop_assert_eq!(unique.len(), edges.len());
                let expected: HashSet<_> = refs.iter().collect();
                prop_assert_eq!(edges.len(), expected.len());
            }

            #[test]
            fn extract_issue_id_never_panics(url in "\\PC{0,80}") {
                let _ = extract_issue_id(&url, MARKER);
            }
        }
    }
}
