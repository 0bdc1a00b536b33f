// Report assembly: runs the engine over one snapshot of issues and defects
// and merges the pieces into the document the dashboard consumes.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use tracing::{info, instrument};

use crate::aggregate::{top_open_hostnames, top_recent_hostnames};
use crate::classify::{PartnerClassifier, PartnerQueryUrls};
use crate::config::CompatConfig;
use crate::link::{DuplicateDefect, rank_duplicates};
use crate::timeseries::{PartnerReport, date_axis, summarize_partner};
use crate::types::{Defect, Issue};

/// The dashboard document. Field order is the on-disk key order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub last_updated: String,
    pub open: IndexMap<String, usize>,
    pub last30: IndexMap<String, usize>,
    pub bugzilla: Vec<DuplicateDefect>,
    pub dates_x: Vec<String>,
    pub by_partner: IndexMap<String, PartnerReport>,
}

impl Report {
    /// Structural merge of already computed sections.
    pub fn assemble(
        generated_at: DateTime<Utc>,
        open: IndexMap<String, usize>,
        last30: IndexMap<String, usize>,
        bugzilla: Vec<DuplicateDefect>,
        axis: &[NaiveDate],
        by_partner: IndexMap<String, PartnerReport>,
    ) -> Self {
        Self {
            last_updated: generated_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            open,
            last30,
            bugzilla,
            dates_x: axis.iter().map(|d| d.format("%Y-%m-%d").to_string()).collect(),
            by_partner,
        }
    }

    pub fn to_json(&self, pretty: bool) -> serde_json::Result<String> {
        if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        }
    }
}

/// Everything the engine reads for one run.
#[derive(Debug, Clone, Copy)]
pub struct Snapshot<'a> {
    pub issues: &'a [Issue],
    /// Defects found through their `see_also` links.
    pub linked_defects: &'a [Defect],
    /// Defects carrying a partner whiteboard tag.
    pub partner_defects: &'a [Defect],
}

/// Run every stage of the engine over `snapshot` as of `now`.
#[instrument(skip_all, name = "build_report")]
pub fn build_report(
    snapshot: Snapshot<'_>,
    config: &CompatConfig,
    now: DateTime<Utc>,
) -> crate::error::Result<Report> {
    let dashboard = &config.dashboard;
    let bugzilla = &config.bugzilla;

    let open = top_open_hostnames(snapshot.issues, dashboard.top_n);
    let last30 = top_recent_hostnames(
        snapshot.issues,
        now,
        dashboard.recent_days,
        dashboard.top_n,
    );

    let duplicates = rank_duplicates(
        snapshot.linked_defects,
        snapshot.issues,
        &bugzilla.issue_marker,
        dashboard.top_n,
    );

    let axis = date_axis(dashboard.anchor_date, now.date_naive());
    let classifier = PartnerClassifier::new(&config.partners, &bugzilla.partner_tag_prefix);
    let grouped = classifier.classify(snapshot.partner_defects);

    let mut by_partner = IndexMap::with_capacity(grouped.len());
    for spec in &config.partners {
        let Some(defects) = grouped.get(&spec.site) else {
            continue;
        };
        let urls =
            PartnerQueryUrls::build(spec, &bugzilla.base_url, &bugzilla.partner_tag_prefix)?;
        by_partner.insert(spec.site.clone(), summarize_partner(defects, &axis, urls));
    }

    info!(
        issues = snapshot.issues.len(),
        linked_defects = snapshot.linked_defects.len(),
        partner_defects = snapshot.partner_defects.len(),
        partners = by_partner.len(),
        days = axis.len(),
        "Report assembled"
    );

    Ok(Report::assemble(now, open, last30, duplicates, &axis, by_partner))
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::types::IssueState;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2018, 8, 27, 12, 0, 0).unwrap()
    }

    fn issue(id: u64, host: &str, age_days: i64) -> Issue {
        Issue {
            id,
            created_at: now() - Duration::days(age_days),
            closed_at: None,
            state: IssueState::Open,
            domain: Some(format!("https://{host}/")),
            hostname: Some(host.to_string()),
        }
    }

    fn defect(id: u64, whiteboard: &str, see_also: &[u64]) -> Defect {
        Defect {
            id,
            summary: format!("bug {id}"),
            component: "Desktop".to_string(),
            status: "NEW".to_string(),
            resolution: String::new(),
            creation_time: Utc.with_ymd_and_hms(2015, 12, 1, 0, 0, 0).unwrap(),
            last_resolved: None,
            cross_references: see_also
                .iter()
                .map(|n| format!("https://webcompat.com/issues/{n}"))
                .collect(),
            whiteboard: whiteboard.to_string(),
            keywords: Vec::new(),
        }
    }

    #[test]
    fn end_to_end_small_snapshot() {
        let issues = vec![
            issue(10, "old.example", 400),
            issue(11, "recent.example", 2),
            issue(12, "recent.example", 3),
        ];
        let linked = vec![defect(500, "", &[10, 11, 12]), defect(501, "", &[11])];
        let partner = vec![
            defect(600, "[platform-rel-youtube]", &[]),
            defect(601, "[platform-rel-facebook]", &[]),
        ];
        let config = CompatConfig::default();
        let report = build_report(
            Snapshot {
                issues: &issues,
                linked_defects: &linked,
                partner_defects: &partner,
            },
            &config,
            now(),
        )
        .unwrap();

        assert_eq!(report.last_updated, "2018-08-27T12:00:00Z");
        assert_eq!(report.open.keys().next().map(String::as_str), Some("recent.example"));
        assert!(report.open.contains_key("old.example"));
        assert!(!report.last30.contains_key("old.example"));

        assert_eq!(report.bugzilla[0].id, 500);
        assert_eq!(report.bugzilla[0].wc_dupes, 3);
        assert_eq!(
            report.bugzilla[0].most_reported,
            "recent.example (2), old.example (1)"
        );

        let partners: Vec<_> = report.by_partner.keys().map(String::as_str).collect();
        assert_eq!(partners, vec!["youtube.com", "facebook.com"]);
        assert_eq!(report.dates_x.first().map(String::as_str), Some("2016-01-01"));
        assert_eq!(report.dates_x.last().map(String::as_str), Some("2018-08-27"));
        for partner in report.by_partner.values() {
            assert_eq!(partner.summary.open_bugs_y.len(), report.dates_x.len());
            assert_eq!(partner.summary.open_bugs_y[0], 1);
            assert!(partner.summary.open_url.contains("buglist.cgi"));
        }
    }

    #[test]
    fn empty_snapshot_still_has_axis() {
        let config = CompatConfig::default();
        let report = build_report(
            Snapshot {
                issues: &[],
                linked_defects: &[],
                partner_defects: &[],
            },
            &config,
            now(),
        )
        .unwrap();
        assert!(report.open.is_empty());
        assert!(report.bugzilla.is_empty());
        assert!(report.by_partner.is_empty());
        assert!(!report.dates_x.is_empty());
    }

    #[test]
    fn json_has_expected_top_level_keys_in_order() {
        let report = Report::assemble(
            now(),
            IndexMap::new(),
            IndexMap::new(),
            Vec::new(),
            &[NaiveDate::from_ymd_opt(2016, 1, 1).unwrap()],
            IndexMap::new(),
        );
        let json = report.to_json(false).unwrap();
        assert_eq!(
            json,
            r#"{"last_updated":"2018-08-27T12:00:00Z","open":{},"last30":{},"bugzilla":[],"dates_x":["2016-01-01"],"by_partner":{}}"#
        );
    }

    #[test]
    fn ranked_maps_serialize_in_rank_order() {
        let mut open = IndexMap::new();
        open.insert("z.test".to_string(), 5);
        open.insert("a.test".to_string(), 2);
        let report = Report::assemble(now(), open, IndexMap::new(), Vec::new(), &[], IndexMap::new());
        let json = report.to_json(false).unwrap();
        assert!(json.contains(r#""open":{"z.test":5,"a.test":2}"#));
    }
}
