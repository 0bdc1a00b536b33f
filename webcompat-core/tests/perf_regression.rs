use std::time::{Duration, Instant};

use chrono::{Duration as Days, TimeZone, Utc};

use webcompat_core::config::CompatConfig;
use webcompat_core::report::{Snapshot, build_report};
use webcompat_core::types::{Defect, Issue, IssueState};

fn threshold_ms(var: &str, default_ms: u64) -> Duration {
    let ms = std::env::var(var)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default_ms);
    Duration::from_millis(ms)
}

#[test]
#[ignore = "performance gate; run explicitly in CI/dev workflows"]
fn perf_report_under_threshold() {
    let now = Utc.with_ymd_and_hms(2018, 9, 1, 0, 0, 0).unwrap();
    let issues: Vec<Issue> = (0..200_000u64)
        .map(|i| Issue {
            id: i,
            created_at: now - Days::days((i % 700) as i64),
            closed_at: None,
            state: if i % 3 == 0 { IssueState::Closed } else { IssueState::Open },
            domain: None,
            hostname: Some(format!("host{}.example", i % 5000)),
        })
        .collect();
    let defects: Vec<Defect> = (0..20_000u64)
        .map(|i| Defect {
            id: i,
            summary: String::new(),
            component: String::new(),
            status: "NEW".to_string(),
            resolution: String::new(),
            creation_time: now - Days::days((i % 1000) as i64),
            last_resolved: None,
            cross_references: vec![format!("https://webcompat.com/issues/{}", i * 7 % 200_000)],
            whiteboard: "[platform-rel-amazon]".to_string(),
            keywords: Vec::new(),
        })
        .collect();

    let config = CompatConfig::default();
    let start = Instant::now();
    let report = build_report(
        Snapshot {
            issues: &issues,
            linked_defects: &defects,
            partner_defects: &defects,
        },
        &config,
        now,
    )
    .unwrap();
    let elapsed = start.elapsed();

    assert_eq!(report.by_partner["amazon.com"].summary.n_open, 20_000);
    assert!(
        elapsed <= threshold_ms("WEBCOMPAT_PERF_REPORT_MS", 3000),
        "report assembly exceeded threshold: {elapsed:?}"
    );
}
