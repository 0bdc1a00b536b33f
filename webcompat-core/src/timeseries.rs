// Time-series windower: per-partner open-defect counts over a daily axis,
// plus the headline counters shown next to each partner.

use chrono::NaiveDate;
use serde::Serialize;

use crate::classify::{PartnerQueryUrls, SITEWAIT_TAG};
use crate::types::Defect;

/// Every calendar day from `anchor` through `today`, inclusive.
///
/// Empty when `anchor` is after `today`.
pub fn date_axis(anchor: NaiveDate, today: NaiveDate) -> Vec<NaiveDate> {
    anchor.iter_days().take_while(|d| *d <= today).collect()
}

/// Number of defects open on each day of `axis`.
///
/// A defect is open on `d` when `created <= d <= last_resolved`; unresolved
/// defects stay open forever. Each defect adds +1 over the index range it
/// covers, and a prefix sum turns the range edits into per-day counts, so
/// the cost is O(defects · log days + days). `axis` must be sorted.
pub fn open_counts(defects: &[&Defect], axis: &[NaiveDate]) -> Vec<usize> {
    let mut delta = vec![0i64; axis.len() + 1];
    for defect in defects {
        let created = defect.creation_time.date_naive();
        let until = defect.open_until();
        let lo = axis.partition_point(|d| *d < created);
        let hi = axis.partition_point(|d| *d <= until);
        if lo < hi {
            delta[lo] += 1;
            delta[hi] -= 1;
        }
    }

    let mut running = 0i64;
    delta[..axis.len()]
        .iter()
        .map(|step| {
            running += step;
            usize::try_from(running).unwrap_or_default()
        })
        .collect()
}

/// Unresolved regression, as listed under a partner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegressionBug {
    pub id: u64,
    pub summary: String,
    pub resolution: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartnerSummary {
    pub n_open: usize,
    pub open_url: String,
    pub n_sitewait: usize,
    pub sitewait_url: String,
    pub n_regression: usize,
    pub regression_url: String,
    /// Open defect count per entry of the report's `dates_x`.
    pub open_bugs_y: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartnerReport {
    pub summary: PartnerSummary,
    pub regression_bugs: Vec<RegressionBug>,
}

/// Counters, regression list, and open series for one partner's defects.
pub fn summarize_partner(
    defects: &[&Defect],
    axis: &[NaiveDate],
    urls: PartnerQueryUrls,
) -> PartnerReport {
    let mut newest_first: Vec<&Defect> = defects.to_vec();
    newest_first.sort_by(|a, b| b.creation_time.cmp(&a.creation_time));

    let mut n_open = 0;
    let mut n_sitewait = 0;
    let mut regression_bugs = Vec::new();

    for defect in newest_first.iter().filter(|d| d.is_unresolved()) {
        n_open += 1;
        if defect.whiteboard.to_lowercase().contains(SITEWAIT_TAG) {
            n_sitewait += 1;
        }
        if defect.has_keyword("regression") {
            regression_bugs.push(RegressionBug {
                id: defect.id,
                summary: defect.summary.clone(),
                resolution: defect.resolution.clone(),
            });
        }
    }

    PartnerReport {
        summary: PartnerSummary {
            n_open,
            open_url: urls.open_url,
            n_sitewait,
            sitewait_url: urls.sitewait_url,
            n_regression: regression_bugs.len(),
            regression_url: urls.regression_url,
            open_bugs_y: open_counts(defects, axis),
        },
        regression_bugs,
    }
}
