// Pipeline orchestrator: optional cache refresh → load issues → fetch
// defects → build the report. Any upstream failure aborts the run.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracing::{info, instrument};

use crate::config::CompatConfig;
use crate::fetch::{DefectSource, IssueFeed, RefreshStats, refresh_cache};
use crate::normalize::normalize_issues;
use crate::progress::{NoopProgress, ProgressReporter};
use crate::report::{Report, Snapshot, build_report};
use crate::store::IssueStore;

/// What a pipeline run produced, beyond the report itself.
#[derive(Debug)]
pub struct PipelineResult {
    pub report: Report,
    /// Present when the run refreshed the cache first.
    pub refresh: Option<RefreshStats>,
    pub issues_cached: usize,
    /// Cached rows that survived normalization.
    pub issues_used: usize,
    pub linked_defects: usize,
    pub partner_defects: usize,
    pub duration: Duration,
}

#[derive(Debug)]
pub struct DashboardPipeline<'a> {
    config: &'a CompatConfig,
}

impl<'a> DashboardPipeline<'a> {
    pub fn new(config: &'a CompatConfig) -> Self {
        Self { config }
    }

    pub async fn run(
        &self,
        store: &dyn IssueStore,
        defects: &dyn DefectSource,
        feed: Option<&dyn IssueFeed>,
        now: DateTime<Utc>,
    ) -> crate::error::Result<PipelineResult> {
        self.run_with_progress(store, defects, feed, now, &NoopProgress)
            .await
    }

    /// Run every stage. `feed` is only consulted when the cache should be
    /// refreshed first.
    #[instrument(skip_all)]
    pub async fn run_with_progress(
        &self,
        store: &dyn IssueStore,
        defects: &dyn DefectSource,
        feed: Option<&dyn IssueFeed>,
        now: DateTime<Utc>,
        progress: &dyn ProgressReporter,
    ) -> crate::error::Result<PipelineResult> {
        let start = Instant::now();

        let refresh = match feed {
            Some(feed) => Some(refresh_cache(store, feed, progress).await?),
            None => None,
        };

        let records = store.load_issues().await?;
        let issues = normalize_issues(&records);
        info!(
            cached = records.len(),
            used = issues.len(),
            "Loaded issues from cache"
        );

        progress.start("Fetching defects", Some(2));
        let linked = defects.fetch_linked_defects().await?;
        progress.advance(1);
        let partner = defects.fetch_partner_defects().await?;
        progress.advance(1);
        progress.finish();

        let report = build_report(
            Snapshot {
                issues: &issues,
                linked_defects: &linked,
                partner_defects: &partner,
            },
            self.config,
            now,
        )?;

        Ok(PipelineResult {
            report,
            refresh,
            issues_cached: records.len(),
            issues_used: issues.len(),
            linked_defects: linked.len(),
            partner_defects: partner.len(),
            duration: start.elapsed(),
        })
    }
}
