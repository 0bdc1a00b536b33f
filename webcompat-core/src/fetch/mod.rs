pub mod bugzilla;
pub mod common;
pub mod github;
pub mod traits;

pub use bugzilla::BugzillaClient;
pub use github::{GitHubIssueFeed, resolve_token};
pub use traits::{DefectSource, IssueFeed, IssuePage};

use tracing::{info, instrument};

use crate::progress::ProgressReporter;
use crate::store::IssueStore;

/// Outcome of one cache refresh.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshStats {
    pub pages: u32,
    pub issues_written: usize,
    /// Watermark the refresh started from; `None` means a full fetch.
    pub since: Option<String>,
}

/// Bring the issue cache up to date: fetch every issue updated since the
/// cache watermark and upsert it by number. Safe to re-run.
#[instrument(skip_all)]
pub async fn refresh_cache(
    store: &dyn IssueStore,
    feed: &dyn IssueFeed,
    progress: &dyn ProgressReporter,
) -> crate::error::Result<RefreshStats> {
    let since = store.watermark().await?;
    info!(since = since.as_deref().unwrap_or("<none>"), "Refreshing issue cache");
    progress.start("Fetching issues", None);

    let mut stats = RefreshStats {
        since,
        ..RefreshStats::default()
    };
    let mut page = 1u32;
    loop {
        let batch = feed.fetch_page(page, stats.since.as_deref()).await?;
        stats.pages += 1;
        stats.issues_written += store.upsert_issues_batch(&batch.issues).await?;
        progress.message(&format!("{} issues", stats.issues_written));
        if !batch.has_more {
            break;
        }
        page += 1;
    }

    progress.finish();
    info!(
        pages = stats.pages,
        issues = stats.issues_written,
        "Issue cache refreshed"
    );
    Ok(stats)
}
