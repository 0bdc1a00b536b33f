use crate::types::{CacheStats, CachedIssue, IssueRecord};

/// The issue cache abstraction. Refresh writes through it; report runs read
/// the projected rows back out.
#[async_trait::async_trait]
pub trait IssueStore: Send + Sync {
    /// Latest `updated_at` among cached issues, or `None` for an empty cache.
    async fn watermark(&self) -> crate::error::Result<Option<String>>;

    /// Insert or replace one issue by number.
    async fn upsert_issue(&self, issue: &CachedIssue) -> crate::error::Result<()>;

    /// Insert or replace a page of issues within a single transaction.
    /// Returns the number of rows written.
    async fn upsert_issues_batch(&self, issues: &[CachedIssue]) -> crate::error::Result<usize>;

    /// Every cached issue projected to the fields the engine reads, ordered
    /// by issue number.
    async fn load_issues(&self) -> crate::error::Result<Vec<IssueRecord>>;

    async fn stats(&self) -> crate::error::Result<CacheStats>;
}
