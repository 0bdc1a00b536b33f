use crate::types::{CachedIssue, Defect};

/// One page of issues from the tracker.
#[derive(Debug, Clone, Default)]
pub struct IssuePage {
    pub issues: Vec<CachedIssue>,
    /// Whether the tracker may have another page after this one.
    pub has_more: bool,
}

/// Source of raw user-report issues, for refreshing the cache.
#[async_trait::async_trait]
pub trait IssueFeed: Send + Sync {
    /// Fetch page `page` (1-based) of issues in any state, restricted to
    /// those updated at or after `since` when given.
    async fn fetch_page(&self, page: u32, since: Option<&str>) -> crate::error::Result<IssuePage>;
}

/// Source of platform defects.
#[async_trait::async_trait]
pub trait DefectSource: Send + Sync {
    /// Defects whose cross-references point into the issue tracker.
    async fn fetch_linked_defects(&self) -> crate::error::Result<Vec<Defect>>;

    /// Defects carrying any partner whiteboard tag.
    async fn fetch_partner_defects(&self) -> crate::error::Result<Vec<Defect>>;
}
