// Fixtures for integration tests: synthetic GitHub issues, Bugzilla rows,
// and an in-process defect source standing in for the REST API.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::{Value, json};

use webcompat_core::config::CompatConfig;
use webcompat_core::fetch::DefectSource;
use webcompat_core::pipeline::{DashboardPipeline, PipelineResult};
use webcompat_core::store::{IssueStore, SqliteIssueStore};
use webcompat_core::types::{CachedIssue, Defect};

pub const WEBCOMPAT_BASE: &str = "https://github.com/webcompat/web-bugs/issues";

static NEXT_NUMBER: AtomicU64 = AtomicU64::new(1000);

fn next_number() -> u64 {
    NEXT_NUMBER.fetch_add(1, Ordering::Relaxed)
}

/// A GitHub issue as the API would return it.
#[derive(Debug, Clone)]
pub struct IssueFixture {
    pub number: u64,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub state: &'static str,
}

impl IssueFixture {
    /// An open issue reporting `url`, filed a day before `now`.
    pub fn for_url(url: &str, now: DateTime<Utc>) -> Self {
        Self {
            number: next_number(),
            body: format!("**URL**: {url}\n\n**Browser / Version**: Firefox 61.0\n"),
            created_at: now - Duration::days(1),
            closed_at: None,
            state: "open",
        }
    }

    pub fn number(mut self, number: u64) -> Self {
        self.number = number;
        self
    }

    pub fn created(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = at;
        self
    }

    pub fn closed(mut self, at: DateTime<Utc>) -> Self {
        self.closed_at = Some(at);
        self.state = "closed";
        self
    }

    pub fn to_json(&self) -> Value {
        json!({
            "number": self.number,
            "title": format!("issue {}", self.number),
            "body": self.body,
            "state": self.state,
            "created_at": self.created_at.to_rfc3339(),
            "updated_at": self.closed_at.unwrap_or(self.created_at).to_rfc3339(),
            "closed_at": self.closed_at.map(|t| t.to_rfc3339()),
        })
    }

    pub fn to_cached(&self) -> CachedIssue {
        CachedIssue {
            number: self.number,
            updated_at: self.closed_at.unwrap_or(self.created_at).to_rfc3339(),
            raw: self.to_json(),
        }
    }
}

/// The reference issue set: one `example.com` report, ten 2010-era
/// `old.example` reports, and ten `recent.example` reports from yesterday.
pub fn generate_webcompat(now: DateTime<Utc>) -> Vec<IssueFixture> {
    let old = Utc.with_ymd_and_hms(2010, 3, 4, 0, 0, 0).single().unwrap_or(now);
    let mut issues = vec![IssueFixture::for_url("https://www.example.com", now)];
    issues.extend(
        (0..10).map(|_| IssueFixture::for_url("https://old.example/some/site", now).created(old)),
    );
    issues.extend((0..10).map(|_| IssueFixture::for_url("https://recent.example/wow.doge", now)));
    issues
}

/// A Bugzilla row as the REST API would return it.
#[derive(Debug, Clone)]
pub struct DefectFixture {
    pub id: u64,
    pub summary: String,
    pub component: String,
    pub status: String,
    pub resolution: String,
    pub creation_time: DateTime<Utc>,
    pub last_resolved: Option<DateTime<Utc>>,
    pub see_also: Vec<String>,
    pub whiteboard: String,
    pub keywords: Vec<String>,
}

impl DefectFixture {
    pub fn new(id: u64, now: DateTime<Utc>) -> Self {
        Self {
            id,
            summary: format!("Bug {id} summary"),
            component: "Component".to_string(),
            status: "NEW".to_string(),
            resolution: String::new(),
            creation_time: now - Duration::days(1),
            last_resolved: None,
            see_also: Vec::new(),
            whiteboard: String::new(),
            keywords: Vec::new(),
        }
    }

    /// A defect whose `see_also` lists the given issue numbers.
    pub fn dupe_of(id: u64, issues: &[u64], now: DateTime<Utc>) -> Self {
        let mut row = Self::new(id, now);
        row.see_also = issues.iter().map(|n| format!("{WEBCOMPAT_BASE}/{n}")).collect();
        row
    }

    pub fn whiteboard(mut self, whiteboard: &str) -> Self {
        self.whiteboard = whiteboard.to_string();
        self
    }

    pub fn keyword(mut self, keyword: &str) -> Self {
        self.keywords.push(keyword.to_string());
        self
    }

    pub fn created(mut self, at: DateTime<Utc>) -> Self {
        self.creation_time = at;
        self
    }

    pub fn resolved(mut self, at: DateTime<Utc>) -> Self {
        self.status = "RESOLVED".to_string();
        self.resolution = "FIXED".to_string();
        self.last_resolved = Some(at);
        self
    }

    pub fn to_json(&self) -> Value {
        json!({
            "id": self.id,
            "summary": self.summary,
            "product": "Firefox",
            "component": self.component,
            "votes": 0,
            "creation_time": self.creation_time.to_rfc3339(),
            "last_change_time": self.creation_time.to_rfc3339(),
            "cf_last_resolved": self
                .last_resolved
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string()),
            "status": self.status,
            "resolution": self.resolution,
            "see_also": self.see_also,
            "whiteboard": self.whiteboard,
            "keywords": self.keywords,
        })
    }

    /// Decode through the same serde path the Bugzilla client uses.
    pub fn to_defect(&self) -> anyhow::Result<Defect> {
        Ok(serde_json::from_value(self.to_json())?)
    }
}

/// Serves fixed defect lists in place of the Bugzilla REST API.
#[derive(Debug, Default)]
pub struct StubDefectSource {
    pub linked: Vec<Defect>,
    pub partner: Vec<Defect>,
}

impl StubDefectSource {
    pub fn new(linked: &[DefectFixture], partner: &[DefectFixture]) -> anyhow::Result<Self> {
        Ok(Self {
            linked: linked.iter().map(DefectFixture::to_defect).collect::<anyhow::Result<_>>()?,
            partner: partner.iter().map(DefectFixture::to_defect).collect::<anyhow::Result<_>>()?,
        })
    }
}

#[async_trait::async_trait]
impl DefectSource for StubDefectSource {
    async fn fetch_linked_defects(&self) -> webcompat_core::error::Result<Vec<Defect>> {
        Ok(self.linked.clone())
    }

    async fn fetch_partner_defects(&self) -> webcompat_core::error::Result<Vec<Defect>> {
        Ok(self.partner.clone())
    }
}

/// An in-memory cache holding `issues`.
pub async fn seeded_store(issues: &[IssueFixture]) -> SqliteIssueStore {
    let store = SqliteIssueStore::in_memory().unwrap();
    let rows: Vec<CachedIssue> = issues.iter().map(IssueFixture::to_cached).collect();
    store.upsert_issues_batch(&rows).await.unwrap();
    store
}

/// Run the pipeline over a seeded cache without refreshing it.
pub async fn run_pipeline(
    issues: &[IssueFixture],
    defects: &StubDefectSource,
    config: &CompatConfig,
    now: DateTime<Utc>,
) -> webcompat_core::error::Result<PipelineResult> {
    let store = seeded_store(issues).await;
    DashboardPipeline::new(config)
        .run(&store, defects, None, now)
        .await
}
