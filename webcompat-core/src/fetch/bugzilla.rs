// Bugzilla REST client: the two read-only bug searches the report needs.

use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::{debug, info, instrument};

use crate::config::BugzillaSection;
use crate::error::{ConfigError, FetchError};
use crate::types::Defect;

use super::common::{endpoint, get_json, http_client};
use super::traits::DefectSource;

const SOURCE: &str = "Bugzilla";

/// Fields requested for defects found through `see_also`.
pub const LINKED_FIELDS: [&str; 10] = [
    "id",
    "summary",
    "product",
    "component",
    "votes",
    "creation_time",
    "last_change_time",
    "status",
    "resolution",
    "see_also",
];

#[derive(Debug, Deserialize)]
struct BugList {
    bugs: Vec<Defect>,
}

/// Defects whose `see_also` matches the configured pattern.
pub fn linked_query_url(section: &BugzillaSection) -> Result<Url, ConfigError> {
    endpoint(
        &section.base_url,
        "/rest/bug",
        &[
            ("o1", "regexp".to_string()),
            ("v1", section.see_also_pattern.clone()),
            ("f1", "see_also".to_string()),
            ("limit", "0".to_string()),
            ("include_fields", LINKED_FIELDS.join(",")),
        ],
    )
}

/// Whiteboard substring shared by every partner tag, e.g. `[platform-rel`.
pub fn partner_marker(tag_prefix: &str) -> String {
    format!("[{}", tag_prefix.trim_end_matches('-'))
}

pub fn partner_query_url(section: &BugzillaSection) -> Result<Url, ConfigError> {
    endpoint(
        &section.base_url,
        "/rest/bug",
        &[
            ("status_whiteboard_type", "substring".to_string()),
            ("status_whiteboard", partner_marker(&section.partner_tag_prefix)),
        ],
    )
}

#[derive(Debug)]
pub struct BugzillaClient {
    section: BugzillaSection,
    client: Client,
}

impl BugzillaClient {
    pub fn new(section: &BugzillaSection) -> Result<Self, FetchError> {
        Ok(Self {
            section: section.clone(),
            client: http_client(SOURCE)?,
        })
    }

    async fn search(&self, url: Url) -> crate::error::Result<Vec<Defect>> {
        debug!(url = %url, "Bugzilla API request");
        let req = self.client.get(url).header("Accept", "application/json");
        let list: BugList = get_json(req, SOURCE).await?;
        Ok(list.bugs)
    }
}

#[async_trait::async_trait]
impl DefectSource for BugzillaClient {
    #[instrument(skip_all)]
    async fn fetch_linked_defects(&self) -> crate::error::Result<Vec<Defect>> {
        let bugs = self.search(linked_query_url(&self.section)?).await?;
        info!(count = bugs.len(), "Fetched linked defects");
        Ok(bugs)
    }

    #[instrument(skip_all)]
    async fn fetch_partner_defects(&self) -> crate::error::Result<Vec<Defect>> {
        let bugs = self.search(partner_query_url(&self.section)?).await?;
        info!(count = bugs.len(), "Fetched partner defects");
        Ok(bugs)
    }
}
