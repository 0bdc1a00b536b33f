// GitHub issue feed: pages through every issue of the report repository,
// optionally only those updated since the cache watermark.

use std::path::Path;

use reqwest::{Client, Url};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::GitHubSection;
use crate::error::{ConfigError, FetchError};
use crate::types::CachedIssue;

use super::common::{endpoint, get_json, http_client};
use super::traits::{IssueFeed, IssuePage};

const SOURCE: &str = "GitHub";

pub const MISSING_TOKEN_MESSAGE: &str =
    "Couldn't find a GitHub token; pass --github-token, set GITHUB_TOKEN, or write it to .token";

/// Pick the API token: explicit value first, then the configured
/// environment variable, then the first line of `token_file`.
pub fn resolve_token(
    explicit: Option<&str>,
    token_env: &str,
    token_file: &Path,
) -> Result<String, FetchError> {
    let from_env = std::env::var(token_env).ok();
    let from_file = std::fs::read_to_string(token_file).ok();

    [explicit.map(str::to_string), from_env, from_file]
        .into_iter()
        .flatten()
        .map(|t| t.lines().next().unwrap_or_default().trim().to_string())
        .find(|t| !t.is_empty())
        .ok_or_else(|| FetchError::MissingCredentials(MISSING_TOKEN_MESSAGE.to_string()))
}

/// One page of the repository's issue listing, all states, optionally only
/// issues updated since `since`.
pub fn issues_page_url(
    section: &GitHubSection,
    page: u32,
    since: Option<&str>,
) -> Result<Url, ConfigError> {
    let mut query = vec![
        ("state", "all".to_string()),
        ("per_page", section.per_page.max(1).to_string()),
        ("page", page.to_string()),
    ];
    if let Some(since) = since {
        query.push(("since", since.to_string()));
    }
    endpoint(
        &section.api_base,
        &format!("/repos/{}/{}/issues", section.owner, section.repo),
        &query,
    )
}

/// GitHub REST issue feed for one repository.
#[derive(Debug)]
pub struct GitHubIssueFeed {
    section: GitHubSection,
    token: String,
    client: Client,
}

impl GitHubIssueFeed {
    pub fn new(section: &GitHubSection, token: String) -> Result<Self, FetchError> {
        Ok(Self {
            section: section.clone(),
            token,
            client: http_client(SOURCE)?,
        })
    }

    fn per_page(&self) -> usize {
        self.section.per_page.max(1) as usize
    }
}

/// Turn one decoded page into cacheable issues. Pull requests share the
/// issues endpoint and are dropped; entries without a number or
/// `updated_at` are skipped with a warning.
pub fn issues_from_page(page: Vec<Value>) -> Vec<CachedIssue> {
    page.into_iter()
        .filter(|raw| raw.get("pull_request").is_none())
        .filter_map(|raw| {
            let number = raw.get("number").and_then(Value::as_u64);
            let updated_at = raw.get("updated_at").and_then(Value::as_str);
            match (number, updated_at) {
                (Some(number), Some(updated_at)) => Some(CachedIssue {
                    number,
                    updated_at: updated_at.to_string(),
                    raw,
                }),
                _ => {
                    warn!(number = ?number, "Skipping issue without number or updated_at");
                    None
                }
            }
        })
        .collect()
}

#[async_trait::async_trait]
impl IssueFeed for GitHubIssueFeed {
    async fn fetch_page(&self, page: u32, since: Option<&str>) -> crate::error::Result<IssuePage> {
        let url = issues_page_url(&self.section, page, since)?;
        debug!(url = %url, page, "GitHub API request");

        let req = self
            .client
            .get(url)
            .header("Accept", "application/vnd.github+json")
            .header("Authorization", format!("Bearer {}", self.token));
        let raw: Vec<Value> = get_json(req, SOURCE).await?;

        let has_more = raw.len() >= self.per_page();
        Ok(IssuePage {
            issues: issues_from_page(raw),
            has_more,
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn first_page_without_watermark() {
        let url = issues_page_url(&GitHubSection::default(), 1, None).unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.github.com/repos/webcompat/web-bugs/issues?state=all&per_page=100&page=1"
        );
    }

    #[test]
    fn later_page_with_watermark() {
        let url =
            issues_page_url(&GitHubSection::default(), 3, Some("2018-08-01T10:00:00Z")).unwrap();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("page".to_string(), "3".to_string())));
        assert!(pairs.contains(&("since".to_string(), "2018-08-01T10:00:00Z".to_string())));
    }

    #[test]
    fn zero_per_page_is_clamped() {
        let section = GitHubSection {
            per_page: 0,
            ..GitHubSection::default()
        };
        let url = issues_page_url(&section, 1, None).unwrap();
        assert!(url.query_pairs().any(|(k, v)| k == "per_page" && v == "1"));
    }

    #[test]
    fn feed_constructs_with_its_own_tls_provider() {
        let feed = GitHubIssueFeed::new(&GitHubSection::default(), "t0ken".to_string()).unwrap();
        assert_eq!(feed.per_page(), 100);
    }

    #[test]
    fn pull_requests_and_incomplete_entries_are_dropped() {
        let page = vec![
            json!({"number": 1, "updated_at": "2018-01-01T00:00:00Z", "state": "open"}),
            json!({"number": 2, "updated_at": "2018-01-01T00:00:00Z", "pull_request": {}}),
            json!({"number": 3}),
            json!({"updated_at": "2018-01-01T00:00:00Z"}),
        ];
        let issues = issues_from_page(page);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].number, 1);
        assert_eq!(issues[0].raw["state"], "open");
    }

    #[test]
    fn explicit_token_wins() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join(".token");
        std::fs::write(&file, "from-file\n").unwrap();
        let token =
            resolve_token(Some("explicit"), "WEBCOMPAT_TEST_UNSET_TOKEN_VAR", &file).unwrap();
        assert_eq!(token, "explicit");
    }

    #[test]
    fn token_file_is_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join(".token");
        std::fs::write(&file, "  from-file  \nsecond line\n").unwrap();
        let token = resolve_token(None, "WEBCOMPAT_TEST_UNSET_TOKEN_VAR", &file).unwrap();
        assert_eq!(token, "from-file");
    }

    #[test]
    fn missing_token_is_actionable() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve_token(Some("  "), "WEBCOMPAT_TEST_UNSET_TOKEN_VAR", &dir.path().join(".token"))
            .unwrap_err();
        assert!(matches!(err, FetchError::MissingCredentials(_)));
        assert!(err.to_string().contains("--github-token"));
    }
}
