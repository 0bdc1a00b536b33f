use std::collections::HashSet;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::PartnerSpec;

/// Widest accepted `dashboard.recent_days`, roughly a century.
pub const MAX_RECENT_DAYS: i64 = 36_500;

/// Top-level configuration, matching `webcompat.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompatConfig {
    #[serde(default)]
    pub dashboard: DashboardSection,
    #[serde(default)]
    pub github: GitHubSection,
    #[serde(default)]
    pub bugzilla: BugzillaSection,
    /// Partner table, in display order.
    #[serde(default = "default_partners")]
    pub partners: Vec<PartnerSpec>,
}

impl Default for CompatConfig {
    fn default() -> Self {
        Self {
            dashboard: DashboardSection::default(),
            github: GitHubSection::default(),
            bugzilla: BugzillaSection::default(),
            partners: default_partners(),
        }
    }
}

impl CompatConfig {
    /// Read and validate a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Parse(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Reject tables that would make the report ambiguous or empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dashboard.top_n == 0 {
            return Err(ConfigError::Invalid("dashboard.top_n must be at least 1".into()));
        }
        if !(0..=MAX_RECENT_DAYS).contains(&self.dashboard.recent_days) {
            return Err(ConfigError::Invalid(format!(
                "dashboard.recent_days must be between 0 and {MAX_RECENT_DAYS}, got {}",
                self.dashboard.recent_days
            )));
        }
        if self.bugzilla.issue_marker.is_empty() {
            return Err(ConfigError::Invalid(
                "bugzilla.issue_marker must not be empty".into(),
            ));
        }

        let mut seen = HashSet::new();
        for partner in &self.partners {
            if !seen.insert(partner.site.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "partner {} is listed more than once",
                    partner.site
                )));
            }
            if partner.include.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "partner {} has no include tags",
                    partner.site
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardSection {
    /// First day of the `dates_x` axis.
    pub anchor_date: NaiveDate,
    /// How many hostnames / defects each ranked list keeps.
    pub top_n: usize,
    /// Width of the "recent" hostname window, in days.
    pub recent_days: i64,
    pub pretty_output: bool,
}

impl Default for DashboardSection {
    fn default() -> Self {
        Self {
            anchor_date: NaiveDate::from_ymd_opt(2016, 1, 1).unwrap_or_default(),
            top_n: 10,
            recent_days: 30,
            pretty_output: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GitHubSection {
    pub owner: String,
    pub repo: String,
    pub api_base: String,
    /// Environment variable holding the API token.
    pub token_env: String,
    pub per_page: u32,
}

impl Default for GitHubSection {
    fn default() -> Self {
        Self {
            owner: "webcompat".to_string(),
            repo: "web-bugs".to_string(),
            api_base: "https://api.github.com".to_string(),
            token_env: "GITHUB_TOKEN".to_string(),
            per_page: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BugzillaSection {
    pub base_url: String,
    /// Regexp matched against `see_also` when fetching linked defects.
    pub see_also_pattern: String,
    /// Substring identifying a cross-reference into the issue tracker.
    pub issue_marker: String,
    /// Prefix applied to partner tags on the whiteboard.
    pub partner_tag_prefix: String,
}

impl Default for BugzillaSection {
    fn default() -> Self {
        Self {
            base_url: "https://bugzilla.mozilla.org".to_string(),
            see_also_pattern: ".*webcompat.*".to_string(),
            issue_marker: "webcompat".to_string(),
            partner_tag_prefix: "platform-rel-".to_string(),
        }
    }
}

fn partner(site: &str, include: &[&str], exclude: &[&str]) -> PartnerSpec {
    PartnerSpec {
        site: site.to_string(),
        include: include.iter().map(ToString::to_string).collect(),
        exclude: exclude.iter().map(ToString::to_string).collect(),
    }
}

/// The partner table shipped with the dashboard.
pub fn default_partners() -> Vec<PartnerSpec> {
    vec![
        partner("youtube.com", &["youtube"], &[]),
        partner("baidu.com", &["baidu"], &[]),
        partner("wikipedia.org", &["wikipedia", "wikimedia"], &[]),
        partner("yahoo.com", &["yahoo!"], &[]),
        partner("reddit.com", &["reddit"], &[]),
        partner(
            "amazon.com",
            &["amazon", "amazonmusic", "amazonshopping", "amazonvideo"],
            &[],
        ),
        partner("twitter.com", &["twitter"], &[]),
        partner("live.com", &["microsoft"], &[]),
        partner("yandex.ru", &["yandex"], &[]),
        partner(
            "google.com",
            &[
                "google",
                "googlecalendar",
                "googledocs",
                "googlehangouts",
                "googlemaps",
                "googlesheets",
                "googleslides",
                "googlesuite",
            ],
            &["youtube"],
        ),
        partner("whatsapp.com", &["whatsappweb"], &[]),
        partner("facebook.com", &["facebook"], &["whatsappweb", "instagram"]),
    ]
}
