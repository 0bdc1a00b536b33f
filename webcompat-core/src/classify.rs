// Partner tag classifier: buckets platform defects by partner using the
// bracketed whiteboard tags, and builds the matching Bugzilla search links.

use std::collections::HashSet;
use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;
use reqwest::Url;
use tracing::debug;

use crate::error::ConfigError;
use crate::types::{Defect, PartnerSpec};

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]").expect("tag pattern is valid"));

/// Whiteboard tag marking a defect as waiting on the site owner.
pub const SITEWAIT_TAG: &str = "sitewait";

/// Extract every `[tag]` from a whiteboard, lowercased, in order of appearance.
pub fn extract_tags(whiteboard: &str) -> Vec<String> {
    let lower = whiteboard.to_lowercase();
    TAG_RE
        .captures_iter(&lower)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
        .collect()
}

/// A partner spec with its tags expanded to the on-whiteboard (prefixed) form.
#[derive(Debug, Clone)]
struct PrefixedSpec {
    site: String,
    include: HashSet<String>,
    exclude: HashSet<String>,
}

impl PrefixedSpec {
    fn new(spec: &PartnerSpec, prefix: &str) -> Self {
        let expand = |tags: &[String]| {
            tags.iter()
                .map(|t| format!("{prefix}{}", t.to_lowercase()))
                .collect::<HashSet<_>>()
        };
        Self {
            site: spec.site.clone(),
            include: expand(&spec.include),
            exclude: expand(&spec.exclude),
        }
    }

    /// Exclusion is checked first and only vetoes this partner.
    fn matches(&self, tags: &[String]) -> bool {
        if tags.iter().any(|t| self.exclude.contains(t)) {
            return false;
        }
        tags.iter().any(|t| self.include.contains(t))
    }
}

/// Immutable partner table, built once from configuration.
#[derive(Debug, Clone)]
pub struct PartnerClassifier {
    specs: Vec<PrefixedSpec>,
}

impl PartnerClassifier {
    pub fn new(partners: &[PartnerSpec], tag_prefix: &str) -> Self {
        Self {
            specs: partners
                .iter()
                .map(|p| PrefixedSpec::new(p, tag_prefix))
                .collect(),
        }
    }

    /// Partners a single defect belongs to, in table order.
    pub fn partners_for(&self, defect: &Defect) -> Vec<&str> {
        let tags = extract_tags(&defect.whiteboard);
        self.specs
            .iter()
            .filter(|spec| spec.matches(&tags))
            .map(|spec| spec.site.as_str())
            .collect()
    }

    /// Group defects by partner. Keys follow table order; partners without a
    /// matching defect are left out.
    pub fn classify<'a>(&self, defects: &'a [Defect]) -> IndexMap<String, Vec<&'a Defect>> {
        let mut by_partner: IndexMap<String, Vec<&'a Defect>> = self
            .specs
            .iter()
            .map(|spec| (spec.site.clone(), Vec::new()))
            .collect();

        for defect in defects {
            let tags = extract_tags(&defect.whiteboard);
            for spec in &self.specs {
                if spec.matches(&tags) {
                    if let Some(bucket) = by_partner.get_mut(&spec.site) {
                        bucket.push(defect);
                    }
                }
            }
        }

        by_partner.retain(|_, bugs| !bugs.is_empty());
        debug!(
            defects = defects.len(),
            partners = by_partner.len(),
            "Classified partner defects"
        );
        by_partner
    }
}

// ── Bugzilla search links ──────────────────────────────────────────

/// Search links shown next to each partner's counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartnerQueryUrls {
    pub open_url: String,
    pub sitewait_url: String,
    pub regression_url: String,
}

impl PartnerQueryUrls {
    pub fn build(
        spec: &PartnerSpec,
        base_url: &str,
        tag_prefix: &str,
    ) -> Result<Self, ConfigError> {
        let search = format!("{}/buglist.cgi", base_url.trim_end_matches('/'));

        let open = whiteboard_clauses(spec, tag_prefix, 1);

        let mut sitewait = vec![
            ("f1".to_string(), "status_whiteboard".to_string()),
            ("o1".to_string(), "substring".to_string()),
            ("v1".to_string(), format!("[{SITEWAIT_TAG}]")),
        ];
        sitewait.extend(whiteboard_clauses(spec, tag_prefix, 2));

        let mut regression = vec![
            ("keywords".to_string(), "regression".to_string()),
            ("keywords_type".to_string(), "allwords".to_string()),
        ];
        regression.extend(whiteboard_clauses(spec, tag_prefix, 1));

        Ok(Self {
            open_url: search_url(&search, &open)?,
            sitewait_url: search_url(&search, &sitewait)?,
            regression_url: search_url(&search, &regression)?,
        })
    }
}

fn search_url(search: &str, clauses: &[(String, String)]) -> Result<String, ConfigError> {
    Url::parse_with_params(search, clauses)
        .map(String::from)
        .map_err(|e| ConfigError::Invalid(format!("bugzilla.base_url: {e}")))
}

/// Advanced-search clauses selecting unresolved bugs that carry any include
/// tag and none of the exclude tags. Field numbering starts at `first_field`.
fn whiteboard_clauses(
    spec: &PartnerSpec,
    tag_prefix: &str,
    first_field: u32,
) -> Vec<(String, String)> {
    let mut n = first_field;
    let mut clauses = vec![
        ("resolution".to_string(), "---".to_string()),
        ("query_format".to_string(), "advanced".to_string()),
        (format!("f{n}"), "OP".to_string()),
        (format!("j{n}"), "OR".to_string()),
    ];
    n += 1;
    for tag in &spec.include {
        clauses.push((format!("f{n}"), "status_whiteboard".to_string()));
        clauses.push((format!("o{n}"), "substring".to_string()));
        clauses.push((format!("v{n}"), format!("[{tag_prefix}{tag}]")));
        n += 1;
    }
    clauses.push((format!("f{n}"), "CP".to_string()));
    n += 1;

    if spec.exclude.is_empty() {
        return clauses;
    }

    clauses.push((format!("f{n}"), "OP".to_string()));
    clauses.push((format!("n{n}"), "1".to_string()));
    n += 1;
    for tag in &spec.exclude {
        clauses.push((format!("f{n}"), "status_whiteboard".to_string()));
        clauses.push((format!("o{n}"), "substring".to_string()));
        clauses.push((format!("v{n}"), format!("[{tag_prefix}{tag}]")));
        n += 1;
    }
    clauses.push((format!("f{n}"), "CP".to_string()));
    clauses
}
