use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

// ── Issues (user-report tracker) ───────────────────────────────────

/// Lifecycle state of a user-reported issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    Open,
    Closed,
}

impl IssueState {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "open" => Some(Self::Open),
            "closed" => Some(Self::Closed),
            _ => None,
        }
    }
}

/// A cached issue row as projected out of the store, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueRecord {
    pub number: u64,
    pub created_at: Option<String>,
    pub closed_at: Option<String>,
    pub state: Option<String>,
    pub body: Option<String>,
}

/// A normalized issue. `hostname` is only ever `Some` when `domain` is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub id: u64,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub state: IssueState,
    pub domain: Option<String>,
    pub hostname: Option<String>,
}

// ── Defects (platform tracker) ─────────────────────────────────────

/// A Bugzilla bug, as decoded from the REST API.
///
/// The linked-defect query requests a narrow `include_fields` list, so every
/// field other than `id` and `creation_time` falls back to its empty value.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Defect {
    pub id: u64,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub component: String,
    #[serde(default)]
    pub status: String,
    /// Empty while the bug is unresolved.
    #[serde(default)]
    pub resolution: String,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub creation_time: DateTime<Utc>,
    #[serde(
        default,
        rename = "cf_last_resolved",
        deserialize_with = "deserialize_opt_timestamp"
    )]
    pub last_resolved: Option<DateTime<Utc>>,
    #[serde(default, rename = "see_also")]
    pub cross_references: Vec<String>,
    #[serde(default)]
    pub whiteboard: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl Defect {
    pub fn is_unresolved(&self) -> bool {
        self.resolution.is_empty()
    }

    pub fn has_keyword(&self, keyword: &str) -> bool {
        self.keywords.iter().any(|k| k == keyword)
    }

    /// Last day the defect counts as open; unresolved defects never close.
    pub fn open_until(&self) -> NaiveDate {
        self.last_resolved
            .map_or(NaiveDate::MAX, |t| t.date_naive())
    }
}

// ── Partners ───────────────────────────────────────────────────────

/// One row of the partner table: whiteboard tags that put a defect in (or
/// keep it out of) a partner's bucket. Tags are stored without the
/// `platform-rel-` style prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartnerSpec {
    pub site: String,
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
}

// ── Links ──────────────────────────────────────────────────────────

/// A defect → issue cross-reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LinkEdge {
    pub defect_id: u64,
    pub issue_id: u64,
}

// ── Cache ──────────────────────────────────────────────────────────

/// One issue as returned by the tracker API, ready to be cached verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedIssue {
    pub number: u64,
    /// The tracker's `updated_at`; the cache watermark is the max of these.
    pub updated_at: String,
    pub raw: serde_json::Value,
}

/// Summary of the issue cache, as shown by `webcompat status`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub issue_count: u64,
    pub open_count: u64,
    pub watermark: Option<String>,
}

// ── Timestamps ─────────────────────────────────────────────────────

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
];

/// Parse the timestamp shapes the two trackers emit.
///
/// RFC 3339 with an offset is normalized to UTC; zone-less values (Bugzilla's
/// `cf_last_resolved`, locally generated fixtures) are taken as UTC.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("unrecognized timestamp: {raw}")))
}

fn deserialize_opt_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => parse_timestamp(s)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("unrecognized timestamp: {s}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn parse_rfc3339_with_offset() {
        let t = parse_timestamp("2018-08-27T10:00:00+02:00").unwrap();
        assert_eq!(t.hour(), 8);
    }

    #[test]
    fn parse_zulu_and_naive_shapes() {
        assert!(parse_timestamp("2018-08-27T10:00:00Z").is_some());
        assert!(parse_timestamp("2018-08-27T10:00:00.123456").is_some());
        assert!(parse_timestamp("2018-08-27 10:00:00").is_some());
        let d = parse_timestamp("2018-08-27").unwrap();
        assert_eq!((d.year(), d.month(), d.day()), (2018, 8, 27));
    }

    #[test]
    fn parse_garbage_is_none() {
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("").is_none());
    }

    #[test]
    fn issue_state_parse() {
        assert_eq!(IssueState::parse("open"), Some(IssueState::Open));
        assert_eq!(IssueState::parse("closed"), Some(IssueState::Closed));
        assert_eq!(IssueState::parse("locked"), None);
    }

    #[test]
    fn deserialize_full_partner_defect() {
        let json = r#"{
            "id": 1234567,
            "summary": "Video controls missing",
            "component": "Layout",
            "status": "RESOLVED",
            "resolution": "FIXED",
            "creation_time": "2017-03-01T12:00:00Z",
            "cf_last_resolved": "2017-04-02 08:30:00",
            "see_also": ["https://webcompat.com/issues/4242"],
            "whiteboard": "[platform-rel-youtube][sitewait]",
            "keywords": ["regression"]
        }"#;
        let defect: Defect = serde_json::from_str(json).unwrap();
        assert_eq!(defect.id, 1_234_567);
        assert!(!defect.is_unresolved());
        assert!(defect.has_keyword("regression"));
        assert_eq!(
            defect.open_until(),
            NaiveDate::from_ymd_opt(2017, 4, 2).unwrap()
        );
        assert_eq!(defect.cross_references.len(), 1);
    }

    #[test]
    fn deserialize_narrow_linked_defect() {
        let json = r#"{
            "id": 9,
            "summary": "Site broken",
            "component": "Desktop",
            "status": "NEW",
            "resolution": "",
            "creation_time": "2018-01-01T00:00:00Z",
            "see_also": []
        }"#;
        let defect: Defect = serde_json::from_str(json).unwrap();
        assert!(defect.is_unresolved());
        assert!(defect.whiteboard.is_empty());
        assert!(defect.keywords.is_empty());
        assert_eq!(defect.last_resolved, None);
        assert_eq!(defect.open_until(), NaiveDate::MAX);
    }

    #[test]
    fn null_last_resolved_is_none() {
        let json = r#"{"id": 1, "creation_time": "2018-01-01T00:00:00Z", "cf_last_resolved": null}"#;
        let defect: Defect = serde_json::from_str(json).unwrap();
        assert!(defect.last_resolved.is_none());
    }

    #[test]
    fn bad_creation_time_fails_decode() {
        let json = r#"{"id": 1, "creation_time": "soon"}"#;
        assert!(serde_json::from_str::<Defect>(json).is_err());
    }
}
