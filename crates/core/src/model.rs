//! Record data model.
//!
//! JSON field names follow the wire format shared by the HTTP surface and the
//! local cache: camelCase, `status` spelled with spaces (`"In Progress"`).

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// How bad a vulnerability is.
///
/// Variants are declared in rank order so the derived `Ord` sorts
/// `Unknown < Low < Medium < High < Critical`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    #[default]
    Unknown,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub const ALL: [Severity; 5] =
        [Severity::Unknown, Severity::Low, Severity::Medium, Severity::High, Severity::Critical];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Unknown => "Unknown",
            Severity::Low => "Low",
            Severity::Medium => "Medium",
            Severity::High => "High",
            Severity::Critical => "Critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = ParseEnumError;

    /// Case-insensitive, so `critical` and `CRITICAL` both parse.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Severity::ALL
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseEnumError { kind: "severity", value: s.to_string() })
    }
}

/// Remediation state of a record. Declared in lifecycle order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Status {
    #[default]
    Open,
    #[serde(rename = "In Progress")]
    InProgress,
    Mitigated,
    Resolved,
}

impl Status {
    pub const ALL: [Status; 4] = [Status::Open, Status::InProgress, Status::Mitigated, Status::Resolved];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Open => "Open",
            Status::InProgress => "In Progress",
            Status::Mitigated => "Mitigated",
            Status::Resolved => "Resolved",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = ParseEnumError;

    /// Accepts the display form plus `in-progress` / `in_progress`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().replace(['-', '_'], " ");
        Status::ALL
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(&normalized))
            .ok_or_else(|| ParseEnumError { kind: "status", value: s.to_string() })
    }
}

/// Unrecognized enum text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value:?}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

/// One tracked vulnerability entry, keyed by `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: String,
    #[serde(default, alias = "name", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub description: String,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default)]
    pub status: Status,
    #[serde(default, deserialize_with = "optional_date", skip_serializing_if = "Option::is_none")]
    pub date_discovered: Option<NaiveDate>,
    pub date_added: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affected_systems: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Record {
    /// Copy of this record with a new status; the only mutation a record allows.
    pub fn with_status(&self, status: Status) -> Record {
        Record { status, ..self.clone() }
    }
}

/// A caller-supplied candidate for the add intent.
///
/// Everything is optional so that missing required fields surface as a
/// validation rejection instead of a parse error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, alias = "name")]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub severity: Option<Severity>,
    #[serde(default)]
    pub status: Option<Status>,
    #[serde(default, deserialize_with = "optional_date")]
    pub date_discovered: Option<NaiveDate>,
    #[serde(default)]
    pub affected_systems: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewRecord {
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self { id: Some(id.into()), description: Some(description.into()), ..Default::default() }
    }
}

/// Forms post `""` for an unset date input.
fn optional_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_severity_rank_order() {
        assert!(Severity::Unknown < Severity::Low);
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::High < Severity::Critical);
    }

    #[test]
    fn test_status_parse_variants() {
        assert_eq!("In Progress".parse::<Status>().unwrap(), Status::InProgress);
        assert_eq!("in-progress".parse::<Status>().unwrap(), Status::InProgress);
        assert_eq!("resolved".parse::<Status>().unwrap(), Status::Resolved);
        assert!("closed".parse::<Status>().is_err());
    }

    #[test]
    fn test_severity_parse_case_insensitive() {
        assert_eq!("CRITICAL".parse::<Severity>().unwrap(), Severity::Critical);
        let err = "severe".parse::<Severity>().unwrap_err();
        assert_eq!(err.kind, "severity");
    }

    #[test]
    fn test_record_wire_format() {
        let record = Record {
            id: "CVE-2024-0001".into(),
            title: None,
            description: "heap overflow".into(),
            severity: Severity::High,
            status: Status::InProgress,
            date_discovered: NaiveDate::from_ymd_opt(2024, 3, 1),
            date_added: "2024-03-02T10:00:00Z".parse().unwrap(),
            affected_systems: Some("web-01".into()),
            notes: None,
        };

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["status"], "In Progress");
        assert_eq!(value["dateDiscovered"], "2024-03-01");
        assert_eq!(value["affectedSystems"], "web-01");
        assert!(value.get("title").is_none());
    }

    #[test]
    fn test_record_defaults_and_name_alias() {
        let record: Record = serde_json::from_value(json!({
            "id": "CVE-1",
            "name": "Log4Shell",
            "description": "x",
            "dateDiscovered": "",
            "dateAdded": "2024-01-01T00:00:00Z"
        }))
        .unwrap();

        assert_eq!(record.title.as_deref(), Some("Log4Shell"));
        assert_eq!(record.severity, Severity::Unknown);
        assert_eq!(record.status, Status::Open);
        assert!(record.date_discovered.is_none());
    }

    #[test]
    fn test_new_record_missing_fields_parse() {
        let draft: NewRecord = serde_json::from_value(json!({ "severity": "Low" })).unwrap();
        assert!(draft.id.is_none());
        assert!(draft.description.is_none());
        assert_eq!(draft.severity, Some(Severity::Low));
    }

    #[test]
    fn test_with_status_keeps_other_fields() {
        let record: Record = serde_json::from_value(json!({
            "id": "CVE-1",
            "description": "x",
            "dateAdded": "2024-01-01T00:00:00Z"
        }))
        .unwrap();

        let updated = record.with_status(Status::Resolved);
        assert_eq!(updated.status, Status::Resolved);
        assert_eq!(updated.id, record.id);
        assert_eq!(updated.date_added, record.date_added);
    }
}
