//! Record admission rules.
//!
//! A candidate is admitted when it carries a non-empty `id` and
//! `description` and its `id` is not already taken. Absent severity and
//! status are normalized to `Unknown` and `Open`.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};

use crate::model::{NewRecord, Record, Severity, Status};

/// Why a candidate was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("a record with id {0:?} already exists")]
    DuplicateId(String),
}

/// A candidate that passed validation, waiting for its `dateAdded` stamp.
#[derive(Debug, Clone, PartialEq)]
pub struct Admitted {
    pub id: String,
    pub title: Option<String>,
    pub description: String,
    pub severity: Severity,
    pub status: Status,
    pub date_discovered: Option<NaiveDate>,
    pub affected_systems: Option<String>,
    pub notes: Option<String>,
}

impl Admitted {
    pub fn into_record(self, date_added: DateTime<Utc>) -> Record {
        Record {
            id: self.id,
            title: self.title,
            description: self.description,
            severity: self.severity,
            status: self.status,
            date_discovered: self.date_discovered,
            date_added,
            affected_systems: self.affected_systems,
            notes: self.notes,
        }
    }
}

/// Validate a candidate against the ids already in the registry.
pub fn validate<'a, I>(candidate: NewRecord, existing_ids: I) -> Result<Admitted, Rejection>
where
    I: IntoIterator<Item = &'a str>,
{
    let id = required(candidate.id, "id")?;
    let description = required(candidate.description, "description")?;

    let taken: HashSet<&str> = existing_ids.into_iter().collect();
    if taken.contains(id.as_str()) {
        return Err(Rejection::DuplicateId(id));
    }

    Ok(Admitted {
        id,
        title: optional(candidate.title),
        description,
        severity: candidate.severity.unwrap_or_default(),
        status: candidate.status.unwrap_or_default(),
        date_discovered: candidate.date_discovered,
        affected_systems: optional(candidate.affected_systems),
        notes: optional(candidate.notes),
    })
}

fn required(value: Option<String>, field: &'static str) -> Result<String, Rejection> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(Rejection::MissingField(field)),
    }
}

fn optional(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const NONE: [&str; 0] = [];

    #[test]
    fn test_admits_minimal_candidate_with_defaults() {
        let admitted = validate(NewRecord::new("CVE-1", "x"), NONE).unwrap();
        assert_eq!(admitted.id, "CVE-1");
        assert_eq!(admitted.severity, Severity::Unknown);
        assert_eq!(admitted.status, Status::Open);
    }

    #[test]
    fn test_rejects_missing_id() {
        let candidate = NewRecord { description: Some("x".into()), ..Default::default() };
        assert_eq!(validate(candidate, NONE), Err(Rejection::MissingField("id")));
    }

    #[test]
    fn test_rejects_blank_description() {
        let candidate = NewRecord::new("CVE-1", "   ");
        assert_eq!(validate(candidate, NONE), Err(Rejection::MissingField("description")));
    }

    #[test]
    fn test_rejects_duplicate_id() {
        let result = validate(NewRecord::new("CVE-1", "y"), ["CVE-0", "CVE-1"]);
        assert_eq!(result, Err(Rejection::DuplicateId("CVE-1".into())));
    }

    #[test]
    fn test_trims_id_before_duplicate_check() {
        let result = validate(NewRecord::new("  CVE-1 ", "y"), ["CVE-1"]);
        assert_eq!(result, Err(Rejection::DuplicateId("CVE-1".into())));
    }

    #[test]
    fn test_keeps_explicit_severity_and_drops_empty_optionals() {
        let candidate = NewRecord {
            severity: Some(Severity::Critical),
            status: Some(Status::Mitigated),
            title: Some(String::new()),
            notes: Some("patched upstream".into()),
            ..NewRecord::new("CVE-2", "rce")
        };

        let admitted = validate(candidate, NONE).unwrap();
        assert_eq!(admitted.severity, Severity::Critical);
        assert_eq!(admitted.status, Status::Mitigated);
        assert!(admitted.title.is_none());
        assert_eq!(admitted.notes.as_deref(), Some("patched upstream"));
    }

    #[test]
    fn test_into_record_stamps_date_added() {
        let stamp: DateTime<Utc> = "2024-05-01T12:00:00Z".parse().unwrap();
        let record = validate(NewRecord::new("CVE-3", "z"), NONE).unwrap().into_record(stamp);
        assert_eq!(record.date_added, stamp);
    }
}
