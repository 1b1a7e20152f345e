//! Presentation list derived from the canonical set.
//!
//! [`project`] is pure: it borrows the records, filters them by a
//! case-insensitive substring, and orders them with a stable sort. Descending
//! order reverses the comparator, so records with equal keys keep their
//! canonical-set order in both directions.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::model::Record;

/// Field a projection is ordered by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortField {
    Id,
    Title,
    Description,
    Severity,
    Status,
    #[default]
    DateDiscovered,
    DateAdded,
    AffectedSystems,
}

impl SortField {
    pub const ALL: [SortField; 8] = [
        SortField::Id,
        SortField::Title,
        SortField::Description,
        SortField::Severity,
        SortField::Status,
        SortField::DateDiscovered,
        SortField::DateAdded,
        SortField::AffectedSystems,
    ];

    /// Wire name, matching the record's JSON field.
    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::Id => "id",
            SortField::Title => "title",
            SortField::Description => "description",
            SortField::Severity => "severity",
            SortField::Status => "status",
            SortField::DateDiscovered => "dateDiscovered",
            SortField::DateAdded => "dateAdded",
            SortField::AffectedSystems => "affectedSystems",
        }
    }

    fn compare(&self, a: &Record, b: &Record) -> Ordering {
        fn text(value: &Option<String>) -> &str {
            value.as_deref().unwrap_or("")
        }

        match self {
            SortField::Id => a.id.cmp(&b.id),
            SortField::Title => text(&a.title).cmp(text(&b.title)),
            SortField::Description => a.description.cmp(&b.description),
            SortField::Severity => a.severity.cmp(&b.severity),
            SortField::Status => a.status.cmp(&b.status),
            SortField::DateDiscovered => a.date_discovered.cmp(&b.date_discovered),
            SortField::DateAdded => a.date_added.cmp(&b.date_added),
            SortField::AffectedSystems => text(&a.affected_systems).cmp(text(&b.affected_systems)),
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortField {
    type Err = String;

    /// Accepts the camelCase wire name or its snake_case spelling; `name`
    /// is an alias for `title`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().replace('_', "").to_ascii_lowercase();
        if wanted == "name" {
            return Ok(SortField::Title);
        }
        SortField::ALL
            .into_iter()
            .find(|f| f.as_str().to_ascii_lowercase() == wanted)
            .ok_or_else(|| format!("unknown sort field: {s:?}"))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortOrder::Asc),
            "desc" | "descending" => Ok(SortOrder::Desc),
            other => Err(format!("unknown sort order: {other:?}")),
        }
    }
}

/// Projection parameters, as chosen by the display layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewParams {
    pub filter: String,
    pub sort_field: SortField,
    pub sort_order: SortOrder,
}

impl ViewParams {
    pub fn apply<'a>(&self, records: &'a [Record]) -> Vec<&'a Record> {
        project(records, &self.filter, self.sort_field, self.sort_order)
    }
}

/// Whether a record matches the filter text.
///
/// Matches on `id`, `title`, `description` and `affectedSystems`; an absent
/// field is an empty string.
pub fn matches(record: &Record, filter: &str) -> bool {
    let needle = filter.to_lowercase();
    if needle.is_empty() {
        return true;
    }

    [
        Some(record.id.as_str()),
        record.title.as_deref(),
        Some(record.description.as_str()),
        record.affected_systems.as_deref(),
    ]
    .into_iter()
    .any(|field| field.unwrap_or("").to_lowercase().contains(&needle))
}

/// Filter and order records for display.
pub fn project<'a>(records: &'a [Record], filter: &str, sort_field: SortField, sort_order: SortOrder) -> Vec<&'a Record> {
    let mut view: Vec<&Record> = records.iter().filter(|r| matches(r, filter)).collect();

    // `sort_by` is stable; flipping the operands keeps equal keys in input order.
    match sort_order {
        SortOrder::Asc => view.sort_by(|a, b| sort_field.compare(a, b)),
        SortOrder::Desc => view.sort_by(|a, b| sort_field.compare(b, a)),
    }

    view
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Severity, Status};
    use chrono::NaiveDate;

    fn record(id: &str, severity: Severity) -> Record {
        Record {
            id: id.to_string(),
            title: None,
            description: format!("issue {id}"),
            severity,
            status: Status::Open,
            date_discovered: None,
            date_added: "2024-01-01T00:00:00Z".parse().unwrap(),
            affected_systems: None,
            notes: None,
        }
    }

    fn ids(view: &[&Record]) -> Vec<String> {
        view.iter().map(|r| r.id.clone()).collect()
    }

    #[test]
    fn test_equal_keys_keep_input_order_both_directions() {
        let records = vec![record("A", Severity::Low), record("B", Severity::Low)];

        let asc = project(&records, "", SortField::Severity, SortOrder::Asc);
        let desc = project(&records, "", SortField::Severity, SortOrder::Desc);

        assert_eq!(ids(&asc), vec!["A", "B"]);
        assert_eq!(ids(&desc), vec!["A", "B"]);
    }

    #[test]
    fn test_desc_reverses_comparator_not_output() {
        let records = vec![
            record("A", Severity::Low),
            record("B", Severity::Critical),
            record("C", Severity::Low),
            record("D", Severity::Critical),
        ];

        let desc = project(&records, "", SortField::Severity, SortOrder::Desc);
        assert_eq!(ids(&desc), vec!["B", "D", "A", "C"]);

        let asc = project(&records, "", SortField::Severity, SortOrder::Asc);
        assert_eq!(ids(&asc), vec!["A", "C", "B", "D"]);
    }

    #[test]
    fn test_filter_is_case_insensitive_across_fields() {
        let mut with_systems = record("CVE-2", Severity::High);
        with_systems.affected_systems = Some("Payments-API".into());
        let mut with_title = record("CVE-3", Severity::High);
        with_title.title = Some("OpenSSL heartbeat".into());
        let records = vec![record("CVE-1", Severity::High), with_systems, with_title];

        assert_eq!(ids(&project(&records, "payments", SortField::Id, SortOrder::Asc)), vec!["CVE-2"]);
        assert_eq!(ids(&project(&records, "OPENSSL", SortField::Id, SortOrder::Asc)), vec!["CVE-3"]);
        assert_eq!(ids(&project(&records, "cve-1", SortField::Id, SortOrder::Asc)), vec!["CVE-1"]);
        assert_eq!(project(&records, "", SortField::Id, SortOrder::Asc).len(), 3);
        assert!(project(&records, "nothing-matches", SortField::Id, SortOrder::Asc).is_empty());
    }

    #[test]
    fn test_absent_dates_sort_first_ascending() {
        let mut dated = record("A", Severity::Low);
        dated.date_discovered = NaiveDate::from_ymd_opt(2023, 6, 1);
        let records = vec![dated, record("B", Severity::Low)];

        let asc = project(&records, "", SortField::DateDiscovered, SortOrder::Asc);
        assert_eq!(ids(&asc), vec!["B", "A"]);
    }

    #[test]
    fn test_projection_is_pure() {
        let records = vec![record("B", Severity::High), record("A", Severity::Low)];
        let before = records.clone();

        let first = project(&records, "issue", SortField::Id, SortOrder::Asc);
        let second = project(&records, "issue", SortField::Id, SortOrder::Asc);

        assert_eq!(first, second);
        assert_eq!(records, before);
    }

    #[test]
    fn test_parse_sort_params() {
        assert_eq!("dateAdded".parse::<SortField>().unwrap(), SortField::DateAdded);
        assert_eq!("affected_systems".parse::<SortField>().unwrap(), SortField::AffectedSystems);
        assert_eq!("name".parse::<SortField>().unwrap(), SortField::Title);
        assert!("priority".parse::<SortField>().is_err());
        assert_eq!("DESC".parse::<SortOrder>().unwrap(), SortOrder::Desc);
        assert!("sideways".parse::<SortOrder>().is_err());
    }

    #[test]
    fn test_view_params_default() {
        let params = ViewParams::default();
        assert_eq!(params.sort_field, SortField::DateDiscovered);
        assert_eq!(params.sort_order, SortOrder::Desc);
    }
}
