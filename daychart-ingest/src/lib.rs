//! Timeline JSON document to classified [`Entry`] list.
//!
//! The input is a sequence of `[groupKey, [record, ...]]` pairs. Records that
//! fail validation are rejected one by one and reported; they never abort
//! the rest of the document.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use daychart_core::calendar;
use daychart_core::{ChartError, Entry};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod classify;

pub use classify::{classify, pretty_name, Field, Matcher, Rule, DEFAULT_RULES};

/// One validated input record, before timestamps are interpreted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub name: String,
    pub start: String,
    pub end: String,
    pub tags: Vec<String>,
    pub path: String,
    pub filename: String,
}

impl RawRecord {
    /// Extracts the required fields from a JSON record. Extra fields are ignored.
    pub fn from_value(value: &Value) -> Result<Self, ChartError> {
        if !value.is_object() {
            return Err(ChartError::WrongFieldType {
                field: "record",
                expected: "an object",
            });
        }
        Ok(Self {
            name: require_str(value, "name")?,
            start: require_str(value, "start")?,
            end: require_str(value, "end")?,
            tags: require_tags(value)?,
            path: require_str(value, "path")?,
            filename: require_str(value, "filename")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawGroup {
    pub key: String,
    pub records: Vec<RawRecord>,
}

/// A record that could not be turned into an entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    pub group: String,
    pub index: usize,
    pub error: ChartError,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]: {}", self.group, self.index, self.error)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestReport {
    pub entries: Vec<Entry>,
    pub rejected: Vec<Rejection>,
    /// Records dropped because they start at local midnight.
    pub midnight_dropped: usize,
}

impl IngestReport {
    fn accept(&mut self, group: &str, index: usize, outcome: Result<Option<Entry>, ChartError>) {
        match outcome {
            Ok(Some(entry)) => self.entries.push(entry),
            Ok(None) => self.midnight_dropped += 1,
            Err(error) => {
                let rejection = Rejection {
                    group: group.to_string(),
                    index,
                    error,
                };
                log::warn!("skipping record {rejection}");
                self.rejected.push(rejection);
            }
        }
    }
}

/// Entries for `groups`, classified with [`DEFAULT_RULES`].
pub fn ingest<Tz: TimeZone>(groups: &[RawGroup], tz: &Tz) -> Vec<Entry> {
    ingest_with_rules(groups, tz, DEFAULT_RULES).entries
}

pub fn ingest_with_rules<Tz: TimeZone>(groups: &[RawGroup], tz: &Tz, rules: &[Rule]) -> IngestReport {
    let mut report = IngestReport::default();
    for group in groups {
        for (index, record) in group.records.iter().enumerate() {
            report.accept(&group.key, index, build_entry(record, tz, rules));
        }
    }
    report
}

pub fn ingest_document_str<Tz: TimeZone>(document: &str, tz: &Tz) -> Result<IngestReport, ChartError> {
    let value: Value =
        serde_json::from_str(document).map_err(|err| ChartError::InvalidDocument(err.to_string()))?;
    ingest_document_value(&value, tz)
}

/// Validates and ingests a parsed document.
///
/// Fails only when the document itself is not a list of
/// `[groupKey, records]` pairs.
pub fn ingest_document_value<Tz: TimeZone>(document: &Value, tz: &Tz) -> Result<IngestReport, ChartError> {
    let groups = document
        .as_array()
        .ok_or_else(|| ChartError::InvalidDocument("expected a list of groups".to_string()))?;

    let mut report = IngestReport::default();
    for (position, group) in groups.iter().enumerate() {
        let (key, records) = split_group(group).ok_or_else(|| {
            ChartError::InvalidDocument(format!(
                "group {position} is not a [groupKey, records] pair"
            ))
        })?;
        for (index, record) in records.iter().enumerate() {
            let outcome = RawRecord::from_value(record)
                .and_then(|raw| build_entry(&raw, tz, DEFAULT_RULES));
            report.accept(&key, index, outcome);
        }
    }

    log::debug!(
        "ingested {} entries ({} rejected, {} at midnight)",
        report.entries.len(),
        report.rejected.len(),
        report.midnight_dropped
    );
    Ok(report)
}

/// `None` when the record starts at local midnight.
fn build_entry<Tz: TimeZone>(record: &RawRecord, tz: &Tz, rules: &[Rule]) -> Result<Option<Entry>, ChartError> {
    let start = parse_timestamp(&record.start, tz).ok_or_else(|| ChartError::InvalidTimestamp {
        field: "start",
        value: record.start.clone(),
    })?;
    let end = parse_timestamp(&record.end, tz).ok_or_else(|| ChartError::InvalidTimestamp {
        field: "end",
        value: record.end.clone(),
    })?;
    if end < start {
        return Err(ChartError::InvertedSpan { start, end });
    }
    if calendar::is_local_midnight(tz, start) {
        return Ok(None);
    }

    Ok(Some(Entry {
        name: record.name.clone(),
        pretty_name: pretty_name(&record.name),
        start,
        end,
        tags: record.tags.clone(),
        path: record.path.clone(),
        filename: record.filename.clone(),
        category: classify(record, rules),
    }))
}

const OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M%:z", "%Y-%m-%d %H:%M:%S%.f%:z"];
const LOCAL_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parses an RFC 3339 instant, or a naive date/date-time read as wall-clock
/// time in `tz`. A wall-clock time skipped by a DST jump is moved forward
/// by an hour.
pub fn parse_timestamp<Tz: TimeZone>(value: &str, tz: &Tz) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in OFFSET_FORMATS {
        if let Ok(parsed) = DateTime::parse_from_str(value, format) {
            return Some(parsed.with_timezone(&Utc));
        }
    }
    for format in LOCAL_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return calendar::resolve_local(tz, naive);
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .map(|date| calendar::local_midnight(tz, date))
}

fn split_group(group: &Value) -> Option<(String, &Vec<Value>)> {
    let pair = group.as_array()?;
    if pair.len() != 2 {
        return None;
    }
    let key = match &pair[0] {
        Value::String(key) => key.clone(),
        Value::Number(key) => key.to_string(),
        _ => return None,
    };
    Some((key, pair[1].as_array()?))
}

fn require_str(record: &Value, field: &'static str) -> Result<String, ChartError> {
    match record.get(field) {
        None | Some(Value::Null) => Err(ChartError::MissingField(field)),
        Some(Value::String(text)) => Ok(text.clone()),
        Some(_) => Err(ChartError::WrongFieldType {
            field,
            expected: "a string",
        }),
    }
}

/// Tags come as a list of strings, or as one org-style string such as `:ops:urgent:`.
fn require_tags(record: &Value) -> Result<Vec<String>, ChartError> {
    let wrong_type = ChartError::WrongFieldType {
        field: "tags",
        expected: "a list of strings",
    };
    match record.get("tags") {
        None | Some(Value::Null) => Err(ChartError::MissingField("tags")),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string).ok_or_else(|| wrong_type.clone()))
            .collect(),
        Some(Value::String(text)) => Ok(text
            .split(|c: char| c == ':' || c.is_whitespace())
            .filter(|tag| !tag.is_empty())
            .map(str::to_string)
            .collect()),
        Some(_) => Err(wrong_type),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Timelike};
    use serde_json::json;

    #[test]
    fn timestamps_with_and_without_offsets() {
        let tz = FixedOffset::east_opt(3600).unwrap();
        let expected = Utc.with_ymd_and_hms(2024, 1, 2, 8, 30, 0).unwrap();
        assert_eq!(parse_timestamp("2024-01-02T09:30:00+01:00", &tz), Some(expected));
        assert_eq!(parse_timestamp("2024-01-02T08:30:00Z", &tz), Some(expected));
        assert_eq!(parse_timestamp("2024-01-02T09:30+01:00", &tz), Some(expected));
        assert_eq!(parse_timestamp("2024-01-02T09:30:00", &tz), Some(expected));
        assert_eq!(parse_timestamp("2024-01-02 09:30", &tz), Some(expected));
        assert_eq!(parse_timestamp(" 2024-01-02T09:30:00.000 ", &tz), Some(expected));

        let date_only = parse_timestamp("2024-01-02", &tz).unwrap();
        assert_eq!(date_only.with_timezone(&tz).hour(), 0);

        assert_eq!(parse_timestamp("yesterday", &tz), None);
        assert_eq!(parse_timestamp("2024-13-40T09:30:00", &tz), None);
    }

    #[test]
    fn local_times_in_a_dst_gap_are_moved_forward() {
        let tz = chrono_tz::Europe::Berlin;
        // 02:30 does not exist on 2024-03-31 in Berlin; 03:30 CEST does.
        let expected = Utc.with_ymd_and_hms(2024, 3, 31, 1, 30, 0).unwrap();
        assert_eq!(parse_timestamp("2024-03-31T02:30:00", &tz), Some(expected));
        assert_eq!(parse_timestamp("2024-03-31 02:30", &tz), Some(expected));

        // In the repeated hour of autumn the earlier, CEST reading wins.
        let repeated = Utc.with_ymd_and_hms(2024, 10, 27, 0, 30, 0).unwrap();
        assert_eq!(parse_timestamp("2024-10-27T02:30:00", &tz), Some(repeated));

        let document = json!([["2024-03-31", [{
            "name": "night shift", "start": "2024-03-31T02:30:00", "end": "2024-03-31T04:00:00",
            "tags": ["ops"], "path": "", "filename": ""
        }]]]);
        let report = ingest_document_value(&document, &tz).unwrap();
        assert!(report.rejected.is_empty());
        assert_eq!(report.entries.len(), 1);
        assert_eq!(report.entries[0].start, expected);
    }

    #[test]
    fn missing_and_mistyped_fields_are_named() {
        let record = json!({"name": "x", "start": "s", "end": "e", "path": "", "filename": ""});
        assert_eq!(RawRecord::from_value(&record), Err(ChartError::MissingField("tags")));

        let record = json!({"name": null, "start": "s", "end": "e", "tags": [], "path": "", "filename": ""});
        assert_eq!(RawRecord::from_value(&record), Err(ChartError::MissingField("name")));

        let record = json!({"name": "x", "start": 5, "end": "e", "tags": [], "path": "", "filename": ""});
        assert!(matches!(
            RawRecord::from_value(&record),
            Err(ChartError::WrongFieldType { field: "start", .. })
        ));

        let record = json!({"name": "x", "start": "s", "end": "e", "tags": [1], "path": "", "filename": ""});
        assert!(matches!(
            RawRecord::from_value(&record),
            Err(ChartError::WrongFieldType { field: "tags", .. })
        ));

        assert!(RawRecord::from_value(&json!("record")).is_err());
    }

    #[test]
    fn tag_strings_are_split() {
        let record = json!({
            "name": "x", "start": "s", "end": "e", "path": "", "filename": "",
            "tags": ":ops:urgent:", "extra": {"ignored": true}
        });
        let raw = RawRecord::from_value(&record).unwrap();
        assert_eq!(raw.tags, vec!["ops", "urgent"]);
    }

    #[test]
    fn typed_groups_are_ingested() {
        let groups = vec![RawGroup {
            key: "2024-01-02".to_string(),
            records: vec![
                RawRecord {
                    name: "TODO tt.9 rollout".to_string(),
                    start: "2024-01-02T10:00:00Z".to_string(),
                    end: "2024-01-02T11:00:00Z".to_string(),
                    tags: vec![],
                    path: "Work".to_string(),
                    filename: "work.org".to_string(),
                },
                RawRecord {
                    name: "all day".to_string(),
                    start: "2024-01-02T00:00:00Z".to_string(),
                    end: "2024-01-03T00:00:00Z".to_string(),
                    tags: vec![],
                    path: String::new(),
                    filename: String::new(),
                },
            ],
        }];
        let entries = ingest(&groups, &Utc);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].pretty_name, "tt.9 rollout");
        assert_eq!(entries[0].category, daychart_core::Category::Ops);
        // The input is left untouched.
        assert_eq!(groups[0].records[0].name, "TODO tt.9 rollout");
    }

    #[test]
    fn inverted_spans_are_rejected() {
        let document = json!([["g", [{
            "name": "backwards", "start": "2024-01-02T10:00:00Z", "end": "2024-01-02T09:00:00Z",
            "tags": [], "path": "", "filename": ""
        }]]]);
        let report = ingest_document_value(&document, &Utc).unwrap();
        assert!(report.entries.is_empty());
        assert!(matches!(
            report.rejected[0].error,
            ChartError::InvertedSpan { .. }
        ));
        assert_eq!(report.rejected[0].to_string().split(':').next(), Some("g[0]"));
    }

    #[test]
    fn malformed_documents_fail_as_a_whole() {
        assert!(matches!(
            ingest_document_str("{\"not\": \"a list\"}", &Utc),
            Err(ChartError::InvalidDocument(_))
        ));
        assert!(matches!(
            ingest_document_str("[[\"only-key\"]]", &Utc),
            Err(ChartError::InvalidDocument(message)) if message.contains("group 0")
        ));
        assert!(ingest_document_str("not json", &Utc).is_err());
        assert_eq!(ingest_document_str("[]", &Utc).unwrap(), IngestReport::default());
    }
}
