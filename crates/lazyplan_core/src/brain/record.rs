//! Indexed record types and per-type text extraction.
//!
//! Records arrive as JSON objects from the host store. Field names are
//! accepted in both `snake_case` and `camelCase`.

use crate::brain::{IndexingError, IndexingResult};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const TIMESTAMP_FIELDS: [&[&str]; 4] = [
    &["updated_at", "updatedAt"],
    &["created_at", "createdAt"],
    &["start_time", "startTime"],
    &["timestamp", "date"],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordType {
    Task,
    Goal,
    Session,
    Habit,
    Timeblock,
    Note,
    Insight,
}

impl RecordType {
    pub const ALL: [RecordType; 7] = [
        Self::Task,
        Self::Goal,
        Self::Session,
        Self::Habit,
        Self::Timeblock,
        Self::Note,
        Self::Insight,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Task => "task",
            Self::Goal => "goal",
            Self::Session => "session",
            Self::Habit => "habit",
            Self::Timeblock => "timeblock",
            Self::Note => "note",
            Self::Insight => "insight",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|kind| kind.as_str() == value)
    }

    /// Fields that carry searchable text, in extraction order.
    fn text_fields(self) -> &'static [&'static [&'static str]] {
        match self {
            Self::Task => &[&["title"], &["description"], &["tags"], &["notes"]],
            Self::Goal => &[&["title"], &["description"], &["category"]],
            Self::Session => &[
                &["title"],
                &["activity", "activity_type", "activityType"],
                &["notes", "summary"],
            ],
            Self::Habit => &[&["name", "title"], &["description"], &["frequency"]],
            Self::Timeblock => &[&["title"], &["type", "block_type", "blockType"], &["notes"]],
            Self::Note => &[&["title"], &["content", "body", "text"], &["tags"]],
            Self::Insight => &[&["title"], &["content", "text", "message"], &["category"]],
        }
    }
}

/// Display fields copied from the record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntryMetadata {
    pub title: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
}

impl EntryMetadata {
    pub fn is_completed(&self) -> bool {
        matches!(self.status.as_deref(), Some("completed" | "done" | "achieved"))
    }

    pub fn is_high_priority(&self) -> bool {
        matches!(self.priority.as_deref(), Some("high" | "critical"))
    }
}

/// One indexed record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub id: String,
    pub record_type: RecordType,
    pub content: String,
    pub keywords: Vec<String>,
    pub entities: Vec<String>,
    pub embedding: Vec<f64>,
    pub sentiment: f64,
    /// In `[0, 1]`.
    pub importance: f64,
    pub timestamp: DateTime<Utc>,
    pub metadata: EntryMetadata,
}

impl IndexEntry {
    /// Title if present, else the first 60 characters of content.
    pub fn label(&self) -> String {
        match &self.metadata.title {
            Some(title) => title.clone(),
            None => self.content.chars().take(60).collect(),
        }
    }
}

/// Fields extracted from a raw record before text analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedRecord {
    pub id: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub importance: f64,
    pub metadata: EntryMetadata,
}

pub fn extract(
    record: &Value,
    record_type: RecordType,
    now: DateTime<Utc>,
) -> IndexingResult<ExtractedRecord> {
    let object = record.as_object().ok_or_else(|| {
        IndexingError::InvalidRecord(format!("expected object, got {}", kind_of(record)))
    })?;
    let id = record_id(object).ok_or(IndexingError::MissingId)?;

    let mut parts: Vec<String> = record_type
        .text_fields()
        .iter()
        .filter_map(|names| lookup(object, names))
        .filter_map(text_of)
        .collect();
    if parts.is_empty() {
        parts = object
            .iter()
            .filter(|(key, _)| key.as_str() != "id")
            .filter_map(|(_, value)| value.as_str())
            .map(str::to_string)
            .collect();
    }
    let content = parts
        .into_iter()
        .map(|part| part.trim().to_string())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    if content.is_empty() {
        return Err(IndexingError::EmptyContent { id });
    }

    let metadata = EntryMetadata {
        title: string_field(object, &["title", "name"]),
        status: string_field(object, &["status"]).map(|value| value.to_lowercase()),
        priority: string_field(object, &["priority"]).map(|value| value.to_lowercase()),
    };
    let timestamp = TIMESTAMP_FIELDS
        .iter()
        .find_map(|names| lookup(object, names).and_then(parse_time))
        .unwrap_or(now);
    let deadline = lookup(object, &["deadline", "due_date", "dueDate", "target_date", "targetDate"])
        .and_then(parse_time);
    let importance = importance(&metadata, deadline, now);

    Ok(ExtractedRecord {
        id,
        content,
        timestamp,
        importance,
        metadata,
    })
}

/// Priority base score adjusted by status and deadline proximity.
fn importance(
    metadata: &EntryMetadata,
    deadline: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> f64 {
    let mut score: f64 = match metadata.priority.as_deref() {
        Some("low") => 0.3,
        Some("high") => 0.7,
        Some("critical" | "urgent") => 0.9,
        _ => 0.5,
    };
    match metadata.status.as_deref() {
        Some("in_progress" | "in-progress" | "active") => score += 0.1,
        Some("cancelled" | "archived") => score -= 0.2,
        _ => {}
    }
    if let Some(deadline) = deadline {
        let until = deadline - now;
        if until >= Duration::zero() && until <= Duration::days(7) {
            score += 0.15;
        }
    }
    score.clamp(0.0, 1.0)
}

fn record_id(object: &Map<String, Value>) -> Option<String> {
    match object.get("id")? {
        Value::String(id) if !id.trim().is_empty() => Some(id.trim().to_string()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

fn lookup<'a>(object: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    names
        .iter()
        .find_map(|name| object.get(*name).filter(|value| !value.is_null()))
}

fn string_field(object: &Map<String, Value>, names: &[&str]) -> Option<String> {
    lookup(object, names)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Array(items) => {
            let joined = items
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join(" ");
            (!joined.is_empty()).then_some(joined)
        }
        _ => None,
    }
}

fn parse_time(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(text) => DateTime::parse_from_rfc3339(text)
            .map(|parsed| parsed.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDate::parse_from_str(text, "%Y-%m-%d")
                    .ok()
                    .and_then(|date| date.and_hms_opt(0, 0, 0))
                    .map(|naive| naive.and_utc())
            }),
        // Epoch milliseconds; JS stores may send them as floats.
        Value::Number(millis) => millis
            .as_i64()
            .or_else(|| {
                millis
                    .as_f64()
                    .filter(|value| value.is_finite() && value.abs() < i64::MAX as f64)
                    .map(|value| value.round() as i64)
            })
            .and_then(DateTime::<Utc>::from_timestamp_millis),
        _ => None,
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::{extract, RecordType};
    use crate::brain::IndexingError;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    #[test]
    fn accepts_camel_case_fields() {
        let now = Utc.with_ymd_and_hms(2026, 4, 6, 9, 0, 0).unwrap();
        let record = json!({
            "id": "t-1",
            "title": "Draft chapter one",
            "description": "Outline and first pages",
            "priority": "High",
            "status": "in_progress",
            "updatedAt": "2026-04-05T10:00:00Z",
            "dueDate": "2026-04-08"
        });
        let extracted = extract(&record, RecordType::Task, now).unwrap();
        assert_eq!(extracted.content, "Draft chapter one Outline and first pages");
        assert_eq!(extracted.timestamp, Utc.with_ymd_and_hms(2026, 4, 5, 10, 0, 0).unwrap());
        assert_eq!(extracted.metadata.priority.as_deref(), Some("high"));
        // high 0.7 + in progress 0.1 + due within a week 0.15
        assert!((extracted.importance - 0.95).abs() < 1e-9);
    }

    #[test]
    fn float_epoch_millis_are_accepted() {
        let now = Utc.with_ymd_and_hms(2026, 4, 6, 9, 0, 0).unwrap();
        let record = json!({"id": "s-1", "notes": "Evening review", "timestamp": 1775379600000.0});
        let extracted = extract(&record, RecordType::Session, now).unwrap();
        assert_eq!(extracted.timestamp, Utc.with_ymd_and_hms(2026, 4, 5, 9, 0, 0).unwrap());

        let record = json!({"id": "s-2", "notes": "Bad clock", "timestamp": 1.0e300});
        assert_eq!(extract(&record, RecordType::Session, now).unwrap().timestamp, now);
    }

    #[test]
    fn importance_is_clamped_to_unit_range() {
        let now = Utc.with_ymd_and_hms(2026, 4, 6, 9, 0, 0).unwrap();
        let record = json!({"id": "t-2", "title": "Tax filing", "priority": "critical",
                            "status": "active", "due_date": "2026-04-07"});
        let extracted = extract(&record, RecordType::Task, now).unwrap();
        assert_eq!(extracted.importance, 1.0);
    }

    #[test]
    fn rejects_records_without_id_or_text() {
        let now = Utc::now();
        assert_eq!(
            extract(&json!({"title": "x"}), RecordType::Note, now),
            Err(IndexingError::MissingId)
        );
        assert!(matches!(
            extract(&json!({"id": 4, "count": 3}), RecordType::Note, now),
            Err(IndexingError::EmptyContent { .. })
        ));
        assert!(matches!(
            extract(&json!("text"), RecordType::Note, now),
            Err(IndexingError::InvalidRecord(_))
        ));
    }

    #[test]
    fn unknown_layout_falls_back_to_string_fields() {
        let record = json!({"id": "h-1", "label": "Morning run"});
        let extracted = extract(&record, RecordType::Habit, Utc::now()).unwrap();
        assert_eq!(extracted.content, "Morning run");
        assert!(RecordType::parse("TimeBlock").is_some());
    }
}
