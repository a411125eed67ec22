//! Document record and persisted snapshot types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One markdown source unit.
///
/// Serialized in the snapshot format shared with the browser build:
/// `{ id, name, content, createdAt, updatedAt }` with timestamps as epoch
/// milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    id: String,
    name: String,
    content: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    updated_at: DateTime<Utc>,
}

impl Document {
    pub(super) fn new(id: String, name: String, content: String, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name,
            content,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Markdown source; the only input to rendering.
    pub fn content(&self) -> &str {
        &self.content
    }

    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub(super) fn set_name(&mut self, name: String, now: DateTime<Utc>) {
        self.name = name;
        self.touch(now);
    }

    pub(super) fn set_content(&mut self, content: String, now: DateTime<Utc>) {
        self.content = content;
        self.touch(now);
    }

    // Wall clocks can step backwards; the timestamp must not.
    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now.max(self.updated_at).max(self.created_at);
    }
}

/// Current instant truncated to millisecond precision, so in-memory
/// timestamps equal what a snapshot round trip yields.
pub(super) fn now() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(ms: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(ms).unwrap()
    }

    #[test]
    fn test_snapshot_uses_camel_case_and_millis() {
        let doc = Document::new("1700".into(), "a.md".into(), "# A".into(), at(1_700));
        let json = serde_json::to_string(&doc).unwrap();
        assert_eq!(
            json,
            r##"{"id":"1700","name":"a.md","content":"# A","createdAt":1700,"updatedAt":1700}"##
        );
    }

    #[test]
    fn test_parses_browser_snapshot_record() {
        let json = r#"{"id":"1712345678901","name":"notes.md","content":"hi","createdAt":1712345678901,"updatedAt":1712345679000}"#;
        let doc: Document = serde_json::from_str(json).unwrap();
        assert_eq!(doc.id(), "1712345678901");
        assert_eq!(doc.updated_at().timestamp_millis(), 1_712_345_679_000);
    }

    #[test]
    fn test_touch_never_moves_backwards() {
        let mut doc = Document::new("1".into(), "a".into(), String::new(), at(5_000));
        doc.set_content("x".into(), at(4_000));
        assert_eq!(doc.updated_at(), at(5_000));
        doc.set_name("b".into(), at(6_000));
        assert_eq!(doc.updated_at(), at(6_000));
        assert_eq!(doc.created_at(), at(5_000));
    }
}
