//! Parsing of the pre-fetched JSON feed document.

use std::fs;
use std::path::Path;

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use super::types::{Diagnostic, DiagnosticReason, FeedDocument, Item};
use crate::error::{CalendarError, Result};
use crate::TARGET_FEED;

/// Parse a feed document from its JSON text.
///
/// Fails with `MalformedFeed` when the text is not JSON, the top-level value
/// is not an object, or `entries` is missing or not a list. Individual
/// entries that lack a string `title`, `link` or `published` are recorded in
/// `rejected` and skipped.
pub fn parse_feed_document(json: &str) -> Result<FeedDocument> {
    let value: Value = serde_json::from_str(json)
        .map_err(|err| CalendarError::malformed(format!("invalid JSON: {}", err)))?;

    let root = value
        .as_object()
        .ok_or_else(|| CalendarError::malformed("top-level value is not an object"))?;

    let entries = match root.get("entries") {
        Some(Value::Array(entries)) => entries,
        Some(_) => return Err(CalendarError::malformed("`entries` is not a list")),
        None => return Err(CalendarError::malformed("missing `entries`")),
    };

    let mut document = FeedDocument {
        updated_at: root
            .get("updated_at")
            .and_then(Value::as_str)
            .map(str::to_string),
        ..FeedDocument::default()
    };

    for (position, entry) in entries.iter().enumerate() {
        match entry_to_item(entry) {
            Ok(item) => {
                document.entries.push(item);
                document.positions.push(position);
            }
            Err(reason) => {
                let diagnostic = Diagnostic {
                    position,
                    title: entry
                        .get("title")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                    reason,
                };
                warn!(target: TARGET_FEED, "Skipping feed entry {}", diagnostic);
                document.rejected.push(diagnostic);
            }
        }
    }

    info!(
        target: TARGET_FEED,
        "Parsed feed document with {} entries ({} rejected)",
        document.entries.len(),
        document.rejected.len()
    );

    Ok(document)
}

/// Read and parse a feed document from disk.
pub fn load_feed_file(path: &Path) -> Result<FeedDocument> {
    debug!(target: TARGET_FEED, "Reading feed document from {}", path.display());
    let json = fs::read_to_string(path).map_err(|source| CalendarError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_feed_document(&json)
}

fn entry_to_item(entry: &Value) -> std::result::Result<Item, DiagnosticReason> {
    let object = entry.as_object().ok_or(DiagnosticReason::NotAnObject)?;

    Ok(Item {
        title: string_field(object, "title")?,
        link: string_field(object, "link")?,
        published: string_field(object, "published")?,
        id: object.get("id").and_then(Value::as_str).map(str::to_string),
    })
}

fn string_field(
    object: &Map<String, Value>,
    field: &'static str,
) -> std::result::Result<String, DiagnosticReason> {
    object
        .get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(DiagnosticReason::MissingField { field })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_valid_document() {
        let json = r#"{
            "updated_at": "2025-10-03T09:00:00",
            "entries": [
                {"title": "本紙 第1号", "link": "https://www.kanpo.go.jp/a.pdf",
                 "published": "Fri, 03 Oct 2025 08:30:00 +0900", "id": "a"},
                {"title": "号外", "link": "https://www.kanpo.go.jp/b.pdf",
                 "published": "2025-10-01T08:30:00+09:00"}
            ]
        }"#;

        let document = parse_feed_document(json).unwrap();
        assert_eq!(document.updated_at.as_deref(), Some("2025-10-03T09:00:00"));
        assert_eq!(document.entries.len(), 2);
        assert_eq!(document.entries[0].id.as_deref(), Some("a"));
        assert_eq!(document.entries[1].id, None);
        assert_eq!(document.entries[1].title, "号外");
        assert_eq!(document.positions, vec![0, 1]);
        assert!(document.rejected.is_empty());
    }

    #[test]
    fn test_missing_entries_is_malformed() {
        for json in [
            r#"{"updated_at": "x"}"#,
            r#"{"entries": {"title": "x"}}"#,
            r#"{"entries": null}"#,
            r#"[1, 2, 3]"#,
            "not json at all",
        ] {
            assert!(
                matches!(
                    parse_feed_document(json),
                    Err(CalendarError::MalformedFeed { .. })
                ),
                "expected MalformedFeed for {}",
                json
            );
        }
    }

    #[test]
    fn test_empty_entries_is_valid() {
        let document = parse_feed_document(r#"{"entries": []}"#).unwrap();
        assert!(document.entries.is_empty());
        assert!(document.rejected.is_empty());
    }

    #[test]
    fn test_incomplete_entries_are_rejected_not_fatal() {
        let json = r#"{"entries": [
            {"title": "ok", "link": "https://x/1", "published": "2025-10-01"},
            "just a string",
            {"title": "no link", "published": "2025-10-01"},
            {"title": "numeric date", "link": "https://x/2", "published": 20251001}
        ]}"#;

        let document = parse_feed_document(json).unwrap();
        assert_eq!(document.entries.len(), 1);
        assert_eq!(document.positions, vec![0]);
        assert_eq!(
            document.rejected,
            vec![
                Diagnostic {
                    position: 1,
                    title: None,
                    reason: DiagnosticReason::NotAnObject,
                },
                Diagnostic {
                    position: 2,
                    title: Some("no link".to_string()),
                    reason: DiagnosticReason::MissingField { field: "link" },
                },
                Diagnostic {
                    position: 3,
                    title: Some("numeric date".to_string()),
                    reason: DiagnosticReason::MissingField { field: "published" },
                },
            ]
        );
    }

    #[test]
    fn test_positions_skip_rejected_entries() {
        let json = r#"{"entries": [
            42,
            {"title": "a", "link": "https://x/a", "published": "2025-10-01"},
            {"title": "no date", "link": "https://x/n"},
            {"title": "b", "link": "https://x/b", "published": "2025-10-02"}
        ]}"#;

        let document = parse_feed_document(json).unwrap();
        assert_eq!(document.positions, vec![1, 3]);
        assert_eq!(document.rejected[0].position, 0);
        assert_eq!(document.rejected[1].position, 2);
    }

    #[test]
    fn test_load_missing_file_reports_io() {
        let err = load_feed_file(Path::new("/definitely/not/here/kanpo_feed.json")).unwrap_err();
        assert!(matches!(err, CalendarError::Io { .. }));
    }
}
