//! Type definitions for the feed module.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One published gazette entry.
///
/// `published` keeps the raw value from the feed; it is parsed into a
/// `DateKey` only when the item is indexed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub title: String,
    pub link: String,
    pub published: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl Item {
    pub fn new(
        title: impl Into<String>,
        link: impl Into<String>,
        published: impl Into<String>,
    ) -> Self {
        Item {
            title: title.into(),
            link: link.into(),
            published: published.into(),
            id: None,
        }
    }
}

/// A parsed feed document.
#[derive(Debug, Clone, Default)]
pub struct FeedDocument {
    pub updated_at: Option<String>,
    pub entries: Vec<Item>,
    /// Offset in the source `entries` list of each accepted item, parallel
    /// to `entries`. Empty when the items did not come from a document.
    pub positions: Vec<usize>,
    /// Entries that were present but could not be turned into an `Item`.
    pub rejected: Vec<Diagnostic>,
}


/// Why an entry was left out of the calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiagnosticReason {
    NotAnObject,
    MissingField { field: &'static str },
    InvalidTimestamp { raw: String },
}

/// A non-fatal exclusion, recorded instead of aborting the load.
///
/// `position` is the entry's offset in the source `entries` list. For items
/// handed straight to the index it is their offset in that item list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub position: usize,
    pub title: Option<String>,
    pub reason: DiagnosticReason,
}

impl fmt::Display for DiagnosticReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticReason::NotAnObject => write!(f, "entry is not an object"),
            DiagnosticReason::MissingField { field } => {
                write!(f, "missing or non-string field `{}`", field)
            }
            DiagnosticReason::InvalidTimestamp { raw } => {
                write!(f, "unparseable published value {:?}", raw)
            }
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.title {
            Some(title) => write!(f, "#{} ({}): {}", self.position, title, self.reason),
            None => write!(f, "#{}: {}", self.position, self.reason),
        }
    }
}
