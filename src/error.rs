//! Error types for the calendar engine.

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the calendar engine.
///
/// Only `MalformedFeed` and `Io` are fatal to a load. `InvalidTimestamp` is
/// produced per item and collected into diagnostics by the index builder.
#[derive(Debug, Error)]
pub enum CalendarError {
    /// The feed document has no usable `entries` list.
    #[error("Malformed feed: {reason}")]
    MalformedFeed { reason: String },

    /// A `published` value did not parse to a valid instant.
    #[error("Invalid timestamp: {raw:?}")]
    InvalidTimestamp { raw: String },

    /// The feed file could not be read.
    #[error("Failed to read feed file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CalendarError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        CalendarError::MalformedFeed {
            reason: reason.into(),
        }
    }
}

pub type Result<T, E = CalendarError> = std::result::Result<T, E>;
