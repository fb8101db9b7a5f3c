//! Feed document handling for the calendar.
//!
//! This module turns the pre-fetched JSON document into items the index
//! can consume. Fetching the document is left to the caller.

mod parser;
mod types;

pub use self::parser::*;
pub use self::types::*;
