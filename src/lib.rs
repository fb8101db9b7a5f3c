pub mod controller;
pub mod date_key;
pub mod environment;
pub mod error;
pub mod feed;
pub mod index;
pub mod logging;
pub mod navigator;

pub use controller::{CalendarController, DaySelection, ListedItem};
pub use date_key::{DateKey, YearMonth};
pub use error::CalendarError;
pub use feed::{Diagnostic, DiagnosticReason, FeedDocument, Item};
pub use index::{ArticleIndex, BucketOrder, IndexOptions};
pub use navigator::{GridCell, NavigatorState};

pub const TARGET_CONFIG: &str = "calendar_config";
pub const TARGET_FEED: &str = "calendar_feed";
pub const TARGET_INDEX: &str = "calendar_index";
pub const TARGET_NAVIGATION: &str = "calendar_navigation";
