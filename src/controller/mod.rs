//! The calendar controller.
//!
//! Owns the built index and the navigator state as one unit and answers the
//! two questions the presentation layer asks: which cells make up the
//! displayed month, and which items belong to the selected date.


use chrono::{Local, TimeZone};
use serde::Serialize;
use tracing::{debug, info};

use crate::date_key::{DateKey, YearMonth};
use crate::error::Result;
use crate::feed::{parse_feed_document, Diagnostic, FeedDocument, Item};
use crate::index::{ArticleIndex, IndexOptions};
use crate::navigator::{GridCell, NavigatorState};
use crate::TARGET_NAVIGATION;

/// An item as listed under the selected date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListedItem {
    pub title: String,
    pub link: String,
    pub display_date: String,
}

/// The selected date and everything published on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DaySelection {
    pub date: DateKey,
    pub display_label: String,
    /// Empty when nothing was published that day.
    pub items: Vec<ListedItem>,
}

impl DaySelection {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Calendar state for one loaded feed.
///
/// Every load replaces the index, the navigator and the diagnostics
/// together, so readers never see an index paired with a navigator from a
/// different load.
#[derive(Debug, Clone)]
pub struct CalendarController<Tz: TimeZone = Local> {
    tz: Tz,
    options: IndexOptions,
    index: ArticleIndex,
    navigator: NavigatorState,
    diagnostics: Vec<Diagnostic>,
    updated_at: Option<String>,
}

impl CalendarController<Local> {
    /// Loads `items` using the host's local timezone.
    pub fn load(items: Vec<Item>) -> Self {
        Self::load_in(items, Local, IndexOptions::default())
    }
}

impl<Tz: TimeZone> CalendarController<Tz> {
    pub fn load_in(items: Vec<Item>, tz: Tz, options: IndexOptions) -> Self {
        Self::from_document(
            FeedDocument {
                entries: items,
                ..FeedDocument::default()
            },
            tz,
            options,
        )
    }

    /// Loads a parsed document, keeping its rejected entries as diagnostics.
    ///
    /// The initial selection is the date of the first indexed item, or
    /// today when nothing could be indexed.
    pub fn from_document(document: FeedDocument, tz: Tz, options: IndexOptions) -> Self {
        let FeedDocument {
            updated_at,
            entries,
            positions,
            rejected,
        } = document;

        let (index, excluded) = ArticleIndex::build_in(entries, &tz, options);
        let default_selected = index
            .most_recent_key()
            .unwrap_or_else(|| DateKey::today_in(&tz));
        let navigator = NavigatorState::init(default_selected);

        // Index diagnostics count accepted items only; map them back to
        // their place in the source entries.
        let mut diagnostics = rejected;
        diagnostics.extend(excluded.into_iter().map(|diagnostic| Diagnostic {
            position: positions
                .get(diagnostic.position)
                .copied()
                .unwrap_or(diagnostic.position),
            ..diagnostic
        }));
        diagnostics.sort_by_key(|diagnostic| diagnostic.position);

        info!(
            target: TARGET_NAVIGATION,
            "Calendar loaded with {} items, initial selection {}",
            index.len(),
            default_selected
        );

        CalendarController {
            tz,
            options,
            index,
            navigator,
            diagnostics,
            updated_at,
        }
    }

    /// Parses and loads a JSON feed document.
    pub fn load_json(json: &str, tz: Tz, options: IndexOptions) -> Result<Self> {
        let document = parse_feed_document(json)?;
        Ok(Self::from_document(document, tz, options))
    }

    /// Replaces the loaded items, resetting navigation and selection.
    pub fn reload(&mut self, items: Vec<Item>) {
        *self = Self::load_in(items, self.tz.clone(), self.options);
    }

    /// Replaces the loaded feed from JSON.
    ///
    /// On `MalformedFeed` the current index and state are left as they were.
    pub fn reload_json(&mut self, json: &str) -> Result<()> {
        let document = parse_feed_document(json)?;
        *self = Self::from_document(document, self.tz.clone(), self.options);
        Ok(())
    }

    pub fn on_prev_month(&mut self) -> Vec<GridCell> {
        self.navigator = self.navigator.go_to_previous_month();
        self.current_grid()
    }

    pub fn on_next_month(&mut self) -> Vec<GridCell> {
        self.navigator = self.navigator.go_to_next_month();
        self.current_grid()
    }

    /// Selects the day cell identified by `storage_key`.
    ///
    /// Keys that do not parse or fall outside the displayed month are
    /// ignored and the current selection is returned unchanged.
    pub fn on_select_date(&mut self, storage_key: &str) -> DaySelection {
        match DateKey::from_storage_key(storage_key) {
            Some(key) if self.navigator.contains(&key) => {
                self.navigator = self.navigator.select_date(key);
            }
            _ => {
                debug!(
                    target: TARGET_NAVIGATION,
                    "Ignoring selection of {:?} while showing {}",
                    storage_key,
                    self.navigator.displayed_month()
                );
            }
        }
        self.items_for_selection()
    }

    /// Resolves the selected date against the index.
    pub fn items_for_selection(&self) -> DaySelection {
        let date = self.selected_date();
        let items = self
            .index
            .items_on(&date)
            .iter()
            .map(|item| ListedItem {
                title: item.title.clone(),
                link: item.link.clone(),
                display_date: date.to_display_string(),
            })
            .collect();

        DaySelection {
            date,
            display_label: date.to_display_string(),
            items,
        }
    }

    /// Grid for the displayed month, computed against the current index.
    pub fn current_grid(&self) -> Vec<GridCell> {
        self.navigator
            .grid(DateKey::today_in(&self.tz), |date| self.index.has_data(date))
    }

    pub fn displayed_month(&self) -> YearMonth {
        self.navigator.displayed_month()
    }

    pub fn selected_date(&self) -> DateKey {
        self.navigator.selected_date()
    }

    /// The most recent item of the feed, whose link is the latest issue.
    pub fn latest_item(&self) -> Option<&Item> {
        self.index.most_recent_item()
    }

    /// Up to `limit` of the most recent items, in feed order.
    pub fn recent_items(&self, limit: usize) -> Vec<&Item> {
        self.index.recent(limit)
    }

    /// Entries left out of the calendar during the last load.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn updated_at(&self) -> Option<&str> {
        self.updated_at.as_deref()
    }

    pub fn index(&self) -> &ArticleIndex {
        &self.index
    }
}
