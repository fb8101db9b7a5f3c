//! Month navigation state and month-grid layout.

use serde::Serialize;
use tracing::debug;

use crate::date_key::{DateKey, YearMonth};
use crate::TARGET_NAVIGATION;

/// Which month is on screen and which date's items are listed.
///
/// The two are independent: moving between months never clears the
/// selection, and selecting a date never moves the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigatorState {
    displayed_month: YearMonth,
    selected_date: DateKey,
}

impl NavigatorState {
    /// Starts on `default_selected`, showing the month it falls in.
    pub fn init(default_selected: DateKey) -> Self {
        NavigatorState {
            displayed_month: YearMonth::of(&default_selected),
            selected_date: default_selected,
        }
    }

    pub fn displayed_month(&self) -> YearMonth {
        self.displayed_month
    }

    pub fn selected_date(&self) -> DateKey {
        self.selected_date
    }

    pub fn go_to_previous_month(self) -> Self {
        let displayed_month = self.displayed_month.previous();
        debug!(target: TARGET_NAVIGATION, "Displayed month {} -> {}", self.displayed_month, displayed_month);
        NavigatorState {
            displayed_month,
            ..self
        }
    }

    pub fn go_to_next_month(self) -> Self {
        let displayed_month = self.displayed_month.next();
        debug!(target: TARGET_NAVIGATION, "Displayed month {} -> {}", self.displayed_month, displayed_month);
        NavigatorState {
            displayed_month,
            ..self
        }
    }

    pub fn select_date(self, key: DateKey) -> Self {
        debug!(target: TARGET_NAVIGATION, "Selected date {}", key);
        NavigatorState {
            selected_date: key,
            ..self
        }
    }

    /// Whether `key` is a day cell of the displayed month.
    pub fn contains(&self, key: &DateKey) -> bool {
        self.displayed_month.contains(key)
    }

    /// Grid for the displayed month with the current selection marked.
    pub fn grid<F>(&self, today: DateKey, has_data: F) -> Vec<GridCell>
    where
        F: Fn(&DateKey) -> bool,
    {
        grid_layout(self.displayed_month, Some(self.selected_date), today, has_data)
    }
}

/// One cell of the month grid, as handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GridCell {
    #[serde(skip)]
    pub date: Option<DateKey>,
    pub storage_key: String,
    pub day_of_month_label: String,
    pub is_blank: bool,
    pub has_data: bool,
    pub is_today: bool,
    pub is_selected: bool,
}

impl GridCell {
    fn blank() -> Self {
        GridCell {
            date: None,
            storage_key: String::new(),
            day_of_month_label: String::new(),
            is_blank: true,
            has_data: false,
            is_today: false,
            is_selected: false,
        }
    }
}

/// Lays out `month` as a Sunday-first grid.
///
/// The result holds one blank per weekday before day 1 followed by one cell
/// per day; there is no trailing padding.
pub fn grid_layout<F>(
    month: YearMonth,
    selected: Option<DateKey>,
    today: DateKey,
    has_data: F,
) -> Vec<GridCell>
where
    F: Fn(&DateKey) -> bool,
{
    let offset = month.first_weekday_offset();
    let days = month.days_in_month();

    let mut cells = Vec::with_capacity((offset + days) as usize);
    cells.extend((0..offset).map(|_| GridCell::blank()));
    cells.extend((1..=days).filter_map(|day| month.day(day)).map(|date| GridCell {
        date: Some(date),
        storage_key: date.to_storage_key(),
        day_of_month_label: date.day().to_string(),
        is_blank: false,
        has_data: has_data(&date),
        is_today: date == today,
        is_selected: selected == Some(date),
    }));
    cells
}
