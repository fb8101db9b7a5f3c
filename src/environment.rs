use std::env;
use std::path::PathBuf;

use chrono::FixedOffset;
use tracing::warn;

use crate::index::BucketOrder;
use crate::TARGET_CONFIG;

pub const FEED_PATH_VAR: &str = "KANPO_FEED_PATH";
pub const UTC_OFFSET_VAR: &str = "KANPO_UTC_OFFSET";
pub const BUCKET_ORDER_VAR: &str = "KANPO_BUCKET_ORDER";
pub const RECENT_LIMIT_VAR: &str = "KANPO_RECENT_LIMIT";

const DEFAULT_FEED_PATH: &str = "data/kanpo_feed.json";
const DEFAULT_RECENT_LIMIT: usize = 5;

/// Settings for the calendar binaries.
///
/// The library itself never reads the environment; callers build this and
/// pass the pieces in.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarConfig {
    pub feed_path: PathBuf,
    /// Fixed zone to index in; `None` means the host's local timezone.
    pub utc_offset: Option<FixedOffset>,
    pub bucket_order: BucketOrder,
    pub recent_limit: usize,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        CalendarConfig {
            feed_path: PathBuf::from(DEFAULT_FEED_PATH),
            utc_offset: None,
            bucket_order: BucketOrder::default(),
            recent_limit: DEFAULT_RECENT_LIMIT,
        }
    }
}

impl CalendarConfig {
    /// Reads settings from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Reads settings through `lookup`. Unparseable values are logged and
    /// replaced by their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = CalendarConfig::default();

        if let Some(path) = non_empty(lookup(FEED_PATH_VAR)) {
            config.feed_path = PathBuf::from(path);
        }

        if let Some(offset) = non_empty(lookup(UTC_OFFSET_VAR)) {
            match parse_utc_offset(&offset) {
                Some(parsed) => config.utc_offset = Some(parsed),
                None => warn!(
                    target: TARGET_CONFIG,
                    "Ignoring {}={:?}: expected an offset like +09:00",
                    UTC_OFFSET_VAR,
                    offset
                ),
            }
        }

        if let Some(order) = non_empty(lookup(BUCKET_ORDER_VAR)) {
            match order.parse() {
                Ok(parsed) => config.bucket_order = parsed,
                Err(err) => warn!(target: TARGET_CONFIG, "Ignoring {}: {}", BUCKET_ORDER_VAR, err),
            }
        }

        if let Some(limit) = non_empty(lookup(RECENT_LIMIT_VAR)) {
            match limit.trim().parse() {
                Ok(parsed) => config.recent_limit = parsed,
                Err(_) => warn!(
                    target: TARGET_CONFIG,
                    "Ignoring {}={:?}: not a number",
                    RECENT_LIMIT_VAR,
                    limit
                ),
            }
        }

        config
    }
}

/// Parses `+09:00`, `+0900` or `-05:00` into a fixed offset.
pub fn parse_utc_offset(value: &str) -> Option<FixedOffset> {
    let value = value.trim();
    let (sign, rest) = match value.chars().next()? {
        '+' => (1, &value[1..]),
        '-' => (-1, &value[1..]),
        _ => return None,
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let hours: i32 = digits[..2].parse().ok()?;
    let minutes: i32 = digits[2..].parse().ok()?;
    if minutes >= 60 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        assert_eq!(CalendarConfig::from_lookup(lookup(&[])), CalendarConfig::default());
        assert_eq!(
            CalendarConfig::default().feed_path,
            PathBuf::from("data/kanpo_feed.json")
        );
    }

    #[test]
    fn test_reads_all_settings() {
        let config = CalendarConfig::from_lookup(lookup(&[
            (FEED_PATH_VAR, "/srv/kanpo/feed.json"),
            (UTC_OFFSET_VAR, "+09:00"),
            (BUCKET_ORDER_VAR, "newest"),
            (RECENT_LIMIT_VAR, "10"),
        ]));
        assert_eq!(config.feed_path, PathBuf::from("/srv/kanpo/feed.json"));
        assert_eq!(config.utc_offset, FixedOffset::east_opt(9 * 3600));
        assert_eq!(config.bucket_order, BucketOrder::NewestFirst);
        assert_eq!(config.recent_limit, 10);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = CalendarConfig::from_lookup(lookup(&[
            (FEED_PATH_VAR, "  "),
            (UTC_OFFSET_VAR, "Asia/Tokyo"),
            (BUCKET_ORDER_VAR, "shuffle"),
            (RECENT_LIMIT_VAR, "many"),
        ]));
        assert_eq!(config, CalendarConfig::default());
    }

    #[test]
    fn test_parse_utc_offset() {
        assert_eq!(parse_utc_offset("-05:00"), FixedOffset::west_opt(5 * 3600));
        assert_eq!(parse_utc_offset("+0900"), FixedOffset::east_opt(9 * 3600));
        assert_eq!(parse_utc_offset("+05:30"), FixedOffset::east_opt(5 * 3600 + 30 * 60));
        assert_eq!(parse_utc_offset("nine"), None);
        assert_eq!(parse_utc_offset("09:00"), None);
        assert_eq!(parse_utc_offset("+9"), None);
    }
}
