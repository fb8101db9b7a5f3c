//! Date-to-items index over a loaded feed.

use std::collections::BTreeMap;

use chrono::{Local, NaiveDateTime, TimeZone};
use tracing::{info, warn};

use crate::date_key::{local_datetime_in, DateKey, YearMonth};
use crate::feed::{Diagnostic, DiagnosticReason, Item};
use crate::TARGET_INDEX;

/// How items inside one date bucket are ordered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BucketOrder {
    /// Keep the order the feed listed them in.
    #[default]
    FeedOrder,
    /// Latest timestamp first; ties keep feed order.
    NewestFirst,
}

impl std::str::FromStr for BucketOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "feed" | "feed_order" => Ok(BucketOrder::FeedOrder),
            "newest" | "newest_first" => Ok(BucketOrder::NewestFirst),
            other => Err(format!("Unknown bucket order: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct IndexOptions {
    pub order: BucketOrder,
}

/// Items grouped by the local calendar date they were published on.
///
/// An index is only ever handed out fully built; rebuilding produces a new
/// value that replaces the old one wholesale.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleIndex {
    buckets: BTreeMap<DateKey, Vec<Item>>,
    /// Bucket and slot of every indexed item, in feed order.
    sequence: Vec<(DateKey, usize)>,
}

struct Pending {
    seq: usize,
    stamp: NaiveDateTime,
    item: Item,
}

impl ArticleIndex {
    /// Builds an index using the host's local timezone.
    pub fn build(items: Vec<Item>) -> (Self, Vec<Diagnostic>) {
        Self::build_in(items, &Local, IndexOptions::default())
    }

    /// Builds an index with dates taken from the wall clock in `tz`.
    ///
    /// Items whose `published` value does not parse are left out and
    /// reported in the returned diagnostics; the build itself never fails.
    pub fn build_in<Tz: TimeZone>(
        items: Vec<Item>,
        tz: &Tz,
        options: IndexOptions,
    ) -> (Self, Vec<Diagnostic>) {
        let mut grouped: BTreeMap<DateKey, Vec<Pending>> = BTreeMap::new();
        let mut diagnostics = Vec::new();
        let mut indexed = 0;

        for (position, item) in items.into_iter().enumerate() {
            let Some(stamp) = local_datetime_in(&item.published, tz) else {
                warn!(
                    target: TARGET_INDEX,
                    "Excluding {:?}: unparseable published value {:?}", item.title, item.published
                );
                diagnostics.push(Diagnostic {
                    position,
                    reason: DiagnosticReason::InvalidTimestamp {
                        raw: item.published.clone(),
                    },
                    title: Some(item.title),
                });
                continue;
            };

            grouped
                .entry(DateKey::from_naive(stamp.date()))
                .or_default()
                .push(Pending {
                    seq: indexed,
                    stamp,
                    item,
                });
            indexed += 1;
        }

        let mut sequence = vec![None; indexed];
        let mut buckets = BTreeMap::new();
        for (key, mut pending) in grouped {
            if options.order == BucketOrder::NewestFirst {
                pending.sort_by(|a, b| b.stamp.cmp(&a.stamp));
            }
            let mut bucket = Vec::with_capacity(pending.len());
            for (slot, entry) in pending.into_iter().enumerate() {
                sequence[entry.seq] = Some((key, slot));
                bucket.push(entry.item);
            }
            buckets.insert(key, bucket);
        }

        let index = ArticleIndex {
            buckets,
            sequence: sequence.into_iter().flatten().collect(),
        };

        info!(
            target: TARGET_INDEX,
            "Indexed {} items across {} dates ({} excluded)",
            index.len(),
            index.bucket_count(),
            diagnostics.len()
        );

        (index, diagnostics)
    }

    /// Items published on `key`, empty when there are none.
    pub fn items_on(&self, key: &DateKey) -> &[Item] {
        self.buckets.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_data(&self, key: &DateKey) -> bool {
        self.buckets.contains_key(key)
    }

    /// Date of the first indexed item in feed order.
    pub fn most_recent_key(&self) -> Option<DateKey> {
        self.sequence.first().map(|(key, _)| *key)
    }

    /// The first indexed item in feed order.
    pub fn most_recent_item(&self) -> Option<&Item> {
        self.recent(1).into_iter().next()
    }

    /// Up to `limit` indexed items in feed order.
    pub fn recent(&self, limit: usize) -> Vec<&Item> {
        self.sequence
            .iter()
            .take(limit)
            .filter_map(|(key, slot)| self.buckets.get(key).and_then(|b| b.get(*slot)))
            .collect()
    }

    /// Number of indexed items.
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Dates holding at least one item, ascending.
    pub fn dates(&self) -> impl Iterator<Item = &DateKey> {
        self.buckets.keys()
    }

    /// Months holding at least one item, ascending.
    pub fn months_with_data(&self) -> Vec<YearMonth> {
        let mut months: Vec<YearMonth> = self.buckets.keys().map(YearMonth::of).collect();
        months.dedup();
        months
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;
    use pretty_assertions::assert_eq;

    fn jst() -> FixedOffset {
        FixedOffset::east_opt(9 * 3600).unwrap()
    }

    fn key(y: i32, m: u32, d: u32) -> DateKey {
        DateKey::new(y, m, d).unwrap()
    }

    fn sample_items() -> Vec<Item> {
        vec![
            Item::new("本紙 10/3", "https://x/3", "2025-10-03T08:30:00+09:00"),
            Item::new("号外 10/1 朝", "https://x/1a", "2025-10-01T08:30:00+09:00"),
            Item::new("号外 10/1 夜", "https://x/1b", "2025-10-01T21:00:00+09:00"),
        ]
    }

    #[test]
    fn test_groups_by_local_date() {
        let (index, diagnostics) = ArticleIndex::build_in(sample_items(), &jst(), IndexOptions::default());
        assert!(diagnostics.is_empty());
        assert_eq!(index.len(), 3);
        assert_eq!(index.bucket_count(), 2);
        assert_eq!(index.items_on(&key(2025, 10, 3)).len(), 1);
        assert_eq!(index.items_on(&key(2025, 10, 1)).len(), 2);
        assert!(index.items_on(&key(2025, 10, 2)).is_empty());
        assert!(index.has_data(&key(2025, 10, 1)));
        assert!(!index.has_data(&key(2025, 10, 2)));
    }

    #[test]
    fn test_every_indexed_item_is_in_its_own_bucket() {
        let items = sample_items();
        let (index, _) = ArticleIndex::build_in(items.clone(), &jst(), IndexOptions::default());
        for item in &items {
            let k = DateKey::from_timestamp_in(&item.published, &jst()).unwrap();
            let hits = index
                .dates()
                .filter(|d| index.items_on(d).contains(item))
                .count();
            assert_eq!(hits, 1);
            assert!(index.items_on(&k).contains(item));
        }
    }

    #[test]
    fn test_bucket_keeps_feed_order_by_default() {
        // Feed lists the morning issue before the evening one.
        let (index, _) = ArticleIndex::build_in(sample_items(), &jst(), IndexOptions::default());
        let titles: Vec<&str> = index
            .items_on(&key(2025, 10, 1))
            .iter()
            .map(|i| i.title.as_str())
            .collect();
        assert_eq!(titles, vec!["号外 10/1 朝", "号外 10/1 夜"]);
    }

    #[test]
    fn test_newest_first_reorders_bucket_but_not_recent() {
        let options = IndexOptions {
            order: BucketOrder::NewestFirst,
        };
        let (index, _) = ArticleIndex::build_in(sample_items(), &jst(), options);
        let titles: Vec<&str> = index
            .items_on(&key(2025, 10, 1))
            .iter()
            .map(|i| i.title.as_str())
            .collect();
        assert_eq!(titles, vec!["号外 10/1 夜", "号外 10/1 朝"]);

        let recent: Vec<&str> = index.recent(3).into_iter().map(|i| i.title.as_str()).collect();
        assert_eq!(recent, vec!["本紙 10/3", "号外 10/1 朝", "号外 10/1 夜"]);
    }

    #[test]
    fn test_invalid_timestamp_is_reported_not_indexed() {
        let mut items = sample_items();
        items.insert(1, Item::new("壊れた項目", "https://x/bad", "not-a-date"));

        let (index, diagnostics) = ArticleIndex::build_in(items, &jst(), IndexOptions::default());
        assert_eq!(index.len(), 3);
        assert_eq!(
            diagnostics,
            vec![Diagnostic {
                position: 1,
                title: Some("壊れた項目".to_string()),
                reason: DiagnosticReason::InvalidTimestamp {
                    raw: "not-a-date".to_string()
                },
            }]
        );
    }

    #[test]
    fn test_most_recent_key_follows_feed_order() {
        let (index, _) = ArticleIndex::build_in(sample_items(), &jst(), IndexOptions::default());
        assert_eq!(index.most_recent_key(), Some(key(2025, 10, 3)));
        assert_eq!(index.most_recent_item().map(|i| i.link.as_str()), Some("https://x/3"));

        // Feed order wins even when a later entry carries a newer date.
        let mut items = sample_items();
        items.push(Item::new("未来", "https://x/f", "2025-11-20T08:30:00+09:00"));
        let (index, _) = ArticleIndex::build_in(items, &jst(), IndexOptions::default());
        assert_eq!(index.most_recent_key(), Some(key(2025, 10, 3)));
    }

    #[test]
    fn test_most_recent_key_skips_unparseable_head() {
        let mut items = sample_items();
        items.insert(0, Item::new("bad", "https://x/bad", "???"));
        let (index, _) = ArticleIndex::build_in(items, &jst(), IndexOptions::default());
        assert_eq!(index.most_recent_key(), Some(key(2025, 10, 3)));
    }

    #[test]
    fn test_build_in_host_zone() {
        let (index, _) = ArticleIndex::build(vec![Item::new("本紙", "https://x/1", "2025-10-03")]);
        assert_eq!(index.most_recent_key(), Some(key(2025, 10, 3)));
    }

    #[test]
    fn test_empty_input() {
        let (index, diagnostics) = ArticleIndex::build_in(Vec::new(), &jst(), IndexOptions::default());
        assert!(index.is_empty());
        assert!(diagnostics.is_empty());
        assert_eq!(index.most_recent_key(), None);
        assert!(index.recent(5).is_empty());
    }

    #[test]
    fn test_build_is_idempotent() {
        let (first, d1) = ArticleIndex::build_in(sample_items(), &jst(), IndexOptions::default());
        let (second, d2) = ArticleIndex::build_in(sample_items(), &jst(), IndexOptions::default());
        assert_eq!(first, second);
        assert_eq!(d1, d2);
    }

    #[test]
    fn test_months_with_data() {
        let mut items = sample_items();
        items.push(Item::new("九月", "https://x/9", "2025-09-30T08:30:00+09:00"));
        let (index, _) = ArticleIndex::build_in(items, &jst(), IndexOptions::default());
        assert_eq!(
            index.months_with_data(),
            vec![YearMonth::new(2025, 9).unwrap(), YearMonth::new(2025, 10).unwrap()]
        );
    }

    #[test]
    fn test_bucket_order_from_str() {
        assert_eq!("feed".parse::<BucketOrder>(), Ok(BucketOrder::FeedOrder));
        assert_eq!("Newest".parse::<BucketOrder>(), Ok(BucketOrder::NewestFirst));
        assert!("random".parse::<BucketOrder>().is_err());
    }
}
