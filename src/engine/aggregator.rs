use log::warn;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Deserialize;

use crate::models::{Classification, EventKind, LiquidityEvent, PoolActivity, PoolKey};

/// How events are grouped into [`PoolActivity`] entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Grouping {
    /// One entry per upstream pool id. Pools sharing a symbol pair stay apart.
    #[default]
    Pool,
    /// One entry per `symbol0-symbol1` key, merging every fee tier of the pair.
    SymbolPair,
}

/// Activity entries keyed by group id (pool id or pool key, depending on [`Grouping`]).
pub type ActivityMap = FxHashMap<String, PoolActivity>;

/// Result of folding one run's events.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregation {
    pub activity: ActivityMap,
    pub events_scanned: usize,
    pub ignored_events: usize,
}

/// Fold events into per-group running totals.
///
/// Every event is classified as exactly one of addition, removal or ignored.
/// The fold only sums and counts, so the result is the same for any ordering
/// of the same event set.
pub fn aggregate<'a, I>(events: I, grouping: Grouping) -> Aggregation
where
    I: IntoIterator<Item = &'a LiquidityEvent>,
{
    let mut aggregation = Aggregation::default();
    // First pool id seen per display key, to surface key collisions
    let mut key_owner: FxHashMap<PoolKey, String> = FxHashMap::default();
    let mut collisions: FxHashSet<PoolKey> = FxHashSet::default();

    for event in events {
        aggregation.events_scanned += 1;

        let pool = &event.pool;
        let key = pool.key();

        let owner = key_owner.entry(key.clone()).or_insert_with(|| pool.id.clone());
        if *owner != pool.id && collisions.insert(key.clone()) {
            match grouping {
                Grouping::Pool => warn!(
                    "Pool key {} is shared by pools {} and {}; keeping them as separate entries",
                    key, owner, pool.id
                ),
                Grouping::SymbolPair => warn!(
                    "Pool key {} is shared by pools {} and {}; merging them under one entry",
                    key, owner, pool.id
                ),
            }
        }

        let group_id = match grouping {
            Grouping::Pool => pool.id.clone(),
            Grouping::SymbolPair => key.to_string(),
        };

        let activity = aggregation
            .activity
            .entry(group_id)
            .or_insert_with(|| PoolActivity::new(key));
        activity.pool_ids.insert(pool.id.clone());
        activity.fee_tiers.insert(pool.fee_tier);

        match event.classification() {
            Classification::Addition => {
                activity.added += &event.amount_usd;
                activity.mints += 1;
            },
            Classification::Removal => {
                activity.removed += &event.amount_usd;
                activity.burns += 1;
            },
            Classification::Ignored => {
                aggregation.ignored_events += 1;
            },
        }
    }

    aggregation
}

/// Per-kind event counts, for logging.
pub fn count_by_kind<'a, I>(events: I) -> FxHashMap<EventKind, usize>
where
    I: IntoIterator<Item = &'a LiquidityEvent>,
{
    let mut counts = FxHashMap::default();
    for event in events {
        *counts.entry(event.kind).or_insert(0) += 1;
    }
    counts
}
