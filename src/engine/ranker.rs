use bigdecimal::BigDecimal;

use crate::{
    engine::{aggregator::Aggregation, fetcher::FetchedWindow, ActivityMap},
    models::{FlowReport, PoolActivity, TimeWindow},
};

/// Order activity by `added` descending, then key ascending, keeping the top `top_n`.
///
/// Entries with equal `added` and equal key (distinct pools sharing a symbol
/// pair) fall back to group id so the order never depends on map iteration.
pub fn rank_pools(activity: &ActivityMap, top_n: usize) -> Vec<PoolActivity> {
    let mut entries: Vec<(&String, &PoolActivity)> = activity.iter().collect();

    entries.sort_by(|(a_id, a), (b_id, b)| {
        b.added
            .cmp(&a.added)
            .then_with(|| a.key.cmp(&b.key))
            .then_with(|| a_id.cmp(b_id))
    });

    entries
        .into_iter()
        .take(top_n)
        .map(|(_, activity)| activity.clone())
        .collect()
}

/// Build the immutable report for one run. Does not modify `aggregation`.
pub fn build_report(
    window: TimeWindow,
    aggregation: &Aggregation,
    fetched: &FetchedWindow,
    top_n: usize,
) -> FlowReport {
    let zero = BigDecimal::from(0);
    let total_added = aggregation
        .activity
        .values()
        .fold(zero.clone(), |sum, a| sum + &a.added);
    let total_removed = aggregation
        .activity
        .values()
        .fold(zero, |sum, a| sum + &a.removed);

    FlowReport {
        window,
        total_added,
        total_removed,
        ranked_pools: rank_pools(&aggregation.activity, top_n),
        pool_count: aggregation.activity.len(),
        events_scanned: aggregation.events_scanned,
        ignored_events: aggregation.ignored_events,
        pages_fetched: fetched.pages,
        truncated: fetched.truncated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        engine::{aggregate, Grouping},
        models::fixtures::{dec, event, pool},
        models::EventKind,
    };

    fn fetched(events: Vec<crate::models::LiquidityEvent>) -> FetchedWindow {
        FetchedWindow {
            events,
            pages: 1,
            truncated: false,
        }
    }

    fn window() -> TimeWindow {
        TimeWindow::new(1000, 2000).unwrap()
    }

    #[test]
    fn test_scenario_totals() {
        let ab = pool("0xab", "A", "B", 3000);
        let fetched = fetched(vec![
            event("m1", EventKind::Mint, &ab, "10.5", 1900),
            event("m2", EventKind::Mint, &ab, "20.25", 1500),
            event("b1", EventKind::Burn, &ab, "5.0", 1200),
        ]);

        let aggregation = aggregate(&fetched.events, Grouping::Pool);
        let report = build_report(window(), &aggregation, &fetched, 5);

        assert_eq!(report.total_added(), &dec("30.75"));
        assert_eq!(report.total_removed(), &dec("5.0"));
        assert_eq!(report.net(), dec("25.75"));
        assert_eq!(report.ranked_pools().len(), 1);
        assert_eq!(report.ranked_pools()[0].key.as_str(), "A-B");
        assert_eq!(report.share_of_added(&report.ranked_pools()[0]), Some(100.0));
    }

    #[test]
    fn test_empty_aggregation_gives_zero_report() {
        let fetched = fetched(Vec::new());
        let report = build_report(window(), &Aggregation::default(), &fetched, 5);

        assert_eq!(report.total_added(), &dec("0"));
        assert_eq!(report.total_removed(), &dec("0"));
        assert!(report.ranked_pools().is_empty());
        assert!(report.is_empty());
        assert_eq!(report.share_of_added(&PoolActivity::new("A-B".into())), None);
    }

    #[test]
    fn test_ties_rank_by_key_ascending() {
        let zz = pool("0x01", "Z", "Z", 3000);
        let aa = pool("0x02", "A", "A", 3000);
        let mm = pool("0x03", "M", "M", 3000);
        let events = vec![
            event("e1", EventKind::Mint, &zz, "10", 1900),
            event("e2", EventKind::Mint, &aa, "10", 1800),
            event("e3", EventKind::Mint, &mm, "10.00", 1700),
        ];

        let aggregation = aggregate(&events, Grouping::Pool);
        let ranked = rank_pools(&aggregation.activity, 5);
        let keys: Vec<_> = ranked.iter().map(|a| a.key.as_str()).collect();
        assert_eq!(keys, vec!["A-A", "M-M", "Z-Z"]);
    }

    #[test]
    fn test_top_n_truncates_but_totals_cover_everything() {
        let events: Vec<_> = (0..8)
            .map(|i| {
                let p = pool(&format!("0x{i}"), &format!("T{i}"), "USDC", 3000);
                event(&format!("e{i}"), EventKind::Mint, &p, &format!("{}", i + 1), 1500)
            })
            .collect();
        let fetched = fetched(events);

        let aggregation = aggregate(&fetched.events, Grouping::Pool);
        let report = build_report(window(), &aggregation, &fetched, 5);

        // 1 + 2 + ... + 8
        assert_eq!(report.total_added(), &dec("36"));
        assert_eq!(report.pool_count(), 8);
        let keys: Vec<_> = report.ranked_pools().iter().map(|a| a.key.as_str()).collect();
        assert_eq!(keys, vec!["T7-USDC", "T6-USDC", "T5-USDC", "T4-USDC", "T3-USDC"]);

        let none = build_report(window(), &aggregation, &fetched, 0);
        assert!(none.ranked_pools().is_empty());
        assert_eq!(none.total_added(), &dec("36"));
    }

    #[test]
    fn test_same_key_distinct_pools_order_by_pool_id() {
        let low = pool("0xaaa", "WETH", "USDC", 500);
        let high = pool("0xbbb", "WETH", "USDC", 3000);
        let events = vec![
            event("e1", EventKind::Mint, &high, "7", 1900),
            event("e2", EventKind::Mint, &low, "7", 1800),
        ];

        let aggregation = aggregate(&events, Grouping::Pool);
        let ranked = rank_pools(&aggregation.activity, 5);
        assert_eq!(ranked[0].fee_tiers.iter().next(), Some(&500));
        assert_eq!(ranked[1].fee_tiers.iter().next(), Some(&3000));
    }
}
