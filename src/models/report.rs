use bigdecimal::BigDecimal;
use num_traits::{ToPrimitive, Zero};
use serde::Serialize;

use crate::models::{PoolActivity, TimeWindow};

/// Result of one analysis run. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowReport {
    pub(crate) window: TimeWindow,
    pub(crate) total_added: BigDecimal,
    pub(crate) total_removed: BigDecimal,
    /// Top-N groups by `added` descending, ties by key ascending
    pub(crate) ranked_pools: Vec<PoolActivity>,
    /// Number of groups before truncation to top-N
    pub(crate) pool_count: usize,
    pub(crate) events_scanned: usize,
    pub(crate) ignored_events: usize,
    pub(crate) pages_fetched: usize,
    /// Set when fetching stopped at the page safety limit with more data available
    pub(crate) truncated: bool,
}

impl FlowReport {
    pub fn window(&self) -> TimeWindow {
        self.window
    }

    pub fn total_added(&self) -> &BigDecimal {
        &self.total_added
    }

    pub fn total_removed(&self) -> &BigDecimal {
        &self.total_removed
    }

    pub fn net(&self) -> BigDecimal {
        &self.total_added - &self.total_removed
    }

    pub fn ranked_pools(&self) -> &[PoolActivity] {
        &self.ranked_pools
    }

    pub fn pool_count(&self) -> usize {
        self.pool_count
    }

    pub fn events_scanned(&self) -> usize {
        self.events_scanned
    }

    pub fn ignored_events(&self) -> usize {
        self.ignored_events
    }

    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    pub fn is_empty(&self) -> bool {
        self.pool_count == 0
    }

    /// Percentage of `total_added` contributed by `pool` (0-100).
    ///
    /// Returns `None` when nothing was added in the window.
    pub fn share_of_added(&self, pool: &PoolActivity) -> Option<f64> {
        if self.total_added.is_zero() {
            return None;
        }
        let share = (&pool.added * BigDecimal::from(100)) / &self.total_added;
        share.to_f64()
    }
}
