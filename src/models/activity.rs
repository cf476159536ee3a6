use std::collections::BTreeSet;

use bigdecimal::BigDecimal;
use serde::Serialize;

use crate::models::PoolKey;

/// Running liquidity totals for one aggregation group within a single run.
///
/// With per-pool grouping `pool_ids` and `fee_tiers` hold exactly one entry.
/// With symbol-pair grouping they list every pool merged under `key`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoolActivity {
    pub key: PoolKey,
    pub pool_ids: BTreeSet<String>,
    pub fee_tiers: BTreeSet<u32>,
    pub added: BigDecimal,
    pub removed: BigDecimal,
    pub mints: u64,
    pub burns: u64,
}

impl PoolActivity {
    pub fn new(key: PoolKey) -> Self {
        Self {
            key,
            pool_ids: BTreeSet::new(),
            fee_tiers: BTreeSet::new(),
            added: BigDecimal::from(0),
            removed: BigDecimal::from(0),
            mints: 0,
            burns: 0,
        }
    }

    /// Net flow: `added - removed`. Negative when more liquidity left than entered.
    pub fn net(&self) -> BigDecimal {
        &self.added - &self.removed
    }
}
