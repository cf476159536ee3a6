use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use crate::{models::Pool, source::EventCursor};

/// Kind of on-chain event as reported by the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Mint,
    Burn,
    Swap,
}

/// How an event contributes to pool activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    /// Liquidity added to the pool (counted in `added`)
    Addition,
    /// Liquidity removed from the pool (counted in `removed`)
    Removal,
    /// Neither bucket
    Ignored,
}

impl EventKind {
    pub fn classify(self) -> Classification {
        match self {
            EventKind::Mint => Classification::Addition,
            EventKind::Burn => Classification::Removal,
            EventKind::Swap => Classification::Ignored,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Mint => "mint",
            EventKind::Burn => "burn",
            EventKind::Swap => "swap",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One observed mint, burn or swap.
///
/// `amount0`/`amount1` are decimal-adjusted token amounts exactly as the source
/// reports them (signed for swaps). `amount_usd` is the source's pre-computed
/// USD value and the only amount the engine aggregates.
#[derive(Debug, Clone, PartialEq)]
pub struct LiquidityEvent {
    pub id: String,
    pub kind: EventKind,
    pub pool: Arc<Pool>,
    pub amount0: BigDecimal,
    pub amount1: BigDecimal,
    pub amount_usd: BigDecimal,
    pub timestamp: u64,
}

impl LiquidityEvent {
    pub fn classification(&self) -> Classification {
        self.kind.classify()
    }

    /// Position of this event in the source ordering, usable as a page cursor.
    pub fn cursor(&self) -> EventCursor {
        EventCursor {
            timestamp: self.timestamp,
            id: self.id.clone(),
        }
    }

    /// Source delivery order: newest first, ties by id descending.
    pub fn cmp_newest_first(&self, other: &Self) -> Ordering {
        other
            .timestamp
            .cmp(&self.timestamp)
            .then_with(|| other.id.cmp(&self.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_has_exactly_one_classification() {
        assert_eq!(EventKind::Mint.classify(), Classification::Addition);
        assert_eq!(EventKind::Burn.classify(), Classification::Removal);
        assert_eq!(EventKind::Swap.classify(), Classification::Ignored);
    }
}
