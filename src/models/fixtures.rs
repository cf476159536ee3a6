//! Builders for events and pools used across unit tests.

use std::str::FromStr;
use std::sync::Arc;

use bigdecimal::BigDecimal;

use crate::models::{EventKind, LiquidityEvent, Pool, Token};

pub(crate) fn pool(id: &str, symbol0: &str, symbol1: &str, fee_tier: u32) -> Arc<Pool> {
    Arc::new(Pool::new(
        id,
        Token::new(format!("0x{}", symbol0.to_lowercase()), symbol0, symbol0, 18),
        Token::new(format!("0x{}", symbol1.to_lowercase()), symbol1, symbol1, 6),
        fee_tier,
    ))
}

pub(crate) fn event(
    id: &str,
    kind: EventKind,
    pool: &Arc<Pool>,
    amount_usd: &str,
    timestamp: u64,
) -> LiquidityEvent {
    LiquidityEvent {
        id: id.to_string(),
        kind,
        pool: pool.clone(),
        amount0: BigDecimal::from(1),
        amount1: BigDecimal::from(1),
        amount_usd: dec(amount_usd),
        timestamp,
    }
}

pub(crate) fn dec(value: &str) -> BigDecimal {
    BigDecimal::from_str(value).unwrap()
}

/// `count` mint events of 1 USD each, one per timestamp counting down from `newest`.
pub(crate) fn mint_series(pool: &Arc<Pool>, count: usize, newest: u64) -> Vec<LiquidityEvent> {
    (0..count)
        .map(|i| {
            event(
                &format!("0x{:04}", i),
                EventKind::Mint,
                pool,
                "1",
                newest - i as u64,
            )
        })
        .collect()
}
