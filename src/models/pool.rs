use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::Token;

/// Display key for a pool: `symbol(token0)-symbol(token1)`.
///
/// Not unique. Two pools with the same token pair at different fee tiers (or
/// two tokens that happen to share a symbol) produce the same key, so this is
/// only used for labelling and optional display grouping. Pool identity is
/// always [`Pool::id`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PoolKey(String);

impl PoolKey {
    pub fn new(token0: &Token, token1: &Token) -> Self {
        Self(format!("{}-{}", token0.symbol, token1.symbol))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PoolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PoolKey {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Liquidity pool reference data.
///
/// Identity is the upstream pool id. Token order is the pool's own
/// token0/token1 order and is never re-sorted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pool {
    pub id: String,
    pub token0: Token,
    pub token1: Token,
    /// Fee in hundredths of a bip (e.g., 3000 = 0.30%)
    pub fee_tier: u32,
}

impl Pool {
    pub fn new(id: impl Into<String>, token0: Token, token1: Token, fee_tier: u32) -> Self {
        Self {
            id: id.into().to_lowercase(),
            token0,
            token1,
            fee_tier,
        }
    }

    pub fn key(&self) -> PoolKey {
        PoolKey::new(&self.token0, &self.token1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(symbol: &str) -> Token {
        Token::new(format!("0x{}", symbol.to_lowercase()), symbol, symbol, 18)
    }

    #[test]
    fn test_key_keeps_token_order() {
        let pool = Pool::new("0xpool", token("WETH"), token("USDC"), 500);
        assert_eq!(pool.key().as_str(), "WETH-USDC");

        let flipped = Pool::new("0xother", token("USDC"), token("WETH"), 500);
        assert_eq!(flipped.key().as_str(), "USDC-WETH");
    }

    #[test]
    fn test_fee_tiers_collide_on_key_but_not_identity() {
        let low = Pool::new("0xAAA", token("WETH"), token("USDC"), 500);
        let high = Pool::new("0xBBB", token("WETH"), token("USDC"), 3000);

        assert_eq!(low.key(), high.key());
        assert_ne!(low, high);
        assert_eq!(low.id, "0xaaa");
    }
}
