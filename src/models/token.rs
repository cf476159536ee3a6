use serde::{Deserialize, Serialize};

/// Token reference data as delivered by the event source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
}

impl Token {
    pub fn new(
        id: impl Into<String>,
        symbol: impl Into<String>,
        name: impl Into<String>,
        decimals: u8,
    ) -> Self {
        Self {
            // Always lowercase addresses for consistent comparisons
            id: id.into().to_lowercase(),
            symbol: symbol.into(),
            name: name.into(),
            decimals,
        }
    }
}
