//! Utility functions for liquidity flow analysis.
//!
//! - [`conversion`] - Parsing source strings into exact decimals and formatting them for display

mod conversion;

pub use conversion::{format_usd, parse_decimal, parse_u64};
