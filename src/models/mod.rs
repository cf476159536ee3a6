//! Domain types for liquidity flow analysis.
//!
//! Reference data ([`Token`], [`Pool`]) and [`LiquidityEvent`]s are produced by
//! the event source and never mutated. [`PoolActivity`] is the per-run
//! accumulator and [`FlowReport`] the immutable result handed to callers.

mod activity;
mod event;
mod pool;
mod report;
mod token;
mod window;

pub use activity::PoolActivity;
pub use event::{Classification, EventKind, LiquidityEvent};
pub use pool::{Pool, PoolKey};
pub use report::FlowReport;
pub use token::Token;
pub use window::TimeWindow;

#[cfg(test)]
pub(crate) mod fixtures;
