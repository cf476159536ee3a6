//! Event source boundary.
//!
//! An [`EventSource`] answers bounded, capped queries for liquidity events
//! ordered newest first. The engine never holds an event store of its own;
//! every run goes back to the source through this trait, and the source
//! instance (with whatever client or connection pool it owns) is supplied by
//! the caller.
//!
//! - [`MemorySource`] - events held in memory (fixtures, replay, tests)
//! - [`SubgraphSource`] - Uniswap v3-style GraphQL subgraph over HTTP

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::LiquidityEvent;

mod memory;
mod subgraph;

pub use memory::MemorySource;
pub use subgraph::SubgraphSource;

/// Position in the source ordering (`timestamp` desc, then `id` desc).
///
/// Ordering on the struct is ascending by `(timestamp, id)`, so an event comes
/// "after" a cursor in delivery order when its position compares less.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventCursor {
    pub timestamp: u64,
    pub id: String,
}

/// One capped page request.
///
/// The source must return at most `limit` events with
/// `lower_bound <= timestamp <= upper_bound`, positioned strictly after
/// `after` when set, ordered by timestamp descending with ties broken by id
/// descending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventQuery {
    pub lower_bound: u64,
    pub upper_bound: u64,
    pub after: Option<EventCursor>,
    pub limit: usize,
}

impl EventQuery {
    /// Whether `event` belongs to the result set of this query (ignoring `limit`).
    pub fn admits(&self, event: &LiquidityEvent) -> bool {
        if event.timestamp < self.lower_bound || event.timestamp > self.upper_bound {
            return false;
        }
        match &self.after {
            Some(cursor) => {
                (event.timestamp, event.id.as_str()) < (cursor.timestamp, cursor.id.as_str())
            },
            None => true,
        }
    }
}

/// Failures reported by an event source.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("rate limited by event source")]
    RateLimited { retry_after: Option<Duration> },

    #[error("page request timed out after {0:?}")]
    Timeout(Duration),

    #[error("malformed response: {0}")]
    Decode(String),

    #[error("event source rejected query: {0}")]
    Upstream(String),
}

impl SourceError {
    /// Transport failures, rate limits and timeouts are transient.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SourceError::Transport(_) | SourceError::RateLimited { .. } | SourceError::Timeout(_)
        )
    }
}

/// A paginated, capped query interface for liquidity events.
#[async_trait]
pub trait EventSource: Send + Sync {
    async fn fetch_page(&self, query: &EventQuery) -> Result<Vec<LiquidityEvent>, SourceError>;
}

/// Sort events into source delivery order (newest first, ties by id descending).
pub fn sort_newest_first(events: &mut [LiquidityEvent]) {
    events.sort_by(|a, b| a.cmp_newest_first(b));
}
