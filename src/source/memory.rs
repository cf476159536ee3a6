use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::{
    models::LiquidityEvent,
    source::{sort_newest_first, EventQuery, EventSource, SourceError},
};

/// Event source backed by an in-memory event set.
///
/// Honors the full [`EventQuery`] contract, including the cursor tie-break,
/// and counts page requests so callers can observe how many round trips a
/// run needed.
pub struct MemorySource {
    events: Vec<LiquidityEvent>,
    calls: AtomicUsize,
}

impl MemorySource {
    pub fn new(mut events: Vec<LiquidityEvent>) -> Self {
        sort_newest_first(&mut events);
        Self {
            events,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of page requests served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[async_trait]
impl EventSource for MemorySource {
    async fn fetch_page(&self, query: &EventQuery) -> Result<Vec<LiquidityEvent>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        Ok(self
            .events
            .iter()
            .filter(|event| query.admits(event))
            .take(query.limit)
            .cloned()
            .collect())
    }
}
