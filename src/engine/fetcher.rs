use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use rustc_hash::FxHashSet;
use tokio_util::sync::CancellationToken;

use crate::{
    config::FetchSettings,
    error::FetchError,
    models::{LiquidityEvent, TimeWindow},
    source::{EventCursor, EventQuery, EventSource, SourceError},
};

/// Retries per page after the first attempt
const MAX_RETRIES: u32 = 3;

/// Delay between retries (exponential backoff base)
const RETRY_DELAY_MS: u64 = 100;

/// Deadline for a single page request (30 seconds)
const PAGE_TIMEOUT: Duration = Duration::from_secs(30);

/// Events retrieved for one window.
#[derive(Debug, Clone)]
pub struct FetchedWindow {
    /// Events in delivery order (newest first)
    pub events: Vec<LiquidityEvent>,
    pub pages: usize,
    /// Fetching stopped at the page limit while the last page was still full
    pub truncated: bool,
}

/// Paginated fetcher over a capped [`EventSource`].
///
/// Pages are walked with a keyset cursor on `(timestamp, id)` rather than by
/// shifting the upper bound one time unit below the last record. Events that
/// share a timestamp across a page boundary are therefore neither skipped nor
/// repeated. Pages are strictly sequential because each query depends on the
/// cursor from the previous page.
pub struct EventFetcher {
    source: Arc<dyn EventSource>,
    max_retries: u32,
    retry_base_delay: Duration,
    page_timeout: Duration,
}

impl EventFetcher {
    pub fn new(source: Arc<dyn EventSource>) -> Self {
        Self {
            source,
            max_retries: MAX_RETRIES,
            retry_base_delay: Duration::from_millis(RETRY_DELAY_MS),
            page_timeout: PAGE_TIMEOUT,
        }
    }

    pub fn from_settings(source: Arc<dyn EventSource>, settings: &FetchSettings) -> Self {
        Self::new(source)
            .with_retry(
                settings.max_retries,
                Duration::from_millis(settings.retry_base_delay_ms),
            )
            .with_page_timeout(Duration::from_secs(settings.page_timeout_secs))
    }

    pub fn with_retry(mut self, max_retries: u32, base_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_base_delay = base_delay;
        self
    }

    pub fn with_page_timeout(mut self, page_timeout: Duration) -> Self {
        self.page_timeout = page_timeout;
        self
    }

    /// Retrieve every event in `window`.
    ///
    /// Stops when a page comes back with fewer than `page_size` events, or
    /// after `max_pages` pages (flagging the result as truncated if the last
    /// page was full). `page_size` and `max_pages` are raised to at least 1.
    ///
    /// Any page that still fails after retries aborts the whole fetch; pages
    /// already collected are dropped with it.
    pub async fn fetch_window(
        &self,
        window: &TimeWindow,
        page_size: usize,
        max_pages: usize,
        cancellation_token: &CancellationToken,
    ) -> Result<FetchedWindow, FetchError> {
        let page_size = page_size.max(1);
        let max_pages = max_pages.max(1);

        let mut events: Vec<LiquidityEvent> = Vec::new();
        let mut seen: FxHashSet<String> = FxHashSet::default();
        let mut cursor: Option<EventCursor> = None;
        let mut pages = 0usize;
        let mut truncated = false;

        loop {
            let query = EventQuery {
                lower_bound: window.start(),
                upper_bound: window.end(),
                after: cursor.clone(),
                limit: page_size,
            };
            pages += 1;

            let page = self
                .fetch_page_with_retry(&query, pages, cancellation_token)
                .await?;
            let returned = page.len();
            let next_cursor = page.last().map(LiquidityEvent::cursor);

            let mut duplicates = 0usize;
            let mut out_of_window = 0usize;
            for event in page {
                if !window.contains(event.timestamp) {
                    out_of_window += 1;
                } else if seen.insert(event.id.clone()) {
                    events.push(event);
                } else {
                    duplicates += 1;
                }
            }
            if duplicates > 0 || out_of_window > 0 {
                warn!(
                    "Page {}: dropped {} duplicate and {} out-of-window event(s) from source",
                    pages, duplicates, out_of_window
                );
            }

            debug!(
                "Page {}: {} event(s), cursor {:?}",
                pages, returned, next_cursor
            );

            if returned < page_size {
                break;
            }

            if pages >= max_pages {
                warn!(
                    "Stopped after {} page(s) for window [{}, {}]; more events remain",
                    pages,
                    window.start(),
                    window.end()
                );
                truncated = true;
                break;
            }

            match next_cursor {
                // A cursor that does not move would request the same page forever
                Some(next) if cursor.as_ref() != Some(&next) => cursor = Some(next),
                _ => {
                    warn!("Page {}: cursor did not advance, stopping", pages);
                    break;
                },
            }
        }

        info!(
            "Fetched {} event(s) in {} page(s) for window [{}, {}]",
            events.len(),
            pages,
            window.start(),
            window.end()
        );

        Ok(FetchedWindow {
            events,
            pages,
            truncated,
        })
    }

    /// Fetch one page, retrying transient failures with exponential backoff.
    async fn fetch_page_with_retry(
        &self,
        query: &EventQuery,
        page: usize,
        cancellation_token: &CancellationToken,
    ) -> Result<Vec<LiquidityEvent>, FetchError> {
        let mut attempts: u32 = 0;

        loop {
            let result = tokio::select! {
                _ = cancellation_token.cancelled() => {
                    return Err(FetchError::Cancelled { page });
                }
                r = tokio::time::timeout(self.page_timeout, self.source.fetch_page(query)) => r,
            };
            attempts += 1;

            let cause = match result {
                Ok(Ok(events)) => return Ok(events),
                Ok(Err(e)) => e,
                Err(_) => SourceError::Timeout(self.page_timeout),
            };

            if !cause.is_retryable() || attempts > self.max_retries {
                return Err(FetchError::Page {
                    page,
                    lower_bound: query.lower_bound,
                    upper_bound: query.upper_bound,
                    cursor: query.after.clone(),
                    attempts,
                    cause,
                });
            }

            let mut delay = self
                .retry_base_delay
                .saturating_mul(2_u32.saturating_pow(attempts - 1));
            if let SourceError::RateLimited {
                retry_after: Some(retry_after),
            } = &cause
            {
                delay = delay.max(*retry_after);
            }

            warn!(
                "Page {} failed (attempt {}/{}), retrying in {:?}: {}",
                page,
                attempts,
                self.max_retries + 1,
                delay,
                cause
            );

            tokio::select! {
                _ = cancellation_token.cancelled() => {
                    return Err(FetchError::Cancelled { page });
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}
