//! Error types surfaced by the liquidity flow engine.
//!
//! Every error aborts the run it belongs to. Partial pages and partial
//! aggregates are discarded, so a caller either gets a complete report or
//! one of these.

use thiserror::Error;

use crate::source::{EventCursor, SourceError};

/// Errors returned by [`crate::engine::Analyzer`].
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Caller supplied bounds that do not form a valid window. Never retried.
    #[error("invalid window [{start}, {end}]: {reason}")]
    InvalidWindow {
        start: String,
        end: String,
        reason: &'static str,
    },

    /// A page could not be fetched after exhausting retries.
    #[error(transparent)]
    Fetch(FetchError),

    /// Another run is still outstanding for this analyzer.
    #[error("an analysis run is already in progress")]
    RunInProgress,

    /// The run was cancelled by the caller or superseded by a newer run.
    #[error("analysis run was cancelled")]
    Cancelled,
}

impl AnalysisError {
    pub(crate) fn invalid_window(
        start: impl ToString,
        end: impl ToString,
        reason: &'static str,
    ) -> Self {
        Self::InvalidWindow {
            start: start.to_string(),
            end: end.to_string(),
            reason,
        }
    }
}

impl From<FetchError> for AnalysisError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Cancelled { .. } => AnalysisError::Cancelled,
            other => AnalysisError::Fetch(other),
        }
    }
}

/// Errors returned by [`crate::engine::EventFetcher`].
#[derive(Error, Debug)]
pub enum FetchError {
    #[error(
        "page {page} of [{lower_bound}, {upper_bound}] failed after {attempts} attempt(s): {cause}"
    )]
    Page {
        page: usize,
        lower_bound: u64,
        upper_bound: u64,
        /// Position the failed page would have continued from (`None` on the first page).
        cursor: Option<EventCursor>,
        attempts: u32,
        #[source]
        cause: SourceError,
    },

    #[error("fetch cancelled while requesting page {page}")]
    Cancelled { page: usize },
}

impl FetchError {
    /// Page number (1-based) the error occurred on.
    pub fn page(&self) -> usize {
        match self {
            FetchError::Page { page, .. } | FetchError::Cancelled { page } => *page,
        }
    }
}
