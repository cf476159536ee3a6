//! Windowed liquidity flow aggregation.
//!
//! Stages run in order for every analysis:
//!
//! - [`fetcher`] - paginated retrieval of a window's events, with retry and cancellation
//! - [`aggregator`] - classification and per-pool accumulation
//! - [`ranker`] - totals and top-N ranking into a [`crate::models::FlowReport`]
//! - [`analyzer`] - the single-flight entry point tying the stages together

pub mod aggregator;
pub mod analyzer;
pub mod fetcher;
pub mod ranker;

pub use aggregator::{aggregate, count_by_kind, ActivityMap, Aggregation, Grouping};
pub use analyzer::{AnalysisOptions, Analyzer, ConcurrencyPolicy};
pub use fetcher::{EventFetcher, FetchedWindow};
pub use ranker::{build_report, rank_pools};
