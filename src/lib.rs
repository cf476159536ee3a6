pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod source;
pub mod utils;

pub use crate::config::Settings;
pub use engine::{AnalysisOptions, Analyzer, ConcurrencyPolicy, EventFetcher, Grouping};
pub use error::{AnalysisError, FetchError};
pub use models::{FlowReport, LiquidityEvent, Pool, PoolActivity, PoolKey, TimeWindow, Token};
pub use source::{EventSource, MemorySource, SourceError, SubgraphSource};
