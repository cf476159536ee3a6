mod config;

pub use self::config::{AnalysisSettings, FetchSettings, Settings, SubgraphSettings};
