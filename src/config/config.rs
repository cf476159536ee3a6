use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;

use crate::engine::{ConcurrencyPolicy, Grouping};

/// GraphQL subgraph connection configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct SubgraphSettings {
    pub url: String,
    /// Sent as a bearer token when set
    #[serde(default)]
    pub api_key: Option<String>,
    /// Also fetch swaps. They are counted as ignored events and never move totals.
    #[serde(default)]
    pub include_swaps: bool,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout_secs() -> u64 {
    30
}

/// Pagination and retry configuration for the event fetcher.
///
/// Retry `n` (1-based) waits `retry_base_delay_ms * 2^(n - 1)`.
#[derive(Debug, Deserialize, Clone)]
pub struct FetchSettings {
    /// Records per page; the upstream subgraph caps this at 100
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Safety bound on pages per run
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,
    /// Retries per page after the first attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
    /// Deadline for a single page request
    #[serde(default = "default_page_timeout_secs")]
    pub page_timeout_secs: u64,
}

fn default_page_size() -> usize {
    100
}

fn default_max_pages() -> usize {
    50
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    100
}

fn default_page_timeout_secs() -> u64 {
    30
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            max_pages: default_max_pages(),
            max_retries: default_max_retries(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            page_timeout_secs: default_page_timeout_secs(),
        }
    }
}

/// Aggregation and ranking configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AnalysisSettings {
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    #[serde(default)]
    pub grouping: Grouping,
    #[serde(default)]
    pub concurrency: ConcurrencyPolicy,
    /// Window used by the `liqflow` binary
    #[serde(default)]
    pub start: Option<u64>,
    #[serde(default)]
    pub end: Option<u64>,
}

fn default_top_n() -> usize {
    5
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
            grouping: Grouping::default(),
            concurrency: ConcurrencyPolicy::default(),
            start: None,
            end: None,
        }
    }
}

/// Root application configuration.
///
/// Loaded from `config.yaml` (or any format the `config` crate recognises)
/// with `LIQFLOW__SECTION__KEY` environment overrides.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub subgraph: SubgraphSettings,
    #[serde(default)]
    pub fetch: FetchSettings,
    #[serde(default)]
    pub analysis: AnalysisSettings,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::with_name("config"))
            .add_source(Environment::with_prefix("LIQFLOW").separator("__"))
            .build()?;

        let settings: Settings = s.try_deserialize()?;

        Ok(settings)
    }

    /// Load settings from a YAML document.
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from_str(contents, FileFormat::Yaml))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_sections() {
        let settings = Settings::from_yaml(
            r#"
subgraph:
  url: "https://gateway.example.com/subgraphs/id/abc"
"#,
        )
        .unwrap();

        assert_eq!(settings.fetch.page_size, 100);
        assert_eq!(settings.fetch.max_pages, 50);
        assert_eq!(settings.fetch.max_retries, 3);
        assert_eq!(settings.analysis.top_n, 5);
        assert_eq!(settings.analysis.grouping, Grouping::Pool);
        assert_eq!(settings.analysis.concurrency, ConcurrencyPolicy::Reject);
        assert!(!settings.subgraph.include_swaps);
        assert!(settings.analysis.start.is_none());
    }

    #[test]
    fn test_explicit_values_override_defaults() {
        let settings = Settings::from_yaml(
            r#"
subgraph:
  url: "https://gateway.example.com/subgraphs/id/abc"
  api_key: "secret"
  include_swaps: true
fetch:
  page_size: 50
  max_retries: 5
analysis:
  top_n: 10
  grouping: symbol_pair
  concurrency: supersede
  start: 1000
  end: 2000
"#,
        )
        .unwrap();

        assert_eq!(settings.subgraph.api_key.as_deref(), Some("secret"));
        assert!(settings.subgraph.include_swaps);
        assert_eq!(settings.fetch.page_size, 50);
        assert_eq!(settings.fetch.max_retries, 5);
        assert_eq!(settings.fetch.page_timeout_secs, 30);
        assert_eq!(settings.analysis.top_n, 10);
        assert_eq!(settings.analysis.grouping, Grouping::SymbolPair);
        assert_eq!(settings.analysis.concurrency, ConcurrencyPolicy::Supersede);
        assert_eq!(settings.analysis.start, Some(1000));
        assert_eq!(settings.analysis.end, Some(2000));
    }

    #[test]
    fn test_large_window_bounds_stay_exact() {
        let settings = Settings::from_yaml(
            r#"
subgraph:
  url: "https://gateway.example.com/subgraphs/id/abc"
analysis:
  start: 9007199254740993
  end: 9007199254740995
"#,
        )
        .unwrap();

        // 2^53 + 1 would round to 2^53 through f64
        assert_eq!(settings.analysis.start, Some(9_007_199_254_740_993));
        assert_eq!(settings.analysis.end, Some(9_007_199_254_740_995));
    }

    #[test]
    fn test_missing_subgraph_section_fails() {
        assert!(Settings::from_yaml("fetch:\n  page_size: 10\n").is_err());
    }
}
