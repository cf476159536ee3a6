use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex, PoisonError,
};

use log::{info, warn};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::{
    config::Settings,
    engine::{aggregate, build_report, count_by_kind, EventFetcher, Grouping},
    error::AnalysisError,
    models::{FlowReport, TimeWindow},
    source::EventSource,
};

/// What to do when a run is triggered while another is still in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConcurrencyPolicy {
    /// Fail the new trigger with [`AnalysisError::RunInProgress`]
    #[default]
    Reject,
    /// Cancel the outstanding run and start the new one
    Supersede,
}

/// Options that stay fixed across runs of one [`Analyzer`].
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    pub max_pages: usize,
    pub grouping: Grouping,
    pub concurrency: ConcurrencyPolicy,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            max_pages: 50,
            grouping: Grouping::default(),
            concurrency: ConcurrencyPolicy::default(),
        }
    }
}

struct InFlight {
    id: u64,
    token: CancellationToken,
}

/// Entry point for liquidity flow analysis.
///
/// Each run is fetch -> aggregate -> rank over a fresh event set. At most one
/// run is in flight per analyzer; the [`ConcurrencyPolicy`] decides whether a
/// second trigger is rejected or replaces the first. Runs own their
/// aggregation state, nothing is shared between them.
pub struct Analyzer {
    fetcher: EventFetcher,
    options: AnalysisOptions,
    in_flight: Mutex<Option<InFlight>>,
    next_run_id: AtomicU64,
}

/// Clears the in-flight slot when its run finishes, unless a newer run took it over.
struct RunGuard<'a> {
    analyzer: &'a Analyzer,
    id: u64,
    token: CancellationToken,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        let mut slot = self
            .analyzer
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().map(|run| run.id) == Some(self.id) {
            *slot = None;
        }
    }
}

impl Analyzer {
    pub fn new(fetcher: EventFetcher, options: AnalysisOptions) -> Self {
        Self {
            fetcher,
            options,
            in_flight: Mutex::new(None),
            next_run_id: AtomicU64::new(1),
        }
    }

    pub fn from_settings(source: Arc<dyn EventSource>, settings: &Settings) -> Self {
        let fetcher = EventFetcher::from_settings(source, &settings.fetch);
        let options = AnalysisOptions {
            max_pages: settings.fetch.max_pages,
            grouping: settings.analysis.grouping,
            concurrency: settings.analysis.concurrency,
        };
        Self::new(fetcher, options)
    }

    /// Whether a run is currently outstanding.
    pub fn is_running(&self) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Cancel the outstanding run, if any.
    pub fn cancel_in_flight(&self) {
        if let Some(run) = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            run.token.cancel();
        }
    }

    /// Analyze `window`, fetching `page_size` events per page and ranking the top `top_n`.
    pub async fn run_analysis(
        &self,
        window: TimeWindow,
        page_size: usize,
        top_n: usize,
    ) -> Result<FlowReport, AnalysisError> {
        self.run_analysis_with_cancel(window, page_size, top_n, &CancellationToken::new())
            .await
    }

    /// Validate raw caller bounds, then analyze.
    ///
    /// Invalid bounds fail before any request reaches the event source.
    pub async fn run_for_bounds(
        &self,
        start: f64,
        end: f64,
        page_size: usize,
        top_n: usize,
    ) -> Result<FlowReport, AnalysisError> {
        let window = TimeWindow::from_f64(start, end)?;
        self.run_analysis(window, page_size, top_n).await
    }

    /// Like [`Analyzer::run_analysis`], aborting with [`AnalysisError::Cancelled`]
    /// once `parent` is cancelled.
    pub async fn run_analysis_with_cancel(
        &self,
        window: TimeWindow,
        page_size: usize,
        top_n: usize,
        parent: &CancellationToken,
    ) -> Result<FlowReport, AnalysisError> {
        let guard = self.begin_run(parent)?;

        info!(
            "Run {}: analyzing window [{}, {}] (page size {}, top {})",
            guard.id,
            window.start(),
            window.end(),
            page_size,
            top_n
        );

        let fetched = self
            .fetcher
            .fetch_window(&window, page_size, self.options.max_pages, &guard.token)
            .await?;

        // A superseding run may have cancelled us after the last page arrived
        if guard.token.is_cancelled() {
            return Err(AnalysisError::Cancelled);
        }

        let aggregation = aggregate(&fetched.events, self.options.grouping);
        let report = build_report(window, &aggregation, &fetched, top_n);

        let counts = count_by_kind(&fetched.events);
        info!(
            "Run {}: {} event(s) ({:?}), {} pool(s), {} page(s){}",
            guard.id,
            report.events_scanned(),
            counts,
            report.pool_count(),
            report.pages_fetched(),
            if report.is_truncated() { ", truncated" } else { "" }
        );

        Ok(report)
    }

    fn begin_run(&self, parent: &CancellationToken) -> Result<RunGuard<'_>, AnalysisError> {
        let mut slot = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(current) = slot.as_ref() {
            match self.options.concurrency {
                ConcurrencyPolicy::Reject => {
                    warn!("Run {} still in progress, rejecting new run", current.id);
                    return Err(AnalysisError::RunInProgress);
                },
                ConcurrencyPolicy::Supersede => {
                    info!("Superseding run {}", current.id);
                    current.token.cancel();
                },
            }
        }

        let id = self.next_run_id.fetch_add(1, Ordering::SeqCst);
        let token = parent.child_token();
        *slot = Some(InFlight {
            id,
            token: token.clone(),
        });

        Ok(RunGuard {
            analyzer: self,
            id,
            token,
        })
    }
}
