use std::sync::Arc;

use anyhow::{bail, Context};
use jemallocator::Jemalloc;
use log::{info, warn, LevelFilter};
use simple_logger::SimpleLogger;
use tokio_util::sync::CancellationToken;

#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use liqflow::{utils::format_usd, Analyzer, FlowReport, Settings, SubgraphSource, TimeWindow};

#[tokio::main()]
async fn main() -> anyhow::Result<()> {
    SimpleLogger::new()
        .with_level(LevelFilter::Info)
        .init()
        .context("Failed to initialize logger")?;

    // Load configuration
    let settings = Settings::new()
        .context("Failed to load config.yaml. Please ensure it exists and is valid")?;

    let (start, end) = match (settings.analysis.start, settings.analysis.end) {
        (Some(start), Some(end)) => (start, end),
        _ => bail!("analysis.start and analysis.end must both be set"),
    };
    let window = TimeWindow::from_bounds(start, end)?;

    let source = SubgraphSource::new(&settings.subgraph)
        .context("Failed to initialize subgraph client")?;
    let analyzer = Analyzer::from_settings(Arc::new(source), &settings);

    let cancellation_token = CancellationToken::new();
    let signal_token = cancellation_token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received shutdown signal (Ctrl+C), cancelling analysis...");
            signal_token.cancel();
        }
    });

    let report = analyzer
        .run_analysis_with_cancel(
            window,
            settings.fetch.page_size,
            settings.analysis.top_n,
            &cancellation_token,
        )
        .await
        .context("Liquidity flow analysis failed")?;

    log_summary(&report);
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}

fn log_summary(report: &FlowReport) {
    let window = report.window();
    info!("Liquidity flow for window [{}, {}]", window.start(), window.end());
    info!("  Total liquidity added:   {}", format_usd(report.total_added(), 2));
    info!("  Total liquidity removed: {}", format_usd(report.total_removed(), 2));
    info!("  Net flow:                {}", format_usd(&report.net(), 2));

    if report.is_truncated() {
        warn!(
            "  Page limit reached after {} page(s); totals cover a partial window",
            report.pages_fetched()
        );
    }

    if report.is_empty() {
        info!("  No liquidity events in window");
        return;
    }

    for (rank, pool) in report.ranked_pools().iter().enumerate() {
        let share = report
            .share_of_added(pool)
            .map(|s| format!("{:.2}%", s))
            .unwrap_or_else(|| "-".to_string());
        info!(
            "  #{} {} (fee {:?}): added {} removed {} net {} [{} of added]",
            rank + 1,
            pool.key,
            pool.fee_tiers,
            format_usd(&pool.added, 4),
            format_usd(&pool.removed, 4),
            format_usd(&pool.net(), 4),
            share
        );
    }
}
