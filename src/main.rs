// =============================================================================
// arb-scanner — thin live/replay driver
// =============================================================================
//
// Module declarations and state live in `lib.rs`; this binary only wires
// config, registries, and the engine together, then dispatches to
// `ScanCoordinator::run_live` or `run_replay` depending on the first CLI
// argument ("live", the default, or "replay").
// =============================================================================

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use arb_scanner::backtest_config::{BacktestConfig, Interpolation};
use arb_scanner::calendar::{Granularity, SimulationClock, TradingCalendar};
use arb_scanner::coordinator::{ScanCoordinator, ShutdownSignal};
use arb_scanner::engine::{Engine, EngineConfig};
use arb_scanner::preview::preview_replay_data;
use arb_scanner::providers::{
    HistoricalHoldingProvider, HistoricalQuoteProvider, HoldingProvider, InMemoryHoldingProvider,
    InMemoryQuoteProvider, QuoteProvider,
};
use arb_scanner::repository::{FileSignalRepository, InMemorySignalRepository, SignalRepository};
use arb_scanner::sink::{LogSink, NullSink, SignalSink};
use arb_scanner::strategy::StrategyRegistries;

fn watchlist_from_env() -> Vec<String> {
    std::env::var("ARB_SCANNER_WATCHLIST")
        .unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn load_config() -> EngineConfig {
    let path = std::env::var("ARB_SCANNER_CONFIG").unwrap_or_else(|_| "engine_config.json".to_string());
    EngineConfig::load(&path).unwrap_or_else(|err| {
        warn!(error = %err, path = %path, "failed to load engine config, using defaults");
        EngineConfig::default()
    })
}

fn build_repository(config: &EngineConfig) -> Arc<dyn SignalRepository> {
    match &config.repository_path {
        Some(path) => Arc::new(FileSignalRepository::new(path.clone())),
        None => Arc::new(InMemorySignalRepository::new()),
    }
}

fn build_sink(config: &EngineConfig) -> Arc<dyn SignalSink> {
    if config.sink_enabled {
        Arc::new(LogSink)
    } else {
        Arc::new(NullSink)
    }
}

/// Live mode has no in-crate vendor feed (out of scope, per the spec's
/// Non-goals) — `InMemoryQuoteProvider`/`InMemoryHoldingProvider` stand in
/// as the integration seam a real feed would implement `QuoteProvider`/
/// `HoldingProvider` against.
async fn run_live_mode(engine: Engine, watchlist: Vec<String>) -> Result<()> {
    if watchlist.is_empty() {
        warn!("no watchlist configured (set ARB_SCANNER_WATCHLIST); live loop will scan nothing");
    }

    let quote_provider: Arc<dyn QuoteProvider> = Arc::new(InMemoryQuoteProvider::new());
    let holding_provider: Arc<dyn HoldingProvider> = Arc::new(InMemoryHoldingProvider::new());
    let repository = build_repository(&engine.config);
    let sink = build_sink(&engine.config);

    let coordinator = ScanCoordinator::new(engine.chain_executor, quote_provider, holding_provider, repository, sink);
    let shutdown = ShutdownSignal::new();

    let cadence = Duration::from_millis(engine.config.cadence_ms);
    let loop_shutdown = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("shutdown signal received");
            loop_shutdown.cancel();
        }
    });

    coordinator.run_live(&watchlist, cadence, shutdown).await;
    Ok(())
}

fn granularity_from_env(s: &str) -> Option<Granularity> {
    match s {
        "daily" => Some(Granularity::Daily),
        "5m" => Some(Granularity::Min5),
        "15m" => Some(Granularity::Min15),
        "30m" => Some(Granularity::Min30),
        _ => None,
    }
}

fn interpolation_from_env(s: &str) -> Option<Interpolation> {
    match s {
        "linear" => Some(Interpolation::Linear),
        "step" => Some(Interpolation::Step),
        _ => None,
    }
}

/// Builds the validated replay config from `ARB_SCANNER_*` env vars, falling
/// back to the same defaults the original `BacktestConfig` dataclass used.
fn backtest_config_from_env(start: NaiveDate, end: NaiveDate) -> Result<BacktestConfig> {
    let granularity = std::env::var("ARB_SCANNER_GRANULARITY")
        .ok()
        .and_then(|s| granularity_from_env(&s))
        .unwrap_or(Granularity::Daily);
    let interpolation = std::env::var("ARB_SCANNER_INTERPOLATION")
        .ok()
        .and_then(|s| interpolation_from_env(&s))
        .unwrap_or(Interpolation::Linear);
    let min_weight = std::env::var("ARB_SCANNER_MIN_WEIGHT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(0.05);
    let min_time_to_close = std::env::var("ARB_SCANNER_MIN_TIME_TO_CLOSE")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(1800);
    let min_etf_volume = std::env::var("ARB_SCANNER_MIN_ETF_VOLUME")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(50_000_000.0);
    let evaluator_type = std::env::var("ARB_SCANNER_EVALUATOR_TYPE").unwrap_or_else(|_| "default".to_string());
    let use_watchlist = std::env::var("ARB_SCANNER_USE_WATCHLIST")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(true);

    let compact = |d: NaiveDate| d.format("%Y%m%d").to_string().parse::<u32>().unwrap();

    BacktestConfig::new(
        compact(start),
        compact(end),
        granularity,
        min_weight,
        min_time_to_close,
        min_etf_volume,
        evaluator_type,
        None,
        interpolation,
        use_watchlist,
    )
    .context("invalid backtest configuration")
}

fn run_replay_mode(engine: Engine, universe: Vec<String>) -> Result<()> {
    let cache_dir = std::env::var("ARB_SCANNER_CACHE_DIR").unwrap_or_else(|_| "data/cache".to_string());
    let start = std::env::var("ARB_SCANNER_START")
        .ok()
        .and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok())
        .unwrap_or_else(|| NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    let end = std::env::var("ARB_SCANNER_END")
        .ok()
        .and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok())
        .unwrap_or_else(|| NaiveDate::from_ymd_opt(2024, 12, 31).unwrap());
    let etf_universe: Vec<String> = std::env::var("ARB_SCANNER_ETFS")
        .unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    let backtest_config = backtest_config_from_env(start, end)?;
    let granularity = backtest_config.granularity;

    let calendar = TradingCalendar::build(start, end, None);
    if calendar.is_empty() {
        warn!(start = %start, end = %end, "replay window has no trading days");
    }

    let stocks = HistoricalQuoteProvider::load(&cache_dir, &universe, &[], start, end, granularity);
    let etfs = HistoricalQuoteProvider::load(&cache_dir, &etf_universe, &[], start, end, granularity);
    let quotes = HistoricalQuoteProvider::load(&cache_dir, &universe, &etf_universe, start, end, granularity);
    let holdings = HistoricalHoldingProvider::new();

    let preview = preview_replay_data("replay-preview", &calendar, start, end, &stocks, &etfs, &holdings);
    info!(
        grade = %preview.quality_score.grade,
        score = preview.quality_score.overall_score,
        coverage_pct = preview.coverage.coverage_percentage,
        "data quality preview"
    );

    let quote_provider: Arc<dyn QuoteProvider> = Arc::new(quotes);
    let holding_provider: Arc<dyn HoldingProvider> = Arc::new(holdings);
    let repository = build_repository(&engine.config);
    let sink = build_sink(&engine.config);

    let coordinator = ScanCoordinator::new(engine.chain_executor, quote_provider, holding_provider, repository, sink);
    let mut sim_clock = SimulationClock::new(calendar, granularity);

    let result = coordinator.run_replay(&mut sim_clock, &universe, |completed, total| {
        if completed % 10 == 0 || completed == total {
            info!(completed, total, "replay progress");
        }
    });

    info!(
        total_signals = result.total_signals,
        securities = result.by_security.len(),
        dates = result.by_date.len(),
        "replay finished"
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("arb-scanner starting");

    let config = load_config();
    let registries = StrategyRegistries::with_defaults();
    let engine = Engine::build(config, &registries).context("failed to build engine from config")?;

    let mode = std::env::args().nth(1).unwrap_or_else(|| "live".to_string());
    let watchlist = watchlist_from_env();

    match mode.as_str() {
        "replay" => run_replay_mode(engine, watchlist),
        "live" => run_live_mode(engine, watchlist).await,
        other => {
            error!(mode = %other, "unknown mode, expected \"live\" or \"replay\"");
            Ok(())
        }
    }
}
