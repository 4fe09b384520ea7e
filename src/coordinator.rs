// =============================================================================
// ScanCoordinator — drives ChainExecutor across a watchlist, live or replayed
// =============================================================================

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::TimeZone;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::calendar::SimulationClock;
use crate::chain_executor::{ChainExecutor, ChainOutcome};
use crate::clock::china_tz;
use crate::domain::TradingSignal;
use crate::providers::{HoldingProvider, QuoteProvider};
use crate::repository::SignalRepository;
use crate::sink::SignalSink;

/// Minimal snapshot of what the replay's data sources actually covered,
/// handed back alongside `ReplayResult` the way the original backtest
/// engine's `get_data_summary()` accompanies its result dict.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataProviderSummary {
    pub dates_count: usize,
    pub stock_codes: Vec<String>,
    pub etf_codes: Vec<String>,
}

/// Aggregated outcome of one `run_replay` pass, field-for-field from the
/// original `_generate_result`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReplayResult {
    pub total_signals: usize,
    pub by_security: HashMap<String, usize>,
    pub by_etf: HashMap<String, usize>,
    pub by_date: HashMap<String, usize>,
    pub signals: Vec<TradingSignal>,
    pub data_summary: DataProviderSummary,
}

/// Cooperative shutdown signal for `run_live`. `tokio_util::CancellationToken`
/// is not part of the dependency stack here, so a plain `Arc<AtomicBool>`
/// fills the same role, matching `CachedFetcher`'s shutdown flag.
#[derive(Clone, Default)]
pub struct ShutdownSignal(Arc<AtomicBool>);

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Ties a `ChainExecutor` to its data sources, persistence, and
/// notification sink, and drives it either continuously (`run_live`) or
/// across a simulated calendar (`run_replay`).
pub struct ScanCoordinator {
    pub chain_executor: ChainExecutor,
    pub quote_provider: Arc<dyn QuoteProvider>,
    pub holding_provider: Arc<dyn HoldingProvider>,
    pub repository: Arc<dyn SignalRepository>,
    pub sink: Arc<dyn SignalSink>,
}

impl ScanCoordinator {
    pub fn new(
        chain_executor: ChainExecutor,
        quote_provider: Arc<dyn QuoteProvider>,
        holding_provider: Arc<dyn HoldingProvider>,
        repository: Arc<dyn SignalRepository>,
        sink: Arc<dyn SignalSink>,
    ) -> Self {
        Self {
            chain_executor,
            quote_provider,
            holding_provider,
            repository,
            sink,
        }
    }

    /// Scans `watchlist` once at `at`, saving and sinking any signal found.
    /// Per-security errors are logged and never abort the rest of the batch.
    fn scan_once(&self, watchlist: &[String], at: chrono::DateTime<chrono::FixedOffset>) -> Vec<TradingSignal> {
        let mut signals = Vec::new();
        for security_code in watchlist {
            match self
                .chain_executor
                .execute(self.quote_provider.as_ref(), self.holding_provider.as_ref(), security_code, at)
            {
                ChainOutcome::Signal(signal, log) => {
                    for line in &log {
                        debug!(security = %security_code, "{line}");
                    }
                    self.repository.save(signal.clone());
                    self.sink.send(&signal);
                    signals.push(signal);
                }
                ChainOutcome::NoSignal(err, log) => {
                    for line in &log {
                        debug!(security = %security_code, "{line}");
                    }
                    debug!(security = %security_code, error = %err, "no signal this tick");
                }
            }
        }
        signals
    }

    /// Polls `watchlist` on a fixed cadence until `shutdown` is cancelled.
    pub async fn run_live(&self, watchlist: &[String], cadence: Duration, shutdown: ShutdownSignal) {
        let mut ticker = tokio::time::interval(cadence);
        info!(count = watchlist.len(), cadence_ms = cadence.as_millis(), "live scan loop starting");
        loop {
            ticker.tick().await;
            if shutdown.is_cancelled() {
                info!("live scan loop shutting down");
                break;
            }
            let at = crate::clock::now_china();
            let signals = self.scan_once(watchlist, at);
            if !signals.is_empty() {
                info!(count = signals.len(), "signals generated this tick");
            }
        }
    }

    /// Steps `sim_clock` across `universe`, collecting every signal emitted
    /// until the calendar is exhausted.
    pub fn run_replay(
        &self,
        sim_clock: &mut SimulationClock,
        universe: &[String],
        progress: impl Fn(usize, usize),
    ) -> ReplayResult {
        let mut by_security: HashMap<String, usize> = HashMap::new();
        let mut by_etf: HashMap<String, usize> = HashMap::new();
        let mut by_date: HashMap<String, usize> = HashMap::new();
        let mut signals = Vec::new();

        let total_steps = sim_clock.total_days().max(1);
        let mut completed = 0usize;

        loop {
            let naive = sim_clock.current();
            let at = china_tz()
                .from_local_datetime(&naive)
                .single()
                .unwrap_or_else(|| china_tz().from_utc_datetime(&naive));

            let tick_signals = self.scan_once(universe, at);
            let date_key = at.format("%Y-%m-%d").to_string();
            for signal in tick_signals {
                *by_security.entry(signal.stock_code.clone()).or_insert(0) += 1;
                *by_etf.entry(signal.etf_code.clone()).or_insert(0) += 1;
                *by_date.entry(date_key.clone()).or_insert(0) += 1;
                signals.push(signal);
            }

            completed += 1;
            progress(completed, total_steps);

            if !sim_clock.has_next() {
                break;
            }
            sim_clock.advance(1);
        }

        info!(total_signals = signals.len(), "replay finished");

        ReplayResult {
            total_signals: signals.len(),
            by_security,
            by_etf,
            by_date,
            signals,
            data_summary: DataProviderSummary {
                dates_count: completed,
                stock_codes: universe.to_vec(),
                etf_codes: Vec::new(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::{Granularity, TradingCalendar};
    use crate::domain::{EtfCategory, HoldingEntry, Quote};
    use crate::providers::{InMemoryHoldingProvider, InMemoryQuoteProvider};
    use crate::repository::InMemorySignalRepository;
    use crate::sink::NullSink;
    use crate::strategy::{HighestWeightSelector, LimitUpDetector};
    use chrono::NaiveDate;

    fn build_coordinator() -> (ScanCoordinator, Arc<InMemoryQuoteProvider>, Arc<InMemoryHoldingProvider>) {
        let quotes = Arc::new(InMemoryQuoteProvider::new());
        let holdings = Arc::new(InMemoryHoldingProvider::new());
        let chain = ChainExecutor::new(
            Box::new(LimitUpDetector::default()),
            Box::new(HighestWeightSelector),
            vec![],
            None,
        );
        let coordinator = ScanCoordinator::new(
            chain,
            quotes.clone(),
            holdings.clone(),
            Arc::new(InMemorySignalRepository::new()),
            Arc::new(NullSink),
        );
        (coordinator, quotes, holdings)
    }

    #[test]
    fn run_replay_collects_signals_and_stops_at_calendar_end() {
        let (coordinator, quotes, holdings) = build_coordinator();
        let at = china_tz().with_ymd_and_hms(2024, 1, 15, 9, 31, 0).unwrap();
        quotes.set_stock_quote(Quote {
            code: "600519".into(),
            name: "Moutai".into(),
            price: 1800.0,
            change_pct: 10.0,
            volume: 1000.0,
            amount: 500_000.0,
            is_limit_up: true,
            timestamp: at,
        });
        quotes.set_etf_quote(Quote {
            code: "510300".into(),
            name: "CSI300 ETF".into(),
            price: 4.0,
            change_pct: 1.0,
            volume: 1000.0,
            amount: 100_000_000.0,
            is_limit_up: false,
            timestamp: at,
        });
        holdings.set_holdings(
            "600519",
            vec![HoldingEntry::new("510300", "CSI300 ETF", 0.1, EtfCategory::BroadIndex, 1, true, 0.3).unwrap()],
        );

        let calendar = TradingCalendar::build(
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            None,
        );
        let mut sim_clock = SimulationClock::new(calendar, Granularity::Daily);
        let result = coordinator.run_replay(&mut sim_clock, &["600519".to_string()], |_, _| {});

        assert_eq!(result.total_signals, 1);
        assert_eq!(result.by_security.get("600519"), Some(&1));
    }

    #[test]
    fn shutdown_signal_round_trips() {
        let shutdown = ShutdownSignal::new();
        assert!(!shutdown.is_cancelled());
        shutdown.cancel();
        assert!(shutdown.is_cancelled());
    }
}
