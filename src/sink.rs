// =============================================================================
// SignalSink — notification output for accepted signals
// =============================================================================

use tracing::info;

use crate::domain::TradingSignal;

/// Delivers an accepted signal somewhere outside the scan pipeline. All
/// custom channels implement this and register themselves by name in a
/// `PluginRegistry<dyn SignalSink>`.
pub trait SignalSink: Send + Sync {
    fn send(&self, signal: &TradingSignal) -> bool;

    fn name(&self) -> &str;
}

/// Default sink: formats the signal as a multi-line log record.
#[derive(Default)]
pub struct LogSink;

impl SignalSink for LogSink {
    fn send(&self, signal: &TradingSignal) -> bool {
        info!(
            "signal: {}({}) -> {}({})",
            signal.stock_name, signal.stock_code, signal.etf_name, signal.etf_code
        );
        info!("  change: {:+.2}%", signal.change_pct);
        info!("  weight: {:.2}%, rank: {}", signal.weight * 100.0, signal.rank);
        info!("  confidence: {:?}, risk: {:?}", signal.confidence, signal.risk_level);
        info!("  reason: {}", signal.reason);
        true
    }

    fn name(&self) -> &str {
        "log"
    }
}

/// Disables notification entirely; used for tests or when alerting is off.
#[derive(Default)]
pub struct NullSink;

impl SignalSink for NullSink {
    fn send(&self, _signal: &TradingSignal) -> bool {
        true
    }

    fn name(&self) -> &str {
        "null"
    }
}
