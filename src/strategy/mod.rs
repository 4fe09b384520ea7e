// =============================================================================
// Strategy layer — pluggable detectors, selectors, filters, evaluators
// =============================================================================

mod chain_config;
mod detectors;
mod evaluator;
mod filters;
mod selectors;
mod templates;

pub use chain_config::ChainConfig;
pub use detectors::{BreakoutDetector, LimitUpDetector};
pub use evaluator::{
    score, AggressiveEvaluator, ConservativeEvaluator, DefaultEvaluator, EvaluationThresholds,
    AGGRESSIVE_THRESHOLDS, BALANCED_THRESHOLDS, CONSERVATIVE_THRESHOLDS,
};
pub use filters::{ConfidenceFilter, LiquidityFilter, RiskFilter, TimeFilterCn};
pub use selectors::{BestLiquiditySelector, HighestWeightSelector, LowestPremiumSelector};
pub use templates::{all_templates, get_template, StrategyTemplate};

use chrono::{DateTime, FixedOffset};

use crate::domain::{Confidence, Event, HoldingEntry, RiskLevel, TradingSignal};
use crate::error::ScanError;
use crate::providers::QuoteProvider;

/// Detects a market event for a security at the current instant.
pub trait EventDetector: Send + Sync {
    fn detect(
        &self,
        quote_provider: &dyn QuoteProvider,
        security_code: &str,
        at: DateTime<FixedOffset>,
    ) -> Result<Option<Event>, ScanError>;

    fn name(&self) -> &str;
}

/// Picks the single best fund holding a triggering security.
pub trait FundSelector: Send + Sync {
    fn select(&self, candidates: &[HoldingEntry]) -> Option<HoldingEntry>;

    fn name(&self) -> &str;
}

/// Accepts or rejects a draft signal. Required filters short-circuit the
/// chain on rejection; advisory filters only annotate the reason log.
///
/// `draft` is the in-progress `TradingSignal` as of step 6 of the chain:
/// confidence/risk are not yet set by an evaluator when filters run, so a
/// filter inspecting `draft.confidence` sees whatever default the chain
/// seeded it with, exactly as in the original ordering.
pub trait SignalFilter: Send + Sync {
    fn check(
        &self,
        event: &Event,
        holding: &HoldingEntry,
        draft: &TradingSignal,
        quote_provider: &dyn QuoteProvider,
        at: DateTime<FixedOffset>,
    ) -> Result<(), ScanError>;

    fn name(&self) -> &str;

    /// Advisory filters log their rejection reason but never abort the chain.
    fn is_required(&self) -> bool {
        true
    }
}

/// Scores an accepted event/holding pair into a confidence/risk tier.
pub trait SignalEvaluator: Send + Sync {
    fn evaluate(&self, event: &Event, holding: &HoldingEntry) -> (Confidence, RiskLevel);

    fn name(&self) -> &str;
}

use crate::registry::PluginRegistry;
use crate::sink::{LogSink, NullSink, SignalSink};

/// The five per-role plugin tables the engine resolves a `ChainConfig`
/// against. Built once at startup via `with_defaults`, then handed to
/// `Engine::build`. `senders` is resolved separately from the other four:
/// `EngineConfig` only ever selects between "log" and "null" via a plain
/// `enabled` flag, so `Engine::build` never looks a sender name up by
/// string the way it does for the chain roles.
pub struct StrategyRegistries {
    pub event_detectors: PluginRegistry<dyn EventDetector>,
    pub fund_selectors: PluginRegistry<dyn FundSelector>,
    pub signal_filters: PluginRegistry<dyn SignalFilter>,
    pub evaluators: PluginRegistry<dyn SignalEvaluator>,
    pub senders: PluginRegistry<dyn SignalSink>,
}

impl StrategyRegistries {
    /// Populate every registry with the built-in strategies. Rust has no
    /// import-time registration hook, so this plain function call stands
    /// in for the decorator side effect the original relied on.
    pub fn with_defaults() -> Self {
        let mut event_detectors: PluginRegistry<dyn EventDetector> = PluginRegistry::new();
        event_detectors.register(
            "limit_up",
            |cfg| {
                let min_change_pct = cfg.get("min_change_pct").and_then(|v| v.as_f64()).unwrap_or(9.5);
                Box::new(LimitUpDetector::new(min_change_pct))
            },
            100,
            "CN A-share limit-up detection",
            "1.0.0",
        );
        event_detectors.register(
            "breakout",
            |cfg| {
                let breakout_pct = cfg.get("breakout_pct").and_then(|v| v.as_f64()).unwrap_or(10.0);
                let min_volume = cfg.get("min_volume").and_then(|v| v.as_f64()).unwrap_or(1_000_000.0);
                Box::new(BreakoutDetector::new(breakout_pct, min_volume))
            },
            50,
            "Breakout detection for markets without a limit-up mechanism",
            "1.0.0",
        );

        let mut fund_selectors: PluginRegistry<dyn FundSelector> = PluginRegistry::new();
        fund_selectors.register(
            "highest_weight",
            |_cfg| Box::new(HighestWeightSelector),
            100,
            "Picks the candidate ETF with the highest weight",
            "1.0.0",
        );
        fund_selectors.register(
            "best_liquidity",
            |_cfg| Box::new(BestLiquiditySelector),
            50,
            "Named extension point, not yet implemented",
            "1.0.0",
        );
        fund_selectors.register(
            "lowest_premium",
            |_cfg| Box::new(LowestPremiumSelector),
            50,
            "Named extension point, not yet implemented",
            "1.0.0",
        );

        let mut signal_filters: PluginRegistry<dyn SignalFilter> = PluginRegistry::new();
        signal_filters.register(
            "time_filter",
            |cfg| {
                let min_time_to_close = cfg.get("min_time_to_close").and_then(|v| v.as_i64()).unwrap_or(1800);
                Box::new(TimeFilterCn::new(min_time_to_close))
            },
            100,
            "Rejects signals too close to (or outside) the trading close",
            "1.0.0",
        );
        signal_filters.register(
            "liquidity_filter",
            |cfg| {
                let min_daily_amount = cfg
                    .get("min_daily_amount")
                    .and_then(|v| v.as_f64())
                    .unwrap_or(50_000_000.0);
                Box::new(LiquidityFilter::new(min_daily_amount))
            },
            100,
            "Rejects ETFs below a minimum daily turnover",
            "1.0.0",
        );
        signal_filters.register(
            "risk_filter",
            |cfg| {
                let max_top10_ratio = cfg.get("max_top10_ratio").and_then(|v| v.as_f64()).unwrap_or(0.70);
                let min_rank = cfg.get("min_rank").and_then(|v| v.as_i64()).unwrap_or(0) as i32;
                Box::new(RiskFilter::new(max_top10_ratio, min_rank))
            },
            50,
            "Advisory: flags concentrated or poorly ranked holdings",
            "1.0.0",
        );
        signal_filters.register(
            "confidence_filter",
            |cfg| {
                let min_confidence = match cfg.get("min_confidence").and_then(|v| v.as_str()) {
                    Some("low") => Confidence::Low,
                    Some("high") => Confidence::High,
                    _ => Confidence::Medium,
                };
                Box::new(ConfidenceFilter::new(min_confidence))
            },
            40,
            "Advisory: rejects signals below a minimum confidence floor",
            "1.0.0",
        );

        let mut evaluators: PluginRegistry<dyn SignalEvaluator> = PluginRegistry::new();
        evaluators.register("default", |_cfg| Box::new(DefaultEvaluator), 100, "Balanced evaluator", "1.0.0");
        evaluators.register(
            "conservative",
            |_cfg| Box::new(ConservativeEvaluator),
            90,
            "Stricter evaluator",
            "1.0.0",
        );
        evaluators.register(
            "aggressive",
            |_cfg| Box::new(AggressiveEvaluator),
            80,
            "Looser evaluator",
            "1.0.0",
        );

        let mut senders: PluginRegistry<dyn SignalSink> = PluginRegistry::new();
        senders.register("log", |_cfg| Box::new(LogSink), 0, "Logs accepted signals", "1.0.0");
        senders.register("null", |_cfg| Box::new(NullSink), 0, "Discards accepted signals", "1.0.0");

        Self {
            event_detectors,
            fund_selectors,
            signal_filters,
            evaluators,
            senders,
        }
    }
}

#[cfg(test)]
mod registry_tests {
    use super::*;

    #[test]
    fn with_defaults_registers_every_built_in_strategy() {
        let registries = StrategyRegistries::with_defaults();
        assert!(registries.event_detectors.is_registered("limit_up"));
        assert!(registries.event_detectors.is_registered("breakout"));
        assert!(registries.fund_selectors.is_registered("highest_weight"));
        assert!(registries.signal_filters.is_registered("time_filter"));
        assert!(registries.signal_filters.is_registered("liquidity_filter"));
        assert!(registries.evaluators.is_registered("default"));
        assert_eq!(registries.evaluators.count(), 3);
        assert!(registries.senders.is_registered("log"));
        assert!(registries.senders.is_registered("null"));
    }
}
