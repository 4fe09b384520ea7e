// =============================================================================
// arb-scanner — CN A-share limit-up / ETF arbitrage scanning engine
// =============================================================================
//
// `main.rs` is a thin live/replay driver; everything it wires together lives
// here so it's reachable from inline `#[cfg(test)]` modules and from the
// binary alike.
// =============================================================================

pub mod backtest_config;
pub mod cache;
pub mod calendar;
pub mod chain_executor;
pub mod clock;
pub mod coordinator;
pub mod domain;
pub mod engine;
pub mod error;
pub mod preview;
pub mod providers;
pub mod registry;
pub mod repository;
pub mod sink;
pub mod strategy;
