// =============================================================================
// Domain model
// =============================================================================

mod event;
mod holding;
mod quote;
mod signal;

pub use event::Event;
pub use holding::{EtfCategory, HoldingEntry};
pub use quote::Quote;
pub use signal::{Confidence, ConfidenceBreakdown, RiskLevel, SubScore, TradingSignal};
