// =============================================================================
// Trading calendar + simulated clock
// =============================================================================
//
// Enumerates trading days and drives a stateful cursor across them at
// daily or intraday granularity for deterministic replay.
// =============================================================================

mod simulation_clock;
mod trading_calendar;

pub use simulation_clock::{Granularity, SimulationClock};
pub use trading_calendar::TradingCalendar;
