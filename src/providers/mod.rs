// =============================================================================
// Quote and holding data providers
// =============================================================================

mod historical;
mod in_memory;

pub use historical::{HistoricalHoldingProvider, HistoricalQuoteProvider};
pub use in_memory::{InMemoryHoldingProvider, InMemoryQuoteProvider};

use chrono::{DateTime, FixedOffset};

use crate::domain::{HoldingEntry, Quote};

/// Point-in-time quote lookup for a security and its candidate ETFs. Live
/// adapters wrap a vendor feed behind a `CachedFetcher`; the historical
/// adapter reads from the replay file cache. Both implementations are
/// reference semantics — vendor-specific feeds are an external contract.
pub trait QuoteProvider: Send + Sync {
    fn get_quote(&self, code: &str, at: DateTime<FixedOffset>) -> Option<Quote>;

    fn get_etf_quote(&self, code: &str, at: DateTime<FixedOffset>) -> Option<Quote>;
}

/// Returns every ETF holding a given security at a point in time.
pub trait HoldingProvider: Send + Sync {
    fn find(&self, security_code: &str, at: DateTime<FixedOffset>) -> Vec<HoldingEntry>;
}

/// Derives the limit-up threshold from a CN security code prefix, used by
/// the historical loader when a cached record omits `is_limit_up`.
///
/// `688`/`300` (STAR Market / ChiNext) and `8`/`43` (Beijing Exchange) are
/// 20%; everything else (main board) is 10%.
pub fn limit_up_threshold(code: &str) -> f64 {
    if code.starts_with("688") || code.starts_with("300") || code.starts_with('8') || code.starts_with("43") {
        0.20
    } else {
        0.10
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn star_and_chinext_prefixes_get_twenty_percent() {
        assert_eq!(limit_up_threshold("688981"), 0.20);
        assert_eq!(limit_up_threshold("300750"), 0.20);
    }

    #[test]
    fn beijing_exchange_prefixes_get_twenty_percent() {
        assert_eq!(limit_up_threshold("830799"), 0.20);
        assert_eq!(limit_up_threshold("430047"), 0.20);
    }

    #[test]
    fn main_board_gets_ten_percent() {
        assert_eq!(limit_up_threshold("600519"), 0.10);
        assert_eq!(limit_up_threshold("000001"), 0.10);
    }
}
