use std::collections::HashMap;

use chrono::{DateTime, FixedOffset};
use parking_lot::RwLock;

use crate::domain::{HoldingEntry, Quote};

use super::{HoldingProvider, QuoteProvider};

/// `HashMap`-backed quote provider used by tests and as the reference
/// semantics `ScanCoordinator` examples are written against. Quotes are
/// keyed by code only — "point in time" is whatever was last set, since
/// the in-memory provider is not meant to answer historical queries.
#[derive(Default)]
pub struct InMemoryQuoteProvider {
    stocks: RwLock<HashMap<String, Quote>>,
    etfs: RwLock<HashMap<String, Quote>>,
}

impl InMemoryQuoteProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_stock_quote(&self, quote: Quote) {
        self.stocks.write().insert(quote.code.clone(), quote);
    }

    pub fn set_etf_quote(&self, quote: Quote) {
        self.etfs.write().insert(quote.code.clone(), quote);
    }
}

impl QuoteProvider for InMemoryQuoteProvider {
    fn get_quote(&self, code: &str, _at: DateTime<FixedOffset>) -> Option<Quote> {
        self.stocks.read().get(code).cloned()
    }

    fn get_etf_quote(&self, code: &str, _at: DateTime<FixedOffset>) -> Option<Quote> {
        self.etfs.read().get(code).cloned()
    }
}

/// `HashMap`-backed holding provider keyed by security code.
#[derive(Default)]
pub struct InMemoryHoldingProvider {
    holdings: RwLock<HashMap<String, Vec<HoldingEntry>>>,
}

impl InMemoryHoldingProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_holdings(&self, security_code: impl Into<String>, entries: Vec<HoldingEntry>) {
        self.holdings.write().insert(security_code.into(), entries);
    }
}

impl HoldingProvider for InMemoryHoldingProvider {
    fn find(&self, security_code: &str, _at: DateTime<FixedOffset>) -> Vec<HoldingEntry> {
        self.holdings
            .read()
            .get(security_code)
            .cloned()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::china_tz;
    use crate::domain::EtfCategory;
    use chrono::TimeZone;

    fn ts() -> DateTime<FixedOffset> {
        china_tz().with_ymd_and_hms(2024, 1, 15, 9, 31, 0).unwrap()
    }

    #[test]
    fn returns_none_for_unknown_code() {
        let provider = InMemoryQuoteProvider::new();
        assert!(provider.get_quote("600519", ts()).is_none());
    }

    #[test]
    fn stock_and_etf_quotes_are_kept_separate() {
        let provider = InMemoryQuoteProvider::new();
        provider.set_stock_quote(Quote {
            code: "600519".into(),
            name: "stock".into(),
            price: 1.0,
            change_pct: 1.0,
            volume: 1.0,
            amount: 1.0,
            is_limit_up: false,
            timestamp: ts(),
        });
        assert!(provider.get_quote("600519", ts()).is_some());
        assert!(provider.get_etf_quote("600519", ts()).is_none());
    }

    #[test]
    fn holding_provider_returns_empty_vec_for_unknown_security() {
        let provider = InMemoryHoldingProvider::new();
        assert!(provider.find("600519", ts()).is_empty());
    }

    #[test]
    fn holding_provider_round_trips_entries() {
        let provider = InMemoryHoldingProvider::new();
        let entry = HoldingEntry::new("510300", "CSI300 ETF", 0.1, EtfCategory::BroadIndex, 1, true, 0.3)
            .unwrap();
        provider.set_holdings("600519", vec![entry.clone()]);
        assert_eq!(provider.find("600519", ts()), vec![entry]);
    }
}
