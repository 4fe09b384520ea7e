use chrono::{DateTime, FixedOffset, NaiveTime, Timelike};

use crate::domain::{Event, HoldingEntry, TradingSignal};
use crate::error::ScanError;
use crate::providers::QuoteProvider;

use super::SignalFilter;

const MORNING_END: (u32, u32) = (11, 30);
const AFTERNOON_START: (u32, u32) = (13, 0);
const AFTERNOON_END: (u32, u32) = (15, 0);

fn time_of(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

/// Seconds to the close of the current half-session; -1 outside 09:00-15:00.
fn time_to_close_seconds(at: DateTime<FixedOffset>) -> i64 {
    let hour = at.hour();
    if hour < 9 || hour >= 15 {
        return -1;
    }
    let t = at.time();
    let morning_end = time_of(MORNING_END.0, MORNING_END.1);
    let afternoon_start = time_of(AFTERNOON_START.0, AFTERNOON_START.1);
    let afternoon_end = time_of(AFTERNOON_END.0, AFTERNOON_END.1);

    let close = if t < afternoon_start && t <= morning_end {
        at.date_naive().and_time(morning_end)
    } else {
        at.date_naive().and_time(afternoon_end)
    };
    (close - at.naive_local()).num_seconds()
}

/// Required: rejects signals too close to (or outside) the trading close.
pub struct TimeFilterCn {
    pub min_time_to_close: i64,
}

impl TimeFilterCn {
    pub fn new(min_time_to_close: i64) -> Self {
        Self { min_time_to_close }
    }
}

impl Default for TimeFilterCn {
    fn default() -> Self {
        Self::new(1800)
    }
}

impl SignalFilter for TimeFilterCn {
    fn check(
        &self,
        _event: &Event,
        _holding: &HoldingEntry,
        _draft: &TradingSignal,
        _quote_provider: &dyn QuoteProvider,
        at: DateTime<FixedOffset>,
    ) -> Result<(), ScanError> {
        let remaining = time_to_close_seconds(at);
        if remaining < 0 {
            return Err(ScanError::FilterReject {
                filter: self.name().to_string(),
                reason: "not currently in trading hours".to_string(),
            });
        }
        if remaining < self.min_time_to_close {
            return Err(ScanError::FilterReject {
                filter: self.name().to_string(),
                reason: format!("only {} minutes to close", remaining / 60),
            });
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "time_filter"
    }
}

/// Required: rejects a selected ETF whose current-day turnover is below the
/// configured floor. The original stub always accepted; the specified
/// contract ("reject below min_daily_amount") is what's implemented here.
pub struct LiquidityFilter {
    pub min_daily_amount: f64,
}

impl LiquidityFilter {
    pub fn new(min_daily_amount: f64) -> Self {
        Self { min_daily_amount }
    }
}

impl Default for LiquidityFilter {
    fn default() -> Self {
        Self::new(50_000_000.0)
    }
}

impl SignalFilter for LiquidityFilter {
    fn check(
        &self,
        _event: &Event,
        holding: &HoldingEntry,
        _draft: &TradingSignal,
        quote_provider: &dyn QuoteProvider,
        at: DateTime<FixedOffset>,
    ) -> Result<(), ScanError> {
        let etf_quote = quote_provider
            .get_etf_quote(&holding.etf_code, at)
            .ok_or_else(|| ScanError::NoData(holding.etf_code.clone()))?;

        if etf_quote.amount < self.min_daily_amount {
            return Err(ScanError::FilterReject {
                filter: self.name().to_string(),
                reason: format!(
                    "ETF turnover {:.0} below floor {:.0}",
                    etf_quote.amount, self.min_daily_amount
                ),
            });
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "liquidity_filter"
    }
}

/// Advisory: flags overly concentrated or poorly ranked holdings without
/// aborting the chain.
pub struct RiskFilter {
    pub max_top10_ratio: f64,
    pub min_rank: i32,
}

impl RiskFilter {
    pub fn new(max_top10_ratio: f64, min_rank: i32) -> Self {
        Self {
            max_top10_ratio,
            min_rank,
        }
    }
}

impl Default for RiskFilter {
    fn default() -> Self {
        Self::new(0.70, 0)
    }
}

impl SignalFilter for RiskFilter {
    fn check(
        &self,
        _event: &Event,
        holding: &HoldingEntry,
        _draft: &TradingSignal,
        _quote_provider: &dyn QuoteProvider,
        _at: DateTime<FixedOffset>,
    ) -> Result<(), ScanError> {
        if holding.top10_ratio > self.max_top10_ratio {
            return Err(ScanError::FilterReject {
                filter: self.name().to_string(),
                reason: format!(
                    "holdings too concentrated (top10 {:.1}%)",
                    holding.top10_ratio * 100.0
                ),
            });
        }
        if self.min_rank > 0 && holding.rank > self.min_rank {
            return Err(ScanError::FilterReject {
                filter: self.name().to_string(),
                reason: format!("rank {} too low", holding.rank),
            });
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "risk_filter"
    }

    fn is_required(&self) -> bool {
        false
    }
}

/// Advisory: rejects signals whose (as-yet-unevaluated) confidence tier is
/// below a configured floor.
pub struct ConfidenceFilter {
    pub min_confidence: crate::domain::Confidence,
}

impl ConfidenceFilter {
    pub fn new(min_confidence: crate::domain::Confidence) -> Self {
        Self { min_confidence }
    }
}

impl Default for ConfidenceFilter {
    fn default() -> Self {
        Self::new(crate::domain::Confidence::Medium)
    }
}

impl SignalFilter for ConfidenceFilter {
    fn check(
        &self,
        _event: &Event,
        _holding: &HoldingEntry,
        draft: &TradingSignal,
        _quote_provider: &dyn QuoteProvider,
        _at: DateTime<FixedOffset>,
    ) -> Result<(), ScanError> {
        if draft.confidence < self.min_confidence {
            return Err(ScanError::FilterReject {
                filter: self.name().to_string(),
                reason: format!("confidence {:?} below floor {:?}", draft.confidence, self.min_confidence),
            });
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "confidence_filter"
    }

    fn is_required(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::china_tz;
    use crate::domain::{Confidence, EtfCategory, Quote, RiskLevel};
    use crate::providers::InMemoryQuoteProvider;
    use chrono::TimeZone;

    fn sample_event(at: DateTime<FixedOffset>) -> Event {
        Event {
            event_type: "limit_up".into(),
            security_code: "600519".into(),
            security_name: "Moutai".into(),
            price: 1800.0,
            change_pct: 10.0,
            trigger_price: 1800.0,
            trigger_time: at,
            volume: 1000.0,
            amount: 1_000_000.0,
            metadata: Default::default(),
        }
    }

    fn sample_holding() -> HoldingEntry {
        HoldingEntry::new("510300", "CSI300 ETF", 0.1, EtfCategory::BroadIndex, 1, true, 0.3).unwrap()
    }

    fn sample_draft(at: DateTime<FixedOffset>) -> TradingSignal {
        TradingSignal::new(
            "sig-1", "600519", "Moutai", "510300", "CSI300 ETF", 0.1, 1, 10.0,
            Confidence::Low, RiskLevel::Low, "draft", at, at,
        )
        .unwrap()
    }

    #[test]
    fn time_filter_rejects_outside_trading_hours() {
        let at = china_tz().with_ymd_and_hms(2024, 1, 15, 20, 0, 0).unwrap();
        let provider = InMemoryQuoteProvider::new();
        let filter = TimeFilterCn::default();
        let result = filter.check(&sample_event(at), &sample_holding(), &sample_draft(at), &provider, at);
        assert!(result.is_err());
    }

    #[test]
    fn time_filter_rejects_too_close_to_close() {
        let at = china_tz().with_ymd_and_hms(2024, 1, 15, 14, 55, 0, ).unwrap();
        let provider = InMemoryQuoteProvider::new();
        let filter = TimeFilterCn::default();
        let result = filter.check(&sample_event(at), &sample_holding(), &sample_draft(at), &provider, at);
        match result {
            Err(ScanError::FilterReject { reason, .. }) => assert!(reason.contains("5 minutes to close")),
            other => panic!("expected a FilterReject, got {other:?}"),
        }
    }

    #[test]
    fn time_filter_rejection_reason_reports_minutes_not_seconds() {
        let at = china_tz().with_ymd_and_hms(2024, 1, 15, 14, 45, 0).unwrap();
        let provider = InMemoryQuoteProvider::new();
        let filter = TimeFilterCn::new(1800);
        let result = filter.check(&sample_event(at), &sample_holding(), &sample_draft(at), &provider, at);
        match result {
            Err(ScanError::FilterReject { reason, .. }) => assert!(reason.contains("15 minutes to close")),
            other => panic!("expected a FilterReject, got {other:?}"),
        }
    }

    #[test]
    fn time_filter_accepts_mid_session() {
        let at = china_tz().with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap();
        let provider = InMemoryQuoteProvider::new();
        let filter = TimeFilterCn::default();
        let result = filter.check(&sample_event(at), &sample_holding(), &sample_draft(at), &provider, at);
        assert!(result.is_ok());
    }

    #[test]
    fn liquidity_filter_rejects_below_floor() {
        let at = china_tz().with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap();
        let provider = InMemoryQuoteProvider::new();
        provider.set_etf_quote(Quote {
            code: "510300".into(),
            name: "CSI300 ETF".into(),
            price: 4.0,
            change_pct: 1.0,
            volume: 1000.0,
            amount: 10_000_000.0,
            is_limit_up: false,
            timestamp: at,
        });
        let filter = LiquidityFilter::default();
        let result = filter.check(&sample_event(at), &sample_holding(), &sample_draft(at), &provider, at);
        assert!(result.is_err());
    }

    #[test]
    fn liquidity_filter_accepts_above_floor() {
        let at = china_tz().with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap();
        let provider = InMemoryQuoteProvider::new();
        provider.set_etf_quote(Quote {
            code: "510300".into(),
            name: "CSI300 ETF".into(),
            price: 4.0,
            change_pct: 1.0,
            volume: 1000.0,
            amount: 100_000_000.0,
            is_limit_up: false,
            timestamp: at,
        });
        let filter = LiquidityFilter::default();
        let result = filter.check(&sample_event(at), &sample_holding(), &sample_draft(at), &provider, at);
        assert!(result.is_ok());
    }

    #[test]
    fn risk_filter_is_advisory() {
        let filter = RiskFilter::default();
        assert!(!filter.is_required());
    }

    #[test]
    fn risk_filter_rejects_overconcentrated_holding() {
        let at = china_tz().with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap();
        let provider = InMemoryQuoteProvider::new();
        let holding = HoldingEntry::new("510300", "CSI300 ETF", 0.1, EtfCategory::BroadIndex, 1, true, 0.9).unwrap();
        let filter = RiskFilter::default();
        let result = filter.check(&sample_event(at), &holding, &sample_draft(at), &provider, at);
        assert!(result.is_err());
    }

    #[test]
    fn confidence_filter_rejects_low_confidence_draft() {
        let at = china_tz().with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap();
        let provider = InMemoryQuoteProvider::new();
        let filter = ConfidenceFilter::default();
        let result = filter.check(&sample_event(at), &sample_holding(), &sample_draft(at), &provider, at);
        assert!(result.is_err());
    }
}
