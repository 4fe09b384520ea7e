use chrono::{DateTime, FixedOffset};

use crate::domain::Event;
use crate::error::ScanError;
use crate::providers::QuoteProvider;

use super::EventDetector;

/// Fires when a quote carries `is_limit_up`. The sole required validity
/// check is `change_pct >= min_change_pct`, guarding against cached quotes
/// whose limit-up flag lags the actual move.
pub struct LimitUpDetector {
    /// Percent scale, matching `Quote::change_pct` (`9.5`, not `0.095`).
    pub min_change_pct: f64,
}

impl LimitUpDetector {
    pub fn new(min_change_pct: f64) -> Self {
        Self { min_change_pct }
    }
}

impl Default for LimitUpDetector {
    fn default() -> Self {
        Self::new(9.5)
    }
}

impl EventDetector for LimitUpDetector {
    fn detect(
        &self,
        quote_provider: &dyn QuoteProvider,
        security_code: &str,
        at: DateTime<FixedOffset>,
    ) -> Result<Option<Event>, ScanError> {
        let quote = quote_provider
            .get_quote(security_code, at)
            .ok_or_else(|| ScanError::NoData(security_code.to_string()))?;

        if !quote.is_limit_up {
            return Ok(None);
        }

        if quote.change_pct < self.min_change_pct {
            return Err(ScanError::InvalidEvent(format!(
                "change_pct {} below min_change_pct {}",
                quote.change_pct, self.min_change_pct
            )));
        }

        let mut metadata = std::collections::HashMap::new();
        metadata.insert("market".to_string(), serde_json::json!("CN"));

        Ok(Some(Event {
            event_type: "limit_up".to_string(),
            security_code: quote.code.clone(),
            security_name: quote.name.clone(),
            price: quote.price,
            change_pct: quote.change_pct,
            trigger_price: quote.price,
            trigger_time: quote.timestamp,
            volume: quote.volume,
            amount: quote.amount,
            metadata,
        }))
    }

    fn name(&self) -> &str {
        "limit_up"
    }
}

/// Fires when price clears a configured breakout percentage over the
/// previous close, subject to a minimum volume floor. Intended for markets
/// without a limit-up mechanism.
pub struct BreakoutDetector {
    pub breakout_pct: f64,
    pub min_volume: f64,
}

impl BreakoutDetector {
    pub fn new(breakout_pct: f64, min_volume: f64) -> Self {
        Self {
            breakout_pct,
            min_volume,
        }
    }
}

impl Default for BreakoutDetector {
    fn default() -> Self {
        Self::new(10.0, 1_000_000.0)
    }
}

impl EventDetector for BreakoutDetector {
    fn detect(
        &self,
        quote_provider: &dyn QuoteProvider,
        security_code: &str,
        at: DateTime<FixedOffset>,
    ) -> Result<Option<Event>, ScanError> {
        let quote = quote_provider
            .get_quote(security_code, at)
            .ok_or_else(|| ScanError::NoData(security_code.to_string()))?;

        if quote.change_pct < self.breakout_pct {
            return Ok(None);
        }
        if quote.volume < self.min_volume {
            return Ok(None);
        }

        Ok(Some(Event {
            event_type: "breakout".to_string(),
            security_code: quote.code.clone(),
            security_name: quote.name.clone(),
            price: quote.price,
            change_pct: quote.change_pct,
            trigger_price: quote.price,
            trigger_time: quote.timestamp,
            volume: quote.volume,
            amount: quote.amount,
            metadata: std::collections::HashMap::new(),
        }))
    }

    fn name(&self) -> &str {
        "breakout"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::china_tz;
    use crate::domain::Quote;
    use crate::providers::InMemoryQuoteProvider;
    use chrono::TimeZone;

    fn ts() -> DateTime<FixedOffset> {
        china_tz().with_ymd_and_hms(2024, 1, 15, 9, 31, 0).unwrap()
    }

    fn quote(is_limit_up: bool, change_pct: f64) -> Quote {
        Quote {
            code: "600519".into(),
            name: "Moutai".into(),
            price: 1800.0,
            change_pct,
            volume: 10000.0,
            amount: 500_000.0,
            is_limit_up,
            timestamp: ts(),
        }
    }

    #[test]
    fn limit_up_detector_returns_none_when_not_limit_up() {
        let provider = InMemoryQuoteProvider::new();
        provider.set_stock_quote(quote(false, 3.0));
        let detector = LimitUpDetector::default();
        let result = detector.detect(&provider, "600519", ts()).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn limit_up_detector_rejects_below_threshold() {
        let provider = InMemoryQuoteProvider::new();
        provider.set_stock_quote(quote(true, 2.0));
        let detector = LimitUpDetector::default();
        let result = detector.detect(&provider, "600519", ts());
        assert!(matches!(result, Err(ScanError::InvalidEvent(_))));
    }

    #[test]
    fn limit_up_detector_fires_on_valid_quote() {
        let provider = InMemoryQuoteProvider::new();
        provider.set_stock_quote(quote(true, 10.0));
        let detector = LimitUpDetector::default();
        let event = detector.detect(&provider, "600519", ts()).unwrap().unwrap();
        assert_eq!(event.event_type, "limit_up");
    }

    #[test]
    fn limit_up_detector_errors_on_missing_quote() {
        let provider = InMemoryQuoteProvider::new();
        let detector = LimitUpDetector::default();
        let result = detector.detect(&provider, "600519", ts());
        assert!(matches!(result, Err(ScanError::NoData(_))));
    }

    #[test]
    fn breakout_detector_requires_volume_floor() {
        let provider = InMemoryQuoteProvider::new();
        let mut q = quote(false, 12.0);
        q.volume = 100.0;
        provider.set_stock_quote(q);
        let detector = BreakoutDetector::default();
        let result = detector.detect(&provider, "600519", ts()).unwrap();
        assert!(result.is_none());
    }
}
