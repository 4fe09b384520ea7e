// =============================================================================
// ChainExecutor — orchestrates one scan of one security at one instant
// =============================================================================

use chrono::{DateTime, FixedOffset};
use tracing::warn;

use crate::domain::{Confidence, RiskLevel, TradingSignal};
use crate::error::ScanError;
use crate::providers::{HoldingProvider, QuoteProvider};
use crate::strategy::{EventDetector, FundSelector, SignalEvaluator, SignalFilter};

/// The typed, discriminated result of one chain execution, replacing the
/// original's ad-hoc `(Option<signal>, [reason])` tuple.
pub enum ChainOutcome {
    Signal(TradingSignal, Vec<String>),
    NoSignal(ScanError, Vec<String>),
}

pub struct ChainExecutor {
    pub event_detector: Box<dyn EventDetector>,
    pub fund_selector: Box<dyn FundSelector>,
    pub signal_filters: Vec<Box<dyn SignalFilter>>,
    pub evaluator: Option<Box<dyn SignalEvaluator>>,
}

impl ChainExecutor {
    pub fn new(
        event_detector: Box<dyn EventDetector>,
        fund_selector: Box<dyn FundSelector>,
        signal_filters: Vec<Box<dyn SignalFilter>>,
        evaluator: Option<Box<dyn SignalEvaluator>>,
    ) -> Self {
        Self {
            event_detector,
            fund_selector,
            signal_filters,
            evaluator,
        }
    }

    /// `Ok` iff a detector and selector are configured; a missing filter
    /// list is a warning, not a failure.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        if self.signal_filters.is_empty() {
            warn!("chain executor has no signal filters configured");
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    pub fn execute(
        &self,
        quote_provider: &dyn QuoteProvider,
        holding_provider: &dyn HoldingProvider,
        security_code: &str,
        at: DateTime<FixedOffset>,
    ) -> ChainOutcome {
        let mut log = Vec::new();

        // Step 1/2: detect the event.
        let event = match self.event_detector.detect(quote_provider, security_code, at) {
            Ok(Some(event)) => event,
            Ok(None) => {
                log.push(format!("no event detected by {}", self.event_detector.name()));
                return ChainOutcome::NoSignal(
                    ScanError::NoData(security_code.to_string()),
                    log,
                );
            }
            Err(err @ ScanError::ProviderTimeout(_)) => {
                log.push(format!("provider timed out: {}", err.as_no_data()));
                return ChainOutcome::NoSignal(ScanError::NoData(err.as_no_data()), log);
            }
            Err(err) => {
                log.push(format!("event detection failed: {err}"));
                return ChainOutcome::NoSignal(err, log);
            }
        };
        log.push(format!(
            "detected {} for {} (+{:.2}%)",
            event.event_type, event.security_name, event.change_pct
        ));

        // Step 3: eligible funds.
        let eligible = holding_provider.find(&event.security_code, at);
        if eligible.is_empty() {
            log.push("no eligible funds".to_string());
            return ChainOutcome::NoSignal(
                ScanError::NoCandidate(event.security_code.clone()),
                log,
            );
        }

        // Step 4: select a fund.
        let Some(holding) = self.fund_selector.select(&eligible) else {
            log.push(format!(
                "fund selector {} returned no candidate from {} eligible",
                self.fund_selector.name(),
                eligible.len()
            ));
            return ChainOutcome::NoSignal(
                ScanError::NoCandidate(event.security_code.clone()),
                log,
            );
        };
        log.push(format!("selected {} (weight {:.2}%)", holding.etf_name, holding.weight_pct()));

        // Step 5: ETF quote.
        if quote_provider.get_etf_quote(&holding.etf_code, at).is_none() {
            log.push(format!("no ETF quote for {}", holding.etf_code));
            return ChainOutcome::NoSignal(ScanError::NoData(holding.etf_code.clone()), log);
        }

        // Step 6: draft signal.
        let signal_id = format!("SIG_{}_{}", at.format("%Y%m%d%H%M%S"), event.security_code);
        let reason = format!(
            "{} {} ({:+.2}%), held at {:.2}% weight (rank {}) in {}",
            event.security_name, event.event_type, event.change_pct,
            holding.weight_pct(), holding.rank, holding.etf_name
        );
        let mut draft = match TradingSignal::new(
            signal_id,
            event.security_code.clone(),
            event.security_name.clone(),
            holding.etf_code.clone(),
            holding.etf_name.clone(),
            holding.weight,
            holding.rank,
            event.change_pct,
            Confidence::Low,
            RiskLevel::Medium,
            reason,
            event.trigger_time,
            at,
        ) {
            Ok(signal) => signal,
            Err(err) => {
                log.push(format!("failed to construct draft signal: {err}"));
                return ChainOutcome::NoSignal(err, log);
            }
        };
        draft.seal_amount = event
            .metadata
            .get("seal_amount")
            .and_then(|v| v.as_f64());

        // Step 7: filters, in configured order.
        for filter in &self.signal_filters {
            if let Err(err) = filter.check(&event, &holding, &draft, quote_provider, at) {
                if filter.is_required() {
                    log.push(format!("rejected by {}: {err}", filter.name()));
                    return ChainOutcome::NoSignal(err, log);
                }
                log.push(format!("warning from {}: {err}", filter.name()));
            }
        }

        // Step 8: evaluate.
        if let Some(evaluator) = &self.evaluator {
            let (confidence, risk_level) = evaluator.evaluate(&event, &holding);
            draft.confidence = confidence;
            draft.risk_level = risk_level;
            log.push(format!(
                "evaluated by {}: confidence={:?} risk={:?}",
                evaluator.name(), draft.confidence, draft.risk_level
            ));
        }

        log.push(format!("signal generated: {} -> {}", draft.stock_name, draft.etf_name));
        ChainOutcome::Signal(draft, log)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::china_tz;
    use crate::domain::{EtfCategory, HoldingEntry, Quote};
    use crate::providers::{InMemoryHoldingProvider, InMemoryQuoteProvider};
    use crate::strategy::{HighestWeightSelector, LimitUpDetector, TimeFilterCn};
    use chrono::TimeZone;

    fn ts() -> DateTime<FixedOffset> {
        china_tz().with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap()
    }

    fn executor() -> ChainExecutor {
        ChainExecutor::new(
            Box::new(LimitUpDetector::default()),
            Box::new(HighestWeightSelector),
            vec![],
            None,
        )
    }

    #[test]
    fn no_quote_yields_no_data() {
        let exec = executor();
        let quotes = InMemoryQuoteProvider::new();
        let holdings = InMemoryHoldingProvider::new();
        match exec.execute(&quotes, &holdings, "600519", ts()) {
            ChainOutcome::NoSignal(ScanError::NoData(_), _) => {}
            _ => panic!("expected NoData"),
        }
    }

    #[test]
    fn full_chain_produces_signal() {
        let exec = executor();
        let quotes = InMemoryQuoteProvider::new();
        let holdings = InMemoryHoldingProvider::new();
        quotes.set_stock_quote(Quote {
            code: "600519".into(),
            name: "Moutai".into(),
            price: 1800.0,
            change_pct: 10.0,
            volume: 1000.0,
            amount: 500_000.0,
            is_limit_up: true,
            timestamp: ts(),
        });
        quotes.set_etf_quote(Quote {
            code: "510300".into(),
            name: "CSI300 ETF".into(),
            price: 4.0,
            change_pct: 1.0,
            volume: 1000.0,
            amount: 100_000_000.0,
            is_limit_up: false,
            timestamp: ts(),
        });
        holdings.set_holdings(
            "600519",
            vec![HoldingEntry::new("510300", "CSI300 ETF", 0.1, EtfCategory::BroadIndex, 1, true, 0.3).unwrap()],
        );

        match exec.execute(&quotes, &holdings, "600519", ts()) {
            ChainOutcome::Signal(signal, _log) => {
                assert_eq!(signal.etf_code, "510300");
                assert_eq!(signal.stock_code, "600519");
            }
            ChainOutcome::NoSignal(err, log) => panic!("expected signal, got {err} ({log:?})"),
        }
    }

    #[test]
    fn required_filter_rejection_short_circuits() {
        let exec = ChainExecutor::new(
            Box::new(LimitUpDetector::default()),
            Box::new(HighestWeightSelector),
            vec![Box::new(TimeFilterCn::new(1_000_000))],
            None,
        );
        let quotes = InMemoryQuoteProvider::new();
        let holdings = InMemoryHoldingProvider::new();
        quotes.set_stock_quote(Quote {
            code: "600519".into(),
            name: "Moutai".into(),
            price: 1800.0,
            change_pct: 10.0,
            volume: 1000.0,
            amount: 500_000.0,
            is_limit_up: true,
            timestamp: ts(),
        });
        quotes.set_etf_quote(Quote {
            code: "510300".into(),
            name: "CSI300 ETF".into(),
            price: 4.0,
            change_pct: 1.0,
            volume: 1000.0,
            amount: 100_000_000.0,
            is_limit_up: false,
            timestamp: ts(),
        });
        holdings.set_holdings(
            "600519",
            vec![HoldingEntry::new("510300", "CSI300 ETF", 0.1, EtfCategory::BroadIndex, 1, true, 0.3).unwrap()],
        );

        match exec.execute(&quotes, &holdings, "600519", ts()) {
            ChainOutcome::NoSignal(ScanError::FilterReject { filter, .. }, _) => {
                assert_eq!(filter, "time_filter");
            }
            _ => panic!("expected filter rejection"),
        }
    }

    #[test]
    fn validate_ok_with_detector_and_selector() {
        let exec = executor();
        assert!(exec.validate().is_ok());
    }
}
