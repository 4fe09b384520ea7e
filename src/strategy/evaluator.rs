use chrono::Timelike;

use crate::clock::{china_tz, current_clock};
use crate::domain::{Confidence, Event, HoldingEntry, RiskLevel};

use super::SignalEvaluator;

/// Shared threshold record parameterizing the scoring function. The
/// original had three near-duplicate evaluator classes differing only in
/// their numeric thresholds; this collapses them into one function plus
/// three constant presets.
#[derive(Debug, Clone, Copy)]
pub struct EvaluationThresholds {
    pub confidence_high_weight: f64,
    pub confidence_medium_weight: f64,
    pub confidence_low_weight: f64,
    pub confidence_high_rank: i32,
    pub confidence_low_rank: i32,
    pub risk_high_time_seconds: i64,
    pub risk_low_time_seconds: i64,
    pub risk_top10_ratio_high: f64,
    pub risk_morning_hour: u32,
}

pub const BALANCED_THRESHOLDS: EvaluationThresholds = EvaluationThresholds {
    confidence_high_weight: 0.10,
    confidence_medium_weight: 0.05,
    confidence_low_weight: 0.03,
    confidence_high_rank: 3,
    confidence_low_rank: 8,
    risk_high_time_seconds: 900,
    risk_low_time_seconds: 3600,
    risk_top10_ratio_high: 0.60,
    risk_morning_hour: 10,
};

pub const CONSERVATIVE_THRESHOLDS: EvaluationThresholds = EvaluationThresholds {
    confidence_high_weight: 0.12,
    confidence_medium_weight: 0.08,
    confidence_low_weight: 0.05,
    confidence_high_rank: 2,
    confidence_low_rank: 5,
    risk_high_time_seconds: 1800,
    risk_low_time_seconds: 5400,
    risk_top10_ratio_high: 0.50,
    risk_morning_hour: 10,
};

pub const AGGRESSIVE_THRESHOLDS: EvaluationThresholds = EvaluationThresholds {
    confidence_high_weight: 0.07,
    confidence_medium_weight: 0.03,
    confidence_low_weight: 0.015,
    confidence_high_rank: 5,
    confidence_low_rank: 12,
    risk_high_time_seconds: 600,
    risk_low_time_seconds: 2400,
    risk_top10_ratio_high: 0.70,
    risk_morning_hour: 9,
};

fn time_to_close_seconds() -> i64 {
    let now = current_clock().now(china_tz());
    if now.hour() < 9 || now.hour() >= 15 {
        return -1;
    }
    let close = now
        .date_naive()
        .and_hms_opt(15, 0, 0)
        .expect("valid close time");
    (close - now.naive_local()).num_seconds()
}

/// Shared scoring path for `DefaultEvaluator` and its conservative /
/// aggressive presets. Weight and rank drive confidence; time-to-close and
/// holding concentration drive risk.
pub fn score(
    _event: &Event,
    holding: &HoldingEntry,
    thresholds: &EvaluationThresholds,
) -> (Confidence, RiskLevel) {
    let mut confidence = Confidence::Medium;
    if holding.weight >= thresholds.confidence_high_weight {
        confidence = Confidence::High;
    } else if holding.weight < thresholds.confidence_low_weight {
        confidence = Confidence::Low;
    } else if holding.weight < thresholds.confidence_medium_weight {
        confidence = Confidence::Low;
    }

    if holding.rank <= thresholds.confidence_high_rank && confidence != Confidence::High {
        confidence = Confidence::High;
    } else if holding.rank > thresholds.confidence_low_rank {
        confidence = Confidence::Low;
    }

    let mut risk = RiskLevel::Medium;
    let time_to_close = time_to_close_seconds();
    if time_to_close >= 0 && time_to_close < thresholds.risk_high_time_seconds {
        risk = RiskLevel::High;
    } else if time_to_close > thresholds.risk_low_time_seconds {
        risk = RiskLevel::Low;
    }

    if holding.top10_ratio > thresholds.risk_top10_ratio_high {
        risk = match risk {
            RiskLevel::Low => RiskLevel::Medium,
            RiskLevel::Medium => RiskLevel::High,
            RiskLevel::High => RiskLevel::High,
        };
    }

    let current_hour = current_clock().now(china_tz()).hour();
    if current_hour < thresholds.risk_morning_hour && risk == RiskLevel::High {
        risk = RiskLevel::Medium;
    }

    (confidence, risk)
}

/// Scores with `BALANCED_THRESHOLDS`; the default, recommended preset.
pub struct DefaultEvaluator;

impl SignalEvaluator for DefaultEvaluator {
    fn evaluate(&self, event: &Event, holding: &HoldingEntry) -> (Confidence, RiskLevel) {
        score(event, holding, &BALANCED_THRESHOLDS)
    }

    fn name(&self) -> &str {
        "default"
    }
}

/// Scores with `CONSERVATIVE_THRESHOLDS`: stricter filtering, fewer but
/// higher-quality signals.
pub struct ConservativeEvaluator;

impl SignalEvaluator for ConservativeEvaluator {
    fn evaluate(&self, event: &Event, holding: &HoldingEntry) -> (Confidence, RiskLevel) {
        score(event, holding, &CONSERVATIVE_THRESHOLDS)
    }

    fn name(&self) -> &str {
        "conservative"
    }
}

/// Scores with `AGGRESSIVE_THRESHOLDS`: looser filtering, more signals.
pub struct AggressiveEvaluator;

impl SignalEvaluator for AggressiveEvaluator {
    fn evaluate(&self, event: &Event, holding: &HoldingEntry) -> (Confidence, RiskLevel) {
        score(event, holding, &AGGRESSIVE_THRESHOLDS)
    }

    fn name(&self) -> &str {
        "aggressive"
    }
}
