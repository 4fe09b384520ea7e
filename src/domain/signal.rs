use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::error::ScanError;

/// Confidence tier assigned by a `SignalEvaluator`. Ordered `Low < Medium
/// < High` so `ConfidenceFilter`'s `min_confidence` check is a plain `>=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

/// Risk tier assigned alongside `Confidence`. Same ordering convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// One weighted component of a confidence score, kept for explainability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubScore {
    pub raw: f64,
    pub threshold: f64,
    pub weight_share: f64,
    pub pass: bool,
    pub weighted_score: f64,
}

/// Optional explanatory breakdown of how a signal's confidence was scored.
/// Not required on the core scan path; evaluators may populate it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceBreakdown {
    pub total_score: u8,
    pub level: Confidence,
    pub order_amount: SubScore,
    pub weight: SubScore,
    pub liquidity: SubScore,
    pub time_to_close: SubScore,
}

/// The unified signal emitted once an event clears fund selection, every
/// filter, and evaluation. A-share-only fields are carried as `Option`
/// rather than forking the struct per market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradingSignal {
    pub signal_id: String,
    pub stock_code: String,
    pub stock_name: String,
    pub etf_code: String,
    pub etf_name: String,
    pub weight: f64,
    pub rank: i32,
    pub change_pct: f64,
    pub confidence: Confidence,
    pub risk_level: RiskLevel,
    pub reason: String,
    pub trigger_time: DateTime<FixedOffset>,
    pub created_at: DateTime<FixedOffset>,
    #[serde(default)]
    pub limit_time: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub seal_amount: Option<f64>,
    #[serde(default)]
    pub breakdown: Option<ConfidenceBreakdown>,
}

impl TradingSignal {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        signal_id: impl Into<String>,
        stock_code: impl Into<String>,
        stock_name: impl Into<String>,
        etf_code: impl Into<String>,
        etf_name: impl Into<String>,
        weight: f64,
        rank: i32,
        change_pct: f64,
        confidence: Confidence,
        risk_level: RiskLevel,
        reason: impl Into<String>,
        trigger_time: DateTime<FixedOffset>,
        created_at: DateTime<FixedOffset>,
    ) -> Result<Self, ScanError> {
        let signal_id = signal_id.into();
        let stock_code = stock_code.into();
        let etf_code = etf_code.into();

        if signal_id.is_empty() {
            return Err(ScanError::InvalidEvent("signal_id must not be empty".into()));
        }
        if stock_code.is_empty() {
            return Err(ScanError::InvalidEvent("stock_code must not be empty".into()));
        }
        if etf_code.is_empty() {
            return Err(ScanError::InvalidEvent("etf_code must not be empty".into()));
        }

        Ok(Self {
            signal_id,
            stock_code,
            stock_name: stock_name.into(),
            etf_code,
            etf_name: etf_name.into(),
            weight,
            rank,
            change_pct,
            confidence,
            risk_level,
            reason: reason.into(),
            trigger_time,
            created_at,
            limit_time: None,
            seal_amount: None,
            breakdown: None,
        })
    }

    pub fn to_value(&self) -> serde_json::Value {
        serde_json::to_value(self).expect("TradingSignal always serializes")
    }

    pub fn from_value(value: serde_json::Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }
}
