use serde::{Deserialize, Serialize};

use crate::error::ScanError;

/// Broad classification of an ETF's investment style. A superset of the
/// original CN-only category set, generalized to cover any market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EtfCategory {
    BroadIndex,
    Sector,
    Theme,
    Strategy,
    Other,
}

/// One ETF's position in a constituent security, as reported by the
/// holdings provider at some instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingEntry {
    pub etf_code: String,
    pub etf_name: String,
    pub weight: f64,
    pub category: EtfCategory,
    pub rank: i32,
    pub in_top10: bool,
    pub top10_ratio: f64,
}

impl HoldingEntry {
    /// Construct a validated holding entry. Malformed external data is
    /// rejected, never panicked on.
    pub fn new(
        etf_code: impl Into<String>,
        etf_name: impl Into<String>,
        weight: f64,
        category: EtfCategory,
        rank: i32,
        in_top10: bool,
        top10_ratio: f64,
    ) -> Result<Self, ScanError> {
        if !(0.0..=1.0).contains(&weight) {
            return Err(ScanError::InvalidEvent(format!(
                "holding weight {weight} out of range [0,1]"
            )));
        }
        if rank < -1 {
            return Err(ScanError::InvalidEvent(format!(
                "holding rank {rank} must be >= -1"
            )));
        }
        if !(0.0..=1.0).contains(&top10_ratio) {
            return Err(ScanError::InvalidEvent(format!(
                "holding top10_ratio {top10_ratio} out of range [0,1]"
            )));
        }

        Ok(Self {
            etf_code: etf_code.into(),
            etf_name: etf_name.into(),
            weight,
            category,
            rank,
            in_top10,
            top10_ratio,
        })
    }

    pub fn weight_pct(&self) -> f64 {
        self.weight * 100.0
    }

    pub fn to_value(&self) -> serde_json::Value {
        serde_json::to_value(self).expect("HoldingEntry always serializes")
    }

    pub fn from_value(value: serde_json::Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }
}
