use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// A single price tick for a stock or ETF.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub code: String,
    pub name: String,
    pub price: f64,
    /// Percent scale, e.g. `9.98` for a 9.98% move, matching the original
    /// market data model rather than a fractional 0..1 scale.
    pub change_pct: f64,
    pub volume: f64,
    pub amount: f64,
    pub is_limit_up: bool,
    pub timestamp: DateTime<FixedOffset>,
}

impl Quote {
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::to_value(self).expect("Quote always serializes")
    }

    pub fn from_value(value: serde_json::Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::china_tz;
    use chrono::TimeZone;

    fn sample() -> Quote {
        Quote {
            code: "600519".into(),
            name: "Kweichow Moutai".into(),
            price: 1800.0,
            change_pct: 9.98,
            volume: 120_000.0,
            amount: 2_000_000.0,
            is_limit_up: true,
            timestamp: china_tz().with_ymd_and_hms(2024, 1, 15, 9, 31, 0).unwrap(),
        }
    }

    #[test]
    fn round_trips_through_json_value() {
        let q = sample();
        let value = q.to_value();
        let back = Quote::from_value(value).unwrap();
        assert_eq!(q, back);
    }
}
