use std::collections::HashMap;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// A detected market event (e.g. intraday limit-up), before any fund has
/// been selected or any filter has run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub event_type: String,
    pub security_code: String,
    pub security_name: String,
    pub price: f64,
    pub change_pct: f64,
    pub trigger_price: f64,
    pub trigger_time: DateTime<FixedOffset>,
    pub volume: f64,
    pub amount: f64,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Event {
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::to_value(self).expect("Event always serializes")
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

    fn sample() -> Event {
        let mut metadata = HashMap::new();
        metadata.insert("seal_amount".to_string(), serde_json::json!(5_000_000.0));
        Event {
            event_type: "limit_up".into(),
            security_code: "600519".into(),
            security_name: "Kweichow Moutai".into(),
            price: 1800.0,
            change_pct: 9.98,
            trigger_price: 1800.0,
            trigger_time: china_tz().with_ymd_and_hms(2024, 1, 15, 9, 31, 0).unwrap(),
            volume: 12000.0,
            amount: 200_000.0,
            metadata,
        }
    }

    #[test]
    fn round_trips_through_json_value() {
        let event = sample();
        let back = Event::from_value(event.to_value()).unwrap();
        assert_eq!(event, back);
    }

    #[test]
    fn missing_metadata_defaults_to_empty_map() {
        let mut value = sample().to_value();
        value.as_object_mut().unwrap().remove("metadata");
        let back = Event::from_value(value).unwrap();
        assert!(back.metadata.is_empty());
    }
}
