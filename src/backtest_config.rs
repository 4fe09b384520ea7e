// =============================================================================
// BacktestConfig — validated replay-mode configuration
// =============================================================================
//
// Counterpart to EngineConfig/ChainConfig for the replay path: dates,
// granularity, and the strategy thresholds a backtest run is parameterized
// by. Validates the same ranges the original dataclass's __post_init__ did.
// =============================================================================

use std::collections::HashMap;

use crate::calendar::Granularity;
use crate::error::ScanError;

const MIN_DATE: u32 = 20000101;
const MAX_DATE: u32 = 20991231;
const MIN_WEIGHT_THRESHOLD: f64 = 0.001;
const MAX_WEIGHT_THRESHOLD: f64 = 1.0;

fn default_min_time_to_close() -> i64 {
    1800
}

fn default_min_etf_volume() -> f64 {
    50_000_000.0
}

fn default_evaluator_type() -> String {
    "default".to_string()
}

/// How a backtest fills gaps between snapshot dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpolation {
    Linear,
    Step,
}

impl Interpolation {
    fn as_str(self) -> &'static str {
        match self {
            Interpolation::Linear => "linear",
            Interpolation::Step => "step",
        }
    }

    fn parse(s: &str) -> Result<Self, ScanError> {
        match s {
            "linear" => Ok(Interpolation::Linear),
            "step" => Ok(Interpolation::Step),
            other => Err(ScanError::Config(format!(
                "interpolation must be one of [linear, step], got {other}"
            ))),
        }
    }
}

fn granularity_str(g: Granularity) -> &'static str {
    match g {
        Granularity::Daily => "daily",
        Granularity::Min5 => "5m",
        Granularity::Min15 => "15m",
        Granularity::Min30 => "30m",
    }
}

fn parse_granularity(s: &str) -> Result<Granularity, ScanError> {
    match s {
        "daily" => Ok(Granularity::Daily),
        "5m" => Ok(Granularity::Min5),
        "15m" => Ok(Granularity::Min15),
        "30m" => Ok(Granularity::Min30),
        other => Err(ScanError::Config(format!(
            "granularity must be one of [daily, 5m, 15m, 30m], got {other}"
        ))),
    }
}

/// Validated replay-mode configuration. Construct via `new`, never the
/// struct literal, so every instance in the program has passed
/// `_validate_dates`/`_validate_weights`/`_validate_interpolation`'s Rust
/// equivalents.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub start_date: u32,
    pub end_date: u32,
    pub granularity: Granularity,
    pub min_weight: f64,
    pub min_time_to_close: i64,
    pub min_etf_volume: f64,
    pub evaluator_type: String,
    pub snapshot_dates: Option<Vec<String>>,
    pub interpolation: Interpolation,
    pub use_watchlist: bool,
}

#[allow(clippy::too_many_arguments)]
impl BacktestConfig {
    pub fn new(
        start_date: u32,
        end_date: u32,
        granularity: Granularity,
        min_weight: f64,
        min_time_to_close: i64,
        min_etf_volume: f64,
        evaluator_type: impl Into<String>,
        snapshot_dates: Option<Vec<String>>,
        interpolation: Interpolation,
        use_watchlist: bool,
    ) -> Result<Self, ScanError> {
        if start_date < MIN_DATE || start_date > MAX_DATE {
            return Err(ScanError::Config(format!(
                "start_date {start_date} out of range [{MIN_DATE}, {MAX_DATE}]"
            )));
        }
        if end_date < MIN_DATE || end_date > MAX_DATE {
            return Err(ScanError::Config(format!(
                "end_date {end_date} out of range [{MIN_DATE}, {MAX_DATE}]"
            )));
        }
        if start_date > end_date {
            return Err(ScanError::Config(format!(
                "start_date {start_date} must not be after end_date {end_date}"
            )));
        }
        if !(MIN_WEIGHT_THRESHOLD..=MAX_WEIGHT_THRESHOLD).contains(&min_weight) {
            return Err(ScanError::Config(format!(
                "min_weight {min_weight} out of range [{MIN_WEIGHT_THRESHOLD}, {MAX_WEIGHT_THRESHOLD}]"
            )));
        }

        Ok(Self {
            start_date,
            end_date,
            granularity,
            min_weight,
            min_time_to_close,
            min_etf_volume,
            evaluator_type: evaluator_type.into(),
            snapshot_dates,
            interpolation,
            use_watchlist,
        })
    }

    /// `to_dict` equivalent: a plain string-keyed map, the Rust analogue of
    /// the Python dataclass's field dict.
    pub fn to_map(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("start_date".to_string(), serde_json::json!(self.start_date));
        map.insert("end_date".to_string(), serde_json::json!(self.end_date));
        map.insert("granularity".to_string(), serde_json::json!(granularity_str(self.granularity)));
        map.insert("min_weight".to_string(), serde_json::json!(self.min_weight));
        map.insert("min_time_to_close".to_string(), serde_json::json!(self.min_time_to_close));
        map.insert("min_etf_volume".to_string(), serde_json::json!(self.min_etf_volume));
        map.insert("evaluator_type".to_string(), serde_json::json!(self.evaluator_type));
        map.insert("snapshot_dates".to_string(), serde_json::json!(self.snapshot_dates));
        map.insert("interpolation".to_string(), serde_json::json!(self.interpolation.as_str()));
        map.insert("use_watchlist".to_string(), serde_json::json!(self.use_watchlist));
        map
    }

    /// `from_dict` equivalent, with the same defaults the Python
    /// `BacktestConfig.from_dict` applies for missing optional keys.
    pub fn from_map(map: &HashMap<String, serde_json::Value>) -> Result<Self, ScanError> {
        let get = |key: &str| map.get(key).cloned().unwrap_or(serde_json::Value::Null);
        let missing = |key: &str| ScanError::Config(format!("BacktestConfig.from_map: missing {key}"));

        let start_date = get("start_date").as_u64().ok_or_else(|| missing("start_date"))? as u32;
        let end_date = get("end_date").as_u64().ok_or_else(|| missing("end_date"))? as u32;
        let granularity = match get("granularity").as_str() {
            Some(s) => parse_granularity(s)?,
            None => Granularity::Daily,
        };
        let min_weight = get("min_weight").as_f64().unwrap_or(0.05);
        let min_time_to_close = get("min_time_to_close").as_i64().unwrap_or_else(default_min_time_to_close);
        let min_etf_volume = get("min_etf_volume").as_f64().unwrap_or_else(default_min_etf_volume);
        let evaluator_type = get("evaluator_type")
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(default_evaluator_type);
        let snapshot_dates = match map.get("snapshot_dates") {
            Some(serde_json::Value::Array(items)) => Some(
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect(),
            ),
            _ => None,
        };
        let interpolation = match get("interpolation").as_str() {
            Some(s) => Interpolation::parse(s)?,
            None => Interpolation::Linear,
        };
        let use_watchlist = get("use_watchlist").as_bool().unwrap_or(true);

        Self::new(
            start_date,
            end_date,
            granularity,
            min_weight,
            min_time_to_close,
            min_etf_volume,
            evaluator_type,
            snapshot_dates,
            interpolation,
            use_watchlist,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> BacktestConfig {
        BacktestConfig::new(
            20240101,
            20241231,
            Granularity::Min5,
            0.05,
            1800,
            50_000_000.0,
            "default",
            None,
            Interpolation::Linear,
            true,
        )
        .unwrap()
    }

    #[test]
    fn rejects_start_date_before_min_date() {
        let result = BacktestConfig::new(
            19991231, 20241231, Granularity::Daily, 0.05, 1800, 50_000_000.0,
            "default", None, Interpolation::Linear, true,
        );
        assert!(matches!(result, Err(ScanError::Config(_))));
    }

    #[test]
    fn rejects_start_after_end() {
        let result = BacktestConfig::new(
            20241231, 20240101, Granularity::Daily, 0.05, 1800, 50_000_000.0,
            "default", None, Interpolation::Linear, true,
        );
        assert!(matches!(result, Err(ScanError::Config(_))));
    }

    #[test]
    fn rejects_min_weight_out_of_range() {
        let result = BacktestConfig::new(
            20240101, 20241231, Granularity::Daily, 1.5, 1800, 50_000_000.0,
            "default", None, Interpolation::Linear, true,
        );
        assert!(matches!(result, Err(ScanError::Config(_))));
    }

    #[test]
    fn from_map_of_to_map_round_trips() {
        let cfg = valid();
        let back = BacktestConfig::from_map(&cfg.to_map()).unwrap();
        assert_eq!(cfg, back);
    }

    #[test]
    fn from_map_applies_defaults_for_missing_optional_fields() {
        let mut map = HashMap::new();
        map.insert("start_date".to_string(), serde_json::json!(20240101));
        map.insert("end_date".to_string(), serde_json::json!(20241231));
        let cfg = BacktestConfig::from_map(&map).unwrap();
        assert_eq!(cfg.granularity, Granularity::Daily);
        assert_eq!(cfg.min_time_to_close, 1800);
        assert_eq!(cfg.evaluator_type, "default");
        assert!(cfg.use_watchlist);
    }
}
