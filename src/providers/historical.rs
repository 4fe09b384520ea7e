use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone};
use tracing::warn;

use crate::calendar::Granularity;
use crate::clock::china_tz;
use crate::domain::Quote;

use super::{limit_up_threshold, QuoteProvider};

fn cache_file_name(prefix: &str, code: &str, start: NaiveDate, end: NaiveDate, granularity: Granularity) -> String {
    let granularity_tag = match granularity {
        Granularity::Daily => "daily",
        Granularity::Min5 => "5m",
        Granularity::Min15 => "15m",
        Granularity::Min30 => "30m",
    };
    format!(
        "{prefix}_{code}_{}_{}_{granularity_tag}.json",
        start.format("%Y%m%d"),
        end.format("%Y%m%d"),
    )
}

fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    if raw.contains(' ') {
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
            .ok()
            .and_then(|naive| china_tz().from_local_datetime(&naive).single())
    } else {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .and_then(|naive| china_tz().from_local_datetime(&naive).single())
    }
}

fn load_quotes_file(path: &Path, code: &str) -> BTreeMap<DateTime<FixedOffset>, Quote> {
    let mut quotes = BTreeMap::new();
    let Ok(raw) = fs::read_to_string(path) else {
        warn!(path = %path.display(), "historical cache file missing, returning empty series");
        return quotes;
    };
    let parsed: serde_json::Value = match serde_json::from_str(&raw) {
        Ok(v) => v,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "failed to parse historical cache file");
            return quotes;
        }
    };
    let Some(map) = parsed.as_object() else {
        return quotes;
    };

    for (ts_str, record) in map {
        let Some(timestamp) = parse_timestamp(ts_str) else {
            continue;
        };
        let is_limit_up = record
            .get("is_limit_up")
            .and_then(|v| v.as_bool())
            .unwrap_or_else(|| {
                let change_pct = record.get("change_pct").and_then(|v| v.as_f64()).unwrap_or(0.0);
                change_pct / 100.0 >= limit_up_threshold(code) - 1e-9
            });

        let quote = Quote {
            code: code.to_string(),
            name: record.get("name").and_then(|v| v.as_str()).unwrap_or("").to_string(),
            price: record.get("price").and_then(|v| v.as_f64()).unwrap_or(0.0),
            change_pct: record.get("change_pct").and_then(|v| v.as_f64()).unwrap_or(0.0),
            volume: record.get("volume").and_then(|v| v.as_f64()).unwrap_or(0.0),
            amount: record.get("amount").and_then(|v| v.as_f64()).unwrap_or(0.0),
            is_limit_up,
            timestamp,
        };
        quotes.insert(timestamp, quote);
    }

    quotes
}

fn nearest_at_or_before(
    series: &BTreeMap<DateTime<FixedOffset>, Quote>,
    at: DateTime<FixedOffset>,
) -> Option<Quote> {
    series.range(..=at).next_back().map(|(_, q)| q.clone())
}

/// Historical stock quote provider backed by the replay file cache: one
/// file per `(code, start, end, granularity)`, a JSON map of formatted
/// timestamp to quote record. Bypasses the TTL cache entirely since the
/// whole series is loaded up front and replay is already deterministic.
pub struct HistoricalQuoteProvider {
    stocks: HashMap<String, BTreeMap<DateTime<FixedOffset>, Quote>>,
    etfs: HashMap<String, BTreeMap<DateTime<FixedOffset>, Quote>>,
}

impl HistoricalQuoteProvider {
    pub fn load(
        cache_dir: impl AsRef<Path>,
        stock_codes: &[String],
        etf_codes: &[String],
        start: NaiveDate,
        end: NaiveDate,
        granularity: Granularity,
    ) -> Self {
        let cache_dir = cache_dir.as_ref();
        let mut stocks = HashMap::new();
        for code in stock_codes {
            let path = cache_path(cache_dir, "stock", code, start, end, granularity);
            stocks.insert(code.clone(), load_quotes_file(&path, code));
        }
        let mut etfs = HashMap::new();
        for code in etf_codes {
            let path = cache_path(cache_dir, "etf", code, start, end, granularity);
            etfs.insert(code.clone(), load_quotes_file(&path, code));
        }
        Self { stocks, etfs }
    }

    pub fn loaded_stock_codes(&self) -> Vec<&str> {
        self.stocks.keys().map(|s| s.as_str()).collect()
    }

    pub fn series_len(&self, code: &str) -> usize {
        self.stocks.get(code).map(|m| m.len()).unwrap_or(0)
    }
}

fn cache_path(
    cache_dir: &Path,
    prefix: &str,
    code: &str,
    start: NaiveDate,
    end: NaiveDate,
    granularity: Granularity,
) -> PathBuf {
    cache_dir.join(cache_file_name(prefix, code, start, end, granularity))
}

impl QuoteProvider for HistoricalQuoteProvider {
    fn get_quote(&self, code: &str, at: DateTime<FixedOffset>) -> Option<Quote> {
        self.stocks.get(code).and_then(|series| nearest_at_or_before(series, at))
    }

    fn get_etf_quote(&self, code: &str, at: DateTime<FixedOffset>) -> Option<Quote> {
        self.etfs.get(code).and_then(|series| nearest_at_or_before(series, at))
    }
}

/// Historical holding-entry provider. Holdings are snapshotted per rebalance
/// date rather than tick-by-tick, so the loader indexes by effective date
/// and `find` returns the most recent snapshot at or before `at`.
pub struct HistoricalHoldingProvider {
    snapshots: HashMap<String, BTreeMap<DateTime<FixedOffset>, Vec<crate::domain::HoldingEntry>>>,
}

impl HistoricalHoldingProvider {
    pub fn new() -> Self {
        Self {
            snapshots: HashMap::new(),
        }
    }

    pub fn insert_snapshot(
        &mut self,
        security_code: impl Into<String>,
        at: DateTime<FixedOffset>,
        entries: Vec<crate::domain::HoldingEntry>,
    ) {
        self.snapshots
            .entry(security_code.into())
            .or_default()
            .insert(at, entries);
    }
}

impl Default for HistoricalHoldingProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl super::HoldingProvider for HistoricalHoldingProvider {
    fn find(&self, security_code: &str, at: DateTime<FixedOffset>) -> Vec<crate::domain::HoldingEntry> {
        self.snapshots
            .get(security_code)
            .and_then(|series| series.range(..=at).next_back())
            .map(|(_, entries)| entries.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_fixture(dir: &Path, name: &str, contents: &str) {
        let mut file = fs::File::create(dir.join(name)).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
    }

    #[test]
    fn loads_daily_series_and_fills_limit_up_from_threshold() {
        let tmp = std::env::temp_dir().join(format!("hist_cache_test_{}", std::process::id()));
        fs::create_dir_all(&tmp).unwrap();
        let contents = r#"{
            "2024-01-15": {"name": "Moutai", "price": 1800.0, "change_pct": 10.0, "volume": 100.0, "amount": 1000.0}
        }"#;
        write_fixture(&tmp, "stock_600519_20240115_20240115_daily.json", contents);

        let provider = HistoricalQuoteProvider::load(
            &tmp,
            &["600519".to_string()],
            &[],
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            Granularity::Daily,
        );

        let at = china_tz().with_ymd_and_hms(2024, 1, 15, 15, 0, 0).unwrap();
        let quote = provider.get_quote("600519", at).unwrap();
        assert!(quote.is_limit_up);

        fs::remove_dir_all(&tmp).ok();
    }

    #[test]
    fn missing_cache_file_yields_empty_series() {
        let tmp = std::env::temp_dir().join(format!("hist_cache_missing_{}", std::process::id()));
        fs::create_dir_all(&tmp).unwrap();
        let provider = HistoricalQuoteProvider::load(
            &tmp,
            &["999999".to_string()],
            &[],
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            Granularity::Daily,
        );
        assert_eq!(provider.series_len("999999"), 0);
        fs::remove_dir_all(&tmp).ok();
    }

    #[test]
    fn holding_snapshot_returns_most_recent_at_or_before() {
        let mut provider = HistoricalHoldingProvider::new();
        let early = china_tz().with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let late = china_tz().with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        provider.insert_snapshot("600519", early, vec![]);
        let entry = crate::domain::HoldingEntry::new(
            "510300", "CSI300 ETF", 0.1, crate::domain::EtfCategory::BroadIndex, 1, true, 0.3,
        )
        .unwrap();
        provider.insert_snapshot("600519", late, vec![entry.clone()]);

        let query = china_tz().with_ymd_and_hms(2024, 2, 15, 0, 0, 0).unwrap();
        let found = super::super::HoldingProvider::find(&provider, "600519", query);
        assert_eq!(found, vec![entry]);
    }
}
