// =============================================================================
// Engine — top-level wiring: config load/save, chain resolution, coordinator
// =============================================================================

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::chain_executor::ChainExecutor;
use crate::error::ScanError;
use crate::strategy::{ChainConfig, StrategyRegistries};

fn default_cadence_ms() -> u64 {
    30_000
}

fn default_cache_ttl_secs() -> u64 {
    60
}

fn default_sink_enabled() -> bool {
    true
}

/// Top-level, JSON-loadable engine configuration. Every field carries a
/// serde default so an older config file missing new fields still loads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub chain: ChainConfig,

    /// Poll interval for `ScanCoordinator::run_live`, in milliseconds.
    #[serde(default = "default_cadence_ms")]
    pub cadence_ms: u64,

    /// TTL for the cached fetcher layer backing live quote/holding lookups.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Where accepted signals persist. `None` means in-memory only.
    #[serde(default)]
    pub repository_path: Option<PathBuf>,

    /// Whether accepted signals are sent anywhere at all. Mirrors the
    /// original's `alert.enabled` check in `create_sender_from_config`:
    /// there is no per-channel selection, just on (`log`) or off (`null`).
    #[serde(default = "default_sink_enabled")]
    pub sink_enabled: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            chain: ChainConfig::default(),
            cadence_ms: default_cadence_ms(),
            cache_ttl_secs: default_cache_ttl_secs(),
            repository_path: None,
            sink_enabled: default_sink_enabled(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a JSON file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ScanError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|err| ScanError::Config(format!("failed to read {}: {err}", path.display())))?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|err| ScanError::Config(format!("failed to parse {}: {err}", path.display())))?;
        info!(path = %path.display(), "engine config loaded");
        Ok(config)
    }

    /// Persist via an atomic tmp-write + rename, matching `RuntimeConfig::save`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ScanError> {
        let path = path.as_ref();
        let content = serde_json::to_string_pretty(self)
            .map_err(|err| ScanError::Config(format!("failed to serialize engine config: {err}")))?;

        let tmp_path = path.with_extension("json.tmp");
        std::fs::write(&tmp_path, &content)
            .map_err(|err| ScanError::Config(format!("failed to write tmp config to {}: {err}", tmp_path.display())))?;
        std::fs::rename(&tmp_path, path)
            .map_err(|err| ScanError::Config(format!("failed to rename tmp config to {}: {err}", path.display())))?;

        info!(path = %path.display(), "engine config saved (atomic)");
        Ok(())
    }
}

/// A fully resolved, ready-to-run engine: the `ChainExecutor` plus the
/// config it was built from (kept around for sink/repository wiring by
/// the caller, which owns the data providers).
pub struct Engine {
    pub chain_executor: ChainExecutor,
    pub config: EngineConfig,
}

impl Engine {
    /// Resolves every plugin name in `config.chain` against `registries`.
    /// Fails fast with `ScanError::Config` naming the first unknown plugin;
    /// this is the one place a bad config stops the engine from starting.
    pub fn build(config: EngineConfig, registries: &StrategyRegistries) -> Result<Self, ScanError> {
        let event_detector = registries
            .event_detectors
            .create(&config.chain.event_detector, &config.chain.event_config)
            .ok_or_else(|| ScanError::Config(format!("unknown event_detector plugin: {}", config.chain.event_detector)))?;

        let fund_selector = registries
            .fund_selectors
            .create(&config.chain.fund_selector, &config.chain.fund_config)
            .ok_or_else(|| ScanError::Config(format!("unknown fund_selector plugin: {}", config.chain.fund_selector)))?;

        let mut signal_filters = Vec::with_capacity(config.chain.signal_filters.len());
        for name in &config.chain.signal_filters {
            let filter_config = config
                .chain
                .filter_configs
                .get(name)
                .cloned()
                .unwrap_or(serde_json::Value::Null);
            let filter = registries
                .signal_filters
                .create(name, &filter_config)
                .ok_or_else(|| ScanError::Config(format!("unknown signal_filter plugin: {name}")))?;
            signal_filters.push(filter);
        }

        let evaluator = match &config.chain.evaluator {
            Some(name) => Some(
                registries
                    .evaluators
                    .create(name, &serde_json::Value::Null)
                    .ok_or_else(|| ScanError::Config(format!("unknown evaluator plugin: {name}")))?,
            ),
            None => None,
        };

        let chain_executor = ChainExecutor::new(event_detector, fund_selector, signal_filters, evaluator);
        if let Err(warnings) = chain_executor.validate() {
            return Err(ScanError::Config(warnings.join("; ")));
        }

        info!(
            event_detector = %config.chain.event_detector,
            fund_selector = %config.chain.fund_selector,
            filters = ?config.chain.signal_filters,
            "engine built"
        );

        Ok(Self { chain_executor, config })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_resolves_against_default_registries() {
        let registries = StrategyRegistries::with_defaults();
        let engine = Engine::build(EngineConfig::default(), &registries);
        assert!(engine.is_ok());
    }

    #[test]
    fn unknown_event_detector_is_a_fatal_config_error() {
        let registries = StrategyRegistries::with_defaults();
        let mut config = EngineConfig::default();
        config.chain.event_detector = "does_not_exist".to_string();
        match Engine::build(config, &registries) {
            Err(ScanError::Config(msg)) => assert!(msg.contains("does_not_exist")),
            _ => panic!("expected a Config error"),
        }
    }

    #[test]
    fn unknown_signal_filter_is_a_fatal_config_error() {
        let registries = StrategyRegistries::with_defaults();
        let mut config = EngineConfig::default();
        config.chain.signal_filters = vec!["nonexistent_filter".to_string()];
        match Engine::build(config, &registries) {
            Err(ScanError::Config(msg)) => assert!(msg.contains("nonexistent_filter")),
            _ => panic!("expected a Config error"),
        }
    }

    #[test]
    fn deserializes_partial_json_with_defaults() {
        let json = serde_json::json!({ "cadence_ms": 5000 });
        let config: EngineConfig = serde_json::from_value(json).unwrap();
        assert_eq!(config.cadence_ms, 5000);
        assert_eq!(config.cache_ttl_secs, 60);
        assert!(config.sink_enabled);
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = std::env::temp_dir().join(format!("arb_scanner_engine_test_{}", std::process::id()));
        let path = dir.join("engine.json");
        let _ = std::fs::create_dir_all(&dir);

        let config = EngineConfig::default();
        config.save(&path).unwrap();
        let reloaded = EngineConfig::load(&path).unwrap();
        assert_eq!(reloaded.cadence_ms, config.cadence_ms);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
