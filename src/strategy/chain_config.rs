use std::collections::HashMap;

use serde::{Deserialize, Serialize};

fn default_filters() -> Vec<String> {
    vec!["time_filter".to_string(), "liquidity_filter".to_string()]
}

/// Declarative description of one `ChainExecutor`: which registered
/// plugin to use for each role, by name, plus their JSON config blobs.
/// `Engine::build` resolves every name against the `PluginRegistry`
/// instances before the engine can start.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    #[serde(default = "default_event_detector")]
    pub event_detector: String,
    #[serde(default = "default_fund_selector")]
    pub fund_selector: String,
    #[serde(default = "default_filters")]
    pub signal_filters: Vec<String>,
    #[serde(default)]
    pub event_config: serde_json::Value,
    #[serde(default)]
    pub fund_config: serde_json::Value,
    #[serde(default)]
    pub filter_configs: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub evaluator: Option<String>,
}

fn default_event_detector() -> String {
    "limit_up".to_string()
}

fn default_fund_selector() -> String {
    "highest_weight".to_string()
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            event_detector: default_event_detector(),
            fund_selector: default_fund_selector(),
            signal_filters: default_filters(),
            event_config: serde_json::Value::Object(Default::default()),
            fund_config: serde_json::Value::Object(Default::default()),
            filter_configs: HashMap::new(),
            evaluator: Some("default".to_string()),
        }
    }
}
