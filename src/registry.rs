// =============================================================================
// Plugin registry — named factory table per strategy role
// =============================================================================
//
// Python registers strategies via a class decorator executed at import
// time. Rust has no such hook, so each strategy module exposes a plain
// `register_defaults(registry)` function the engine calls at construction
// time — the same end state (every built-in strategy available by name)
// reached through an explicit call instead of an import side effect.
// =============================================================================

use std::collections::HashMap;

use tracing::warn;

/// Static description of a registered plugin, independent of its factory.
#[derive(Debug, Clone)]
pub struct PluginMetadata {
    pub name: String,
    pub priority: i32,
    pub description: String,
    pub version: String,
}

struct Entry<T: ?Sized> {
    factory: Box<dyn Fn(&serde_json::Value) -> Box<T> + Send + Sync>,
    metadata: PluginMetadata,
}

/// Name -> (factory, metadata) table for one strategy role
/// (`event_detector`, `fund_selector`, `signal_filter`, `evaluator`, `sender`).
pub struct PluginRegistry<T: ?Sized> {
    entries: HashMap<String, Entry<T>>,
}

impl<T: ?Sized> Default for PluginRegistry<T> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<T: ?Sized> PluginRegistry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plugin factory under `name`. Replacing an existing name
    /// is allowed (later registration wins) but logged at `warn!`, matching
    /// the engine's "do not silently shadow" invariant.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        factory: impl Fn(&serde_json::Value) -> Box<T> + Send + Sync + 'static,
        priority: i32,
        description: impl Into<String>,
        version: impl Into<String>,
    ) {
        let name = name.into();
        if self.entries.contains_key(&name) {
            warn!(plugin = %name, "replacing existing plugin registration");
        }
        self.entries.insert(
            name.clone(),
            Entry {
                factory: Box::new(factory),
                metadata: PluginMetadata {
                    name,
                    priority,
                    description: description.into(),
                    version: version.into(),
                },
            },
        );
    }

    pub fn create(&self, name: &str, config: &serde_json::Value) -> Option<Box<T>> {
        self.entries.get(name).map(|entry| (entry.factory)(config))
    }

    pub fn get_metadata(&self, name: &str) -> Option<&PluginMetadata> {
        self.entries.get(name).map(|e| &e.metadata)
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn unregister(&mut self, name: &str) -> bool {
        self.entries.remove(name).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }

    /// Registered names, sorted by descending priority then name for a
    /// stable tie-break.
    pub fn list_names(&self) -> Vec<String> {
        let mut items: Vec<&PluginMetadata> = self.entries.values().map(|e| &e.metadata).collect();
        items.sort_by(|a, b| b.priority.cmp(&a.priority).then_with(|| a.name.cmp(&b.name)));
        items.into_iter().map(|m| m.name.clone()).collect()
    }

    pub fn summary(&self) -> String {
        let names = self.list_names();
        format!("{} plugins registered: [{}]", names.len(), names.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Noop {}
    struct NoopImpl;
    impl Noop for NoopImpl {}

    #[test]
    fn register_and_create_round_trip() {
        let mut registry: PluginRegistry<dyn Noop> = PluginRegistry::new();
        registry.register("a", |_cfg| Box::new(NoopImpl), 10, "desc", "1.0");
        assert!(registry.is_registered("a"));
        assert!(registry.create("a", &serde_json::json!({})).is_some());
        assert!(registry.create("missing", &serde_json::json!({})).is_none());
    }

    #[test]
    fn list_names_sorted_by_priority_descending() {
        let mut registry: PluginRegistry<dyn Noop> = PluginRegistry::new();
        registry.register("low", |_| Box::new(NoopImpl), 1, "", "1.0");
        registry.register("high", |_| Box::new(NoopImpl), 100, "", "1.0");
        registry.register("mid", |_| Box::new(NoopImpl), 50, "", "1.0");
        assert_eq!(registry.list_names(), vec!["high", "mid", "low"]);
    }

    #[test]
    fn reregistering_same_name_replaces_metadata() {
        let mut registry: PluginRegistry<dyn Noop> = PluginRegistry::new();
        registry.register("a", |_| Box::new(NoopImpl), 1, "old", "1.0");
        registry.register("a", |_| Box::new(NoopImpl), 2, "new", "2.0");
        assert_eq!(registry.count(), 1);
        let meta = registry.get_metadata("a").unwrap();
        assert_eq!(meta.priority, 2);
        assert_eq!(meta.description, "new");
    }

    #[test]
    fn unregister_and_clear() {
        let mut registry: PluginRegistry<dyn Noop> = PluginRegistry::new();
        registry.register("a", |_| Box::new(NoopImpl), 1, "", "1.0");
        assert!(registry.unregister("a"));
        assert!(!registry.unregister("a"));
        registry.register("b", |_| Box::new(NoopImpl), 1, "", "1.0");
        registry.clear();
        assert_eq!(registry.count(), 0);
    }
}
