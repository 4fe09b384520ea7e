// =============================================================================
// SignalRepository — in-memory and file-backed signal history
// =============================================================================

use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::{debug, error, info};

use crate::clock::current_clock;
use crate::domain::TradingSignal;

/// Storage contract for accepted signals. `get_today` uses the installed
/// clock rather than `Utc::now()` so it stays determinisable under a
/// `FrozenClock`.
pub trait SignalRepository: Send + Sync {
    fn save(&self, signal: TradingSignal) -> bool;
    fn save_all(&self, signals: Vec<TradingSignal>);
    fn get_all(&self) -> Vec<TradingSignal>;
    fn get(&self, signal_id: &str) -> Option<TradingSignal>;
    fn get_today(&self) -> Vec<TradingSignal>;
    fn get_recent(&self, limit: usize) -> Vec<TradingSignal>;
    fn clear(&self);
    fn count(&self) -> usize;
}

fn today_china() -> String {
    current_clock().now(crate::clock::china_tz()).format("%Y-%m-%d").to_string()
}

fn recent_sorted(signals: &[TradingSignal], limit: usize) -> Vec<TradingSignal> {
    let mut sorted = signals.to_vec();
    sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    sorted.truncate(limit);
    sorted
}

/// Reference semantics, no file I/O. Used by tests and as the default when
/// no persistence path is configured.
#[derive(Default)]
pub struct InMemorySignalRepository {
    signals: Mutex<Vec<TradingSignal>>,
}

impl InMemorySignalRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SignalRepository for InMemorySignalRepository {
    fn save(&self, signal: TradingSignal) -> bool {
        debug!(stock = %signal.stock_name, etf = %signal.etf_name, "saving signal");
        self.signals.lock().push(signal);
        true
    }

    fn save_all(&self, signals: Vec<TradingSignal>) {
        let count = signals.len();
        self.signals.lock().extend(signals);
        info!(count, "batch saved signals");
    }

    fn get_all(&self) -> Vec<TradingSignal> {
        self.signals.lock().clone()
    }

    fn get(&self, signal_id: &str) -> Option<TradingSignal> {
        self.signals.lock().iter().find(|s| s.signal_id == signal_id).cloned()
    }

    fn get_today(&self) -> Vec<TradingSignal> {
        let today = today_china();
        self.signals
            .lock()
            .iter()
            .filter(|s| s.created_at.format("%Y-%m-%d").to_string() == today)
            .cloned()
            .collect()
    }

    fn get_recent(&self, limit: usize) -> Vec<TradingSignal> {
        recent_sorted(&self.signals.lock(), limit)
    }

    fn clear(&self) {
        self.signals.lock().clear();
    }

    fn count(&self) -> usize {
        self.signals.lock().len()
    }
}

/// File-backed repository. Every mutation re-persists the full signal list
/// via an atomic tmp-write + rename, matching `RuntimeConfig::save`. If the
/// file write fails, the in-memory append is NOT rolled back — the error is
/// logged and the in-memory state stays authoritative for the rest of the
/// process lifetime.
pub struct FileSignalRepository {
    path: PathBuf,
    signals: Mutex<Vec<TradingSignal>>,
}

impl FileSignalRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let signals = Self::load(&path);
        Self {
            path,
            signals: Mutex::new(signals),
        }
    }

    fn load(path: &Path) -> Vec<TradingSignal> {
        if !path.exists() {
            debug!(path = %path.display(), "signal file does not exist yet");
            return Vec::new();
        }
        match std::fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str::<Vec<TradingSignal>>(&content) {
                Ok(signals) => {
                    info!(count = signals.len(), "loaded signal history");
                    signals
                }
                Err(err) => {
                    error!(error = %err, "failed to parse signal history, starting empty");
                    Vec::new()
                }
            },
            Err(err) => {
                error!(error = %err, "failed to read signal history, starting empty");
                Vec::new()
            }
        }
    }

    fn persist(&self, signals: &[TradingSignal]) {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                if let Err(err) = std::fs::create_dir_all(parent) {
                    error!(error = %err, "failed to create signal repository directory");
                    return;
                }
            }
        }

        let content = match serde_json::to_string_pretty(signals) {
            Ok(content) => content,
            Err(err) => {
                error!(error = %err, "failed to serialize signal history");
                return;
            }
        };

        let tmp_path = self.path.with_extension("json.tmp");
        if let Err(err) = std::fs::write(&tmp_path, &content) {
            error!(error = %err, "failed to write tmp signal file");
            let _ = std::fs::remove_file(&tmp_path);
            return;
        }
        if let Err(err) = std::fs::rename(&tmp_path, &self.path) {
            error!(error = %err, "failed to rename tmp signal file");
        }
    }
}

impl SignalRepository for FileSignalRepository {
    fn save(&self, signal: TradingSignal) -> bool {
        let snapshot = {
            let mut guard = self.signals.lock();
            guard.push(signal.clone());
            guard.clone()
        };
        debug!(stock = %signal.stock_name, etf = %signal.etf_name, "saving signal");
        self.persist(&snapshot);
        true
    }

    fn save_all(&self, signals: Vec<TradingSignal>) {
        let count = signals.len();
        let snapshot = {
            let mut guard = self.signals.lock();
            guard.extend(signals);
            guard.clone()
        };
        self.persist(&snapshot);
        info!(count, "batch saved signals");
    }

    fn get_all(&self) -> Vec<TradingSignal> {
        self.signals.lock().clone()
    }

    fn get(&self, signal_id: &str) -> Option<TradingSignal> {
        self.signals.lock().iter().find(|s| s.signal_id == signal_id).cloned()
    }

    fn get_today(&self) -> Vec<TradingSignal> {
        let today = today_china();
        self.signals
            .lock()
            .iter()
            .filter(|s| s.created_at.format("%Y-%m-%d").to_string() == today)
            .cloned()
            .collect()
    }

    fn get_recent(&self, limit: usize) -> Vec<TradingSignal> {
        recent_sorted(&self.signals.lock(), limit)
    }

    fn clear(&self) {
        self.signals.lock().clear();
        self.persist(&[]);
    }

    fn count(&self) -> usize {
        self.signals.lock().len()
    }
}
