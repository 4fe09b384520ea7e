// =============================================================================
// Clock abstraction — process-wide, swappable wall-time source
// =============================================================================
//
// Every time-dependent component (time-to-close, trading-time detection,
// evaluator rules, signal IDs) reads the currently installed clock rather
// than calling `Utc::now()` directly. Swapping in a `FrozenClock` via
// `install_clock` fully determinises the whole pipeline — this is load
// bearing for the test suite.
// =============================================================================

use std::sync::Arc;

use chrono::{DateTime, Duration, FixedOffset, Utc};
use parking_lot::RwLock;

/// China Standard Time offset (+08:00), the hardcoded session timezone.
pub fn china_tz() -> FixedOffset {
    FixedOffset::east_opt(8 * 3600).expect("valid fixed offset")
}

/// Abstract wall-time source.
pub trait Clock: Send + Sync {
    /// Current instant in the given timezone.
    fn now(&self, tz: FixedOffset) -> DateTime<FixedOffset>;
}

/// Delegates to the OS wall clock. The default process-wide instance.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self, tz: FixedOffset) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&tz)
    }
}

/// Returns a fixed instant regardless of the requested timezone. The caller
/// is responsible for supplying a tz-aware instant up front.
#[derive(Debug, Clone)]
pub struct FrozenClock {
    frozen: DateTime<FixedOffset>,
}

impl FrozenClock {
    pub fn new(frozen: DateTime<FixedOffset>) -> Self {
        Self { frozen }
    }
}

impl Clock for FrozenClock {
    fn now(&self, _tz: FixedOffset) -> DateTime<FixedOffset> {
        self.frozen
    }
}

/// Returns `base.now() + offset`. The offset is mutable so tests can nudge
/// time forward without re-installing a new clock.
pub struct ShiftClock {
    base: Arc<dyn Clock>,
    offset: RwLock<Duration>,
}

impl ShiftClock {
    pub fn new(base: Arc<dyn Clock>, offset: Duration) -> Self {
        Self {
            base,
            offset: RwLock::new(offset),
        }
    }

    pub fn set_offset(&self, offset: Duration) {
        *self.offset.write() = offset;
    }
}

impl Clock for ShiftClock {
    fn now(&self, tz: FixedOffset) -> DateTime<FixedOffset> {
        self.base.now(tz) + *self.offset.read()
    }
}

static CLOCK: RwLock<Option<Arc<dyn Clock>>> = RwLock::new(None);

/// Install a clock as the active process-wide instance.
pub fn install_clock(clock: Arc<dyn Clock>) {
    *CLOCK.write() = Some(clock);
}

/// Fetch the active process-wide clock, defaulting to `SystemClock` if none
/// has been installed yet.
pub fn current_clock() -> Arc<dyn Clock> {
    let guard = CLOCK.read();
    match guard.as_ref() {
        Some(clock) => clock.clone(),
        None => Arc::new(SystemClock),
    }
}

/// Restore the process-wide clock to `SystemClock`. Tests must call this in
/// teardown after installing a `FrozenClock`/`ShiftClock`.
pub fn reset_clock() {
    *CLOCK.write() = Some(Arc::new(SystemClock));
}

/// Convenience: current instant in the installed clock's CST view.
pub fn now_china() -> DateTime<FixedOffset> {
    current_clock().now(china_tz())
}
