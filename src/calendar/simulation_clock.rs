use chrono::{Duration, NaiveDateTime, NaiveTime, Timelike};

use super::TradingCalendar;

const MORNING_START: (u32, u32) = (9, 30);
const MORNING_END: (u32, u32) = (11, 30);
const AFTERNOON_START: (u32, u32) = (13, 0);
const AFTERNOON_END: (u32, u32) = (15, 0);

fn time_of(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

/// Step size for intraday replay. `Daily` advances by whole trading days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Daily,
    Min5,
    Min15,
    Min30,
}

impl Granularity {
    pub fn delta_minutes(self) -> i64 {
        match self {
            Granularity::Daily => 0,
            Granularity::Min5 => 5,
            Granularity::Min15 => 15,
            Granularity::Min30 => 30,
        }
    }

    pub fn is_daily(self) -> bool {
        matches!(self, Granularity::Daily)
    }
}

/// Stateful cursor over a `TradingCalendar`, advancing at a configured
/// granularity and skipping the lunch break / non-trading days.
#[derive(Debug, Clone)]
pub struct SimulationClock {
    calendar: TradingCalendar,
    current: NaiveDateTime,
    granularity: Granularity,
    index: usize,
}

impl SimulationClock {
    pub fn new(calendar: TradingCalendar, granularity: Granularity) -> Self {
        let first_day = calendar.days().first().copied().unwrap_or_default();
        let current = if granularity.is_daily() {
            first_day.and_time(time_of(0, 0))
        } else {
            first_day.and_time(time_of(MORNING_START.0, MORNING_START.1))
        };

        Self {
            calendar,
            current,
            granularity,
            index: 0,
        }
    }

    pub fn current(&self) -> NaiveDateTime {
        self.current
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    /// Advance the clock by `steps` ticks of the configured granularity.
    pub fn advance(&mut self, steps: i64) -> NaiveDateTime {
        if self.granularity.is_daily() {
            self.index = (self.index + steps as usize).min(self.last_index());
            self.current = self.calendar.days()[self.index].and_time(time_of(0, 0));
        } else {
            self.advance_minutes(steps);
        }
        self.current
    }

    fn advance_minutes(&mut self, steps: i64) {
        let delta = Duration::minutes(self.granularity.delta_minutes() * steps);
        let tentative = self.current + delta;

        let same_day = tentative.date() == self.current.date();
        let afternoon_end = time_of(AFTERNOON_END.0, AFTERNOON_END.1);
        let morning_end = time_of(MORNING_END.0, MORNING_END.1);
        let afternoon_start = time_of(AFTERNOON_START.0, AFTERNOON_START.1);

        if !same_day || tentative.time() > afternoon_end {
            self.index = (self.index + 1).min(self.last_index());
            let next_day = self.calendar.days()[self.index];
            self.current = next_day.and_time(time_of(MORNING_START.0, MORNING_START.1));
            return;
        }

        if self.current.time() < afternoon_start && tentative.time() > morning_end {
            self.current = self.current.date().and_time(afternoon_start);
            return;
        }

        self.current = tentative;
    }

    fn last_index(&self) -> usize {
        self.calendar.len().saturating_sub(1)
    }

    pub fn has_next(&self) -> bool {
        if self.granularity.is_daily() {
            return self.index < self.last_index();
        }
        if self.index >= self.last_index() {
            return false;
        }
        let day_end = self.current.date().and_time(time_of(AFTERNOON_END.0, AFTERNOON_END.1));
        self.current < day_end
    }

    pub fn is_trading_time(&self) -> bool {
        if self.granularity.is_daily() {
            return true;
        }
        let t = self.current.time();
        let morning_start = time_of(MORNING_START.0, MORNING_START.1);
        let morning_end = time_of(MORNING_END.0, MORNING_END.1);
        let afternoon_start = time_of(AFTERNOON_START.0, AFTERNOON_START.1);
        let afternoon_end = time_of(AFTERNOON_END.0, AFTERNOON_END.1);
        (t >= morning_start && t <= morning_end) || (t >= afternoon_start && t <= afternoon_end)
    }

    /// Seconds to the end of the current half-session, -1 outside trading hours.
    pub fn time_to_close(&self) -> i64 {
        if !self.is_trading_time() {
            return -1;
        }
        let t = self.current.time();
        let morning_end = time_of(MORNING_END.0, MORNING_END.1);
        let close = if t <= morning_end {
            self.current.date().and_time(morning_end)
        } else {
            self.current.date().and_time(time_of(AFTERNOON_END.0, AFTERNOON_END.1))
        };
        (close - self.current).num_seconds()
    }

    /// Number of trading days in the underlying calendar. Used by callers
    /// (the replay driver's progress reporting) that need an approximate
    /// denominator; not meaningful as an exact step count for intraday
    /// granularities.
    pub fn total_days(&self) -> usize {
        self.calendar.len()
    }

    pub fn reset(&mut self) {
        self.index = 0;
        let first_day = self.calendar.days().first().copied().unwrap_or_default();
        self.current = if self.granularity.is_daily() {
            first_day.and_time(time_of(0, 0))
        } else {
            first_day.and_time(time_of(MORNING_START.0, MORNING_START.1))
        };
    }

    /// Best-effort fraction of overall progress through the replay. Not a
    /// contract — used only for UI display.
    pub fn progress(&self) -> f64 {
        let total_days = self.calendar.len();
        if total_days == 0 {
            return 0.0;
        }
        if self.granularity.is_daily() {
            return self.index as f64 / total_days as f64;
        }

        let total_minutes_per_day = 240.0;
        let elapsed_minutes =
            (self.current.hour() as i64 - 9) * 60 + self.current.minute() as i64 - 30;
        let day_progress = (elapsed_minutes as f64 / total_minutes_per_day).clamp(0.0, 1.0);
        (self.index as f64 + day_progress) / total_days as f64
    }
}
