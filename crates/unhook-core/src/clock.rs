//! Wall-clock abstraction.
//!
//! Streak continuity is keyed by the device-local calendar date and the rate
//! limiter by elapsed milliseconds. Both read time through [`Clock`] so tests
//! can step a [`ManualClock`] across day and window boundaries.

use chrono::{DateTime, Duration, Local, NaiveDate, Utc};
use parking_lot::Mutex;

/// Source of the current instant and calendar date.
pub trait Clock: Send + Sync {
    /// Current instant.
    fn now(&self) -> DateTime<Utc>;

    /// Current calendar date in the device's local time zone.
    fn today(&self) -> NaiveDate {
        self.now().with_timezone(&Local).date_naive()
    }
}

/// Clock backed by the operating system.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually advanced clock for tests and replays.
///
/// `today()` is the UTC date of the current instant, so results do not depend
/// on the host time zone.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    /// Create a clock frozen at `start`.
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Create a clock frozen at noon UTC on `date`.
    pub fn at_date(date: NaiveDate) -> Self {
        let start = date
            .and_hms_opt(12, 0, 0)
            .map_or_else(Utc::now, |naive| naive.and_utc());
        Self::new(start)
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now += by;
    }

    /// Move the clock forward by whole days.
    pub fn advance_days(&self, days: i64) {
        self.advance(Duration::days(days));
    }

    /// Jump to an absolute instant.
    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock() = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }

    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn manual_clock_reports_date() {
        let clock = ManualClock::at_date(date(2026, 3, 14));
        assert_eq!(clock.today(), date(2026, 3, 14));
    }

    #[test]
    fn manual_clock_advances_days() {
        let clock = ManualClock::at_date(date(2026, 12, 31));
        clock.advance_days(1);
        assert_eq!(clock.today(), date(2027, 1, 1));
    }

    #[test]
    fn manual_clock_advances_millis() {
        let clock = ManualClock::at_date(date(2026, 1, 1));
        let before = clock.now();
        clock.advance(Duration::milliseconds(1500));
        assert_eq!((clock.now() - before).num_milliseconds(), 1500);
    }

    #[test]
    fn system_clock_is_recent() {
        let now = SystemClock.now();
        assert!(now.timestamp() > 1_700_000_000);
    }
}
