//! Clock abstraction
//!
//! Key disambiguation and record timestamps read the wall clock through this
//! trait so tests can pin or step time deterministically.

use chrono::{DateTime, Duration, Utc};
use std::sync::{Arc, Mutex};

/// Source of the current UTC time
pub trait Clock: Send + Sync {
    /// Current wall-clock time
    fn now(&self) -> DateTime<Utc>;

    /// Current time as milliseconds since the Unix epoch
    fn now_millis(&self) -> u64 {
        self.now().timestamp_millis().max(0) as u64
    }
}

/// Production clock backed by the system time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock for tests
///
/// Clones share the same instant, so advancing one advances all of them.
#[derive(Debug, Clone)]
pub struct FixedClock {
    instant: Arc<Mutex<DateTime<Utc>>>,
}

impl FixedClock {
    /// Create a clock frozen at `instant`
    pub fn new(instant: DateTime<Utc>) -> Self {
        Self {
            instant: Arc::new(Mutex::new(instant)),
        }
    }

    /// Move the clock forward
    pub fn advance(&self, by: Duration) {
        let mut instant = self.instant.lock().unwrap_or_else(|e| e.into_inner());
        *instant += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.instant.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_fixed_clock_is_frozen() {
        let t = Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap();
        let clock = FixedClock::new(t);
        assert_eq!(clock.now(), t);
        assert_eq!(clock.now(), t);
    }

    #[test]
    fn test_fixed_clock_advance_is_shared() {
        let t = Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap();
        let clock = FixedClock::new(t);
        let other = clock.clone();

        clock.advance(Duration::microseconds(1));
        assert_eq!(other.now(), t + Duration::microseconds(1));
    }

    #[test]
    fn test_now_millis() {
        let t = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        let clock = FixedClock::new(t);
        assert_eq!(clock.now_millis(), 1_700_000_000_123);
    }
}
