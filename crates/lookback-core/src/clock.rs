//! Time sources for the Lookback service.
//!
//! Every component that needs the current time reads it through the
//! [`Clock`] trait instead of calling [`Utc::now`] directly. The
//! composition root injects a [`SystemClock`]; tests inject a
//! [`ManualClock`] so window edges can be exercised deterministically.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeDelta, Utc};

/// A source of the current UTC time.
///
/// Implementations must be cheap and safe to share across threads: the
/// store reads the clock on every record, and the statistics handler reads
/// it on every query.
pub trait Clock: Send + Sync {
    /// Return the current UTC time.
    fn now(&self) -> DateTime<Utc>;
}

/// Clock backed by the operating system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    /// Create a new system clock.
    pub const fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Settable clock for deterministic tests.
///
/// Clones share the underlying instant, so a clone handed to a store
/// observes later [`set`](Self::set) and [`advance`](Self::advance) calls
/// made through the original.
#[derive(Debug, Clone)]
pub struct ManualClock {
    /// The instant reported by [`Clock::now`], shared across clones.
    instant: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    /// Create a manual clock frozen at `start`.
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            instant: Arc::new(Mutex::new(start)),
        }
    }

    /// Move the clock to an absolute instant.
    pub fn set(&self, to: DateTime<Utc>) {
        // A poisoned lock only happens if a holder panicked; recover the
        // guard and keep the clock usable.
        let mut instant = self
            .instant
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        *instant = to;
    }

    /// Shift the clock by `delta`, which may be negative.
    ///
    /// Saturates at the representable range instead of wrapping.
    pub fn advance(&self, delta: TimeDelta) {
        let mut instant = self
            .instant
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        *instant = instant.checked_add_signed(delta).unwrap_or(*instant);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self
            .instant
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    /// Fixed instant used across the deterministic tests.
    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn system_clock_tracks_wall_time() {
        let clock = SystemClock::new();
        let first = clock.now();
        let second = clock.now();
        assert!(second >= first);
    }

    #[test]
    fn manual_clock_holds_its_instant() {
        let clock = ManualClock::new(base_time());
        assert_eq!(clock.now(), base_time());
        assert_eq!(clock.now(), base_time());
    }

    #[test]
    fn manual_clock_set_and_advance() {
        let clock = ManualClock::new(base_time());

        clock.advance(TimeDelta::minutes(30));
        assert_eq!(clock.now(), base_time() + TimeDelta::minutes(30));

        clock.advance(TimeDelta::minutes(-10));
        assert_eq!(clock.now(), base_time() + TimeDelta::minutes(20));

        let later = base_time() + TimeDelta::hours(2);
        clock.set(later);
        assert_eq!(clock.now(), later);
    }

    #[test]
    fn manual_clock_clones_share_the_instant() {
        let clock = ManualClock::new(base_time());
        let observer: Arc<dyn Clock> = Arc::new(clock.clone());

        clock.advance(TimeDelta::hours(1));
        assert_eq!(observer.now(), base_time() + TimeDelta::hours(1));
    }
}
