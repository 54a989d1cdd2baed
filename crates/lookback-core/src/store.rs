//! The windowed aggregate store at the heart of Lookback.
//!
//! [`WindowedStore`] retains events in arrival order behind a single
//! mutex, trims entries that have fallen out of the trailing window from
//! the front of the sequence on every access, and folds the survivors
//! into a [`WindowSummary`] on demand. There is no background sweeper:
//! eviction happens opportunistically inside [`record`] and [`summary`],
//! so an idle store holds stale entries until the next call.
//!
//! # Ordering
//!
//! Arrival order approximates timestamp order but callers may backdate
//! events. Front-trimming therefore bounds memory while a per-event
//! cutoff filter during aggregation keeps the summary exact: a backdated
//! stale event parked behind an in-window entry stays in the sequence
//! until it reaches the front, but it is never counted.
//!
//! [`record`]: WindowedStore::record
//! [`summary`]: WindowedStore::summary

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeDelta, Utc};
use tracing::{debug, trace};

use crate::clock::Clock;
use crate::event::{Event, WindowSummary};

/// Errors that can occur when constructing a [`WindowedStore`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The window duration must be strictly positive.
    #[error("window duration must be positive, got {0}")]
    NonPositiveWindow(TimeDelta),
}

/// Thread-safe store of timestamped values over a trailing time window.
///
/// Both operations take `&self` and are safe to call concurrently from
/// any number of threads; a single internal mutex serializes them, so a
/// summary observes every record that completed before it.
///
/// # Usage
///
/// ```text
/// let clock = Arc::new(SystemClock::new());
/// let store = WindowedStore::new(WindowedStore::DEFAULT_WINDOW, clock)?;
///
/// store.record(Utc::now(), 12.5);
/// let summary = store.summary(Utc::now());
/// assert_eq!(summary.count, 1);
/// ```
pub struct WindowedStore {
    /// Width of the trailing window.
    window: TimeDelta,
    /// Time source used to derive the eviction cutoff during writes.
    clock: Arc<dyn Clock>,
    /// Retained events in arrival order, guarded by a single lock.
    events: Mutex<VecDeque<Event>>,
}

impl WindowedStore {
    /// The service's contractual window width: one trailing hour.
    pub const DEFAULT_WINDOW: TimeDelta = TimeDelta::hours(1);

    /// Create a store covering a trailing `window`, reading write-time
    /// cutoffs from `clock`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NonPositiveWindow`] if `window` is zero or
    /// negative.
    pub fn new(window: TimeDelta, clock: Arc<dyn Clock>) -> Result<Self, StoreError> {
        if window <= TimeDelta::zero() {
            return Err(StoreError::NonPositiveWindow(window));
        }
        Ok(Self {
            window,
            clock,
            events: Mutex::new(VecDeque::new()),
        })
    }

    /// Record one event.
    ///
    /// Appends to the back of the retained sequence, then trims expired
    /// entries from the front against the injected clock. The timestamp
    /// is taken as given: an event already older than the window is
    /// accepted and dropped once it reaches the front.
    pub fn record(&self, timestamp: DateTime<Utc>, value: f64) {
        let cutoff = self.cutoff(self.clock.now());

        // A poisoned lock means a holder panicked mid-update; recovery
        // would hand back a sequence in an unknown order, so the write is
        // skipped instead.
        let Ok(mut events) = self.events.lock() else {
            return;
        };

        events.push_back(Event::new(timestamp, value));
        Self::evict_expired(&mut events, cutoff);
    }

    /// Compute aggregate statistics over events stamped at or after
    /// `now - window`.
    ///
    /// Expired entries are trimmed first so a query-only workload still
    /// bounds memory. Events stamped after `now` are included; guarding
    /// against client clock skew is the transport's concern. The result
    /// is deterministic for a given `now` and store content, so repeated
    /// calls without intervening writes return identical summaries.
    pub fn summary(&self, now: DateTime<Utc>) -> WindowSummary {
        let cutoff = self.cutoff(now);

        let Ok(mut events) = self.events.lock() else {
            return WindowSummary::empty();
        };

        Self::evict_expired(&mut events, cutoff);

        let mut count: u64 = 0;
        let mut sum = 0.0_f64;
        let mut min: Option<f64> = None;
        let mut max: Option<f64> = None;

        for event in events.iter().filter(|event| event.timestamp >= cutoff) {
            count = count.saturating_add(1);
            sum += event.value;
            min = Some(min.map_or(event.value, |current| current.min(event.value)));
            max = Some(max.map_or(event.value, |current| current.max(event.value)));
        }

        if count == 0 {
            return WindowSummary::empty();
        }

        // Counts stay far below 2^52, where f64 arithmetic is exact.
        #[allow(clippy::cast_precision_loss)]
        let mean = sum / count as f64;

        WindowSummary {
            count,
            min,
            max,
            mean: Some(mean),
        }
    }

    /// Discard every retained event.
    pub fn clear(&self) {
        let Ok(mut events) = self.events.lock() else {
            return;
        };
        let dropped = events.len();
        events.clear();
        debug!(dropped, "Cleared the store");
    }

    /// Number of retained events, including stale entries awaiting
    /// eviction.
    pub fn len(&self) -> usize {
        self.events.lock().map_or(0, |events| events.len())
    }

    /// Whether the store currently retains no events.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Width of the trailing window.
    pub const fn window(&self) -> TimeDelta {
        self.window
    }

    /// The oldest timestamp still inside the window at `now`.
    ///
    /// Saturates at the earliest representable instant so a `now` near
    /// the range floor cannot underflow.
    fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_sub_signed(self.window)
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Pop events from the front of the sequence until the front entry
    /// is inside the window or the sequence is empty.
    ///
    /// Linear in the number of entries evicted, never a full scan.
    fn evict_expired(events: &mut VecDeque<Event>, cutoff: DateTime<Utc>) {
        let before = events.len();
        while events.front().is_some_and(|event| event.timestamp < cutoff) {
            events.pop_front();
        }
        let evicted = before.saturating_sub(events.len());
        if evicted > 0 {
            trace!(evicted, "Evicted events older than the window cutoff");
        }
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::float_cmp,
    clippy::arithmetic_side_effects
)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::TimeZone;

    /// Fixed instant used as "now" across the deterministic tests.
    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    /// Helper building a one-hour store frozen at [`base_time`].
    fn make_store() -> (WindowedStore, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(base_time()));
        let store = WindowedStore::new(WindowedStore::DEFAULT_WINDOW, clock.clone()).unwrap();
        (store, clock)
    }

    #[test]
    fn empty_store_reports_absent_statistics() {
        let (store, _clock) = make_store();
        let summary = store.summary(base_time());

        assert_eq!(summary, WindowSummary::empty());
        assert_eq!(summary.count, 0);
        assert!(summary.min.is_none());
        assert!(summary.max.is_none());
        assert!(summary.mean.is_none());
    }

    #[test]
    fn single_event_summary() {
        let (store, _clock) = make_store();
        store.record(base_time(), 42.5);

        let summary = store.summary(base_time());
        assert_eq!(summary.count, 1);
        assert_eq!(summary.min, Some(42.5));
        assert_eq!(summary.max, Some(42.5));
        assert_eq!(summary.mean, Some(42.5));
    }

    #[test]
    fn same_instant_events_all_counted() {
        let (store, _clock) = make_store();
        store.record(base_time(), 10.0);
        store.record(base_time(), 20.0);
        store.record(base_time(), 30.0);

        let summary = store.summary(base_time());
        assert_eq!(summary.count, 3);
        assert_eq!(summary.min, Some(10.0));
        assert_eq!(summary.max, Some(30.0));
        assert_eq!(summary.mean, Some(20.0));
    }

    #[test]
    fn mixed_age_events_inside_the_window() {
        let (store, _clock) = make_store();
        store.record(base_time() - TimeDelta::minutes(30), 50.0);
        store.record(base_time(), 25.0);

        let summary = store.summary(base_time());
        assert_eq!(summary.count, 2);
        assert_eq!(summary.min, Some(25.0));
        assert_eq!(summary.max, Some(50.0));
        assert_eq!(summary.mean, Some(37.5));
    }

    #[test]
    fn events_older_than_the_window_are_evicted() {
        let (store, _clock) = make_store();
        store.record(base_time() - TimeDelta::hours(2), 99.0);

        let summary = store.summary(base_time());
        assert_eq!(summary.count, 0);
        assert!(summary.mean.is_none());
        // The stale event was physically dropped, not just filtered out.
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn boundary_event_exactly_one_window_old_is_counted() {
        let (store, _clock) = make_store();
        store.record(base_time() - TimeDelta::hours(1), 5.0);

        // The window is inclusive at its lower edge.
        let summary = store.summary(base_time());
        assert_eq!(summary.count, 1);
        assert_eq!(summary.mean, Some(5.0));
    }

    #[test]
    fn future_stamped_events_are_counted() {
        let (store, _clock) = make_store();
        store.record(base_time() + TimeDelta::minutes(10), 7.0);

        // No upper bound: client clock skew is the transport's concern.
        let summary = store.summary(base_time());
        assert_eq!(summary.count, 1);
    }

    #[test]
    fn negative_values_aggregate() {
        let (store, _clock) = make_store();
        store.record(base_time(), -5.0);
        store.record(base_time(), 5.0);

        let summary = store.summary(base_time());
        assert_eq!(summary.count, 2);
        assert_eq!(summary.min, Some(-5.0));
        assert_eq!(summary.max, Some(5.0));
        assert_eq!(summary.mean, Some(0.0));
    }

    #[test]
    fn mean_lies_between_min_and_max() {
        let (store, _clock) = make_store();
        for value in [3.5, -2.0, 18.25, 0.0, 7.75] {
            store.record(base_time(), value);
        }

        let summary = store.summary(base_time());
        let min = summary.min.unwrap();
        let max = summary.max.unwrap();
        let mean = summary.mean.unwrap();
        assert!(min <= mean && mean <= max);
    }

    #[test]
    fn mean_precision_is_reasonable() {
        let (store, _clock) = make_store();
        store.record(base_time(), 10.1);
        store.record(base_time(), 20.2);
        store.record(base_time(), 30.3);

        let mean = store.summary(base_time()).mean.unwrap();
        assert!((mean - 20.2).abs() < 1e-9);
    }

    #[test]
    fn summary_is_idempotent_between_writes() {
        let (store, _clock) = make_store();
        store.record(base_time() - TimeDelta::minutes(10), 1.5);
        store.record(base_time(), 2.5);

        let first = store.summary(base_time());
        let second = store.summary(base_time());
        assert_eq!(first, second);
    }

    #[test]
    fn window_slides_as_time_passes() {
        let (store, clock) = make_store();
        store.record(base_time(), 10.0);

        // Half an hour later the event is still inside the window.
        clock.advance(TimeDelta::minutes(30));
        store.record(clock.now(), 20.0);
        let summary = store.summary(clock.now());
        assert_eq!(summary.count, 2);

        // Two hours later both events have aged out and been dropped.
        clock.advance(TimeDelta::minutes(90));
        let summary = store.summary(clock.now());
        assert_eq!(summary.count, 0);
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn expired_events_do_not_accumulate_under_write_load() {
        let (store, _clock) = make_store();
        let stale = base_time() - TimeDelta::hours(2);

        // Each write trims the front, so stale entries never pile up.
        for i in 0..100 {
            store.record(stale, f64::from(i));
        }
        store.record(base_time(), 1.0);

        assert_eq!(store.len(), 1);
        assert_eq!(store.summary(base_time()).count, 1);
    }

    #[test]
    fn backdated_event_is_retained_but_never_counted() {
        let (store, _clock) = make_store();
        store.record(base_time(), 10.0);
        // Arrives after an in-window event despite being two hours old.
        store.record(base_time() - TimeDelta::hours(2), 99.0);

        let summary = store.summary(base_time());
        assert_eq!(summary.count, 1);
        assert_eq!(summary.mean, Some(10.0));
        // Front-trimming stops at the in-window front entry, so the
        // backdated event stays in the sequence as bounded slack.
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn clear_empties_the_store() {
        let (store, _clock) = make_store();
        store.record(base_time(), 1.0);
        store.record(base_time(), 2.0);

        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.summary(base_time()), WindowSummary::empty());
    }

    #[test]
    fn rejects_non_positive_windows() {
        let clock: Arc<dyn Clock> = Arc::new(ManualClock::new(base_time()));

        let zero = WindowedStore::new(TimeDelta::zero(), Arc::clone(&clock));
        assert!(matches!(zero, Err(StoreError::NonPositiveWindow(_))));

        let negative = WindowedStore::new(TimeDelta::seconds(-5), clock);
        assert!(matches!(negative, Err(StoreError::NonPositiveWindow(_))));
    }

    #[test]
    fn shorter_windows_are_honored() {
        let clock = Arc::new(ManualClock::new(base_time()));
        let store = WindowedStore::new(TimeDelta::minutes(10), clock.clone()).unwrap();

        store.record(base_time() - TimeDelta::minutes(15), 1.0);
        store.record(base_time() - TimeDelta::minutes(5), 2.0);

        let summary = store.summary(base_time());
        assert_eq!(summary.count, 1);
        assert_eq!(summary.mean, Some(2.0));
    }

    #[test]
    fn concurrent_recording_loses_no_events() {
        use std::thread;

        let (store, _clock) = make_store();
        let store = Arc::new(store);
        let mut handles = Vec::new();

        for _ in 0..10 {
            let s = Arc::clone(&store);
            handles.push(thread::spawn(move || {
                for i in 0..100 {
                    s.record(base_time(), f64::from(i));
                }
            }));
        }

        for handle in handles {
            handle.join().ok();
        }

        let summary = store.summary(base_time());
        assert_eq!(summary.count, 1000);
        assert_eq!(summary.min, Some(0.0));
        assert_eq!(summary.max, Some(99.0));
    }

    #[test]
    fn concurrent_reads_and_writes_interleave() {
        use std::thread;

        let (store, _clock) = make_store();
        let store = Arc::new(store);
        let mut handles = Vec::new();

        for _ in 0..5 {
            let s = Arc::clone(&store);
            handles.push(thread::spawn(move || {
                for i in 0..100 {
                    s.record(base_time(), f64::from(i));
                }
            }));
        }
        for _ in 0..5 {
            let s = Arc::clone(&store);
            handles.push(thread::spawn(move || {
                for _ in 0..100 {
                    let _ = s.summary(base_time());
                }
            }));
        }

        for handle in handles {
            handle.join().ok();
        }

        assert_eq!(store.summary(base_time()).count, 500);
    }
}
