//! Event and summary types for the windowed store.
//!
//! An [`Event`] is the immutable pair the store retains; a
//! [`WindowSummary`] is the aggregate snapshot it answers queries with.
//! The summary is the only type that crosses the wire, so it carries the
//! serde derives and keeps absent statistics as `Option` fields that
//! serialize to `null`.

use chrono::{DateTime, Utc};

/// One recorded observation: a UTC timestamp and a numeric value.
///
/// Timestamps are normalized to UTC before they reach the store; zoneless
/// inputs are read as UTC by the transport. The value is stored as given --
/// finiteness checks belong to request validation, not to the store.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Event {
    /// When the observation occurred.
    pub timestamp: DateTime<Utc>,
    /// The observed value.
    pub value: f64,
}

impl Event {
    /// Create an event from its parts.
    pub const fn new(timestamp: DateTime<Utc>, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// Aggregate statistics over the events inside the window.
///
/// When `count` is zero the three statistics are `None` and serialize as
/// JSON `null`; a summary never invents a zero min or mean for an empty
/// window.
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct WindowSummary {
    /// Number of events inside the window.
    pub count: u64,
    /// Smallest value inside the window, if any.
    pub min: Option<f64>,
    /// Largest value inside the window, if any.
    pub max: Option<f64>,
    /// Arithmetic mean of the values inside the window, if any.
    pub mean: Option<f64>,
}

impl WindowSummary {
    /// The summary of an empty window: zero count, all statistics absent.
    pub const fn empty() -> Self {
        Self {
            count: 0,
            min: None,
            max: None,
            mean: None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn empty_summary_serializes_nulls() {
        let json = serde_json::to_value(WindowSummary::empty()).unwrap();
        assert_eq!(json["count"], 0);
        assert!(json["min"].is_null());
        assert!(json["max"].is_null());
        assert!(json["mean"].is_null());
    }

    #[test]
    fn populated_summary_serializes_numbers() {
        let summary = WindowSummary {
            count: 2,
            min: Some(25.0),
            max: Some(50.0),
            mean: Some(37.5),
        };
        let json = serde_json::to_value(summary).unwrap();
        assert_eq!(json["count"], 2);
        assert_eq!(json["min"], 25.0);
        assert_eq!(json["max"], 50.0);
        assert_eq!(json["mean"], 37.5);
    }

    #[test]
    fn summary_round_trips_through_json() {
        let summary = WindowSummary {
            count: 1,
            min: Some(-3.5),
            max: Some(-3.5),
            mean: Some(-3.5),
        };
        let text = serde_json::to_string(&summary).unwrap();
        let back: WindowSummary = serde_json::from_str(&text).unwrap();
        assert_eq!(back, summary);
    }
}
