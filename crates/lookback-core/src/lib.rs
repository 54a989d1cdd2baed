//! Core library for the Lookback rolling statistics service.
//!
//! Lookback records timestamped numeric events and answers aggregate
//! queries (count, min, max, mean) over a trailing one-hour window. This
//! crate holds everything below the HTTP layer:
//!
//! - [`store::WindowedStore`] -- the mutex-guarded event sequence with
//!   front-trim eviction and windowed aggregation
//! - [`clock`] -- the injected [`Clock`](clock::Clock) time source, with
//!   system and manual implementations
//! - [`event`] -- the recorded event pair and the summary type
//! - [`config`] -- YAML configuration with environment overrides
//!
//! # Design Principles
//!
//! - Time is always injected. Nothing below the composition root calls
//!   [`chrono::Utc::now`] directly, so every windowing rule can be tested
//!   against a manual clock.
//! - The store never starts background work. Expired events are trimmed
//!   opportunistically on each record and query; an idle store retains
//!   stale entries until the next access.

pub mod clock;
pub mod config;
pub mod event;
pub mod store;

// Re-export primary types for convenience.
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, HttpConfig, ServiceConfig, WindowConfig};
pub use event::{Event, WindowSummary};
pub use store::{StoreError, WindowedStore};
