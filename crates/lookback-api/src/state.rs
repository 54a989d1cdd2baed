//! Shared application state for the Lookback API server.
//!
//! [`AppState`] carries the windowed store plus the clock the handlers
//! read when they need "now". Both come from the composition root, never
//! from globals, so a test harness can substitute a manual clock and get
//! deterministic window behavior.

use std::sync::Arc;

use lookback_core::clock::Clock;
use lookback_core::store::WindowedStore;

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// The windowed aggregate store.
    pub store: Arc<WindowedStore>,
    /// Time source for statistics queries and the service descriptor.
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    /// Create application state from its shared components.
    pub const fn new(store: Arc<WindowedStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }
}
