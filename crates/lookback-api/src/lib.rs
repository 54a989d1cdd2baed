//! HTTP API for the Lookback rolling statistics service.
//!
//! This crate provides the Axum transport in front of
//! [`lookback_core::WindowedStore`]:
//!
//! - **`POST /event`** -- validate and record one timestamped value
//! - **`GET /statistics`** -- rolling one-hour count/min/max/mean
//! - **`GET /health`** -- liveness probe
//! - **`GET /`** -- service descriptor
//!
//! # Architecture
//!
//! Handlers stay thin: request parsing and status mapping live here,
//! while every windowing rule lives in the core crate. The store and the
//! clock arrive through Axum's `State` extractor, so integration tests
//! drive the router with `tower::ServiceExt` and a manual clock -- no
//! TCP socket involved.

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;

// Re-export primary types for convenience.
pub use error::ApiError;
pub use router::build_router;
pub use server::{start_server, ServerConfig, ServerError};
pub use state::AppState;
