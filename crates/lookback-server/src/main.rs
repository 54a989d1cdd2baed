//! Lookback service binary.
//!
//! This is the composition root: it loads configuration, constructs the
//! windowed store against the system clock, and hands both to the HTTP
//! server. Nothing here holds state of its own; every component is built
//! once and shared via [`Arc`].
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from `lookback-config.yaml`
//! 3. Construct the windowed store with the system clock
//! 4. Serve HTTP until `Ctrl-C`

use std::path::Path;
use std::sync::Arc;

use lookback_api::server::{start_server, ServerConfig};
use lookback_api::state::AppState;
use lookback_core::clock::{Clock, SystemClock};
use lookback_core::config::{ConfigError, ServiceConfig};
use lookback_core::store::WindowedStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Application entry point for the Lookback service.
///
/// # Errors
///
/// Returns an error if the configuration file is unreadable or invalid,
/// the configured window is not a positive representable duration, or
/// the HTTP server fails to bind or serve.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("lookback-server starting");

    // 2. Load configuration.
    let config = load_config()?;
    info!(
        host = config.http.host,
        port = config.http.port,
        window_secs = config.window.duration_secs,
        "Configuration loaded"
    );

    // 3. Construct the store against the system clock.
    let clock: Arc<dyn Clock> = Arc::new(SystemClock::new());
    let window = config
        .window
        .duration()
        .ok_or("window.duration_secs is outside the representable range")?;
    let store = Arc::new(WindowedStore::new(window, Arc::clone(&clock))?);
    info!(window = %store.window(), "Windowed store initialized");

    // 4. Serve until Ctrl-C.
    let state = Arc::new(AppState::new(store, clock));
    let server_config = ServerConfig::from(&config.http);
    start_server(&server_config, state).await?;

    info!("lookback-server shutdown complete");

    Ok(())
}

/// Load the service configuration from `lookback-config.yaml`.
///
/// Looks for the config file relative to the current working directory
/// and falls back to defaults when it is absent. A present but invalid
/// file is a fatal error.
fn load_config() -> Result<ServiceConfig, ConfigError> {
    let config_path = Path::new("lookback-config.yaml");
    if config_path.exists() {
        let config = ServiceConfig::from_file(config_path)?;
        Ok(config)
    } else {
        info!("Config file not found, using defaults");
        Ok(ServiceConfig::default())
    }
}
