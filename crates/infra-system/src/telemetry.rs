//! Logging setup for the platform layer
//!
//! Installs the global tracing subscriber. Hosts that already configure
//! tracing themselves can skip this.

use keystone_core::config::LogFormat;
use keystone_core::{PlatformError, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is not set
pub const DEFAULT_LOG_FILTER: &str = "keystone=info";

/// Initialize the global subscriber
///
/// # Environment Variables
///
/// - `RUST_LOG`: filter directives (default: `keystone=info`)
///
/// Fails if a global subscriber is already installed.
pub fn init_logging(format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_LOG_FILTER))
        .map_err(|e| PlatformError::Logging(e.to_string()))?;

    let registry = tracing_subscriber::registry().with(env_filter);

    match format {
        // Production: JSON structured logging
        LogFormat::Json => registry.with(fmt::layer().json()).try_init(),
        // Development: Pretty formatting with colors
        LogFormat::Pretty => registry.with(fmt::layer().pretty()).try_init(),
    }
    .map_err(|e| PlatformError::Logging(e.to_string()))?;

    tracing::debug!(?format, "Logging initialized");
    Ok(())
}
