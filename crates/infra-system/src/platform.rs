// Composition root: wires native adapters into the core prober
use std::sync::Arc;

use keystone_core::application::CapabilityProber;
use keystone_core::config::PlatformConfig;
use keystone_core::domain::ProcessorInfo;
use keystone_core::port::MonotonicTimeProvider;
use tracing::info;

use crate::console::TracingConsoleSink;
use crate::cpu_probe_impl::native_probe;

/// Build the prober for this host
pub fn prober(config: &PlatformConfig) -> CapabilityProber {
    let prober = CapabilityProber::new(
        native_probe(),
        Arc::new(MonotonicTimeProvider::new()),
        Arc::new(TracingConsoleSink),
    );

    if config.skip_calibration {
        prober.without_calibration()
    } else {
        prober.with_calibration_window(config.calibration_window)
    }
}

/// Detect the host processor once at startup
///
/// Call before spawning threads that read the result; the returned record
/// is immutable and can be shared freely afterwards.
///
/// # Example
/// ```text
/// let config = PlatformConfig::from_env();
/// telemetry::init_logging(config.log_format)?;
/// let cpu = Arc::new(platform::initialize(&config));
/// if cpu.has(FeatureFlags::SSE2) { /* fast path */ }
/// ```
pub fn initialize(config: &PlatformConfig) -> ProcessorInfo {
    info!(
        calibration_ms = config.calibration_window.as_millis() as u64,
        skip_calibration = config.skip_calibration,
        "Probing processor..."
    );
    prober(config).initialize()
}
