// Capability detection (CPU identity, features, clock frequency)
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use super::constants::{DEFAULT_CALIBRATION_WINDOW_MS, SUMMARY_HEADER, SUMMARY_INDENT};
use crate::domain::{
    estimate_mhz, sanitize_identifier, snap_to_speed_grade, CpuVendor, FeatureFlags,
    ProcessorInfo, ProcessorSignature,
};
use crate::port::{ConsoleSink, CpuProbe, RawIdentification, TimeProvider};

/// Builds the process' `ProcessorInfo`
///
/// Detection is one-shot and never fails: anything the probe cannot report
/// leaves the corresponding default in place. Calling `initialize` again
/// re-runs the full measurement, including the calibration busy-wait.
pub struct CapabilityProber {
    probe: Arc<dyn CpuProbe>,
    time_provider: Arc<dyn TimeProvider>,
    console: Arc<dyn ConsoleSink>,
    calibration_window: Option<Duration>,
}

impl CapabilityProber {
    /// Create a prober with the default 750ms calibration window
    ///
    /// # Example
    /// ```text
    /// let prober = CapabilityProber::new(
    ///     Arc::new(X86CpuProbe),
    ///     Arc::new(MonotonicTimeProvider::new()),
    ///     Arc::new(TracingConsoleSink),
    /// );
    /// let info = prober.initialize();
    /// ```
    pub fn new(
        probe: Arc<dyn CpuProbe>,
        time_provider: Arc<dyn TimeProvider>,
        console: Arc<dyn ConsoleSink>,
    ) -> Self {
        Self {
            probe,
            time_provider,
            console,
            calibration_window: Some(Duration::from_millis(DEFAULT_CALIBRATION_WINDOW_MS)),
        }
    }

    pub fn with_calibration_window(mut self, window: Duration) -> Self {
        self.calibration_window = Some(window);
        self
    }

    /// Leave the clock frequency at 0 instead of busy-waiting
    pub fn without_calibration(mut self) -> Self {
        self.calibration_window = None;
        self
    }

    /// Detect the processor and print the console summary
    pub fn initialize(&self) -> ProcessorInfo {
        let mut info = ProcessorInfo::unknown(self.probe.architecture());

        match self.probe.identify() {
            Some(raw) => apply_identification(&mut info, &raw),
            None => debug!(
                architecture = %info.architecture,
                "CPU identification unsupported, keeping defaults"
            ),
        }

        if info.has(FeatureFlags::TSC | FeatureFlags::FPU) {
            if let Some(window) = self.calibration_window {
                let raw_mhz = self.measure_raw_mhz(window);
                info.clock_mhz = snap_to_speed_grade(raw_mhz);
                debug!(raw_mhz, snapped_mhz = info.clock_mhz, "Clock calibrated");
            }
        }

        self.report(&info);
        info
    }

    /// Count timestamp ticks across a busy-waited wall-clock window
    fn measure_raw_mhz(&self, window: Duration) -> u32 {
        let window_ms = u64::try_from(window.as_millis()).unwrap_or(u64::MAX);

        let start_ticks = self.probe.read_timestamp();
        let start = self.time_provider.now_millis();
        let deadline = start.saturating_add(window_ms);

        let mut now = start;
        while now < deadline {
            std::hint::spin_loop();
            now = self.time_provider.now_millis();
        }

        let end_ticks = self.probe.read_timestamp();
        estimate_mhz(end_ticks.wrapping_sub(start_ticks), now - start)
    }

    fn report(&self, info: &ProcessorInfo) {
        self.console.print_line(SUMMARY_HEADER);
        self.console.print_line(&format!(
            "{SUMMARY_INDENT}{}, {} Mhz",
            info.vendor, info.clock_mhz
        ));
        for name in info.features.names() {
            self.console
                .print_line(&format!("{SUMMARY_INDENT}{name} detected"));
        }
        self.console.print_line(" ");

        info!(
            vendor = %info.vendor,
            manufacturer = %info.manufacturer,
            brand = info.brand.as_deref().unwrap_or("-"),
            mhz = info.clock_mhz,
            features = %info.features,
            "Processor initialized"
        );
    }
}

fn apply_identification(info: &mut ProcessorInfo, raw: &RawIdentification) {
    if let Some(vendor) = sanitize_identifier(&raw.vendor) {
        info.manufacturer = CpuVendor::from_vendor_string(&vendor);
        info.vendor = vendor;
    }

    info.signature = Some(ProcessorSignature::from_eax(raw.signature));
    info.brand = raw.brand.as_ref().and_then(|b| sanitize_identifier(b));
    info.features =
        FeatureFlags::from_registers(raw.standard_edx, raw.standard_ecx, raw.extended_edx);
}
