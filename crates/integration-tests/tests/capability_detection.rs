//! Capability Detection Tests
//!
//! Runs the prober against the real host and against scripted probes
//! through the public API.

use keystone_core::application::CapabilityProber;
use keystone_core::config::PlatformConfig;
use keystone_core::domain::{ArchitectureFamily, FeatureFlags, VENDOR_LEN};
use keystone_core::port::console_sink::mocks::RecordingConsoleSink;
use keystone_core::port::cpu_probe::mocks::FakeCpuProbe;
use keystone_core::port::time_provider::mocks::SteppingTimeProvider;
use keystone_core::port::{MonotonicTimeProvider, RawIdentification};
use keystone_infra_system::{native_probe, platform, UnsupportedCpuProbe};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn short_calibration() -> PlatformConfig {
    PlatformConfig {
        calibration_window: Duration::from_millis(100),
        ..PlatformConfig::default()
    }
}

/// Real host: detection completes and yields a well-formed record
#[test]
fn test_host_detection() {
    let info = platform::initialize(&short_calibration());

    if info.architecture() == ArchitectureFamily::X86Compatible {
        assert!(info.vendor().len() <= VENDOR_LEN || info.vendor() == "Unknown x86 Compatible");
        if info.has(FeatureFlags::TSC | FeatureFlags::FPU) {
            assert!(info.clock_mhz() > 0, "TSC present but frequency undetermined");
        }
    } else {
        assert_eq!(info.vendor(), "Unknown");
        assert_eq!(info.clock_mhz(), 0);
    }
}

/// Skipping calibration leaves the frequency undetermined
#[test]
fn test_host_detection_without_calibration() {
    let config = PlatformConfig {
        skip_calibration: true,
        ..PlatformConfig::default()
    };

    let info = platform::initialize(&config);
    assert_eq!(info.clock_mhz(), 0);
}

/// The record is immutable and safe to read from many threads
#[test]
fn test_record_shared_across_threads() {
    let prober = CapabilityProber::new(
        native_probe(),
        Arc::new(MonotonicTimeProvider::new()),
        Arc::new(RecordingConsoleSink::new()),
    )
    .with_calibration_window(Duration::from_millis(50));
    let info = Arc::new(prober.initialize());

    let readers: Vec<_> = (0..8)
        .map(|_| {
            let info = info.clone();
            thread::spawn(move || (info.vendor().to_string(), info.clock_mhz(), info.features()))
        })
        .collect();

    for reader in readers {
        let (vendor, mhz, features) = reader.join().unwrap();
        assert_eq!(vendor, info.vendor());
        assert_eq!(mhz, info.clock_mhz());
        assert_eq!(features, info.features());
    }
}

/// Non-x86 hosts fall back to the "Unknown" record without errors
#[test]
fn test_unsupported_family_probe() {
    let console = Arc::new(RecordingConsoleSink::new());
    let prober = CapabilityProber::new(
        Arc::new(UnsupportedCpuProbe),
        Arc::new(MonotonicTimeProvider::new()),
        console.clone(),
    );

    let info = prober.initialize();

    assert_eq!(info.architecture(), ArchitectureFamily::Other);
    assert_eq!(info.vendor(), "Unknown");
    assert_eq!(info.clock_mhz(), 0);
    assert_eq!(console.lines()[1], "   Unknown, 0 Mhz");
}

/// A 3DNow!-capable AMD part, calibrated at a raw 1398 MHz
#[test]
fn test_scripted_amd_part() {
    let raw = RawIdentification {
        vendor: *b"AuthenticAMD",
        signature: 0x0000_0662,
        // FPU, TSC, MMX
        standard_edx: 1 | (1 << 4) | (1 << 23),
        standard_ecx: 0,
        extended_edx: Some((1 << 31) | (1 << 30)),
        brand: None,
    };
    let probe = Arc::new(FakeCpuProbe::identified(raw).with_timestamps([0, 1_398_000 * 750]));
    let console = Arc::new(RecordingConsoleSink::new());

    let info = CapabilityProber::new(
        probe,
        Arc::new(SteppingTimeProvider::new(0, 25)),
        console.clone(),
    )
    .initialize();

    assert_eq!(info.vendor(), "AuthenticAMD");
    assert!(info.has(FeatureFlags::AMD_3DNOW | FeatureFlags::AMD_3DNOW_EXT));
    assert!(!info.has(FeatureFlags::SSE));
    // rem50 = 48 -> nearest 50
    assert_eq!(info.clock_mhz(), 1400);

    let lines = console.lines();
    assert_eq!(lines[1], "   AuthenticAMD, 1400 Mhz");
    assert!(lines.contains(&"   3DNow detected".to_string()));
    assert!(!lines.contains(&"   SSE detected".to_string()));
}

/// The record serializes for diagnostics dumps
#[test]
fn test_record_serializes_to_json() {
    let info = CapabilityProber::new(
        Arc::new(FakeCpuProbe::unsupported(ArchitectureFamily::X86Compatible)),
        Arc::new(MonotonicTimeProvider::new()),
        Arc::new(RecordingConsoleSink::new()),
    )
    .initialize();

    let json = serde_json::to_value(&info).unwrap();
    assert_eq!(json["vendor"], "Unknown x86 Compatible");
    assert_eq!(json["clock_mhz"], 0);
    assert_eq!(json["architecture"], "X86_COMPATIBLE");
}
