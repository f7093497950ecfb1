// CPU identification port
//
// Every architecture-specific instruction sequence lives behind this trait;
// calibration and rounding above it stay architecture-neutral.
use crate::domain::{ArchitectureFamily, VENDOR_LEN};

/// Register words returned by the CPU identification facility
///
/// Only raw values cross the port; translation into `FeatureFlags` and the
/// vendor string happens in the application layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawIdentification {
    /// Vendor bytes (leaf 0 EBX, EDX, ECX), not necessarily printable
    pub vendor: [u8; VENDOR_LEN],
    /// Leaf 1 EAX (family/model/stepping)
    pub signature: u32,
    /// Leaf 1 EDX
    pub standard_edx: u32,
    /// Leaf 1 ECX
    pub standard_ecx: u32,
    /// Leaf 0x8000_0001 EDX, `None` when the extended range is absent
    pub extended_edx: Option<u32>,
    /// Leaves 0x8000_0002..=0x8000_0004, `None` when not reported
    pub brand: Option<[u8; 48]>,
}

/// Architecture-specific capability provider
///
/// Implementations must never fail loudly: an unsupported facility is
/// reported as `None`, and the timestamp read is only called once
/// identification reported a timestamp counter.
pub trait CpuProbe: Send + Sync {
    /// Instruction-set family this probe interrogates
    fn architecture(&self) -> ArchitectureFamily;

    /// Run the identification facility, `None` if the CPU lacks it
    fn identify(&self) -> Option<RawIdentification>;

    /// Read the free-running timestamp counter
    fn read_timestamp(&self) -> u64;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Scripted probe: fixed identification and a queue of counter values
    pub struct FakeCpuProbe {
        architecture: ArchitectureFamily,
        identification: Option<RawIdentification>,
        timestamps: Mutex<VecDeque<u64>>,
        timestamp_reads: AtomicUsize,
    }

    impl FakeCpuProbe {
        /// Probe whose identification facility is unsupported
        pub fn unsupported(architecture: ArchitectureFamily) -> Self {
            Self {
                architecture,
                identification: None,
                timestamps: Mutex::new(VecDeque::new()),
                timestamp_reads: AtomicUsize::new(0),
            }
        }

        pub fn identified(identification: RawIdentification) -> Self {
            Self {
                identification: Some(identification),
                ..Self::unsupported(ArchitectureFamily::X86Compatible)
            }
        }

        /// Queue timestamp counter values, returned in order (0 once drained)
        pub fn with_timestamps(self, values: impl IntoIterator<Item = u64>) -> Self {
            self.timestamps.lock().unwrap().extend(values);
            self
        }

        pub fn timestamp_reads(&self) -> usize {
            self.timestamp_reads.load(Ordering::SeqCst)
        }
    }

    impl CpuProbe for FakeCpuProbe {
        fn architecture(&self) -> ArchitectureFamily {
            self.architecture
        }

        fn identify(&self) -> Option<RawIdentification> {
            self.identification.clone()
        }

        fn read_timestamp(&self) -> u64 {
            self.timestamp_reads.fetch_add(1, Ordering::SeqCst);
            self.timestamps.lock().unwrap().pop_front().unwrap_or(0)
        }
    }

    /// Identification words of a typical SSE2-era Intel part
    pub fn intel_identification() -> RawIdentification {
        RawIdentification {
            vendor: *b"GenuineIntel",
            signature: 0x0000_06F6,
            // FPU, TSC, CMOV, MMX, FXSR, SSE, SSE2
            standard_edx: 1 | (1 << 4) | (1 << 15) | (1 << 23) | (1 << 24) | (1 << 25) | (1 << 26),
            standard_ecx: 1,
            extended_edx: Some(0),
            brand: None,
        }
    }
}
