// CPU probe implementations
// reason: core::arch intrinsics for CPUID/RDTSC, everything else stays in core (ADR-001)
use std::sync::Arc;

use keystone_core::domain::{ArchitectureFamily, VENDOR_LEN};
use keystone_core::port::{CpuProbe, RawIdentification};

/// Probe for hosts outside the x86 family
///
/// Always reports the identification facility as unsupported, so the
/// prober keeps its defaults.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedCpuProbe;

impl CpuProbe for UnsupportedCpuProbe {
    fn architecture(&self) -> ArchitectureFamily {
        ArchitectureFamily::Other
    }

    fn identify(&self) -> Option<RawIdentification> {
        None
    }

    fn read_timestamp(&self) -> u64 {
        0
    }
}

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
pub use x86::X86CpuProbe;

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
mod x86 {
    use super::{ArchitectureFamily, CpuProbe, RawIdentification, VENDOR_LEN};
    use tracing::debug;

    #[cfg(target_arch = "x86")]
    use core::arch::x86::{__cpuid, _rdtsc, CpuidResult};
    #[cfg(target_arch = "x86_64")]
    use core::arch::x86_64::{__cpuid, _rdtsc, CpuidResult};

    const LEAF_VENDOR: u32 = 0x0000_0000;
    const LEAF_FEATURES: u32 = 0x0000_0001;
    const LEAF_EXT_MAX: u32 = 0x8000_0000;
    const LEAF_EXT_FEATURES: u32 = 0x8000_0001;
    const LEAF_EXT_BRAND: [u32; 3] = [0x8000_0002, 0x8000_0003, 0x8000_0004];

    /// CPUID/RDTSC probe for x86 and x86-64
    #[derive(Debug, Default, Clone, Copy)]
    pub struct X86CpuProbe;

    #[cfg(target_arch = "x86")]
    fn cpuid_supported() -> bool {
        // Toggles EFLAGS.ID to detect pre-Pentium parts
        core::arch::x86::has_cpuid()
    }

    #[cfg(target_arch = "x86_64")]
    fn cpuid_supported() -> bool {
        true
    }

    #[allow(unused_unsafe)]
    fn cpuid(leaf: u32) -> CpuidResult {
        // SAFETY: only called after cpuid_supported(); unsupported leaves
        // return vendor-defined data, never fault.
        unsafe {
            __cpuid(leaf)
        }
    }

    impl CpuProbe for X86CpuProbe {
        fn architecture(&self) -> ArchitectureFamily {
            ArchitectureFamily::X86Compatible
        }

        fn identify(&self) -> Option<RawIdentification> {
            if !cpuid_supported() {
                debug!("CPUID instruction not supported");
                return None;
            }

            let leaf0 = cpuid(LEAF_VENDOR);
            let mut vendor = [0u8; VENDOR_LEN];
            vendor[0..4].copy_from_slice(&leaf0.ebx.to_le_bytes());
            vendor[4..8].copy_from_slice(&leaf0.edx.to_le_bytes());
            vendor[8..12].copy_from_slice(&leaf0.ecx.to_le_bytes());

            let (signature, standard_edx, standard_ecx) = if leaf0.eax >= LEAF_FEATURES {
                let leaf1 = cpuid(LEAF_FEATURES);
                (leaf1.eax, leaf1.edx, leaf1.ecx)
            } else {
                (0, 0, 0)
            };

            let max_extended = cpuid(LEAF_EXT_MAX).eax;
            let extended_edx =
                (max_extended > LEAF_EXT_MAX).then(|| cpuid(LEAF_EXT_FEATURES).edx);
            let brand = (max_extended >= LEAF_EXT_BRAND[2]).then(read_brand);

            debug!(
                max_leaf = leaf0.eax,
                max_extended_leaf = max_extended,
                "CPUID identification complete"
            );

            Some(RawIdentification {
                vendor,
                signature,
                standard_edx,
                standard_ecx,
                extended_edx,
                brand,
            })
        }

        #[allow(unused_unsafe)]
        fn read_timestamp(&self) -> u64 {
            // SAFETY: the prober only reads the counter once CPUID reported TSC
            unsafe {
                _rdtsc()
            }
        }
    }

    fn read_brand() -> [u8; 48] {
        let mut brand = [0u8; 48];
        for (chunk, leaf) in brand.chunks_exact_mut(16).zip(LEAF_EXT_BRAND) {
            let regs = cpuid(leaf);
            for (dst, word) in chunk
                .chunks_exact_mut(4)
                .zip([regs.eax, regs.ebx, regs.ecx, regs.edx])
            {
                dst.copy_from_slice(&word.to_le_bytes());
            }
        }
        brand
    }
}

/// Probe matching the compilation target
pub fn native_probe() -> Arc<dyn CpuProbe> {
    #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
    {
        Arc::new(X86CpuProbe)
    }

    #[cfg(not(any(target_arch = "x86", target_arch = "x86_64")))]
    {
        Arc::new(UnsupportedCpuProbe)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_probe() {
        let probe = UnsupportedCpuProbe;
        assert_eq!(probe.architecture(), ArchitectureFamily::Other);
        assert!(probe.identify().is_none());
    }

    #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
    #[test]
    fn test_x86_identification() {
        let probe = X86CpuProbe;
        let raw = probe.identify().expect("CPUID available on test hosts");

        let vendor = keystone_core::domain::sanitize_identifier(&raw.vendor);
        assert!(vendor.is_some_and(|v| v.len() <= VENDOR_LEN));
        // Every x86-64 part has an FPU and a TSC
        #[cfg(target_arch = "x86_64")]
        assert_eq!(raw.standard_edx & 0x11, 0x11);
    }

    #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
    #[test]
    fn test_timestamp_advances() {
        let probe = X86CpuProbe;
        let first = probe.read_timestamp();
        std::thread::sleep(std::time::Duration::from_millis(1));
        assert!(probe.read_timestamp() > first);
    }

    #[test]
    fn test_native_probe_family() {
        let expected = if cfg!(any(target_arch = "x86", target_arch = "x86_64")) {
            ArchitectureFamily::X86Compatible
        } else {
            ArchitectureFamily::Other
        };
        assert_eq!(native_probe().architecture(), expected);
    }
}
