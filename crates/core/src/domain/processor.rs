// Processor Capability Record

use serde::{Deserialize, Serialize};

use super::feature::FeatureFlags;

/// Length of the identification vendor string in bytes
pub const VENDOR_LEN: usize = 12;

/// Vendor sentinel for an x86 host that could not be identified
pub const UNKNOWN_X86_VENDOR: &str = "Unknown x86 Compatible";

/// Vendor sentinel for hosts outside the x86 family
pub const UNKNOWN_OTHER_VENDOR: &str = "Unknown";

/// Instruction-set family of the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ArchitectureFamily {
    X86Compatible,
    Other,
}

impl std::fmt::Display for ArchitectureFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArchitectureFamily::X86Compatible => write!(f, "X86_COMPATIBLE"),
            ArchitectureFamily::Other => write!(f, "OTHER"),
        }
    }
}

/// Manufacturer classification of the vendor string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CpuVendor {
    Intel,
    Amd,
    Cyrix,
    Centaur,
    Hygon,
    Unknown,
}

impl CpuVendor {
    pub fn from_vendor_string(vendor: &str) -> Self {
        match vendor {
            "GenuineIntel" => CpuVendor::Intel,
            "AuthenticAMD" | "AMDisbetter!" => CpuVendor::Amd,
            "CyrixInstead" => CpuVendor::Cyrix,
            "CentaurHauls" => CpuVendor::Centaur,
            "HygonGenuine" => CpuVendor::Hygon,
            _ => CpuVendor::Unknown,
        }
    }
}

impl std::fmt::Display for CpuVendor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CpuVendor::Intel => write!(f, "Intel"),
            CpuVendor::Amd => write!(f, "AMD"),
            CpuVendor::Cyrix => write!(f, "Cyrix"),
            CpuVendor::Centaur => write!(f, "Centaur"),
            CpuVendor::Hygon => write!(f, "Hygon"),
            CpuVendor::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Family/model/stepping decoded from the leaf 1 EAX signature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessorSignature {
    pub family: u32,
    pub model: u32,
    pub stepping: u32,
}

impl ProcessorSignature {
    /// Decode a raw signature word, folding in the extended family/model
    /// fields the way both Intel and AMD define them.
    pub fn from_eax(eax: u32) -> Self {
        let base_family = (eax >> 8) & 0xF;
        let base_model = (eax >> 4) & 0xF;
        let stepping = eax & 0xF;

        let family = if base_family == 0xF {
            base_family + ((eax >> 20) & 0xFF)
        } else {
            base_family
        };
        let model = if base_family == 0x6 || base_family == 0xF {
            base_model + (((eax >> 16) & 0xF) << 4)
        } else {
            base_model
        };

        Self {
            family,
            model,
            stepping,
        }
    }
}

/// Reduce raw identification bytes to a printable string
///
/// Stops at the first NUL, drops non-printable bytes and trims whitespace.
/// The result never exceeds `raw.len()` characters. Returns `None` when
/// nothing printable remains.
pub fn sanitize_identifier(raw: &[u8]) -> Option<String> {
    let text: String = raw
        .iter()
        .take_while(|b| **b != 0)
        .filter(|b| b.is_ascii_graphic() || **b == b' ')
        .map(|b| *b as char)
        .collect();

    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Immutable snapshot of the detected CPU identity, features and frequency
///
/// Built once by `CapabilityProber::initialize` and read-only afterwards;
/// share it by value or behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessorInfo {
    pub(crate) architecture: ArchitectureFamily,
    pub(crate) vendor: String,
    pub(crate) manufacturer: CpuVendor,
    pub(crate) signature: Option<ProcessorSignature>,
    pub(crate) brand: Option<String>,
    pub(crate) features: FeatureFlags,
    pub(crate) clock_mhz: u32,
}

impl ProcessorInfo {
    /// The record a probe starts from before anything is detected
    pub fn unknown(architecture: ArchitectureFamily) -> Self {
        let vendor = match architecture {
            ArchitectureFamily::X86Compatible => UNKNOWN_X86_VENDOR,
            ArchitectureFamily::Other => UNKNOWN_OTHER_VENDOR,
        };

        Self {
            architecture,
            vendor: vendor.to_string(),
            manufacturer: CpuVendor::Unknown,
            signature: None,
            brand: None,
            features: FeatureFlags::FPU,
            clock_mhz: 0,
        }
    }

    pub fn architecture(&self) -> ArchitectureFamily {
        self.architecture
    }

    /// Vendor identification string (at most 12 characters when detected)
    pub fn vendor(&self) -> &str {
        &self.vendor
    }

    pub fn manufacturer(&self) -> CpuVendor {
        self.manufacturer
    }

    pub fn signature(&self) -> Option<ProcessorSignature> {
        self.signature
    }

    /// Marketing brand string, when the extended leaves report one
    pub fn brand(&self) -> Option<&str> {
        self.brand.as_deref()
    }

    pub fn features(&self) -> FeatureFlags {
        self.features
    }

    /// True when every flag in `flags` was detected
    pub fn has(&self, flags: FeatureFlags) -> bool {
        self.features.contains(flags)
    }

    /// Estimated clock frequency in MHz, 0 when undetermined
    pub fn clock_mhz(&self) -> u32 {
        self.clock_mhz
    }
}
