// CPU Feature Flags
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Named CPU capabilities reported by the identification probe
    ///
    /// Bit positions are internal to this crate and unrelated to the
    /// hardware register layout (see `FEATURE_TABLE` for that mapping).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct FeatureFlags: u32 {
        /// On-chip floating point unit
        const FPU = 1 << 0;
        /// MMX multimedia extension
        const MMX = 1 << 1;
        /// AMD 3DNow! extension
        const AMD_3DNOW = 1 << 2;
        /// Streaming SIMD extension
        const SSE = 1 << 3;
        /// Time stamp counter (RDTSC)
        const TSC = 1 << 4;
        const CMOV = 1 << 5;
        const FXSR = 1 << 6;
        const SSE2 = 1 << 7;
        /// Hyper-threading capable package
        const HTT = 1 << 8;
        const SSE3 = 1 << 9;
        const SSSE3 = 1 << 10;
        const SSE4_1 = 1 << 11;
        const SSE4_2 = 1 << 12;
        const POPCNT = 1 << 13;
        const AVX = 1 << 14;
        /// AMD extensions to MMX
        const MMX_EXT = 1 << 15;
        /// AMD extensions to 3DNow!
        const AMD_3DNOW_EXT = 1 << 16;
    }
}

/// Identification register word a feature bit is reported in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureRegister {
    /// Leaf 0x0000_0001, EDX
    StandardEdx,
    /// Leaf 0x0000_0001, ECX
    StandardEcx,
    /// Leaf 0x8000_0001, EDX
    ExtendedEdx,
}

/// One row of the raw-bit to named-flag translation table
#[derive(Debug, Clone, Copy)]
pub struct FeatureBit {
    pub register: FeatureRegister,
    pub bit: u32,
    pub flag: FeatureFlags,
    pub name: &'static str,
}

const fn row(
    register: FeatureRegister,
    bit: u32,
    flag: FeatureFlags,
    name: &'static str,
) -> FeatureBit {
    FeatureBit {
        register,
        bit,
        flag,
        name,
    }
}

/// Translation table, in the order features are reported
///
/// Bits not listed here (reserved or not interesting to the engine) are
/// ignored by `FeatureFlags::from_registers`.
pub const FEATURE_TABLE: &[FeatureBit] = &[
    row(FeatureRegister::StandardEdx, 0, FeatureFlags::FPU, "FPU"),
    row(FeatureRegister::StandardEdx, 23, FeatureFlags::MMX, "MMX"),
    row(FeatureRegister::ExtendedEdx, 31, FeatureFlags::AMD_3DNOW, "3DNow"),
    row(FeatureRegister::StandardEdx, 25, FeatureFlags::SSE, "SSE"),
    row(FeatureRegister::StandardEdx, 4, FeatureFlags::TSC, "RDTSC"),
    row(FeatureRegister::StandardEdx, 15, FeatureFlags::CMOV, "CMOV"),
    row(FeatureRegister::StandardEdx, 24, FeatureFlags::FXSR, "FXSR"),
    row(FeatureRegister::StandardEdx, 26, FeatureFlags::SSE2, "SSE2"),
    row(FeatureRegister::StandardEdx, 28, FeatureFlags::HTT, "HTT"),
    row(FeatureRegister::StandardEcx, 0, FeatureFlags::SSE3, "SSE3"),
    row(FeatureRegister::StandardEcx, 9, FeatureFlags::SSSE3, "SSSE3"),
    row(FeatureRegister::StandardEcx, 19, FeatureFlags::SSE4_1, "SSE4.1"),
    row(FeatureRegister::StandardEcx, 20, FeatureFlags::SSE4_2, "SSE4.2"),
    row(FeatureRegister::StandardEcx, 23, FeatureFlags::POPCNT, "POPCNT"),
    row(FeatureRegister::StandardEcx, 28, FeatureFlags::AVX, "AVX"),
    row(FeatureRegister::ExtendedEdx, 22, FeatureFlags::MMX_EXT, "MMX-Ext"),
    row(FeatureRegister::ExtendedEdx, 30, FeatureFlags::AMD_3DNOW_EXT, "3DNow-Ext"),
];

impl FeatureFlags {
    /// Translate raw identification register words into named flags
    ///
    /// `extended_edx` is `None` when the extended leaf range is absent, in
    /// which case every extended-only flag stays clear.
    pub fn from_registers(standard_edx: u32, standard_ecx: u32, extended_edx: Option<u32>) -> Self {
        FEATURE_TABLE
            .iter()
            .filter(|entry| {
                let word = match entry.register {
                    FeatureRegister::StandardEdx => Some(standard_edx),
                    FeatureRegister::StandardEcx => Some(standard_ecx),
                    FeatureRegister::ExtendedEdx => extended_edx,
                };
                word.is_some_and(|w| w & (1 << entry.bit) != 0)
            })
            .fold(FeatureFlags::empty(), |acc, entry| acc | entry.flag)
    }

    /// Display names of the set flags, in table order
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        FEATURE_TABLE
            .iter()
            .filter(move |entry| self.contains(entry.flag))
            .map(|entry| entry.name)
    }
}

impl std::fmt::Display for FeatureFlags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.names().collect();
        if names.is_empty() {
            write!(f, "none")
        } else {
            write!(f, "{}", names.join(" "))
        }
    }
}
