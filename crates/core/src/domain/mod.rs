// Domain Layer - Processor facts and pure detection logic

pub mod feature;
pub mod processor;
pub mod speed_grade;

// Re-exports
pub use feature::{FeatureBit, FeatureFlags, FeatureRegister, FEATURE_TABLE};
pub use processor::{
    sanitize_identifier, ArchitectureFamily, CpuVendor, ProcessorInfo, ProcessorSignature,
    UNKNOWN_OTHER_VENDOR, UNKNOWN_X86_VENDOR, VENDOR_LEN,
};
pub use speed_grade::{estimate_mhz, snap_to_speed_grade};
