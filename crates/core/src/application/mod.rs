// Application Layer - Use Cases

pub mod constants;
pub mod prober;

// Re-exports
pub use prober::CapabilityProber;
