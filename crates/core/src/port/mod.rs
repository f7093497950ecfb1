// Port Layer - Interfaces for external dependencies

pub mod console_sink;
pub mod cpu_probe;
pub mod semaphore;
pub mod time_provider;

// Re-exports
pub use console_sink::ConsoleSink;
pub use cpu_probe::{CpuProbe, RawIdentification};
pub use semaphore::{CountingSemaphore, SemaphoreError};
pub use time_provider::{MonotonicTimeProvider, TimeProvider};
