// Keystone Infrastructure - System Adapters
// Implements: CpuProbe, CountingSemaphore, ConsoleSink (ADR-002)

pub mod console;
pub mod cpu_probe_impl;
pub mod platform;
pub mod semaphore;
pub mod telemetry;

pub use console::TracingConsoleSink;
pub use cpu_probe_impl::{native_probe, UnsupportedCpuProbe};
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
pub use cpu_probe_impl::X86CpuProbe;
pub use semaphore::Semaphore;
