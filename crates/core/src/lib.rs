// Keystone Core - Domain Logic & Ports
// NO OS or architecture dependencies (ADR-001: Hexagonal Architecture)

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod port;

pub use error::{PlatformError, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
