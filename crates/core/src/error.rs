// Central Error Type for the Platform Layer

use thiserror::Error;

/// Platform-level error type
///
/// Detection never produces one of these: a failed probe degrades to the
/// default record instead (see `CapabilityProber`). Semaphore failures
/// have their own `SemaphoreError` and are fatal outside `try_new`.
#[derive(Error, Debug)]
pub enum PlatformError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Logging error: {0}")]
    Logging(String),
}

/// Result type alias using PlatformError
pub type Result<T> = std::result::Result<T, PlatformError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = PlatformError::Config("unknown log format: xml".into());
        assert_eq!(err.to_string(), "Configuration error: unknown log format: xml");

        let err = PlatformError::Logging("already set".into());
        assert_eq!(err.to_string(), "Logging error: already set");
    }
}
