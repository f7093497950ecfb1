// Time Provider Port (for testability)
use std::time::Instant;

/// Millisecond clock interface (allows mocking in tests)
pub trait TimeProvider: Send + Sync {
    /// Milliseconds elapsed since an arbitrary, fixed origin
    fn now_millis(&self) -> u64;
}

/// Monotonic clock anchored at construction (production)
pub struct MonotonicTimeProvider {
    origin: Instant,
}

impl MonotonicTimeProvider {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicTimeProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeProvider for MonotonicTimeProvider {
    fn now_millis(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    /// Clock that advances by a fixed step on every read
    pub struct SteppingTimeProvider {
        now: AtomicU64,
        step: u64,
    }

    impl SteppingTimeProvider {
        pub fn new(start: u64, step: u64) -> Self {
            Self {
                now: AtomicU64::new(start),
                step,
            }
        }

        /// Value the next read will return
        pub fn current(&self) -> u64 {
            self.now.load(Ordering::SeqCst)
        }
    }

    impl TimeProvider for SteppingTimeProvider {
        fn now_millis(&self) -> u64 {
            self.now.fetch_add(self.step, Ordering::SeqCst)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mocks::SteppingTimeProvider;
    use super::*;

    #[test]
    fn test_monotonic_never_goes_back() {
        let clock = MonotonicTimeProvider::new();
        let first = clock.now_millis();
        std::thread::sleep(std::time::Duration::from_millis(5));
        assert!(clock.now_millis() >= first + 5);
    }

    #[test]
    fn test_stepping_clock() {
        let clock = SteppingTimeProvider::new(100, 10);
        assert_eq!(clock.now_millis(), 100);
        assert_eq!(clock.now_millis(), 110);
        assert_eq!(clock.current(), 120);
    }
}
