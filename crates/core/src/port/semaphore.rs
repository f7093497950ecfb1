// Counting semaphore port
use std::time::Duration;
use thiserror::Error;

/// Failure reported by a native semaphore backend
///
/// These surface only from fallible constructors; the operational calls
/// treat them as fatal.
#[derive(Error, Debug)]
pub enum SemaphoreError {
    #[error("failed to create semaphore (initial count {initial_count}): {source}")]
    Create {
        initial_count: u32,
        #[source]
        source: std::io::Error,
    },

    #[error("semaphore wait failed: {0}")]
    Wait(#[source] std::io::Error),

    #[error("semaphore post failed: {0}")]
    Post(#[source] std::io::Error),
}

/// Counting semaphore interface
///
/// Ordering among several blocked waiters is not guaranteed; every
/// `release` eventually wakes some waiter.
pub trait CountingSemaphore: Send + Sync {
    /// Take one permit
    ///
    /// With `block = false` this never waits and returns whether a permit
    /// was consumed. With `block = true` it waits for a permit and returns
    /// `true`, or `false` once `timeout` elapses on backends where
    /// `supports_timeout()` holds. Backends without timeout support wait
    /// indefinitely.
    fn acquire(&self, block: bool, timeout: Option<Duration>) -> bool;

    /// Return one permit, waking at most one waiter
    fn release(&self);

    /// Whether a blocking `acquire` honors its timeout
    fn supports_timeout(&self) -> bool;

    fn try_acquire(&self) -> bool {
        self.acquire(false, None)
    }

    fn wait(&self) {
        self.acquire(true, None);
    }
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::{Condvar, Mutex};
    use std::time::Instant;

    /// In-process semaphore for testing code that coordinates through the port
    pub struct MockSemaphore {
        count: Mutex<u32>,
        available: Condvar,
    }

    impl MockSemaphore {
        pub fn new(initial_count: u32) -> Self {
            Self {
                count: Mutex::new(initial_count),
                available: Condvar::new(),
            }
        }

        /// Current permit count (not part of the port)
        pub fn count(&self) -> u32 {
            *self.count.lock().unwrap()
        }
    }

    impl CountingSemaphore for MockSemaphore {
        fn acquire(&self, block: bool, timeout: Option<Duration>) -> bool {
            let mut count = self.count.lock().unwrap();

            if !block {
                if *count == 0 {
                    return false;
                }
                *count -= 1;
                return true;
            }

            let deadline = timeout.map(|t| Instant::now() + t);
            while *count == 0 {
                match deadline {
                    None => count = self.available.wait(count).unwrap(),
                    Some(deadline) => {
                        let now = Instant::now();
                        if now >= deadline {
                            return false;
                        }
                        count = self.available.wait_timeout(count, deadline - now).unwrap().0;
                    }
                }
            }
            *count -= 1;
            true
        }

        fn release(&self) {
            *self.count.lock().unwrap() += 1;
            self.available.notify_one();
        }

        fn supports_timeout(&self) -> bool {
            true
        }
    }
}
