// Native counting semaphore (ADR-002: fatal on OS resource failure)
//
// One backend per OS family; each exposes the same `NativeSemaphore` shape:
// new / wait / try_wait / timed_wait / post, released in Drop.
use std::fmt;
use std::time::Duration;

use keystone_core::port::{CountingSemaphore, SemaphoreError};
use tracing::{error, trace};

#[cfg(any(
    target_os = "linux",
    target_os = "android",
    target_os = "freebsd",
    target_os = "netbsd",
    target_os = "dragonfly"
))]
#[path = "posix.rs"]
mod backend;

#[cfg(any(target_os = "macos", target_os = "ios"))]
#[path = "darwin.rs"]
mod backend;

#[cfg(windows)]
#[path = "windows.rs"]
mod backend;

#[cfg(not(any(
    target_os = "linux",
    target_os = "android",
    target_os = "freebsd",
    target_os = "netbsd",
    target_os = "dragonfly",
    target_os = "macos",
    target_os = "ios",
    windows
)))]
compile_error!("no native semaphore backend for this target");

use backend::NativeSemaphore;

/// Counting semaphore over a native OS object
///
/// Each instance exclusively owns one kernel/libc semaphore and releases it
/// when dropped. Dropping while another thread is blocked in `acquire` is
/// impossible without unsafe code, since waiters hold a borrow; callers
/// sharing it through `Arc` must wake their waiters before the last clone
/// goes away.
///
/// # Example
/// ```text
/// let sem = Arc::new(Semaphore::new(0));
/// let worker = { let sem = sem.clone(); thread::spawn(move || sem.wait()) };
/// sem.release();
/// worker.join().unwrap();
/// ```
pub struct Semaphore {
    native: NativeSemaphore,
}

impl Semaphore {
    /// Whether blocking acquires honor their timeout on this platform
    pub const SUPPORTS_TIMEOUT: bool = backend::SUPPORTS_TIMEOUT;

    /// Create a semaphore holding `initial_count` permits
    ///
    /// The count may not exceed `i32::MAX` (`SEM_VALUE_MAX` on Linux, the
    /// Win32 limit on Windows; Apple platforms cap it lower still). A count
    /// the OS rejects, or any other allocation failure, aborts the process.
    pub fn new(initial_count: u32) -> Self {
        match Self::try_new(initial_count) {
            Ok(sem) => sem,
            Err(e) => fatal("Semaphore::new - creation failed", &e),
        }
    }

    /// Fallible constructor behind `new`
    ///
    /// Returns `SemaphoreError::Create` when `initial_count` is above the
    /// platform maximum.
    pub fn try_new(initial_count: u32) -> Result<Self, SemaphoreError> {
        let native = NativeSemaphore::new(initial_count)?;
        trace!(initial_count, "Semaphore created");
        Ok(Self { native })
    }
}

impl CountingSemaphore for Semaphore {
    fn acquire(&self, block: bool, timeout: Option<Duration>) -> bool {
        let result = match (block, timeout) {
            (false, _) => self.native.try_wait(),
            (true, None) => self.native.wait().map(|()| true),
            (true, Some(timeout)) => self.native.timed_wait(timeout),
        };

        result.unwrap_or_else(|e| fatal("Semaphore::acquire - wait failed", &e))
    }

    fn release(&self) {
        if let Err(e) = self.native.post() {
            fatal("Semaphore::release - post failed", &e);
        }
    }

    fn supports_timeout(&self) -> bool {
        Self::SUPPORTS_TIMEOUT
    }
}

impl fmt::Debug for Semaphore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Semaphore")
            .field("supports_timeout", &Self::SUPPORTS_TIMEOUT)
            .finish_non_exhaustive()
    }
}

/// Report an unrecoverable semaphore failure and abort the process
///
/// Aborts regardless of the panic strategy of the final binary, so a
/// failure on a worker thread cannot leave the process running.
#[cold]
fn fatal(context: &str, err: &SemaphoreError) -> ! {
    error!(error = %err, "{}", context);
    eprintln!("{context}: {err}");
    std::process::abort();
}
