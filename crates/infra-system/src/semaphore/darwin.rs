// Named POSIX semaphore backend for Apple platforms
//
// Darwin does not implement unnamed semaphores (sem_init fails with
// ENOSYS) nor sem_timedwait. Each instance opens a uniquely named
// semaphore and unlinks the name right away, leaving a private object.
use std::ffi::CString;
use std::io;
use std::sync::Once;
use std::time::Duration;

use keystone_core::port::SemaphoreError;
use tracing::{debug, warn};
use uuid::Uuid;

pub(super) const SUPPORTS_TIMEOUT: bool = false;

/// PSEMNAMLEN is 31 on Darwin, leading slash included
const NAME_HEX_LEN: usize = 24;

static TIMEOUT_WARNING: Once = Once::new();

pub(super) struct NativeSemaphore {
    sem: *mut libc::sem_t,
}

// SAFETY: sem_t is designed for concurrent use from multiple threads.
unsafe impl Send for NativeSemaphore {}
unsafe impl Sync for NativeSemaphore {}

impl NativeSemaphore {
    pub(super) fn new(initial_count: u32) -> Result<Self, SemaphoreError> {
        let hex = Uuid::new_v4().simple().to_string();
        let name = CString::new(format!("/ks-{}", &hex[..NAME_HEX_LEN])).map_err(|e| {
            SemaphoreError::Create {
                initial_count,
                source: io::Error::new(io::ErrorKind::InvalidInput, e),
            }
        })?;

        // SAFETY: `name` is NUL-terminated; variadic mode and value are
        // passed as c_uint per the sem_open contract
        let sem = unsafe {
            libc::sem_open(
                name.as_ptr(),
                libc::O_CREAT | libc::O_EXCL,
                0o600 as libc::c_uint,
                initial_count as libc::c_uint,
            )
        };
        if sem == libc::SEM_FAILED {
            return Err(SemaphoreError::Create {
                initial_count,
                source: io::Error::last_os_error(),
            });
        }

        // The open handle stays valid; only the name goes away
        // SAFETY: `name` is NUL-terminated
        if unsafe { libc::sem_unlink(name.as_ptr()) } != 0 {
            debug!(error = %io::Error::last_os_error(), "sem_unlink failed");
        }

        Ok(Self { sem })
    }

    pub(super) fn wait(&self) -> Result<(), SemaphoreError> {
        loop {
            // SAFETY: opened in `new`, closed only in `drop`
            if unsafe { libc::sem_wait(self.sem) } == 0 {
                return Ok(());
            }
            let err = io::Error::last_os_error();
            if err.kind() != io::ErrorKind::Interrupted {
                return Err(SemaphoreError::Wait(err));
            }
        }
    }

    pub(super) fn try_wait(&self) -> Result<bool, SemaphoreError> {
        loop {
            // SAFETY: see `wait`
            if unsafe { libc::sem_trywait(self.sem) } == 0 {
                return Ok(true);
            }
            let err = io::Error::last_os_error();
            match err.raw_os_error() {
                Some(libc::EAGAIN) => return Ok(false),
                Some(libc::EINTR) => continue,
                _ => return Err(SemaphoreError::Wait(err)),
            }
        }
    }

    /// No bounded wait on this platform: blocks until a permit arrives
    pub(super) fn timed_wait(&self, timeout: Duration) -> Result<bool, SemaphoreError> {
        TIMEOUT_WARNING.call_once(|| {
            warn!(
                timeout_ms = timeout.as_millis() as u64,
                "Semaphore timeouts unsupported on this platform, waiting indefinitely"
            );
        });
        self.wait().map(|()| true)
    }

    pub(super) fn post(&self) -> Result<(), SemaphoreError> {
        // SAFETY: see `wait`
        if unsafe { libc::sem_post(self.sem) } != 0 {
            return Err(SemaphoreError::Post(io::Error::last_os_error()));
        }
        Ok(())
    }
}

impl Drop for NativeSemaphore {
    fn drop(&mut self) {
        // SAFETY: `&mut self` proves no thread is inside a sem_* call
        unsafe {
            libc::sem_close(self.sem);
        }
    }
}
