// Unnamed POSIX semaphore backend (sem_init / sem_timedwait)
use std::cell::UnsafeCell;
use std::io;
use std::time::{Duration, Instant};

use keystone_core::port::SemaphoreError;

pub(super) const SUPPORTS_TIMEOUT: bool = true;

const NANOS_PER_SEC: i64 = 1_000_000_000;

pub(super) struct NativeSemaphore {
    // sem_t must not move after sem_init, so it lives on the heap
    sem: Box<UnsafeCell<libc::sem_t>>,
}

// SAFETY: sem_t is designed for concurrent use from multiple threads.
unsafe impl Send for NativeSemaphore {}
unsafe impl Sync for NativeSemaphore {}

impl NativeSemaphore {
    pub(super) fn new(initial_count: u32) -> Result<Self, SemaphoreError> {
        // SAFETY: an all-zero sem_t is a valid placeholder until sem_init
        let sem = Box::new(UnsafeCell::new(unsafe { std::mem::zeroed::<libc::sem_t>() }));

        // SAFETY: `sem` points to writable, heap-pinned storage
        if unsafe { libc::sem_init(sem.get(), 0, initial_count as libc::c_uint) } != 0 {
            // Nothing was initialized, so dropping the box is the only cleanup
            return Err(SemaphoreError::Create {
                initial_count,
                source: io::Error::last_os_error(),
            });
        }

        Ok(Self { sem })
    }

    pub(super) fn wait(&self) -> Result<(), SemaphoreError> {
        loop {
            // SAFETY: initialized in `new`, destroyed only in `drop`
            if unsafe { libc::sem_wait(self.sem.get()) } == 0 {
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
            if unsafe { libc::sem_trywait(self.sem.get()) } == 0 {
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

    /// Wait up to `timeout`, measured on the monotonic clock
    ///
    /// `sem_timedwait` only takes a CLOCK_REALTIME deadline. A forward
    /// wall-clock step makes it time out early; that is detected against
    /// `Instant` and the wait is re-armed for the remaining time. A backward
    /// step can still lengthen the wait by the size of the step.
    pub(super) fn timed_wait(&self, timeout: Duration) -> Result<bool, SemaphoreError> {
        let started = Instant::now();
        let mut remaining = timeout;
        loop {
            let deadline = realtime_deadline(remaining)?;
            // SAFETY: see `wait`; `deadline` outlives the call
            if unsafe { libc::sem_timedwait(self.sem.get(), &deadline) } == 0 {
                return Ok(true);
            }
            let err = io::Error::last_os_error();
            match err.raw_os_error() {
                Some(libc::ETIMEDOUT) => match timeout.checked_sub(started.elapsed()) {
                    Some(left) if !left.is_zero() => remaining = left,
                    _ => return Ok(false),
                },
                Some(libc::EINTR) => {
                    remaining = timeout.saturating_sub(started.elapsed());
                }
                _ => return Err(SemaphoreError::Wait(err)),
            }
        }
    }

    pub(super) fn post(&self) -> Result<(), SemaphoreError> {
        // SAFETY: see `wait`
        if unsafe { libc::sem_post(self.sem.get()) } != 0 {
            return Err(SemaphoreError::Post(io::Error::last_os_error()));
        }
        Ok(())
    }
}

impl Drop for NativeSemaphore {
    fn drop(&mut self) {
        // SAFETY: `&mut self` proves no thread is inside a sem_* call
        unsafe {
            libc::sem_destroy(self.sem.get());
        }
    }
}

/// Absolute CLOCK_REALTIME deadline `timeout` from now (sem_timedwait's clock)
fn realtime_deadline(timeout: Duration) -> Result<libc::timespec, SemaphoreError> {
    // SAFETY: timespec is plain old data
    let mut now: libc::timespec = unsafe { std::mem::zeroed() };
    // SAFETY: `now` is a valid out-pointer
    if unsafe { libc::clock_gettime(libc::CLOCK_REALTIME, &mut now) } != 0 {
        return Err(SemaphoreError::Wait(io::Error::last_os_error()));
    }

    let nanos = now.tv_nsec as i64 + i64::from(timeout.subsec_nanos());
    let secs = (now.tv_sec as i64)
        .saturating_add(i64::try_from(timeout.as_secs()).unwrap_or(i64::MAX))
        .saturating_add(nanos / NANOS_PER_SEC);

    let mut deadline = now;
    deadline.tv_sec = libc::time_t::try_from(secs).unwrap_or(libc::time_t::MAX);
    deadline.tv_nsec = (nanos % NANOS_PER_SEC) as _;
    Ok(deadline)
}
