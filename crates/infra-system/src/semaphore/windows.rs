// Win32 kernel semaphore backend
use std::io;
use std::ptr;
use std::time::Duration;

use keystone_core::port::SemaphoreError;
use windows_sys::Win32::Foundation::{CloseHandle, HANDLE, WAIT_OBJECT_0, WAIT_TIMEOUT};
use windows_sys::Win32::System::Threading::{
    CreateSemaphoreW, ReleaseSemaphore, WaitForSingleObject, INFINITE,
};

pub(super) const SUPPORTS_TIMEOUT: bool = true;

pub(super) struct NativeSemaphore {
    handle: HANDLE,
}

// SAFETY: kernel semaphore handles may be used from any thread.
unsafe impl Send for NativeSemaphore {}
unsafe impl Sync for NativeSemaphore {}

impl NativeSemaphore {
    pub(super) fn new(initial_count: u32) -> Result<Self, SemaphoreError> {
        let initial = i32::try_from(initial_count).map_err(|_| SemaphoreError::Create {
            initial_count,
            source: io::Error::from(io::ErrorKind::InvalidInput),
        })?;

        // SAFETY: null attributes and name create a private semaphore
        let handle = unsafe { CreateSemaphoreW(ptr::null(), initial, i32::MAX, ptr::null()) };
        if handle.is_null() {
            return Err(SemaphoreError::Create {
                initial_count,
                source: io::Error::last_os_error(),
            });
        }

        Ok(Self { handle })
    }

    fn wait_ms(&self, millis: u32) -> Result<bool, SemaphoreError> {
        // SAFETY: handle is open until `drop`
        match unsafe { WaitForSingleObject(self.handle, millis) } {
            WAIT_OBJECT_0 => Ok(true),
            WAIT_TIMEOUT => Ok(false),
            _ => Err(SemaphoreError::Wait(io::Error::last_os_error())),
        }
    }

    pub(super) fn wait(&self) -> Result<(), SemaphoreError> {
        self.wait_ms(INFINITE).map(|_| ())
    }

    pub(super) fn try_wait(&self) -> Result<bool, SemaphoreError> {
        self.wait_ms(0)
    }

    pub(super) fn timed_wait(&self, timeout: Duration) -> Result<bool, SemaphoreError> {
        // INFINITE itself would mean "no timeout"
        let millis = u32::try_from(timeout.as_millis())
            .unwrap_or(u32::MAX)
            .min(INFINITE - 1);
        self.wait_ms(millis)
    }

    pub(super) fn post(&self) -> Result<(), SemaphoreError> {
        // SAFETY: handle is open until `drop`
        if unsafe { ReleaseSemaphore(self.handle, 1, ptr::null_mut()) } == 0 {
            return Err(SemaphoreError::Post(io::Error::last_os_error()));
        }
        Ok(())
    }
}

impl Drop for NativeSemaphore {
    fn drop(&mut self) {
        // SAFETY: we exclusively own the handle
        unsafe {
            CloseHandle(self.handle);
        }
    }
}
