//! Scoped kernel handles

use windows::Win32::Foundation::{CloseHandle, HANDLE};

/// Owns a kernel handle and closes it on drop.
pub struct ScopedHandle(HANDLE);

impl ScopedHandle {
    pub fn new(handle: HANDLE) -> Self {
        Self(handle)
    }

    pub fn raw(&self) -> HANDLE {
        self.0
    }
}

impl Drop for ScopedHandle {
    fn drop(&mut self) {
        if !self.0.is_invalid() {
            unsafe {
                let _ = CloseHandle(self.0);
            }
        }
    }
}
