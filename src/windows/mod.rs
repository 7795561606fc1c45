//! Windows memory-management APIs
//!
//! Thin wrappers over kernel32, psapi, ntdll and shell32. Every handle is
//! held in a [`ScopedHandle`] so it is closed on all paths.

#![cfg(target_os = "windows")]

pub mod handle;
pub mod memory;
pub mod ntapi;
pub mod privileges;
pub mod process;
pub mod shell;

pub use handle::ScopedHandle;

use crate::platform::FacilityError;
use windows::Win32::Foundation::{E_ACCESSDENIED, ERROR_ACCESS_DENIED, ERROR_PRIVILEGE_NOT_HELD};

impl From<windows::core::Error> for FacilityError {
    fn from(err: windows::core::Error) -> Self {
        let code = err.code();
        if code == E_ACCESSDENIED
            || code == ERROR_ACCESS_DENIED.to_hresult()
            || code == ERROR_PRIVILEGE_NOT_HELD.to_hresult()
        {
            FacilityError::PermissionDenied(err.message().to_string())
        } else {
            FacilityError::SystemError {
                code: code.0,
                message: err.message().to_string(),
            }
        }
    }
}
