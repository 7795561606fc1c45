//! Token privileges and elevation

use std::ffi::c_void;
use std::mem::size_of;

use windows::core::{w, PCWSTR};
use windows::Win32::Foundation::{GetLastError, ERROR_NOT_ALL_ASSIGNED, HANDLE, LUID};
use windows::Win32::Security::{
    AdjustTokenPrivileges, GetTokenInformation, LookupPrivilegeValueW, TokenElevation,
    LUID_AND_ATTRIBUTES, SE_PRIVILEGE_ENABLED, TOKEN_ADJUST_PRIVILEGES, TOKEN_ELEVATION,
    TOKEN_ACCESS_MASK, TOKEN_PRIVILEGES, TOKEN_QUERY,
};
use windows::Win32::System::Threading::{GetCurrentProcess, OpenProcessToken};

use super::ScopedHandle;
use crate::platform::{FacilityError, FacilityResult};

/// Needed by `SystemMemoryListInformation` requests.
pub const PROFILE_SINGLE_PROCESS: PCWSTR = w!("SeProfileSingleProcessPrivilege");
/// Needed by `SetSystemFileCacheSize` and working set trimming.
pub const INCREASE_QUOTA: PCWSTR = w!("SeIncreaseQuotaPrivilege");

fn open_own_token(access: TOKEN_ACCESS_MASK) -> FacilityResult<ScopedHandle> {
    let mut token = HANDLE::default();
    unsafe { OpenProcessToken(GetCurrentProcess(), access, &mut token) }?;
    Ok(ScopedHandle::new(token))
}

/// Enable one named privilege on the current process token.
pub fn enable_privilege(name: PCWSTR) -> FacilityResult<()> {
    let token = open_own_token(TOKEN_ADJUST_PRIVILEGES | TOKEN_QUERY)?;

    let mut luid = LUID::default();
    unsafe { LookupPrivilegeValueW(PCWSTR::null(), name, &mut luid) }?;

    let privileges = TOKEN_PRIVILEGES {
        PrivilegeCount: 1,
        Privileges: [LUID_AND_ATTRIBUTES {
            Luid: luid,
            Attributes: SE_PRIVILEGE_ENABLED,
        }],
    };

    unsafe {
        AdjustTokenPrivileges(
            token.raw(),
            false,
            Some(&privileges as *const TOKEN_PRIVILEGES),
            0,
            None,
            None,
        )
    }?;

    // AdjustTokenPrivileges succeeds even when the privilege is absent
    if unsafe { GetLastError() } == ERROR_NOT_ALL_ASSIGNED {
        let display = unsafe { name.to_string() }.unwrap_or_default();
        return Err(FacilityError::PermissionDenied(format!(
            "{} not held by this token",
            display
        )));
    }
    Ok(())
}

/// Whether the current process token is elevated.
pub fn is_elevated() -> bool {
    let token = match open_own_token(TOKEN_QUERY) {
        Ok(t) => t,
        Err(_) => return false,
    };

    let mut elevation = TOKEN_ELEVATION::default();
    let mut returned = 0u32;
    let queried = unsafe {
        GetTokenInformation(
            token.raw(),
            TokenElevation,
            Some(&mut elevation as *mut TOKEN_ELEVATION as *mut c_void),
            size_of::<TOKEN_ELEVATION>() as u32,
            &mut returned,
        )
    };

    queried.is_ok() && elevation.TokenIsElevated != 0
}
