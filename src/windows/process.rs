//! Per-process working set and heap operations

use std::mem::size_of;

use windows::Win32::Foundation::HANDLE;
use windows::Win32::System::Diagnostics::ToolHelp::{
    CreateToolhelp32Snapshot, Module32FirstW, Module32NextW, MODULEENTRY32W, TH32CS_SNAPMODULE,
    TH32CS_SNAPMODULE32,
};
use windows::Win32::System::Memory::{
    GetProcessHeaps, HeapCompact, SetProcessWorkingSetSizeEx, HEAP_NONE,
    SETPROCESSWORKINGSETSIZEEX_FLAGS,
};
use windows::Win32::System::ProcessStatus::EmptyWorkingSet;
use windows::Win32::System::Threading::{
    GetCurrentProcess, OpenProcess, PROCESS_QUERY_LIMITED_INFORMATION, PROCESS_SET_QUOTA,
};

use super::ScopedHandle;
use crate::platform::process::is_clr_module;
use crate::platform::FacilityResult;

/// `(SIZE_T)-1` for both bounds removes as many pages as possible.
const WORKING_SET_UNBOUNDED: usize = usize::MAX;

fn open_for_trim(pid: u32) -> FacilityResult<ScopedHandle> {
    let handle = unsafe {
        OpenProcess(PROCESS_SET_QUOTA | PROCESS_QUERY_LIMITED_INFORMATION, false, pid)
    }?;
    Ok(ScopedHandle::new(handle))
}

fn empty_working_set(handle: HANDLE) -> FacilityResult<()> {
    unsafe {
        EmptyWorkingSet(handle)?;
        SetProcessWorkingSetSizeEx(
            handle,
            WORKING_SET_UNBOUNDED,
            WORKING_SET_UNBOUNDED,
            SETPROCESSWORKINGSETSIZEEX_FLAGS(0),
        )?;
    }
    Ok(())
}

/// Empty the working set of `pid`. Fails for protected processes and for
/// processes owned by other sessions when not running as SYSTEM.
pub fn trim_process_working_set(pid: u32) -> FacilityResult<()> {
    let handle = open_for_trim(pid)?;
    empty_working_set(handle.raw())
}

/// Empty the calling process's own working set.
pub fn trim_current_working_set() -> FacilityResult<()> {
    empty_working_set(unsafe { GetCurrentProcess() })
}

/// Compact every heap of the calling process. Returns the number of heaps.
pub fn compact_process_heaps() -> usize {
    let count = unsafe { GetProcessHeaps(&mut []) } as usize;
    let mut heaps = vec![HANDLE::default(); count];
    let filled = unsafe { GetProcessHeaps(&mut heaps) } as usize;

    for heap in heaps.iter().take(filled.min(count)) {
        unsafe {
            HeapCompact(*heap, HEAP_NONE);
        }
    }
    filled.min(count)
}

/// Whether `pid` has a CLR module loaded.
pub fn has_clr_module(pid: u32) -> bool {
    let snapshot = match unsafe { CreateToolhelp32Snapshot(TH32CS_SNAPMODULE | TH32CS_SNAPMODULE32, pid) } {
        Ok(h) => ScopedHandle::new(h),
        Err(_) => return false,
    };

    let mut entry = MODULEENTRY32W {
        dwSize: size_of::<MODULEENTRY32W>() as u32,
        ..Default::default()
    };

    if unsafe { Module32FirstW(snapshot.raw(), &mut entry) }.is_err() {
        return false;
    }
    loop {
        let len = entry.szModule.iter().position(|&c| c == 0).unwrap_or(entry.szModule.len());
        if is_clr_module(&String::from_utf16_lossy(&entry.szModule[..len])) {
            return true;
        }
        if unsafe { Module32NextW(snapshot.raw(), &mut entry) }.is_err() {
            return false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compact_own_heaps() {
        assert!(compact_process_heaps() >= 1);
    }

    #[test]
    fn test_trim_missing_process_fails() {
        assert!(trim_process_working_set(u32::MAX - 3).is_err());
    }
}
