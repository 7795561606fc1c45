//! Windows memory status and system cache controls

use std::mem::size_of;

use windows::Win32::System::Memory::SetSystemFileCacheSize;
use windows::Win32::System::ProcessStatus::{GetPerformanceInfo, PERFORMANCE_INFORMATION};
use windows::Win32::System::SystemInformation::{GlobalMemoryStatusEx, MEMORYSTATUSEX};

use crate::platform::codes::{FILE_CACHE_FLAGS, FILE_CACHE_UNBOUNDED};
use crate::platform::{FacilityError, FacilityResult, PerformanceCounters, RawMemoryStatus};

/// `GlobalMemoryStatusEx`
pub fn memory_status() -> FacilityResult<RawMemoryStatus> {
    let mut status = MEMORYSTATUSEX {
        dwLength: size_of::<MEMORYSTATUSEX>() as u32,
        ..Default::default()
    };

    unsafe { GlobalMemoryStatusEx(&mut status) }
        .map_err(|e| FacilityError::QueryFailed(e.message().to_string()))?;

    Ok(RawMemoryStatus {
        total_physical: status.ullTotalPhys,
        available_physical: status.ullAvailPhys,
        total_page_file: status.ullTotalPageFile,
        available_page_file: status.ullAvailPageFile,
        total_virtual: status.ullTotalVirtual,
        available_virtual: status.ullAvailVirtual,
    })
}

/// `GetPerformanceInfo`, for the system cache page count
pub fn performance_counters() -> FacilityResult<PerformanceCounters> {
    let cb = size_of::<PERFORMANCE_INFORMATION>() as u32;
    let mut info = PERFORMANCE_INFORMATION {
        cb,
        ..Default::default()
    };

    unsafe { GetPerformanceInfo(&mut info, cb) }?;

    Ok(PerformanceCounters {
        system_cache_pages: info.SystemCache as u64,
        page_size: info.PageSize as u64,
    })
}

/// Trim the system file cache to its minimum.
///
/// Requires `SeIncreaseQuotaPrivilege`.
pub fn shrink_file_cache() -> FacilityResult<()> {
    unsafe { SetSystemFileCacheSize(FILE_CACHE_UNBOUNDED, FILE_CACHE_UNBOUNDED, FILE_CACHE_FLAGS) }?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_status() {
        let status = memory_status().unwrap();
        assert!(status.total_physical > 0);
        assert!(status.available_physical <= status.total_physical);
    }

    #[test]
    fn test_performance_counters() {
        let counters = performance_counters().unwrap();
        assert!(counters.page_size > 0);
    }
}
