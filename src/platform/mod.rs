//! Platform layer for the memory cleaner
//!
//! The cleaner drives the OS through one trait, [`MemoryFacility`]. Each
//! supported OS provides an implementation and [`create_facility`] picks the
//! one for the build target:
//!
//! ```text
//! src/platform/
//! +-- mod.rs           <- This file (module definitions, selection)
//! +-- traits.rs        <- MemoryFacility and its value types
//! +-- codes.rs         <- Kernel request codes and the capability mask
//! +-- process.rs       <- Process enumeration (sysinfo)
//! +-- temp_files.rs    <- Stale temp-file sweep used by the volume phase
//! +-- windows.rs       <- Windows implementation over src/windows/
//! +-- linux/           <- Linux implementation over /proc
//! +-- fallback.rs      <- Everything else
//! ```
//!
//! # Platform Support
//!
//! | Phase | Windows | Linux |
//! |-------|---------|-------|
//! | Working sets | NtSetSystemInformation + EmptyWorkingSet | clear_refs |
//! | System file cache | SetSystemFileCacheSize | drop_caches=1 |
//! | Modified list | NtSetSystemInformation | sync |
//! | Standby list | NtSetSystemInformation | drop_caches=2 |
//! | Priority-0 standby | NtSetSystemInformation | - |
//! | Volume cache | temp sweep + recycle bin | temp sweep + sync |
//! | Registry cache | NtSetSystemInformation | - |
//! | Memory lists | NtSetSystemInformation | compact_memory |
//! | Process heap | HeapCompact | malloc_trim |
//! | Managed processes | EmptyWorkingSet | clear_refs |

pub mod codes;
pub mod fallback;
pub mod process;
pub mod temp_files;
pub mod traits;

#[cfg(target_os = "linux")]
pub mod linux;

#[cfg(target_os = "windows")]
pub mod windows;

#[cfg(test)]
pub(crate) mod recording;

pub use traits::{
    FacilityError, FacilityResult, HeapOptions, MemoryFacility, PerformanceCounters,
    RawMemoryStatus, VolumeCacheOptions,
};

/// Facility type for the build target.
#[cfg(target_os = "windows")]
pub type PlatformFacility = windows::WindowsFacility;

/// Facility type for the build target.
#[cfg(target_os = "linux")]
pub type PlatformFacility = linux::LinuxFacility;

/// Facility type for the build target.
#[cfg(not(any(target_os = "windows", target_os = "linux")))]
pub type PlatformFacility = fallback::UnsupportedFacility;

/// Create the facility for the running OS.
pub fn create_facility() -> PlatformFacility {
    PlatformFacility::new()
}

/// Whether the current process runs with administrative rights.
pub fn is_elevated() -> bool {
    crate::security::privileges::is_elevated()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_facility_reports_platform() {
        let facility = create_facility();
        let name = facility.platform_name();
        #[cfg(target_os = "linux")]
        assert_eq!(name, "linux");
        #[cfg(target_os = "windows")]
        assert_eq!(name, "windows");
        assert!(!name.is_empty());
    }

    #[test]
    fn test_facility_reads_memory() {
        let facility = create_facility();
        let status = facility.memory_status().unwrap();
        assert!(status.total_physical > 0);
    }
}
