//! The OS memory facility seam
//!
//! Every native request the cleaner issues goes through [`MemoryFacility`].
//! The orchestrator only ever sees this trait, so the production bindings
//! (Windows, Linux) and the recording fake used in tests are interchangeable.
//!
//! ```text
//! +-------------------+
//! |   MemoryCleaner   |  <- fixed phase order, failure isolation
//! +-------------------+
//!          |
//!   MemoryFacility      <- this module
//!          |
//!    +-----+-----+------------+
//!    |           |            |
//! +--v--+     +--v--+     +---v----+
//! | Win |     | Lin |     | (fake) |
//! +-----+     +-----+     +--------+
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::path::PathBuf;

use super::codes::{
    STATUS_ACCESS_DENIED, STATUS_INVALID_INFO_CLASS, STATUS_NOT_IMPLEMENTED,
    STATUS_PRIVILEGE_NOT_HELD, STATUS_SUCCESS,
};

// ============================================================================
// Error Types
// ============================================================================

/// Error raised by a facility call.
#[derive(Debug, Clone, PartialEq)]
pub enum FacilityError {
    /// The caller lacks a right or privilege the OS demands
    PermissionDenied(String),
    /// The OS build or platform has no such interface
    NotSupported(String),
    /// A native call returned a failure code
    SystemError { code: i32, message: String },
    /// Filesystem or procfs I/O failed
    Io(String),
    /// The memory status query itself failed
    QueryFailed(String),
}

impl FacilityError {
    /// Map an `NTSTATUS` returned by `NtSetSystemInformation`.
    ///
    /// Returns `Ok(())` for success and informational codes.
    pub fn check_ntstatus(status: i32, call: &str) -> FacilityResult<()> {
        match status {
            s if s >= STATUS_SUCCESS => Ok(()),
            STATUS_PRIVILEGE_NOT_HELD | STATUS_ACCESS_DENIED => Err(FacilityError::PermissionDenied(
                format!("{} (NTSTATUS 0x{:08X})", call, status as u32),
            )),
            STATUS_INVALID_INFO_CLASS | STATUS_NOT_IMPLEMENTED => Err(FacilityError::NotSupported(
                format!("{} (NTSTATUS 0x{:08X})", call, status as u32),
            )),
            code => Err(FacilityError::SystemError {
                code,
                message: format!("{} failed with NTSTATUS 0x{:08X}", call, code as u32),
            }),
        }
    }

    pub fn is_not_supported(&self) -> bool {
        matches!(self, FacilityError::NotSupported(_))
    }
}

impl fmt::Display for FacilityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FacilityError::PermissionDenied(msg) => write!(f, "Permission denied: {}", msg),
            FacilityError::NotSupported(msg) => write!(f, "Not supported: {}", msg),
            FacilityError::SystemError { code, message } => {
                write!(f, "System error ({}): {}", code, message)
            }
            FacilityError::Io(msg) => write!(f, "I/O error: {}", msg),
            FacilityError::QueryFailed(msg) => write!(f, "Memory query failed: {}", msg),
        }
    }
}

impl std::error::Error for FacilityError {}

impl From<io::Error> for FacilityError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::PermissionDenied => FacilityError::PermissionDenied(err.to_string()),
            io::ErrorKind::Unsupported => FacilityError::NotSupported(err.to_string()),
            _ => FacilityError::Io(err.to_string()),
        }
    }
}

/// Result type alias for facility calls.
pub type FacilityResult<T> = Result<T, FacilityError>;

// ============================================================================
// Memory Types
// ============================================================================

/// Raw figures from the OS memory status query, all in bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawMemoryStatus {
    pub total_physical: u64,
    pub available_physical: u64,
    /// Commit limit (physical + page files)
    pub total_page_file: u64,
    pub available_page_file: u64,
    /// User-mode virtual address space of the calling process
    pub total_virtual: u64,
    pub available_virtual: u64,
}

/// Subset of the system performance counters used for the cache figure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PerformanceCounters {
    pub system_cache_pages: u64,
    pub page_size: u64,
}

impl PerformanceCounters {
    pub fn system_cache_bytes(&self) -> u64 {
        self.system_cache_pages.saturating_mul(self.page_size)
    }
}

// ============================================================================
// Phase Options
// ============================================================================

/// Parameters of the volume cache phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumeCacheOptions {
    /// Only files last touched longer ago than this are removed
    pub max_age_hours: u64,
    /// Upper bound of files examined per directory
    pub max_files_per_dir: usize,
    /// Swept in addition to the platform's temp directories
    pub extra_dirs: Vec<PathBuf>,
    /// Also ask the shell to empty the recycle bin (Windows only)
    pub empty_recycle_bin: bool,
}

impl Default for VolumeCacheOptions {
    fn default() -> Self {
        Self {
            max_age_hours: 24,
            max_files_per_dir: 50,
            extra_dirs: Vec::new(),
            empty_recycle_bin: true,
        }
    }
}

/// Parameters of the own-process heap compaction phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeapOptions {
    /// Compaction is skipped while the process's private usage is at or below this
    pub threshold_mb: u64,
    /// Number of compaction passes
    pub passes: u32,
}

impl HeapOptions {
    pub fn threshold_bytes(&self) -> u64 {
        self.threshold_mb.saturating_mul(1024 * 1024)
    }
}

impl Default for HeapOptions {
    fn default() -> Self {
        Self { threshold_mb: 10, passes: 3 }
    }
}

// ============================================================================
// Facility Trait
// ============================================================================

/// Capability interface over the OS memory subsystems.
///
/// One method per reclamation phase. Methods that loop over many independent
/// targets (processes, temp files) swallow per-target failures and return how
/// many targets succeeded; only a failure of the phase as a whole is an `Err`.
pub trait MemoryFacility: Send + Sync {
    /// Physical, page file and virtual memory totals.
    fn memory_status(&self) -> FacilityResult<RawMemoryStatus>;

    /// Performance counters for the system cache size. Best-effort.
    fn performance_counters(&self) -> FacilityResult<PerformanceCounters>;

    /// Empty the working set of every process the caller can open.
    /// Returns the number of processes acted on.
    ///
    /// On Linux this resets each process's referenced bits through
    /// `clear_refs`. That frees nothing by itself; it marks the pages cold
    /// so the next reclaim pass (phases 2 to 4) evicts them first.
    fn trim_working_sets(&self) -> FacilityResult<usize>;

    /// Shrink the system file cache to its minimum.
    fn shrink_file_cache(&self) -> FacilityResult<()>;

    /// Write back and release the modified page list.
    fn flush_modified_list(&self) -> FacilityResult<()>;

    /// Discard the standby page list.
    fn purge_standby_list(&self) -> FacilityResult<()>;

    /// Discard the priority-0 standby pages.
    fn purge_low_priority_standby_list(&self) -> FacilityResult<()>;

    /// Sweep stale temp files and clear deferred deletions.
    /// Returns the number of files removed.
    fn flush_volume_caches(&self, options: &VolumeCacheOptions) -> FacilityResult<usize>;

    /// Release the in-memory registry cache.
    ///
    /// `NotSupported` means the OS has no such interface; the cleaner
    /// counts the phase as done. Same for [`combine_memory_lists`].
    ///
    /// [`combine_memory_lists`]: MemoryFacility::combine_memory_lists
    fn reconcile_registry_cache(&self) -> FacilityResult<()>;

    /// Merge fragmented free-memory lists.
    fn combine_memory_lists(&self) -> FacilityResult<()>;

    /// Compact the calling process's heaps if they exceed the threshold.
    /// Returns whether compaction ran.
    fn compact_process_heap(&self, options: &HeapOptions) -> FacilityResult<bool>;

    /// Trim up to `limit` processes hosting a managed runtime.
    /// Returns the number of processes acted on, with the same Linux
    /// caveat as [`trim_working_sets`](MemoryFacility::trim_working_sets).
    fn trim_managed_processes(&self, limit: usize) -> FacilityResult<usize>;

    /// Short platform name for logs.
    fn platform_name(&self) -> &'static str;
}

impl<T: MemoryFacility + ?Sized> MemoryFacility for Box<T> {
    fn memory_status(&self) -> FacilityResult<RawMemoryStatus> {
        (**self).memory_status()
    }
    fn performance_counters(&self) -> FacilityResult<PerformanceCounters> {
        (**self).performance_counters()
    }
    fn trim_working_sets(&self) -> FacilityResult<usize> {
        (**self).trim_working_sets()
    }
    fn shrink_file_cache(&self) -> FacilityResult<()> {
        (**self).shrink_file_cache()
    }
    fn flush_modified_list(&self) -> FacilityResult<()> {
        (**self).flush_modified_list()
    }
    fn purge_standby_list(&self) -> FacilityResult<()> {
        (**self).purge_standby_list()
    }
    fn purge_low_priority_standby_list(&self) -> FacilityResult<()> {
        (**self).purge_low_priority_standby_list()
    }
    fn flush_volume_caches(&self, options: &VolumeCacheOptions) -> FacilityResult<usize> {
        (**self).flush_volume_caches(options)
    }
    fn reconcile_registry_cache(&self) -> FacilityResult<()> {
        (**self).reconcile_registry_cache()
    }
    fn combine_memory_lists(&self) -> FacilityResult<()> {
        (**self).combine_memory_lists()
    }
    fn compact_process_heap(&self, options: &HeapOptions) -> FacilityResult<bool> {
        (**self).compact_process_heap(options)
    }
    fn trim_managed_processes(&self, limit: usize) -> FacilityResult<usize> {
        (**self).trim_managed_processes(limit)
    }
    fn platform_name(&self) -> &'static str {
        (**self).platform_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ntstatus_mapping() {
        assert!(FacilityError::check_ntstatus(0, "call").is_ok());
        assert!(FacilityError::check_ntstatus(0x0000_0103, "pending").is_ok());

        let denied = FacilityError::check_ntstatus(STATUS_PRIVILEGE_NOT_HELD, "purge");
        assert!(matches!(denied, Err(FacilityError::PermissionDenied(_))));

        let unsupported = FacilityError::check_ntstatus(STATUS_INVALID_INFO_CLASS, "combine");
        assert!(unsupported.unwrap_err().is_not_supported());

        let other = FacilityError::check_ntstatus(0xC000_0004_u32 as i32, "flush");
        match other {
            Err(FacilityError::SystemError { message, .. }) => {
                assert!(message.contains("0xC0000004"));
            }
            e => panic!("unexpected {:?}", e),
        }
    }

    #[test]
    fn test_io_error_conversion() {
        let err = FacilityError::from(io::Error::new(io::ErrorKind::PermissionDenied, "nope"));
        assert!(matches!(err, FacilityError::PermissionDenied(_)));

        let err = FacilityError::from(io::Error::new(io::ErrorKind::Other, "boom"));
        assert_eq!(err.to_string(), "I/O error: boom");
    }

    #[test]
    fn test_performance_counters() {
        let counters = PerformanceCounters { system_cache_pages: 1000, page_size: 4096 };
        assert_eq!(counters.system_cache_bytes(), 4_096_000);
    }

    #[test]
    fn test_option_defaults() {
        let volume = VolumeCacheOptions::default();
        assert_eq!(volume.max_age_hours, 24);
        assert_eq!(volume.max_files_per_dir, 50);

        let heap = HeapOptions::default();
        assert_eq!(heap.threshold_bytes(), 10 * 1024 * 1024);
        assert_eq!(heap.passes, 3);
    }
}
