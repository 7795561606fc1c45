//! Facility for platforms without memory-list controls
//!
//! Reads the memory status through `sysinfo` and sweeps temp files;
//! every kernel-level phase reports `NotSupported`.

use sysinfo::System;

use super::temp_files;
use super::{
    FacilityError, FacilityResult, HeapOptions, MemoryFacility, PerformanceCounters,
    RawMemoryStatus, VolumeCacheOptions,
};

#[derive(Debug, Default)]
pub struct UnsupportedFacility;

impl UnsupportedFacility {
    pub fn new() -> Self {
        Self
    }

    fn unsupported<T>(&self, what: &str) -> FacilityResult<T> {
        Err(FacilityError::NotSupported(format!(
            "{} is not available on {}",
            what,
            std::env::consts::OS
        )))
    }
}

impl MemoryFacility for UnsupportedFacility {
    fn memory_status(&self) -> FacilityResult<RawMemoryStatus> {
        let mut sys = System::new();
        sys.refresh_memory();
        if sys.total_memory() == 0 {
            return Err(FacilityError::QueryFailed("sysinfo reported no memory".to_string()));
        }
        Ok(RawMemoryStatus {
            total_physical: sys.total_memory(),
            available_physical: sys.available_memory(),
            total_page_file: sys.total_memory() + sys.total_swap(),
            available_page_file: sys.available_memory() + sys.free_swap(),
            total_virtual: 0,
            available_virtual: 0,
        })
    }

    fn performance_counters(&self) -> FacilityResult<PerformanceCounters> {
        self.unsupported("performance counters")
    }

    fn trim_working_sets(&self) -> FacilityResult<usize> {
        self.unsupported("working set trimming")
    }

    fn shrink_file_cache(&self) -> FacilityResult<()> {
        self.unsupported("file cache control")
    }

    fn flush_modified_list(&self) -> FacilityResult<()> {
        self.unsupported("modified list flush")
    }

    fn purge_standby_list(&self) -> FacilityResult<()> {
        self.unsupported("standby list purge")
    }

    fn purge_low_priority_standby_list(&self) -> FacilityResult<()> {
        self.unsupported("priority-0 standby purge")
    }

    fn flush_volume_caches(&self, options: &VolumeCacheOptions) -> FacilityResult<usize> {
        Ok(temp_files::sweep(options))
    }

    fn reconcile_registry_cache(&self) -> FacilityResult<()> {
        self.unsupported("registry reconciliation")
    }

    fn combine_memory_lists(&self) -> FacilityResult<()> {
        self.unsupported("memory list combining")
    }

    fn compact_process_heap(&self, _options: &HeapOptions) -> FacilityResult<bool> {
        self.unsupported("heap compaction")
    }

    fn trim_managed_processes(&self, _limit: usize) -> FacilityResult<usize> {
        self.unsupported("managed process trimming")
    }

    fn platform_name(&self) -> &'static str {
        std::env::consts::OS
    }
}
