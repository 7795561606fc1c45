//! Linux Platform Support
//!
//! Best-effort counterparts of the Windows memory-list requests, built on
//! the /proc controls in [`memory`]. Linux has no standby list priorities
//! and no registry, so those two phases report `NotSupported`; only the
//! priority-0 purge ends up as a phase error.
//!
//! Working set "trimming" writes `1` to `clear_refs`. The kernel only
//! clears the referenced bits, so the pages become first in line for the
//! cache drops that follow rather than being freed on the spot.
//!
//! ## Required Capabilities
//!
//! - `drop_caches`, `compact_memory`: root or CAP_SYS_ADMIN
//! - `clear_refs` of another user's process: root or CAP_SYS_ADMIN

#![cfg(target_os = "linux")]

pub mod memory;

use tracing::debug;

use super::process::{current_process_memory, is_managed_host_name, list_processes};
use super::temp_files;
use super::{
    FacilityError, FacilityResult, HeapOptions, MemoryFacility, PerformanceCounters,
    RawMemoryStatus, VolumeCacheOptions,
};
use memory::DropLevel;

/// Memory facility backed by /proc
#[derive(Debug, Default)]
pub struct LinuxFacility;

impl LinuxFacility {
    pub fn new() -> Self {
        Self
    }
}

impl MemoryFacility for LinuxFacility {
    fn memory_status(&self) -> FacilityResult<RawMemoryStatus> {
        memory::memory_status()
    }

    fn performance_counters(&self) -> FacilityResult<PerformanceCounters> {
        memory::performance_counters()
    }

    fn trim_working_sets(&self) -> FacilityResult<usize> {
        let aged = list_processes()
            .iter()
            .filter(|p| memory::clear_refs(p.pid).is_ok())
            .count();
        debug!("Cleared referenced bits of {} processes", aged);
        Ok(aged)
    }

    fn shrink_file_cache(&self) -> FacilityResult<()> {
        memory::drop_caches(DropLevel::PageCache)
    }

    fn flush_modified_list(&self) -> FacilityResult<()> {
        memory::sync();
        Ok(())
    }

    fn purge_standby_list(&self) -> FacilityResult<()> {
        memory::drop_caches(DropLevel::Slab)
    }

    fn purge_low_priority_standby_list(&self) -> FacilityResult<()> {
        Err(FacilityError::NotSupported(
            "Linux keeps no prioritized standby lists".to_string(),
        ))
    }

    fn flush_volume_caches(&self, options: &VolumeCacheOptions) -> FacilityResult<usize> {
        let removed = temp_files::sweep(options);
        memory::sync();
        Ok(removed)
    }

    fn reconcile_registry_cache(&self) -> FacilityResult<()> {
        Err(FacilityError::NotSupported("no registry on Linux".to_string()))
    }

    fn combine_memory_lists(&self) -> FacilityResult<()> {
        memory::compact_memory()
    }

    fn compact_process_heap(&self, options: &HeapOptions) -> FacilityResult<bool> {
        let resident = current_process_memory().unwrap_or(0);
        if resident <= options.threshold_bytes() {
            debug!("Heap compaction skipped: {} bytes resident", resident);
            return Ok(false);
        }
        for _ in 0..options.passes.max(1) {
            memory::trim_own_heap()?;
        }
        Ok(true)
    }

    fn trim_managed_processes(&self, limit: usize) -> FacilityResult<usize> {
        let own = std::process::id();
        let trimmed = list_processes()
            .into_iter()
            .filter(|p| p.pid != own)
            .filter(|p| is_managed_host_name(&p.name) || memory::maps_clr(p.pid))
            .take(limit)
            .filter(|p| memory::clear_refs(p.pid).is_ok())
            .count();
        Ok(trimmed)
    }

    fn platform_name(&self) -> &'static str {
        "linux"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_phases() {
        let facility = LinuxFacility::new();
        assert!(facility.purge_low_priority_standby_list().unwrap_err().is_not_supported());
        assert!(facility.reconcile_registry_cache().unwrap_err().is_not_supported());
    }

    #[test]
    fn test_missing_registry_counts_as_done() {
        use crate::core::config::CleanerConfig;
        use crate::core::phase::{Phase, SettleDelays};
        use crate::core::MemoryCleaner;
        use crate::platform::codes::{Capability, ReductMask};

        let config = CleanerConfig {
            mask: ReductMask::empty().with(Capability::RegistryCache),
            delays: SettleDelays::none(),
            heap: HeapOptions { threshold_mb: u64::MAX / (2 * 1024 * 1024), passes: 1 },
            managed_process_limit: 0,
            ..Default::default()
        };
        let result = MemoryCleaner::new(LinuxFacility::new(), config).cleanup(true).unwrap();

        assert!(result.is_completed(Phase::RegistryCache));
        assert!(result.errors.is_empty(), "{:?}", result.errors);
    }

    #[test]
    fn test_working_set_count_is_bounded_by_process_count() {
        let before = list_processes().len();
        let aged = LinuxFacility::new().trim_working_sets().unwrap();
        // Processes may start between the two listings
        assert!(aged <= before + 64);
    }

    #[test]
    fn test_heap_below_threshold_is_skipped() {
        let facility = LinuxFacility::new();
        let options = HeapOptions { threshold_mb: u64::MAX / (2 * 1024 * 1024), passes: 3 };
        assert_eq!(facility.compact_process_heap(&options).unwrap(), false);
    }

    #[test]
    fn test_status_through_facility() {
        let facility = LinuxFacility::new();
        let snapshot = crate::core::snapshot::read_snapshot(&facility).unwrap();
        assert!(snapshot.ram_total > 0);
        assert!((0.0..=100.0).contains(&snapshot.ram_usage_percent));
    }
}
