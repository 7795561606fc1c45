//! Windows platform implementation
//!
//! Maps each facility call onto the raw wrappers in `src/windows/`.
//! Registry reconciliation and page combining only exist on newer builds;
//! on older ones the kernel rejects the information class with
//! `NotSupported`, which the cleaner counts as done.

#![cfg(target_os = "windows")]

use std::sync::Once;
use tracing::{debug, warn};

use super::codes::MemoryListCommand;
use super::process::{current_process_memory, is_managed_host_name, list_processes};
use super::temp_files;
use super::{
    FacilityResult, HeapOptions, MemoryFacility, PerformanceCounters, RawMemoryStatus,
    VolumeCacheOptions,
};
use crate::windows::{memory, ntapi, privileges, process, shell};

/// Memory facility backed by kernel32, psapi and ntdll
#[derive(Debug)]
pub struct WindowsFacility {
    privileges: Once,
}

impl WindowsFacility {
    pub fn new() -> Self {
        Self {
            privileges: Once::new(),
        }
    }

    /// Enable the token privileges the memory-list requests need, once,
    /// on the first mutating call. Status queries leave the token alone.
    /// A privilege that cannot be enabled is logged; the affected phases
    /// then fail on their own.
    fn ensure_privileges(&self) {
        self.privileges.call_once(|| {
            for (label, name) in [
                ("SeProfileSingleProcessPrivilege", privileges::PROFILE_SINGLE_PROCESS),
                ("SeIncreaseQuotaPrivilege", privileges::INCREASE_QUOTA),
            ] {
                if let Err(e) = privileges::enable_privilege(name) {
                    warn!("Could not enable {}: {}", label, e);
                }
            }
        });
    }
}

impl Default for WindowsFacility {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryFacility for WindowsFacility {
    fn memory_status(&self) -> FacilityResult<RawMemoryStatus> {
        memory::memory_status()
    }

    fn performance_counters(&self) -> FacilityResult<PerformanceCounters> {
        memory::performance_counters()
    }

    fn trim_working_sets(&self) -> FacilityResult<usize> {
        self.ensure_privileges();
        let system_wide = ntapi::memory_list_command(MemoryListCommand::EmptyWorkingSets);

        let trimmed = list_processes()
            .iter()
            .filter(|p| p.pid != 0 && process::trim_process_working_set(p.pid).is_ok())
            .count();
        debug!("Emptied working sets of {} processes", trimmed);

        system_wide.map(|_| trimmed)
    }

    fn shrink_file_cache(&self) -> FacilityResult<()> {
        self.ensure_privileges();
        memory::shrink_file_cache()
    }

    fn flush_modified_list(&self) -> FacilityResult<()> {
        self.ensure_privileges();
        ntapi::memory_list_command(MemoryListCommand::FlushModifiedList)
    }

    fn purge_standby_list(&self) -> FacilityResult<()> {
        self.ensure_privileges();
        ntapi::memory_list_command(MemoryListCommand::PurgeStandbyList)
    }

    fn purge_low_priority_standby_list(&self) -> FacilityResult<()> {
        self.ensure_privileges();
        ntapi::memory_list_command(MemoryListCommand::PurgeLowPriorityStandbyList)
    }

    fn flush_volume_caches(&self, options: &VolumeCacheOptions) -> FacilityResult<usize> {
        let removed = temp_files::sweep(options);
        if options.empty_recycle_bin && shell::empty_recycle_bin() {
            debug!("Recycle bin emptied");
        }
        Ok(removed)
    }

    fn reconcile_registry_cache(&self) -> FacilityResult<()> {
        self.ensure_privileges();
        ntapi::reconcile_registry()
    }

    fn combine_memory_lists(&self) -> FacilityResult<()> {
        self.ensure_privileges();
        let pages = ntapi::combine_physical_memory()?;
        debug!("Combined {} physical pages", pages);
        Ok(())
    }

    fn compact_process_heap(&self, options: &HeapOptions) -> FacilityResult<bool> {
        let resident = current_process_memory().unwrap_or(0);
        if resident <= options.threshold_bytes() {
            debug!("Heap compaction skipped: {} bytes resident", resident);
            return Ok(false);
        }
        for pass in 0..options.passes.max(1) {
            let heaps = process::compact_process_heaps();
            debug!("Heap compaction pass {}: {} heaps", pass + 1, heaps);
        }
        process::trim_current_working_set()?;
        Ok(true)
    }

    fn trim_managed_processes(&self, limit: usize) -> FacilityResult<usize> {
        self.ensure_privileges();
        let own = std::process::id();
        let trimmed = list_processes()
            .into_iter()
            .filter(|p| p.pid != own && p.pid != 0)
            .filter(|p| is_managed_host_name(&p.name) || process::has_clr_module(p.pid))
            .take(limit)
            .filter(|p| process::trim_process_working_set(p.pid).is_ok())
            .count();
        Ok(trimmed)
    }

    fn platform_name(&self) -> &'static str {
        "windows"
    }
}
