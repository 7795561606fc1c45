//! Cleanup orchestrator
//!
//! Runs the reclamation phases strictly in [`Phase::ALL`] order on the
//! calling thread. Each phase is isolated: an error or panic inside it is
//! recorded against that phase and the run moves on. Only the privilege
//! precondition and the before-snapshot can abort a run.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::config::{CleanerConfig, MAX_MANAGED_PROCESSES};
use super::error::CleanerError;
use super::phase::Phase;
use super::report;
use super::result::CleanupResult;
use super::snapshot::{read_snapshot, MemorySnapshot};
use crate::platform::{FacilityResult, MemoryFacility};

/// What a successful phase reported back.
#[derive(Debug, Clone, Copy, PartialEq)]
enum PhaseEffect {
    Done,
    ProcessesTrimmed(usize),
    FilesRemoved(usize),
    HeapCompacted(bool),
    ManagedTrimmed(usize),
}

/// Memory cleaner bound to one OS facility.
///
/// Holds no per-run state, so one instance can serve any number of
/// sequential runs. Callers must not start overlapping runs; see
/// [`BusyFlag`](crate::monitor::BusyFlag).
pub struct MemoryCleaner<F: MemoryFacility> {
    facility: F,
    config: CleanerConfig,
}

impl<F: MemoryFacility> MemoryCleaner<F> {
    pub fn new(facility: F, config: CleanerConfig) -> Self {
        Self { facility, config }
    }

    pub fn facility(&self) -> &F {
        &self.facility
    }

    pub fn config(&self) -> &CleanerConfig {
        &self.config
    }

    /// Current memory figures.
    pub fn snapshot(&self) -> Result<MemorySnapshot, CleanerError> {
        read_snapshot(&self.facility)
    }

    /// Run every enabled phase once and report the outcome.
    ///
    /// Blocks for the sum of the settling delays (about two seconds with
    /// the defaults); run it off any latency-sensitive thread.
    pub fn cleanup(&self, elevated: bool) -> Result<CleanupResult, CleanerError> {
        if !elevated {
            warn!("Cleanup refused: process is not elevated");
            return Err(CleanerError::PrivilegeRequired);
        }

        let start = Instant::now();
        let before = read_snapshot(&self.facility)?;
        let mut result = CleanupResult::new(before.ram_used);

        info!(
            "Starting cleanup on {} ({:.1}% RAM in use, mask 0x{:02X})",
            self.facility.platform_name(),
            before.ram_usage_percent,
            self.config.mask.bits()
        );

        for phase in Phase::ALL {
            if !phase.is_enabled(self.config.mask) {
                debug!("{}: disabled by mask", phase);
                continue;
            }

            match self.run_phase(phase) {
                Ok(effect) => {
                    debug!("{}: done ({:?})", phase, effect);
                    result.mark_completed(phase);
                    match effect {
                        PhaseEffect::ProcessesTrimmed(n) => result.processes_trimmed = n,
                        PhaseEffect::FilesRemoved(n) => result.temp_files_removed = n,
                        PhaseEffect::HeapCompacted(ran) => result.heap_compacted = ran,
                        PhaseEffect::ManagedTrimmed(n) => result.managed_processes_trimmed = n,
                        PhaseEffect::Done => {}
                    }
                }
                Err(message) => {
                    warn!("{}: {}", phase, message);
                    result.record_error(phase, message);
                }
            }

            settle(self.config.delays.after(phase));
        }

        settle(self.config.delays.final_settle());

        // A rise in usage during the run floors to zero freed; the anomaly
        // itself is not reported.
        match read_snapshot(&self.facility) {
            Ok(after) => {
                result.finish(after.ram_used);
                result.success = true;
            }
            Err(e) => {
                warn!("After-snapshot failed: {}", e);
                result.errors.push(format!("General: {}", e));
                result.success = false;
            }
        }

        result.duration_ms = start.elapsed().as_millis() as u64;
        info!(
            "Cleanup finished in {}ms: {} freed, {} of {} phases completed, {} errors",
            result.duration_ms,
            report::format_bytes(result.memory_freed),
            result.completed_phases().len(),
            Phase::ALL.len(),
            result.error_count()
        );

        Ok(result)
    }

    /// Run one phase, turning errors and panics into a message.
    fn run_phase(&self, phase: Phase) -> Result<PhaseEffect, String> {
        match panic::catch_unwind(AssertUnwindSafe(|| self.dispatch(phase))) {
            Ok(Ok(effect)) => Ok(effect),
            Ok(Err(e)) if e.is_not_supported() && phase.is_version_gated() => {
                debug!("{}: not available here ({})", phase, e);
                Ok(PhaseEffect::Done)
            }
            Ok(Err(e)) => Err(e.to_string()),
            Err(payload) => Err(format!("panicked: {}", panic_message(payload.as_ref()))),
        }
    }

    fn dispatch(&self, phase: Phase) -> FacilityResult<PhaseEffect> {
        let f = &self.facility;
        match phase {
            Phase::WorkingSets => f.trim_working_sets().map(PhaseEffect::ProcessesTrimmed),
            Phase::SystemFileCache => f.shrink_file_cache().map(|_| PhaseEffect::Done),
            Phase::ModifiedList => f.flush_modified_list().map(|_| PhaseEffect::Done),
            Phase::StandbyList => f.purge_standby_list().map(|_| PhaseEffect::Done),
            Phase::LowPriorityStandbyList => {
                f.purge_low_priority_standby_list().map(|_| PhaseEffect::Done)
            }
            Phase::VolumeCache => f
                .flush_volume_caches(&self.config.volume_cache)
                .map(PhaseEffect::FilesRemoved),
            Phase::RegistryCache => f.reconcile_registry_cache().map(|_| PhaseEffect::Done),
            Phase::CombineMemoryLists => f.combine_memory_lists().map(|_| PhaseEffect::Done),
            Phase::ProcessHeap => f
                .compact_process_heap(&self.config.heap)
                .map(PhaseEffect::HeapCompacted),
            Phase::ManagedProcesses => {
                let limit = self.config.managed_process_limit.min(MAX_MANAGED_PROCESSES);
                f.trim_managed_processes(limit).map(PhaseEffect::ManagedTrimmed)
            }
        }
    }
}

fn settle(delay: Duration) {
    if !delay.is_zero() {
        std::thread::sleep(delay);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
