//! Deterministic facility for tests
//!
//! Records the order in which phases are invoked and fails, or panics in,
//! whichever phases it is told to.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use super::traits::{
    FacilityError, FacilityResult, HeapOptions, MemoryFacility, PerformanceCounters,
    RawMemoryStatus, VolumeCacheOptions,
};
use crate::core::phase::Phase;

pub struct RecordingFacility {
    calls: Mutex<Vec<Phase>>,
    statuses: Mutex<VecDeque<FacilityResult<RawMemoryStatus>>>,
    status_queries: AtomicUsize,
    failing: HashSet<Phase>,
    panicking: HashSet<Phase>,
    unsupported: HashSet<Phase>,
    counters_available: bool,
    heap_over_threshold: bool,
}

impl RecordingFacility {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            statuses: Mutex::new(VecDeque::new()),
            status_queries: AtomicUsize::new(0),
            failing: HashSet::new(),
            panicking: HashSet::new(),
            unsupported: HashSet::new(),
            counters_available: true,
            heap_over_threshold: true,
        }
    }

    /// Status answers in query order; the last one repeats.
    pub fn with_statuses(self, statuses: Vec<FacilityResult<RawMemoryStatus>>) -> Self {
        *self.statuses.lock().unwrap() = statuses.into();
        self
    }

    /// `ram_used` before, then after.
    pub fn with_usage(self, total: u64, before_used: u64, after_used: u64) -> Self {
        self.with_statuses(vec![Ok(status(total, before_used)), Ok(status(total, after_used))])
    }

    pub fn failing(mut self, phases: &[Phase]) -> Self {
        self.failing.extend(phases.iter().copied());
        self
    }

    pub fn failing_all(self) -> Self {
        self.failing(&Phase::ALL)
    }

    /// Phases whose interface the simulated OS lacks.
    pub fn unsupported(mut self, phases: &[Phase]) -> Self {
        self.unsupported.extend(phases.iter().copied());
        self
    }

    pub fn panicking(mut self, phases: &[Phase]) -> Self {
        self.panicking.extend(phases.iter().copied());
        self
    }

    pub fn without_counters(mut self) -> Self {
        self.counters_available = false;
        self
    }

    pub fn heap_below_threshold(mut self) -> Self {
        self.heap_over_threshold = false;
        self
    }

    pub fn calls(&self) -> Vec<Phase> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of phase (mutating) calls made.
    pub fn mutation_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn status_queries(&self) -> usize {
        self.status_queries.load(Ordering::SeqCst)
    }

    fn invoke(&self, phase: Phase) -> FacilityResult<()> {
        self.calls.lock().unwrap().push(phase);
        if self.panicking.contains(&phase) {
            panic!("simulated crash in {}", phase.label());
        }
        if self.unsupported.contains(&phase) {
            return Err(FacilityError::NotSupported(format!(
                "simulated absence of {}",
                phase.label()
            )));
        }
        if self.failing.contains(&phase) {
            return Err(FacilityError::PermissionDenied(format!(
                "simulated denial of {}",
                phase.label()
            )));
        }
        Ok(())
    }
}

impl Default for RecordingFacility {
    fn default() -> Self {
        Self::new()
    }
}

/// Status with `used` bytes of `total` in use.
pub fn status(total: u64, used: u64) -> RawMemoryStatus {
    RawMemoryStatus {
        total_physical: total,
        available_physical: total.saturating_sub(used),
        total_page_file: total * 2,
        available_page_file: total,
        total_virtual: total * 4,
        available_virtual: total * 3,
    }
}

impl MemoryFacility for RecordingFacility {
    fn memory_status(&self) -> FacilityResult<RawMemoryStatus> {
        self.status_queries.fetch_add(1, Ordering::SeqCst);
        let mut statuses = self.statuses.lock().unwrap();
        match statuses.len() {
            0 => Ok(status(16 << 30, 8 << 30)),
            1 => statuses[0].clone(),
            _ => statuses.pop_front().unwrap_or_else(|| Ok(RawMemoryStatus::default())),
        }
    }

    fn performance_counters(&self) -> FacilityResult<PerformanceCounters> {
        if self.counters_available {
            Ok(PerformanceCounters { system_cache_pages: 1024, page_size: 4096 })
        } else {
            Err(FacilityError::NotSupported("counters".into()))
        }
    }

    fn trim_working_sets(&self) -> FacilityResult<usize> {
        self.invoke(Phase::WorkingSets).map(|_| 42)
    }

    fn shrink_file_cache(&self) -> FacilityResult<()> {
        self.invoke(Phase::SystemFileCache)
    }

    fn flush_modified_list(&self) -> FacilityResult<()> {
        self.invoke(Phase::ModifiedList)
    }

    fn purge_standby_list(&self) -> FacilityResult<()> {
        self.invoke(Phase::StandbyList)
    }

    fn purge_low_priority_standby_list(&self) -> FacilityResult<()> {
        self.invoke(Phase::LowPriorityStandbyList)
    }

    fn flush_volume_caches(&self, options: &VolumeCacheOptions) -> FacilityResult<usize> {
        self.invoke(Phase::VolumeCache).map(|_| options.max_files_per_dir.min(7))
    }

    fn reconcile_registry_cache(&self) -> FacilityResult<()> {
        self.invoke(Phase::RegistryCache)
    }

    fn combine_memory_lists(&self) -> FacilityResult<()> {
        self.invoke(Phase::CombineMemoryLists)
    }

    fn compact_process_heap(&self, _options: &HeapOptions) -> FacilityResult<bool> {
        self.invoke(Phase::ProcessHeap).map(|_| self.heap_over_threshold)
    }

    fn trim_managed_processes(&self, limit: usize) -> FacilityResult<usize> {
        self.invoke(Phase::ManagedProcesses).map(|_| limit.min(3))
    }

    fn platform_name(&self) -> &'static str {
        "recording"
    }
}
