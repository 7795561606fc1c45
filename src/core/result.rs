//! Outcome of one cleanup run

use serde::{Serialize, Serializer};

use super::phase::{Phase, PHASE_COUNT};
use super::report;

/// Built up phase by phase during one run, then handed to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleanupResult {
    /// False only when something outside the per-phase isolation failed
    pub success: bool,
    /// Used physical memory before the first phase (bytes)
    pub memory_before_cleanup: u64,
    /// Used physical memory after the final settle (bytes)
    pub memory_after_cleanup: u64,
    /// `before - after`, floored at zero
    pub memory_freed: u64,
    /// One entry per failed phase, tagged `"<Label>: <message>"`
    pub errors: Vec<String>,
    /// Serialized as `{ "working_sets": true, ... }` in phase order
    #[serde(serialize_with = "serialize_completed")]
    completed: [bool; PHASE_COUNT],
    pub processes_trimmed: usize,
    pub temp_files_removed: usize,
    pub heap_compacted: bool,
    pub managed_processes_trimmed: usize,
    pub duration_ms: u64,
}

impl CleanupResult {
    pub(crate) fn new(memory_before_cleanup: u64) -> Self {
        Self {
            success: false,
            memory_before_cleanup,
            memory_after_cleanup: 0,
            memory_freed: 0,
            errors: Vec::new(),
            completed: [false; PHASE_COUNT],
            processes_trimmed: 0,
            temp_files_removed: 0,
            heap_compacted: false,
            managed_processes_trimmed: 0,
            duration_ms: 0,
        }
    }

    pub(crate) fn mark_completed(&mut self, phase: Phase) {
        self.completed[phase.index()] = true;
    }

    pub(crate) fn record_error(&mut self, phase: Phase, message: impl std::fmt::Display) {
        self.errors.push(format!("{}: {}", phase.label(), message));
    }

    /// Record the after-figure. A rise in usage during the run is
    /// reported as nothing freed.
    pub(crate) fn finish(&mut self, memory_after_cleanup: u64) {
        self.memory_after_cleanup = memory_after_cleanup;
        self.memory_freed = self.memory_before_cleanup.saturating_sub(memory_after_cleanup);
    }

    pub fn is_completed(&self, phase: Phase) -> bool {
        self.completed[phase.index()]
    }

    /// Completed phases in execution order.
    pub fn completed_phases(&self) -> Vec<Phase> {
        Phase::ALL.iter().copied().filter(|p| self.is_completed(*p)).collect()
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// `memory_freed` in the largest fitting unit.
    pub fn formatted_memory_freed(&self) -> String {
        report::format_bytes(self.memory_freed)
    }
}

fn serialize_completed<S: Serializer>(
    flags: &[bool; PHASE_COUNT],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_map(Phase::ALL.iter().map(|p| (p, flags[p.index()])))
}
