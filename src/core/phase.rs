//! Reclamation phases and their settling delays

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::platform::codes::{Capability, ReductMask};

/// Number of reclamation phases.
pub const PHASE_COUNT: usize = 10;

/// The reclamation phases, in the order they must run.
///
/// Flushing the modified list before purging the standby list is
/// intentional: pages written back land on the standby list and are then
/// discarded by the purge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    WorkingSets,
    SystemFileCache,
    ModifiedList,
    StandbyList,
    LowPriorityStandbyList,
    VolumeCache,
    RegistryCache,
    CombineMemoryLists,
    ProcessHeap,
    ManagedProcesses,
}

impl Phase {
    /// Every phase in execution order.
    pub const ALL: [Phase; PHASE_COUNT] = [
        Phase::WorkingSets,
        Phase::SystemFileCache,
        Phase::ModifiedList,
        Phase::StandbyList,
        Phase::LowPriorityStandbyList,
        Phase::VolumeCache,
        Phase::RegistryCache,
        Phase::CombineMemoryLists,
        Phase::ProcessHeap,
        Phase::ManagedProcesses,
    ];

    /// Position in [`Phase::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// Human-readable label, also used to tag phase errors.
    pub fn label(self) -> &'static str {
        match self {
            Phase::WorkingSets => "Working Sets",
            Phase::SystemFileCache => "System Cache",
            Phase::ModifiedList => "Modified List",
            Phase::StandbyList => "Standby List",
            Phase::LowPriorityStandbyList => "Priority-0 List",
            Phase::VolumeCache => "Volume Cache",
            Phase::RegistryCache => "Registry Cache",
            Phase::CombineMemoryLists => "Memory Lists",
            Phase::ProcessHeap => "Process Heap",
            Phase::ManagedProcesses => "Managed Processes",
        }
    }

    /// Mask bit gating this phase. The last two phases act only on
    /// user-mode processes and are not gated.
    pub fn capability(self) -> Option<Capability> {
        match self {
            Phase::WorkingSets => Some(Capability::WorkingSet),
            Phase::SystemFileCache => Some(Capability::SystemFileCache),
            Phase::ModifiedList => Some(Capability::ModifiedList),
            Phase::StandbyList => Some(Capability::StandbyList),
            Phase::LowPriorityStandbyList => Some(Capability::StandbyPriority0List),
            Phase::VolumeCache => Some(Capability::ModifiedFileCache),
            Phase::RegistryCache => Some(Capability::RegistryCache),
            Phase::CombineMemoryLists => Some(Capability::CombineMemoryLists),
            Phase::ProcessHeap | Phase::ManagedProcesses => None,
        }
    }

    pub fn is_enabled(self, mask: ReductMask) -> bool {
        self.capability().map_or(true, |c| mask.contains(c))
    }

    /// Phases that only exist on some OS versions. A platform without the
    /// interface has nothing to reconcile or combine, so `NotSupported`
    /// counts as done.
    pub fn is_version_gated(self) -> bool {
        matches!(self, Phase::RegistryCache | Phase::CombineMemoryLists)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Pause after each phase, in milliseconds.
///
/// Memory-list requests complete asynchronously in the kernel; the pause
/// lets one phase's effect land before the next phase acts on the lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettleDelays {
    pub working_sets_ms: u64,
    pub file_cache_ms: u64,
    pub modified_list_ms: u64,
    pub standby_list_ms: u64,
    pub low_priority_standby_ms: u64,
    pub volume_cache_ms: u64,
    pub registry_cache_ms: u64,
    pub combine_ms: u64,
    pub process_heap_ms: u64,
    pub managed_processes_ms: u64,
    /// Before the after-snapshot is taken
    pub final_ms: u64,
}

impl SettleDelays {
    pub const WORKING_SETS: Duration = Duration::from_millis(150);
    pub const FILE_CACHE: Duration = Duration::from_millis(200);
    pub const MODIFIED_LIST: Duration = Duration::from_millis(150);
    pub const STANDBY_LIST: Duration = Duration::from_millis(150);
    pub const LOW_PRIORITY_STANDBY: Duration = Duration::from_millis(150);
    pub const VOLUME_CACHE: Duration = Duration::from_millis(200);
    pub const REGISTRY_CACHE: Duration = Duration::from_millis(100);
    pub const COMBINE: Duration = Duration::from_millis(200);
    pub const PROCESS_HEAP: Duration = Duration::from_millis(100);
    pub const MANAGED_PROCESSES: Duration = Duration::from_millis(100);
    pub const FINAL: Duration = Duration::from_millis(500);

    /// All delays zero. Ordering is unaffected.
    pub fn none() -> Self {
        Self {
            working_sets_ms: 0,
            file_cache_ms: 0,
            modified_list_ms: 0,
            standby_list_ms: 0,
            low_priority_standby_ms: 0,
            volume_cache_ms: 0,
            registry_cache_ms: 0,
            combine_ms: 0,
            process_heap_ms: 0,
            managed_processes_ms: 0,
            final_ms: 0,
        }
    }

    pub fn after(&self, phase: Phase) -> Duration {
        let ms = match phase {
            Phase::WorkingSets => self.working_sets_ms,
            Phase::SystemFileCache => self.file_cache_ms,
            Phase::ModifiedList => self.modified_list_ms,
            Phase::StandbyList => self.standby_list_ms,
            Phase::LowPriorityStandbyList => self.low_priority_standby_ms,
            Phase::VolumeCache => self.volume_cache_ms,
            Phase::RegistryCache => self.registry_cache_ms,
            Phase::CombineMemoryLists => self.combine_ms,
            Phase::ProcessHeap => self.process_heap_ms,
            Phase::ManagedProcesses => self.managed_processes_ms,
        };
        Duration::from_millis(ms)
    }

    pub fn final_settle(&self) -> Duration {
        Duration::from_millis(self.final_ms)
    }

    /// Sum of every delay, i.e. the minimum wall time of a full run.
    pub fn total(&self) -> Duration {
        Phase::ALL.iter().map(|p| self.after(*p)).sum::<Duration>() + self.final_settle()
    }
}

impl Default for SettleDelays {
    fn default() -> Self {
        let ms = |d: Duration| d.as_millis() as u64;
        Self {
            working_sets_ms: ms(Self::WORKING_SETS),
            file_cache_ms: ms(Self::FILE_CACHE),
            modified_list_ms: ms(Self::MODIFIED_LIST),
            standby_list_ms: ms(Self::STANDBY_LIST),
            low_priority_standby_ms: ms(Self::LOW_PRIORITY_STANDBY),
            volume_cache_ms: ms(Self::VOLUME_CACHE),
            registry_cache_ms: ms(Self::REGISTRY_CACHE),
            combine_ms: ms(Self::COMBINE),
            process_heap_ms: ms(Self::PROCESS_HEAP),
            managed_processes_ms: ms(Self::MANAGED_PROCESSES),
            final_ms: ms(Self::FINAL),
        }
    }
}
