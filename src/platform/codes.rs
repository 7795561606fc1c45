//! Kernel request codes for the memory-list interfaces
//!
//! These values are the public contract with `ntdll!NtSetSystemInformation`
//! and `kernel32!SetSystemFileCacheSize`. They are compiled on every platform
//! so the mask logic and its tests do not depend on the target OS.

use serde::{Deserialize, Serialize};

/// `SYSTEM_INFORMATION_CLASS` values used by the cleaner.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SystemInformationClass {
    /// Takes a [`MemoryListCommand`] as its payload.
    MemoryListInformation = 0x50,
    /// No payload. Windows 8.1 and later.
    RegistryReconciliationInformation = 0x51,
    /// Takes a `MEMORY_COMBINE_INFORMATION_EX`. Windows 10 and later.
    CombinePhysicalMemoryInformation = 0x52,
}

impl SystemInformationClass {
    pub fn code(self) -> i32 {
        self as i32
    }
}

/// `SYSTEM_MEMORY_LIST_COMMAND` values.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemoryListCommand {
    EmptyWorkingSets = 1,
    FlushModifiedList = 2,
    PurgeStandbyList = 3,
    PurgeLowPriorityStandbyList = 4,
}

impl MemoryListCommand {
    pub fn code(self) -> i32 {
        self as i32
    }
}

/// `(SIZE_T)-1` passed as both minimum and maximum to `SetSystemFileCacheSize`
/// asks the cache manager to trim the system file cache as far as it can.
pub const FILE_CACHE_UNBOUNDED: usize = usize::MAX;

/// Flags passed alongside [`FILE_CACHE_UNBOUNDED`].
pub const FILE_CACHE_FLAGS: u32 = 0;

/// One bit per capability class of the reduction mask.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    WorkingSet = 0x01,
    SystemFileCache = 0x02,
    ModifiedList = 0x04,
    StandbyList = 0x08,
    StandbyPriority0List = 0x10,
    ModifiedFileCache = 0x20,
    RegistryCache = 0x40,
    CombineMemoryLists = 0x80,
}

impl Capability {
    pub const ALL: [Capability; 8] = [
        Capability::WorkingSet,
        Capability::SystemFileCache,
        Capability::ModifiedList,
        Capability::StandbyList,
        Capability::StandbyPriority0List,
        Capability::ModifiedFileCache,
        Capability::RegistryCache,
        Capability::CombineMemoryLists,
    ];

    pub fn bit(self) -> u32 {
        self as u32
    }
}

/// Set of enabled capability classes.
///
/// Serialized as the raw integer so config files can carry the same mask
/// values other memory-list tools use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReductMask(u32);

impl ReductMask {
    /// All eight classes.
    pub const DEFAULT: ReductMask = ReductMask(0xFF);

    pub const fn empty() -> Self {
        ReductMask(0)
    }

    /// Unknown high bits are dropped.
    pub fn from_bits(bits: u32) -> Self {
        ReductMask(bits & Self::DEFAULT.0)
    }

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn contains(self, capability: Capability) -> bool {
        self.0 & capability.bit() == capability.bit()
    }

    pub fn with(self, capability: Capability) -> Self {
        ReductMask(self.0 | capability.bit())
    }

    pub fn without(self, capability: Capability) -> Self {
        ReductMask(self.0 & !capability.bit())
    }
}

impl Default for ReductMask {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl FromIterator<Capability> for ReductMask {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        iter.into_iter().fold(ReductMask::empty(), ReductMask::with)
    }
}

// NTSTATUS values the cleaner distinguishes.
pub const STATUS_SUCCESS: i32 = 0;
pub const STATUS_NOT_IMPLEMENTED: i32 = 0xC000_0002_u32 as i32;
pub const STATUS_INVALID_INFO_CLASS: i32 = 0xC000_0003_u32 as i32;
pub const STATUS_ACCESS_DENIED: i32 = 0xC000_0022_u32 as i32;
pub const STATUS_PRIVILEGE_NOT_HELD: i32 = 0xC000_0061_u32 as i32;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_information_class_codes() {
        assert_eq!(SystemInformationClass::MemoryListInformation.code(), 0x50);
        assert_eq!(SystemInformationClass::RegistryReconciliationInformation.code(), 0x51);
        assert_eq!(SystemInformationClass::CombinePhysicalMemoryInformation.code(), 0x52);
    }

    #[test]
    fn test_memory_list_commands() {
        assert_eq!(MemoryListCommand::EmptyWorkingSets.code(), 1);
        assert_eq!(MemoryListCommand::FlushModifiedList.code(), 2);
        assert_eq!(MemoryListCommand::PurgeStandbyList.code(), 3);
        assert_eq!(MemoryListCommand::PurgeLowPriorityStandbyList.code(), 4);
    }

    #[test]
    fn test_capability_bits_are_distinct() {
        let combined = Capability::ALL.iter().fold(0u32, |acc, c| {
            assert_eq!(acc & c.bit(), 0, "{:?} overlaps", c);
            acc | c.bit()
        });
        assert_eq!(combined, 0xFF);
        assert_eq!(Capability::StandbyPriority0List.bit(), 0x10);
        assert_eq!(Capability::CombineMemoryLists.bit(), 0x80);
    }

    #[test]
    fn test_mask_operations() {
        let mask = ReductMask::DEFAULT.without(Capability::RegistryCache);
        assert!(!mask.contains(Capability::RegistryCache));
        assert!(mask.contains(Capability::WorkingSet));
        assert_eq!(mask.bits(), 0xBF);

        let built: ReductMask = [Capability::ModifiedList, Capability::StandbyList]
            .into_iter()
            .collect();
        assert_eq!(built.bits(), 0x0C);

        assert_eq!(ReductMask::from_bits(0x1FF).bits(), 0xFF);
    }

    #[test]
    fn test_ntstatus_values() {
        assert_eq!(STATUS_PRIVILEGE_NOT_HELD as u32, 0xC0000061);
        assert_eq!(STATUS_INVALID_INFO_CLASS as u32, 0xC0000003);
        assert!(STATUS_ACCESS_DENIED < 0);
    }
}
