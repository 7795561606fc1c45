//! Point-in-time memory figures

use serde::Serialize;
use tracing::debug;

use super::error::CleanerError;
use crate::platform::{MemoryFacility, PerformanceCounters, RawMemoryStatus};

/// Share of used physical memory assumed to be file cache when the
/// performance counters are unavailable.
pub const CACHE_ESTIMATE_RATIO: f64 = 0.15;

/// Memory figures at one instant. All sizes in bytes, percentages 0-100.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MemorySnapshot {
    pub ram_total: u64,
    pub ram_used: u64,
    pub ram_usage_percent: f64,
    pub virtual_total: u64,
    pub virtual_used: u64,
    pub virtual_usage_percent: f64,
    pub cache_used: u64,
}

impl MemorySnapshot {
    /// Derive a snapshot from the raw status. Without performance
    /// counters the cache size is estimated from used physical memory.
    pub fn from_raw(status: &RawMemoryStatus, counters: Option<&PerformanceCounters>) -> Self {
        let ram_total = status.total_physical;
        let ram_used = status.total_physical.saturating_sub(status.available_physical);

        // No page file: fall back to the process's virtual address space
        let (virtual_total, virtual_used) = if status.total_page_file > 0 {
            (
                status.total_page_file,
                status.total_page_file.saturating_sub(status.available_page_file),
            )
        } else {
            (
                status.total_virtual,
                status.total_virtual.saturating_sub(status.available_virtual),
            )
        };

        let cache_used = match counters {
            Some(c) if c.page_size > 0 => c.system_cache_bytes(),
            _ => (ram_used as f64 * CACHE_ESTIMATE_RATIO) as u64,
        };

        Self {
            ram_total,
            ram_used,
            ram_usage_percent: percent(ram_used, ram_total),
            virtual_total,
            virtual_used,
            virtual_usage_percent: percent(virtual_used, virtual_total),
            cache_used,
        }
    }

    pub fn ram_available(&self) -> u64 {
        self.ram_total.saturating_sub(self.ram_used)
    }
}

fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    (part as f64 * 100.0 / whole as f64).clamp(0.0, 100.0)
}

/// Read a fresh snapshot through `facility`.
///
/// Fails only when the status query fails; the performance counter query
/// is best-effort.
pub fn read_snapshot<F: MemoryFacility + ?Sized>(facility: &F) -> Result<MemorySnapshot, CleanerError> {
    let status = facility
        .memory_status()
        .map_err(CleanerError::MemoryQueryFailed)?;

    let counters = match facility.performance_counters() {
        Ok(c) => Some(c),
        Err(e) => {
            debug!("Performance counters unavailable, estimating cache: {}", e);
            None
        }
    };

    Ok(MemorySnapshot::from_raw(&status, counters.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const GB: u64 = 1024 * 1024 * 1024;

    fn status(total: u64, avail: u64) -> RawMemoryStatus {
        RawMemoryStatus {
            total_physical: total,
            available_physical: avail,
            total_page_file: 24 * GB,
            available_page_file: 18 * GB,
            total_virtual: 128 * GB,
            available_virtual: 120 * GB,
        }
    }

    #[test]
    fn test_used_and_percent() {
        let snap = MemorySnapshot::from_raw(&status(16 * GB, 4 * GB), None);
        assert_eq!(snap.ram_total, 16 * GB);
        assert_eq!(snap.ram_used, 12 * GB);
        assert_eq!(snap.ram_available(), 4 * GB);
        assert!((snap.ram_usage_percent - 75.0).abs() < 1e-9);
        assert_eq!(snap.virtual_total, 24 * GB);
        assert_eq!(snap.virtual_used, 6 * GB);
        assert!((snap.virtual_usage_percent - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_total_has_zero_percent() {
        let snap = MemorySnapshot::from_raw(&RawMemoryStatus::default(), None);
        assert_eq!(snap.ram_usage_percent, 0.0);
        assert_eq!(snap.virtual_usage_percent, 0.0);
        assert_eq!(snap.cache_used, 0);
    }

    #[test]
    fn test_percent_stays_in_range() {
        // Available larger than total must not underflow
        let snap = MemorySnapshot::from_raw(&status(4 * GB, 8 * GB), None);
        assert_eq!(snap.ram_used, 0);
        assert!((0.0..=100.0).contains(&snap.ram_usage_percent));

        for avail in [0, 1, GB, 16 * GB] {
            let snap = MemorySnapshot::from_raw(&status(16 * GB, avail), None);
            assert!((0.0..=100.0).contains(&snap.ram_usage_percent));
        }
    }

    #[test]
    fn test_virtual_falls_back_without_page_file() {
        let raw = RawMemoryStatus {
            total_page_file: 0,
            available_page_file: 0,
            ..status(8 * GB, 2 * GB)
        };
        let snap = MemorySnapshot::from_raw(&raw, None);
        assert_eq!(snap.virtual_total, 128 * GB);
        assert_eq!(snap.virtual_used, 8 * GB);
    }

    #[test]
    fn test_cache_from_counters_or_estimate() {
        let counters = PerformanceCounters { system_cache_pages: 256, page_size: 4096 };
        let snap = MemorySnapshot::from_raw(&status(16 * GB, 6 * GB), Some(&counters));
        assert_eq!(snap.cache_used, 256 * 4096);

        let estimated = MemorySnapshot::from_raw(&status(16 * GB, 6 * GB), None);
        let expected = ((10 * GB) as f64 * CACHE_ESTIMATE_RATIO) as u64;
        assert_eq!(estimated.cache_used, expected);
        assert!(expected.abs_diff((10 * GB) * 15 / 100) <= 1);

        let zero_page = PerformanceCounters { system_cache_pages: 256, page_size: 0 };
        let fallback = MemorySnapshot::from_raw(&status(16 * GB, 6 * GB), Some(&zero_page));
        assert_eq!(fallback.cache_used, estimated.cache_used);
    }
}
