//! Human-readable rendering of cleanup results

use super::result::CleanupResult;
use super::snapshot::MemorySnapshot;

const KB: u64 = 1024;
const MB: u64 = KB * 1024;
const GB: u64 = MB * 1024;

/// Render a byte count in the largest unit it reaches, two decimals.
/// Plain byte counts are printed as integers.
pub fn format_bytes(bytes: u64) -> String {
    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

/// Three-line summary: freed amount, completed phases, error count.
pub fn format_report(result: &CleanupResult) -> String {
    let operations: Vec<&str> = result
        .completed_phases()
        .into_iter()
        .map(|p| p.label())
        .collect();

    format!(
        "Memory freed: {}\nOperations: {}\nErrors: {}",
        format_bytes(result.memory_freed),
        operations.join(", "),
        result.error_count()
    )
}

/// Multi-line status block for a snapshot.
pub fn format_snapshot(snapshot: &MemorySnapshot) -> String {
    format!(
        "RAM:     {} / {} ({:.1}%)\nVirtual: {} / {} ({:.1}%)\nCache:   {}",
        format_bytes(snapshot.ram_used),
        format_bytes(snapshot.ram_total),
        snapshot.ram_usage_percent,
        format_bytes(snapshot.virtual_used),
        format_bytes(snapshot.virtual_total),
        snapshot.virtual_usage_percent,
        format_bytes(snapshot.cache_used),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::phase::Phase;

    #[test]
    fn test_format_bytes_units() {
        assert_eq!(format_bytes(0), "0 bytes");
        assert_eq!(format_bytes(1023), "1023 bytes");
        assert_eq!(format_bytes(1536), "1.50 KB");
        assert_eq!(format_bytes(5 * MB / 2), "2.50 MB");
        assert_eq!(format_bytes(1_073_741_824), "1.00 GB");
        assert_eq!(format_bytes(500_000_000), "476.84 MB");
    }

    #[test]
    fn test_report_lists_completed_phases() {
        let mut result = CleanupResult::new(3 * GB);
        result.mark_completed(Phase::WorkingSets);
        result.mark_completed(Phase::StandbyList);
        result.record_error(Phase::SystemFileCache, "denied");
        result.finish(2 * GB);

        let report = format_report(&result);
        assert_eq!(
            report,
            "Memory freed: 1.00 GB\nOperations: Working Sets, Standby List\nErrors: 1"
        );
    }

    #[test]
    fn test_report_with_nothing_completed() {
        let result = CleanupResult::new(0);
        assert_eq!(format_report(&result), "Memory freed: 0 bytes\nOperations: \nErrors: 0");
    }

    #[test]
    fn test_snapshot_block() {
        let snapshot = MemorySnapshot {
            ram_total: 16 * GB,
            ram_used: 8 * GB,
            ram_usage_percent: 50.0,
            virtual_total: 32 * GB,
            virtual_used: 8 * GB,
            virtual_usage_percent: 25.0,
            cache_used: 2 * GB,
        };
        let text = format_snapshot(&snapshot);
        assert!(text.starts_with("RAM:     8.00 GB / 16.00 GB (50.0%)"));
        assert!(text.ends_with("Cache:   2.00 GB"));
    }
}
