//! Linux memory controls via /proc
//!
//! - /proc/meminfo for the memory status
//! - /proc/sys/vm/drop_caches for page cache and slab
//! - /proc/sys/vm/compact_memory for free-list compaction
//! - /proc/[pid]/clear_refs to age a process's pages (requires CAP_SYS_ADMIN)

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use tracing::debug;

use crate::platform::{FacilityError, FacilityResult, PerformanceCounters, RawMemoryStatus};

const DROP_CACHES: &str = "/proc/sys/vm/drop_caches";
const COMPACT_MEMORY: &str = "/proc/sys/vm/compact_memory";

/// What `drop_caches` should release
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropLevel {
    /// Page cache
    PageCache = 1,
    /// Reclaimable slab (dentries and inodes)
    Slab = 2,
}

/// Read the memory status from /proc/meminfo
pub fn memory_status() -> FacilityResult<RawMemoryStatus> {
    use procfs::Current;

    let info = procfs::Meminfo::current().map_err(|e| FacilityError::QueryFailed(e.to_string()))?;
    let available = info
        .mem_available
        .unwrap_or(info.mem_free + info.cached + info.buffers);

    // Commit analogue: RAM plus swap
    Ok(RawMemoryStatus {
        total_physical: info.mem_total,
        available_physical: available,
        total_page_file: info.mem_total + info.swap_total,
        available_page_file: available + info.swap_free,
        total_virtual: 0,
        available_virtual: 0,
    })
}

/// Page cache size in pages
pub fn performance_counters() -> FacilityResult<PerformanceCounters> {
    use procfs::Current;

    let info = procfs::Meminfo::current().map_err(|e| FacilityError::Io(e.to_string()))?;
    let page_size = page_size();
    Ok(PerformanceCounters {
        system_cache_pages: info.cached / page_size,
        page_size,
    })
}

pub fn page_size() -> u64 {
    let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if size > 0 { size as u64 } else { 4096 }
}

/// Flush dirty pages to disk
pub fn sync() {
    unsafe {
        libc::sync();
    }
}

/// Drop caches by writing to /proc/sys/vm/drop_caches
pub fn drop_caches(level: DropLevel) -> FacilityResult<()> {
    sync();
    write_control(Path::new(DROP_CACHES), &(level as u8).to_string())?;
    debug!("Dropped caches (level {})", level as u8);
    Ok(())
}

/// Ask the kernel to compact free memory
pub fn compact_memory() -> FacilityResult<()> {
    let path = Path::new(COMPACT_MEMORY);
    if !path.exists() {
        return Err(FacilityError::NotSupported(
            "kernel built without CONFIG_COMPACTION".to_string(),
        ));
    }
    write_control(path, "1")
}

/// Clear the referenced bits of every page of `pid`, so reclaim treats
/// its whole working set as cold
pub fn clear_refs(pid: u32) -> FacilityResult<()> {
    write_control(&Path::new("/proc").join(pid.to_string()).join("clear_refs"), "1")
}

/// Whether any mapping of `pid` comes from a CLR runtime library
pub fn maps_clr(pid: u32) -> bool {
    let path = Path::new("/proc").join(pid.to_string()).join("maps");
    match fs::read_to_string(path) {
        Ok(maps) => maps
            .lines()
            .filter_map(|line| line.split_whitespace().nth(5))
            .any(crate::platform::process::is_clr_module),
        Err(_) => false,
    }
}

/// Return freed heap pages of the calling process to the kernel
pub fn trim_own_heap() -> FacilityResult<()> {
    #[cfg(target_env = "gnu")]
    {
        unsafe {
            libc::malloc_trim(0);
        }
        Ok(())
    }

    #[cfg(not(target_env = "gnu"))]
    {
        Err(FacilityError::NotSupported("malloc_trim requires glibc".to_string()))
    }
}

fn write_control(path: &Path, value: &str) -> FacilityResult<()> {
    let mut file = OpenOptions::new().write(true).open(path)?;
    file.write_all(value.as_bytes())?;
    Ok(())
}
