//! Process enumeration

use sysinfo::{Pid, ProcessesToUpdate, System};

/// A running process as seen by the cleaner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessEntry {
    pub pid: u32,
    pub name: String,
    /// Resident memory in bytes
    pub memory: u64,
}

/// List all processes
pub fn list_processes() -> Vec<ProcessEntry> {
    let mut sys = System::new();
    sys.refresh_processes(ProcessesToUpdate::All, true);

    let mut entries: Vec<ProcessEntry> = sys
        .processes()
        .iter()
        .map(|(pid, p)| ProcessEntry {
            pid: pid.as_u32(),
            name: p.name().to_string_lossy().to_string(),
            memory: p.memory(),
        })
        .collect();
    entries.sort_by_key(|e| e.pid);
    entries
}

/// Resident memory of the calling process (bytes)
pub fn current_process_memory() -> Option<u64> {
    let pid = Pid::from_u32(std::process::id());
    let mut sys = System::new();
    sys.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);

    sys.process(pid).map(|p| p.memory())
}

/// Names that identify a managed-runtime host on their own
const MANAGED_HOST_NAMES: &[&str] = &["dotnet"];

/// Whether `name` alone marks a managed-runtime host
pub fn is_managed_host_name(name: &str) -> bool {
    let lower = name.to_lowercase();
    MANAGED_HOST_NAMES.iter().any(|n| lower.contains(n))
}

/// Module file names that mark a loaded CLR
const CLR_MODULE_MARKERS: &[&str] = &["mscoree.dll", "coreclr", "clr.dll", "libcoreclr.so"];

/// Whether a loaded module name indicates a managed runtime
pub fn is_clr_module(module: &str) -> bool {
    let lower = module.to_lowercase();
    CLR_MODULE_MARKERS.iter().any(|m| lower.contains(m))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_contains_self() {
        let me = std::process::id();
        assert!(list_processes().iter().any(|p| p.pid == me));
    }

    #[test]
    fn test_current_process_memory() {
        assert!(current_process_memory().unwrap_or(0) > 0);
    }

    #[test]
    fn test_managed_markers() {
        assert!(is_managed_host_name("dotnet.exe"));
        assert!(is_managed_host_name("DotNet"));
        assert!(!is_managed_host_name("notepad.exe"));

        assert!(is_clr_module("MSCOREE.DLL"));
        assert!(is_clr_module("coreclr.dll"));
        assert!(is_clr_module("/usr/share/dotnet/shared/Microsoft.NETCore.App/8.0.0/libcoreclr.so"));
        assert!(!is_clr_module("kernel32.dll"));
    }
}
