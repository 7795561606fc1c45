//! Stale temp file sweep
//!
//! Part of the volume cache phase. Each target directory is swept
//! independently and every per-file failure is swallowed: a locked or
//! permission-protected file is the common case in a shared temp directory,
//! not an error.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::debug;

use super::traits::VolumeCacheOptions;

/// Temp directories swept on this platform, deduplicated, existing only.
pub fn default_temp_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![std::env::temp_dir()];

    #[cfg(target_os = "windows")]
    {
        if let Some(local) = dirs::cache_dir() {
            dirs.push(local.join("Microsoft").join("Windows").join("INetCache"));
        }
        let root = std::env::var_os("SystemRoot").unwrap_or_else(|| "C:\\Windows".into());
        dirs.push(PathBuf::from(root).join("Temp"));
    }

    #[cfg(target_os = "linux")]
    {
        dirs.push(PathBuf::from("/var/tmp"));
    }

    dedup_existing(dirs)
}

fn dedup_existing(dirs: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut seen: Vec<PathBuf> = Vec::with_capacity(dirs.len());
    for dir in dirs {
        if dir.is_dir() && !seen.contains(&dir) {
            seen.push(dir);
        }
    }
    seen
}

/// Sweep the default temp directories plus `options.extra_dirs`.
/// Returns the number of files removed.
pub fn sweep(options: &VolumeCacheOptions) -> usize {
    let mut dirs = default_temp_dirs();
    dirs.extend(options.extra_dirs.iter().cloned());
    let dirs = dedup_existing(dirs);

    let max_age = Duration::from_secs(options.max_age_hours.saturating_mul(3600));
    let now = SystemTime::now();

    dirs.iter()
        .map(|dir| sweep_dir(dir, max_age, options.max_files_per_dir, now))
        .sum()
}

/// Remove files directly under `dir` that have not been touched for
/// `max_age`. Only the first `max_files` regular files are examined.
pub fn sweep_dir(dir: &Path, max_age: Duration, max_files: usize, now: SystemTime) -> usize {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!("Skipping {}: {}", dir.display(), e);
            return 0;
        }
    };

    let mut removed = 0usize;
    let files = entries
        .flatten()
        .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
        .take(max_files);

    for entry in files {
        let Ok(metadata) = entry.metadata() else { continue };
        let touched = metadata.accessed().or_else(|_| metadata.modified());
        let Ok(touched) = touched else { continue };

        let stale = now
            .duration_since(touched)
            .map(|age| age > max_age)
            .unwrap_or(false);
        if stale && fs::remove_file(entry.path()).is_ok() {
            removed += 1;
        }
    }

    debug!("Removed {} stale files from {}", removed, dir.display());
    removed
}
