//! memcleaner
//!
//! One-shot physical memory reclamation for Windows, with a best-effort
//! Linux counterpart.
//!
//! ## Features
//!
//! - **Ten ordered phases**: working sets, system file cache, modified,
//!   standby and priority-0 standby lists, volume caches, registry cache,
//!   page combining, own-heap compaction, managed-runtime processes
//! - **Failure isolation**: a failing or panicking phase is recorded and
//!   the run continues
//! - **Capability mask**: skip phase classes through configuration
//! - **Auto-clean**: threshold-driven background cleaning
//!
//! ## Example
//!
//! ```no_run
//! use memcleaner::{create_facility, format_report, CleanerConfig, MemoryCleaner};
//!
//! let cleaner = MemoryCleaner::new(create_facility(), CleanerConfig::default());
//! let result = cleaner.cleanup(memcleaner::security::is_elevated())?;
//! println!("{}", format_report(&result));
//! # Ok::<(), memcleaner::CleanerError>(())
//! ```

pub mod core;
pub mod monitor;
pub mod platform;
pub mod security;
#[cfg(target_os = "windows")]
pub mod windows;

// Re-exports
pub use core::report::{format_bytes, format_report, format_snapshot};
pub use core::{
    CleanerConfig, CleanerError, CleanupResult, ConfigError, MemoryCleaner, MemorySnapshot, Phase,
};
pub use monitor::{AutoCleaner, BusyFlag};
pub use platform::codes::{Capability, ReductMask};
pub use platform::{create_facility, FacilityError, MemoryFacility, PlatformFacility};
