//! Core cleanup logic

pub mod cleaner;
pub mod config;
pub mod error;
pub mod phase;
pub mod report;
pub mod result;
pub mod snapshot;

pub use cleaner::MemoryCleaner;
pub use config::{AutoCleanSettings, CleanerConfig, ConfigError};
pub use error::CleanerError;
pub use phase::{Phase, SettleDelays};
pub use result::CleanupResult;
pub use snapshot::MemorySnapshot;
