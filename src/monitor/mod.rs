//! Threshold-driven background cleaning

pub mod auto_clean;

pub use auto_clean::{should_clean, AutoCleaner, BusyFlag, BusyGuard};
