//! Errors that abort a cleanup run

use std::fmt;

use super::config::ConfigError;
use crate::platform::FacilityError;

/// Conditions under which no (or no meaningful) cleanup result exists.
///
/// Individual phase failures never surface here; they are recorded in the
/// [`CleanupResult`](super::result::CleanupResult) instead.
#[derive(Debug, Clone, PartialEq)]
pub enum CleanerError {
    /// The caller is not elevated; nothing was touched
    PrivilegeRequired,
    /// The memory status query failed, so there is nothing to compare against
    MemoryQueryFailed(FacilityError),
    /// Configuration could not be loaded or is invalid
    Config(ConfigError),
}

impl fmt::Display for CleanerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CleanerError::PrivilegeRequired => {
                write!(f, "Administrator privileges are required to clean memory")
            }
            CleanerError::MemoryQueryFailed(e) => write!(f, "Could not read memory status: {}", e),
            CleanerError::Config(e) => write!(f, "Configuration error: {}", e),
        }
    }
}

impl std::error::Error for CleanerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CleanerError::MemoryQueryFailed(e) => Some(e),
            CleanerError::Config(e) => Some(e),
            CleanerError::PrivilegeRequired => None,
        }
    }
}

impl From<ConfigError> for CleanerError {
    fn from(err: ConfigError) -> Self {
        CleanerError::Config(err)
    }
}
