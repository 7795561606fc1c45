//! Privilege detection

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrivilegeLevel {
    /// Standard user - cleanup is refused
    Standard,
    /// Elevated admin or root - every phase may run
    Elevated,
}

impl PrivilegeLevel {
    pub fn detect() -> Self {
        if is_elevated() {
            PrivilegeLevel::Elevated
        } else {
            PrivilegeLevel::Standard
        }
    }

    pub fn can_clean(self) -> bool {
        self == PrivilegeLevel::Elevated
    }
}

impl fmt::Display for PrivilegeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrivilegeLevel::Standard => write!(f, "standard"),
            PrivilegeLevel::Elevated => write!(f, "elevated"),
        }
    }
}

/// Whether the process token is elevated (Windows) or runs as root (Linux)
#[cfg(target_os = "windows")]
pub fn is_elevated() -> bool {
    crate::windows::privileges::is_elevated()
}

/// Whether the process token is elevated (Windows) or runs as root (Linux)
#[cfg(target_os = "linux")]
pub fn is_elevated() -> bool {
    unsafe { libc::geteuid() == 0 }
}

/// Whether the process token is elevated (Windows) or runs as root (Linux)
#[cfg(not(any(target_os = "windows", target_os = "linux")))]
pub fn is_elevated() -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_matches_elevation() {
        let level = PrivilegeLevel::detect();
        assert_eq!(level.can_clean(), is_elevated());
    }

    #[test]
    fn test_display() {
        assert_eq!(PrivilegeLevel::Standard.to_string(), "standard");
        assert_eq!(PrivilegeLevel::Elevated.to_string(), "elevated");
    }
}
