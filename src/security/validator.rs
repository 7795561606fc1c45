//! Input validation and sanitization

use std::path::Path;

/// Validate path is safe (no traversal attacks)
pub fn validate_path(path: &Path) -> bool {
    let path_str = path.to_string_lossy();

    // No path traversal
    if path_str.contains("..") {
        return false;
    }

    // No suspicious characters
    if path_str.contains('\0') || path_str.contains('|') || path_str.contains('<') || path_str.contains('>') {
        return false;
    }

    true
}

/// Validate configuration values
pub fn validate_config_value(key: &str, value: &str) -> bool {
    match key {
        "threshold_percent" => {
            value.parse::<u32>().map(|v| (1..=99).contains(&v)).unwrap_or(false)
        }
        "interval_minutes" => {
            value.parse::<u64>().map(|v| (1..=1440).contains(&v)).unwrap_or(false)
        }
        "max_files_per_dir" => {
            value.parse::<usize>().map(|v| v >= 1).unwrap_or(false)
        }
        "max_age_hours" => {
            value.parse::<u64>().map(|v| v >= 1).unwrap_or(false)
        }
        "passes" => {
            value.parse::<u32>().map(|v| (1..=10).contains(&v)).unwrap_or(false)
        }
        "managed_process_limit" => {
            value.parse::<usize>().map(|v| v <= 20).unwrap_or(false)
        }
        "mask" => {
            value.parse::<u32>().map(|v| v <= 0xFF).unwrap_or(false)
        }
        _ => true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_validation() {
        assert!(validate_path(Path::new("C:/safe/path")));
        assert!(!validate_path(Path::new("../../../etc/passwd")));
        assert!(!validate_path(Path::new("/tmp/a|b")));
    }

    #[test]
    fn test_threshold_bounds() {
        assert!(validate_config_value("threshold_percent", "75"));
        assert!(!validate_config_value("threshold_percent", "0"));
        assert!(!validate_config_value("threshold_percent", "100"));
        assert!(!validate_config_value("threshold_percent", "abc"));
    }

    #[test]
    fn test_interval_bounds() {
        assert!(validate_config_value("interval_minutes", "1"));
        assert!(validate_config_value("interval_minutes", "1440"));
        assert!(!validate_config_value("interval_minutes", "1441"));
    }

    #[test]
    fn test_managed_limit_and_mask() {
        assert!(validate_config_value("managed_process_limit", "20"));
        assert!(!validate_config_value("managed_process_limit", "21"));
        assert!(validate_config_value("mask", "255"));
        assert!(!validate_config_value("mask", "256"));
        assert!(validate_config_value("unknown_key", "anything"));
    }
}
