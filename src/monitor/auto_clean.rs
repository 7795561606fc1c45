//! Auto-clean watcher
//!
//! Samples memory usage on a fixed interval and runs a cleanup on a
//! blocking worker whenever usage reaches the configured threshold.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::core::config::{AutoCleanSettings, MAX_INTERVAL_MINUTES};
use crate::core::result::CleanupResult;
use crate::core::snapshot::MemorySnapshot;
use crate::core::{report, MemoryCleaner};
use crate::platform::MemoryFacility;

/// Process-wide "cleanup in progress" flag.
///
/// Cloning shares the flag. At most one [`BusyGuard`] exists at a time.
#[derive(Debug, Clone, Default)]
pub struct BusyFlag(Arc<AtomicBool>);

impl BusyFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the flag, or `None` if a run is already in progress.
    pub fn try_acquire(&self) -> Option<BusyGuard> {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| BusyGuard(Arc::clone(&self.0)))
    }

    pub fn is_busy(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Releases the [`BusyFlag`] on drop.
#[derive(Debug)]
pub struct BusyGuard(Arc<AtomicBool>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Whether usage has reached the trigger threshold.
pub fn should_clean(snapshot: &MemorySnapshot, threshold_percent: u32) -> bool {
    snapshot.ram_usage_percent >= threshold_percent as f64
}

pub struct AutoCleaner<F: MemoryFacility + 'static> {
    cleaner: Arc<MemoryCleaner<F>>,
    settings: AutoCleanSettings,
    busy: BusyFlag,
    elevated: bool,
}

impl<F: MemoryFacility + 'static> AutoCleaner<F> {
    pub fn new(cleaner: MemoryCleaner<F>, settings: AutoCleanSettings) -> Self {
        Self {
            cleaner: Arc::new(cleaner),
            settings,
            busy: BusyFlag::new(),
            elevated: crate::platform::is_elevated(),
        }
    }

    /// Override the detected elevation.
    pub fn with_elevation(mut self, elevated: bool) -> Self {
        self.elevated = elevated;
        self
    }

    /// Share an existing busy flag, e.g. with a manual "clean now" trigger.
    pub fn with_busy_flag(mut self, busy: BusyFlag) -> Self {
        self.busy = busy;
        self
    }

    pub fn busy_flag(&self) -> &BusyFlag {
        &self.busy
    }

    /// Check interval, clamped to 1 minute..1 day.
    pub fn interval(&self) -> Duration {
        let minutes = self.settings.interval_minutes.clamp(1, MAX_INTERVAL_MINUTES);
        Duration::from_secs(minutes.saturating_mul(60))
    }

    /// Check once; clean if usage is at or above the threshold.
    ///
    /// Returns the result of the cleanup that ran, if any.
    pub async fn check_once(&self) -> Option<CleanupResult> {
        let snapshot = match self.cleaner.snapshot() {
            Ok(s) => s,
            Err(e) => {
                warn!("Auto-clean check failed: {}", e);
                return None;
            }
        };

        if !should_clean(&snapshot, self.settings.threshold_percent) {
            debug!(
                "RAM at {:.1}%, below {}% threshold",
                snapshot.ram_usage_percent, self.settings.threshold_percent
            );
            return None;
        }

        let guard = match self.busy.try_acquire() {
            Some(g) => g,
            None => {
                debug!("Cleanup already in progress, skipping");
                return None;
            }
        };

        info!(
            "[{}] RAM at {:.1}% (threshold {}%), cleaning",
            chrono::Local::now().format("%H:%M:%S"),
            snapshot.ram_usage_percent,
            self.settings.threshold_percent
        );

        let cleaner = Arc::clone(&self.cleaner);
        let elevated = self.elevated;
        let outcome = tokio::task::spawn_blocking(move || {
            let _guard = guard;
            cleaner.cleanup(elevated)
        })
        .await;

        match outcome {
            Ok(Ok(result)) => {
                info!("{}", report::format_report(&result).replace('\n', "; "));
                Some(result)
            }
            Ok(Err(e)) => {
                warn!("Auto-clean failed: {}", e);
                None
            }
            Err(e) => {
                warn!("Auto-clean worker aborted: {}", e);
                None
            }
        }
    }

    /// Run until Ctrl-C.
    pub async fn run(&self) {
        info!(
            "Auto-clean every {} min at {}% usage",
            self.settings.interval_minutes, self.settings.threshold_percent
        );

        let mut ticker = tokio::time::interval(self.interval());
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.check_once().await;
                }
                _ = &mut ctrl_c => {
                    info!("Auto-clean stopped");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::CleanerConfig;
    use crate::core::phase::SettleDelays;
    use crate::platform::recording::{status, RecordingFacility};

    fn watcher(facility: RecordingFacility, threshold: u32) -> AutoCleaner<RecordingFacility> {
        let config = CleanerConfig {
            delays: SettleDelays::none(),
            ..Default::default()
        };
        let settings = AutoCleanSettings {
            enabled: true,
            threshold_percent: threshold,
            interval_minutes: 1,
        };
        AutoCleaner::new(MemoryCleaner::new(facility, config), settings).with_elevation(true)
    }

    #[test]
    fn test_busy_flag_is_exclusive() {
        let flag = BusyFlag::new();
        let guard = flag.try_acquire();
        assert!(guard.is_some());
        assert!(flag.is_busy());
        assert!(flag.clone().try_acquire().is_none());

        drop(guard);
        assert!(!flag.is_busy());
        assert!(flag.try_acquire().is_some());
    }

    #[test]
    fn test_should_clean_at_threshold() {
        let at = MemorySnapshot::from_raw(&status(100, 75), None);
        let below = MemorySnapshot::from_raw(&status(100, 74), None);
        assert!(should_clean(&at, 75));
        assert!(!should_clean(&below, 75));
    }

    #[test]
    fn test_interval_is_clamped() {
        let mut auto = watcher(RecordingFacility::new(), 75);
        auto.settings.interval_minutes = u64::MAX;
        assert_eq!(auto.interval(), Duration::from_secs(MAX_INTERVAL_MINUTES * 60));

        auto.settings.interval_minutes = 0;
        assert_eq!(auto.interval(), Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_below_threshold_does_not_clean() {
        let auto = watcher(RecordingFacility::new().with_statuses(vec![Ok(status(100, 50))]), 75);
        assert!(auto.check_once().await.is_none());
        assert_eq!(auto.cleaner.facility().mutation_calls(), 0);
    }

    #[tokio::test]
    async fn test_above_threshold_cleans() {
        let auto = watcher(RecordingFacility::new().with_statuses(vec![Ok(status(100, 90))]), 75);
        let result = auto.check_once().await.unwrap();
        assert!(result.success);
        assert_eq!(auto.cleaner.facility().mutation_calls(), 10);
        assert!(!auto.busy_flag().is_busy());
    }

    #[tokio::test]
    async fn test_busy_flag_blocks_second_run() {
        let auto = watcher(RecordingFacility::new().with_statuses(vec![Ok(status(100, 90))]), 75);
        let _held = auto.busy_flag().try_acquire().unwrap();
        assert!(auto.check_once().await.is_none());
        assert_eq!(auto.cleaner.facility().mutation_calls(), 0);
    }

    #[tokio::test]
    async fn test_not_elevated_is_refused() {
        let auto = watcher(RecordingFacility::new().with_statuses(vec![Ok(status(100, 90))]), 75)
            .with_elevation(false);
        assert!(auto.check_once().await.is_none());
        assert_eq!(auto.cleaner.facility().mutation_calls(), 0);
    }
}
