//! Configuration for the sync driver.

use crate::error::SyncError;
use outpost_core::CollectionKind;
use rand::Rng;
use std::time::Duration;

/// Configuration for sync operations.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Collections synced, in order. Defaults to all of them.
    pub collections: Vec<CollectionKind>,
    /// Maximum number of records per push request.
    pub push_batch_size: usize,
    /// Whether a cycle drains the tombstone queue.
    pub drain_tombstones: bool,
    /// Retry configuration.
    pub retry: RetryConfig,
}

impl SyncConfig {
    /// Creates a configuration syncing every collection.
    pub fn new() -> Self {
        Self {
            collections: CollectionKind::ALL.to_vec(),
            push_batch_size: 100,
            drain_tombstones: true,
            retry: RetryConfig::default(),
        }
    }

    /// Restricts sync to the given collections.
    pub fn with_collections(mut self, collections: impl IntoIterator<Item = CollectionKind>) -> Self {
        self.collections = collections.into_iter().collect();
        self
    }

    /// Sets the push batch size. Zero is treated as one.
    pub fn with_push_batch_size(mut self, size: usize) -> Self {
        self.push_batch_size = size.max(1);
        self
    }

    /// Enables or disables the tombstone drain phase.
    pub fn with_tombstone_drain(mut self, enabled: bool) -> Self {
        self.drain_tombstones = enabled;
        self
    }

    /// Sets the retry configuration.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Push batch size actually used; never zero.
    pub(crate) fn batch_size(&self) -> usize {
        self.push_batch_size.max(1)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Up to this fraction of a delay is added as random jitter.
const JITTER_FRACTION: f64 = 0.25;

/// Retry policy of [`crate::SyncEngine::sync_with_retry`].
///
/// Only errors that [`SyncError::is_retryable`] reports as transient are
/// retried. Waits grow geometrically from `initial_delay`, are capped at
/// `max_delay` and may carry jitter on top of the cap.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Attempts per call, the first one included.
    pub max_attempts: u32,
    /// Wait before the first retry.
    pub initial_delay: Duration,
    /// Upper bound of a wait, before jitter.
    pub max_delay: Duration,
    /// Growth factor per retry. Values below 1 and NaN count as 1.
    pub backoff_multiplier: f64,
    /// Adds up to 25% random extra wait.
    pub add_jitter: bool,
}

impl RetryConfig {
    /// Up to `max_attempts` tries, waiting 500 ms, 1 s, 2 s ... capped at 30 s.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            add_jitter: true,
        }
    }

    /// A single attempt.
    pub fn no_retry() -> Self {
        Self::new(1)
            .with_initial_delay(Duration::ZERO)
            .with_jitter(false)
    }

    /// Sets the wait before the first retry.
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets the cap on a single wait.
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Sets the growth factor per retry.
    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Enables or disables jitter.
    pub fn with_jitter(mut self, enabled: bool) -> Self {
        self.add_jitter = enabled;
        self
    }

    /// Returns true if `error`, raised by the 0-indexed `attempt`, is
    /// worth another attempt.
    pub fn should_retry(&self, error: &SyncError, attempt: u32) -> bool {
        error.is_retryable() && attempt.saturating_add(1) < self.max_attempts
    }

    /// Wait before the 0-indexed `attempt`. The first attempt never waits.
    ///
    /// Never panics: a delay that does not fit a [`Duration`] becomes
    /// `max_delay`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        let exponent = i32::try_from(attempt - 1).unwrap_or(i32::MAX);
        let growth = self.backoff_multiplier.max(1.0).powi(exponent);
        let mut secs = (self.initial_delay.as_secs_f64() * growth).min(self.max_delay.as_secs_f64());
        if self.add_jitter && secs > 0.0 {
            secs += secs * rand::thread_rng().gen_range(0.0..JITTER_FRACTION);
        }

        Duration::try_from_secs_f64(secs).unwrap_or(self.max_delay)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::new(3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sync_config_builder() {
        let config = SyncConfig::new()
            .with_collections([CollectionKind::Entries, CollectionKind::Patrols])
            .with_push_batch_size(0)
            .with_tombstone_drain(false);

        assert_eq!(
            config.collections,
            vec![CollectionKind::Entries, CollectionKind::Patrols]
        );
        assert_eq!(config.push_batch_size, 1);
        assert!(!config.drain_tombstones);
    }

    #[test]
    fn default_syncs_everything() {
        let config = SyncConfig::default();
        assert_eq!(config.collections.len(), 8);
        assert!(config.drain_tombstones);
        assert_eq!(config.retry.max_attempts, 3);
    }

    #[test]
    fn retry_config_no_retry() {
        let config = RetryConfig::no_retry();
        assert_eq!(config.max_attempts, 1);
        assert_eq!(config.delay_for_attempt(3), Duration::ZERO);
    }

    #[test]
    fn retry_delay_calculation() {
        let config = RetryConfig::new(5)
            .with_initial_delay(Duration::from_millis(100))
            .with_backoff_multiplier(2.0);

        // First attempt has no delay
        assert_eq!(config.delay_for_attempt(0), Duration::ZERO);

        let delay1 = config.delay_for_attempt(1);
        assert!(delay1 >= Duration::from_millis(100));
        assert!(delay1 <= Duration::from_millis(125));

        let delay2 = config.delay_for_attempt(2);
        assert!(delay2 >= Duration::from_millis(200));
    }

    #[test]
    fn retry_delay_without_jitter_is_exact() {
        let config = RetryConfig::new(4)
            .with_initial_delay(Duration::from_millis(10))
            .with_jitter(false);
        assert_eq!(config.delay_for_attempt(3), Duration::from_millis(40));
    }

    #[test]
    fn retry_delay_respects_max() {
        let config = RetryConfig::new(10)
            .with_initial_delay(Duration::from_secs(1))
            .with_max_delay(Duration::from_secs(5))
            .with_backoff_multiplier(10.0);

        let delay = config.delay_for_attempt(5);
        assert!(delay <= Duration::from_millis(6250));
    }

    #[test]
    fn zero_batch_size_set_directly_is_clamped() {
        let config = SyncConfig {
            push_batch_size: 0,
            ..SyncConfig::default()
        };
        assert_eq!(config.batch_size(), 1);
    }

    #[test]
    fn retry_policy_follows_error_kind_and_budget() {
        let config = RetryConfig::new(3);
        assert!(config.should_retry(&SyncError::NotConnected, 0));
        assert!(config.should_retry(&SyncError::Timeout, 1));
        assert!(!config.should_retry(&SyncError::Timeout, 2));
        assert!(!config.should_retry(&SyncError::rejected("patrols", "denied"), 0));
        assert!(!RetryConfig::no_retry().should_retry(&SyncError::NotConnected, 0));
        assert!(!RetryConfig::new(u32::MAX).should_retry(&SyncError::Cancelled, 0));
    }

    #[test]
    fn shrinking_or_nan_multiplier_never_shrinks_the_delay() {
        for multiplier in [-2.0, 0.5, f64::NAN] {
            let config = RetryConfig::new(5)
                .with_initial_delay(Duration::from_millis(100))
                .with_backoff_multiplier(multiplier)
                .with_jitter(false);
            assert_eq!(config.delay_for_attempt(3), Duration::from_millis(100));
        }
    }

    #[test]
    fn huge_delays_are_capped_without_panicking() {
        let config = RetryConfig::new(u32::MAX)
            .with_initial_delay(Duration::MAX)
            .with_max_delay(Duration::MAX)
            .with_backoff_multiplier(f64::INFINITY);
        assert_eq!(config.delay_for_attempt(u32::MAX), Duration::MAX);

        let capped = config.with_max_delay(Duration::from_secs(1)).with_jitter(false);
        assert_eq!(capped.delay_for_attempt(40), Duration::from_secs(1));
    }
}
