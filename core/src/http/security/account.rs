//! Account locking and login attempt tracking.
//!
//! Failed logins are counted per username inside a sliding window. Reaching
//! the limit locks the account for a fixed duration; a successful login
//! resets the counter. Locks always expire on their own.
//!
//! # Spring Security Equivalent
//! `AuthenticationFailureHandler` combined with `LockedException` from
//! `AccountStatusUserDetailsChecker`.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use beveiligd_security_core::http::security::account::{AccountLockManager, LockConfig};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let locks = AccountLockManager::new(
//!     LockConfig::new()
//!         .max_attempts(2)
//!         .lockout_duration(Duration::from_secs(60)),
//! );
//!
//! locks.record_failure("joe").await;
//! assert!(locks.record_failure("joe").await.is_locked());
//! assert!(locks.is_locked("joe").await);
//! # }
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

/// Upper bound for a lock whose configured duration does not fit an `Instant`.
pub const MAX_LOCKOUT: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Account lock status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockStatus {
    Unlocked,
    /// Locked until the given instant.
    Locked { until: Instant },
}

impl LockStatus {
    pub fn is_locked(&self) -> bool {
        match self {
            LockStatus::Unlocked => false,
            LockStatus::Locked { until } => Instant::now() < *until,
        }
    }

    /// Time left on the lock, `None` when unlocked or expired.
    pub fn remaining_lock_duration(&self) -> Option<Duration> {
        match self {
            LockStatus::Locked { until } => until.checked_duration_since(Instant::now()),
            LockStatus::Unlocked => None,
        }
    }
}

/// Account lock configuration.
#[derive(Debug, Clone)]
pub struct LockConfig {
    /// Failed attempts within the window that trigger a lock.
    pub max_attempts: u32,
    pub lockout_duration: Duration,
    /// Failures older than this are forgotten.
    pub attempt_window: Duration,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            lockout_duration: Duration::from_secs(15 * 60),
            attempt_window: Duration::from_secs(60 * 60),
        }
    }
}

impl LockConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    pub fn lockout_duration(mut self, duration: Duration) -> Self {
        self.lockout_duration = duration;
        self
    }

    pub fn attempt_window(mut self, window: Duration) -> Self {
        self.attempt_window = window;
        self
    }
}

#[derive(Debug, Default)]
struct AttemptRecord {
    failures: Vec<Instant>,
    locked_until: Option<Instant>,
}

impl AttemptRecord {
    fn status(&self) -> LockStatus {
        match self.locked_until {
            Some(until) if Instant::now() < until => LockStatus::Locked { until },
            _ => LockStatus::Unlocked,
        }
    }

    fn recent_failures(&self, window: Duration) -> u32 {
        self.failures.iter().filter(|t| t.elapsed() < window).count() as u32
    }

    /// No lock in force and no failure inside the window.
    fn is_stale(&self, window: Duration) -> bool {
        !self.status().is_locked() && self.recent_failures(window) == 0
    }
}

/// Tracks failed attempts and temporarily locks accounts.
///
/// Cloning shares the underlying records.
#[derive(Clone)]
pub struct AccountLockManager {
    records: Arc<RwLock<HashMap<String, AttemptRecord>>>,
    config: LockConfig,
}

impl AccountLockManager {
    pub fn new(config: LockConfig) -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
            config,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(LockConfig::default())
    }

    pub fn config(&self) -> &LockConfig {
        &self.config
    }

    pub async fn is_locked(&self, username: &str) -> bool {
        self.lock_status(username).await.is_locked()
    }

    pub async fn lock_status(&self, username: &str) -> LockStatus {
        let records = self.records.read().await;
        records
            .get(username)
            .map_or(LockStatus::Unlocked, AttemptRecord::status)
    }

    /// Failures recorded within the attempt window.
    pub async fn failed_attempts(&self, username: &str) -> u32 {
        let records = self.records.read().await;
        records
            .get(username)
            .map_or(0, |r| r.recent_failures(self.config.attempt_window))
    }

    /// Failures still allowed before the account locks.
    pub async fn remaining_attempts(&self, username: &str) -> u32 {
        let failed = self.failed_attempts(username).await;
        self.config.max_attempts.saturating_sub(failed)
    }

    /// Records a failed login and returns the resulting status.
    ///
    /// Stale records of other usernames are dropped on the way.
    pub async fn record_failure(&self, username: &str) -> LockStatus {
        let window = self.config.attempt_window;
        let mut records = self.records.write().await;
        records.retain(|_, record| !record.is_stale(window));

        let record = records.entry(username.to_string()).or_default();
        record.failures.retain(|t| t.elapsed() < window);
        record.failures.push(Instant::now());

        if record.failures.len() as u32 >= self.config.max_attempts {
            let now = Instant::now();
            record.locked_until = now
                .checked_add(self.config.lockout_duration)
                .or_else(|| now.checked_add(MAX_LOCKOUT));
            record.failures.clear();
        }

        record.status()
    }

    /// Drops records with neither a lock in force nor a recent failure.
    pub async fn cleanup(&self) {
        let window = self.config.attempt_window;
        self.records
            .write()
            .await
            .retain(|_, record| !record.is_stale(window));
    }

    /// Number of usernames currently tracked.
    pub async fn tracked_accounts(&self) -> usize {
        self.records.read().await.len()
    }

    /// Records a successful login, clearing failures and any lock.
    pub async fn record_success(&self, username: &str) {
        self.records.write().await.remove(username);
    }

    /// Lifts a lock before it expires.
    pub async fn unlock(&self, username: &str) {
        self.records.write().await.remove(username);
    }
}

impl Default for AccountLockManager {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager(max_attempts: u32, lockout: Duration) -> AccountLockManager {
        AccountLockManager::new(
            LockConfig::new()
                .max_attempts(max_attempts)
                .lockout_duration(lockout),
        )
    }

    #[test]
    fn test_default_config() {
        let config = LockConfig::default();
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.lockout_duration, Duration::from_secs(900));
        assert_eq!(config.attempt_window, Duration::from_secs(3600));
    }

    #[tokio::test]
    async fn test_locks_after_max_attempts() {
        let locks = manager(3, Duration::from_secs(60));

        assert_eq!(locks.record_failure("joe").await, LockStatus::Unlocked);
        assert_eq!(locks.record_failure("joe").await, LockStatus::Unlocked);
        assert_eq!(locks.remaining_attempts("joe").await, 1);

        let status = locks.record_failure("joe").await;
        assert!(status.is_locked());
        assert!(status.remaining_lock_duration().is_some());
        assert!(locks.is_locked("joe").await);
        assert!(!locks.is_locked("averell").await);
    }

    #[tokio::test]
    async fn test_success_resets_counter() {
        let locks = manager(3, Duration::from_secs(60));

        locks.record_failure("joe").await;
        locks.record_failure("joe").await;
        locks.record_success("joe").await;

        assert_eq!(locks.failed_attempts("joe").await, 0);
        assert_eq!(locks.record_failure("joe").await, LockStatus::Unlocked);
    }

    #[tokio::test]
    async fn test_lock_expires() {
        let locks = manager(1, Duration::from_millis(50));

        assert!(locks.record_failure("joe").await.is_locked());
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(!locks.is_locked("joe").await);
    }

    #[tokio::test]
    async fn test_unlock() {
        let locks = manager(1, Duration::from_secs(60));

        locks.record_failure("joe").await;
        assert!(locks.is_locked("joe").await);

        locks.unlock("joe").await;
        assert!(!locks.is_locked("joe").await);
        assert_eq!(locks.remaining_attempts("joe").await, 1);
    }

    #[tokio::test]
    async fn test_expired_records_are_dropped() {
        let locks = AccountLockManager::new(
            LockConfig::new()
                .max_attempts(3)
                .attempt_window(Duration::from_millis(1))
                .lockout_duration(Duration::from_millis(1)),
        );

        for i in 0..1000 {
            locks.record_failure(&format!("nobody-{}", i)).await;
        }

        tokio::time::sleep(Duration::from_millis(20)).await;
        locks.record_failure("nobody-else").await;
        assert_eq!(locks.tracked_accounts().await, 1);
    }

    #[tokio::test]
    async fn test_cleanup_keeps_locked_accounts() {
        let locks = AccountLockManager::new(
            LockConfig::new()
                .max_attempts(1)
                .attempt_window(Duration::from_millis(1))
                .lockout_duration(Duration::from_secs(60)),
        );

        locks.record_failure("joe").await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        locks.cleanup().await;

        assert_eq!(locks.tracked_accounts().await, 1);
        assert!(locks.is_locked("joe").await);
    }

    #[tokio::test]
    async fn test_huge_lockout_duration_does_not_overflow() {
        let locks = manager(1, Duration::MAX);

        let status = locks.record_failure("joe").await;
        assert!(status.is_locked());
        assert!(status.remaining_lock_duration().unwrap() <= MAX_LOCKOUT);
    }

    #[tokio::test]
    async fn test_window_forgets_old_failures() {
        let locks = AccountLockManager::new(
            LockConfig::new()
                .max_attempts(2)
                .attempt_window(Duration::from_millis(50)),
        );

        locks.record_failure("joe").await;
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(locks.failed_attempts("joe").await, 0);
        assert_eq!(locks.record_failure("joe").await, LockStatus::Unlocked);
    }
}
