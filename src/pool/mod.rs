//! Credential pool and rotation
//!
//! Each credential is one authenticated rotation unit against the remote data
//! source, carrying its own rate-limit cooldown. The pool rotates round-robin:
//! when the active credential is rate limited it is blocked for one lockout
//! window and moved to the tail, and the next credential takes over. Rotation
//! is deliberately not sorted by cooldown; round-robin keeps the worst-case
//! wait bounded (one lockout window divided across the pool) and every
//! credential equally used.

use crate::config::CredentialEntry;
use crate::CrawlError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;

/// Lockout applied to a credential that hit the remote rate limit:
/// one 15-minute rate window plus a small safety margin.
pub const RATE_LIMIT_LOCKOUT: Duration = Duration::from_secs(15 * 60 + 5);

/// Authentication material for one credential
///
/// These are the values handed to the data source on every call. They are
/// loaded from configuration and never written to the checkpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialKeys {
    pub api_key: String,
    pub api_secret: String,
    pub access_token: String,
    pub access_secret: String,
}

/// Persistable cooldown state of one credential
///
/// This is what the checkpoint stores: the credential's identity and its
/// cooldown, never its live keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialState {
    pub id: String,
    pub remaining_cooldown: Duration,
    pub blocked_at: Option<DateTime<Utc>>,
}

/// One authenticated handle to the data source with its cooldown state
#[derive(Debug, Clone)]
pub struct Credential {
    id: String,
    keys: CredentialKeys,
    remaining_cooldown: Duration,
    blocked_at: Option<DateTime<Utc>>,
}

impl Credential {
    /// Creates an unblocked credential
    pub fn new(id: String, keys: CredentialKeys) -> Self {
        Self {
            id,
            keys,
            remaining_cooldown: Duration::ZERO,
            blocked_at: None,
        }
    }

    /// The credential's configured identity
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Authentication material for data source calls
    pub fn keys(&self) -> &CredentialKeys {
        &self.keys
    }

    /// Remaining cooldown as of the last `update` or `block`
    pub fn remaining_cooldown(&self) -> Duration {
        self.remaining_cooldown
    }

    /// Whether this credential is still inside a lockout window
    pub fn is_blocked(&self) -> bool {
        !self.remaining_cooldown.is_zero()
    }

    /// Blocks this credential for one full lockout window starting `now`
    pub fn block(&mut self, now: DateTime<Utc>) {
        self.remaining_cooldown = RATE_LIMIT_LOCKOUT;
        self.blocked_at = Some(now);
    }

    /// Decays the cooldown by the wall-clock time elapsed since the block
    ///
    /// The cooldown is recomputed from `blocked_at`, so repeated calls never
    /// double-subtract. It is monotonically non-increasing between calls and
    /// never negative; once fully decayed the block timestamp is cleared.
    pub fn update(&mut self, now: DateTime<Utc>) {
        let Some(blocked_at) = self.blocked_at else {
            return;
        };
        let elapsed = (now - blocked_at).to_std().unwrap_or(Duration::ZERO);
        self.remaining_cooldown = self
            .remaining_cooldown
            .min(RATE_LIMIT_LOCKOUT.saturating_sub(elapsed));
        if self.remaining_cooldown.is_zero() {
            self.blocked_at = None;
        }
    }

    /// Snapshot of the persistable state
    pub fn state(&self) -> CredentialState {
        CredentialState {
            id: self.id.clone(),
            remaining_cooldown: self.remaining_cooldown,
            blocked_at: self.blocked_at,
        }
    }

    fn apply_state(&mut self, state: &CredentialState) {
        self.remaining_cooldown = state.remaining_cooldown;
        self.blocked_at = state.blocked_at;
    }
}

/// Rotation-ordered pool of credentials
///
/// Owned exclusively by the crawl controller; reordered only through
/// [`CredentialPool::recycle`]. Rotation preserves membership.
#[derive(Debug, Clone)]
pub struct CredentialPool {
    credentials: VecDeque<Credential>,
}

impl CredentialPool {
    /// Builds a pool from configured credential entries
    ///
    /// Fails with [`CrawlError::EmptyPool`] when no credentials are
    /// configured.
    pub fn from_config(entries: &[CredentialEntry]) -> Result<Self, CrawlError> {
        let credentials: VecDeque<Credential> = entries
            .iter()
            .map(|entry| {
                Credential::new(
                    entry.id.clone(),
                    CredentialKeys {
                        api_key: entry.api_key.clone(),
                        api_secret: entry.api_secret.clone(),
                        access_token: entry.access_token.clone(),
                        access_secret: entry.access_secret.clone(),
                    },
                )
            })
            .collect();

        if credentials.is_empty() {
            return Err(CrawlError::EmptyPool);
        }

        Ok(Self { credentials })
    }

    /// The credential at rotation position 0
    pub fn active(&self) -> Result<&Credential, CrawlError> {
        self.credentials.front().ok_or(CrawlError::EmptyPool)
    }

    /// Blocks the active credential for one lockout window starting `now`
    pub fn block_active(&mut self, now: DateTime<Utc>) -> Result<(), CrawlError> {
        let active = self.credentials.front_mut().ok_or(CrawlError::EmptyPool)?;
        active.block(now);
        Ok(())
    }

    /// Rotates the pool and returns the new active credential's cooldown
    ///
    /// Every credential's cooldown is first decayed by elapsed time, then the
    /// current active credential moves to the tail. A returned cooldown above
    /// zero means every credential in the pool is blocked and the caller must
    /// wait at least that long before retrying.
    pub fn recycle(&mut self, now: DateTime<Utc>) -> Result<Duration, CrawlError> {
        for credential in &mut self.credentials {
            credential.update(now);
        }
        let head = self.credentials.pop_front().ok_or(CrawlError::EmptyPool)?;
        self.credentials.push_back(head);
        Ok(self.active()?.remaining_cooldown())
    }

    /// Number of credentials in the pool
    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    /// Whether the pool holds no credentials
    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }

    /// Snapshot of every credential's persistable state, in rotation order
    pub fn snapshot(&self) -> Vec<CredentialState> {
        self.credentials.iter().map(Credential::state).collect()
    }

    /// Restores cooldown state from a checkpoint snapshot
    ///
    /// Credentials are matched by id; the pool is reordered to the snapshot's
    /// rotation order. Configured credentials missing from the snapshot keep
    /// their fresh state and go to the tail; snapshot entries for credentials
    /// no longer configured are dropped.
    pub fn restore(&mut self, states: &[CredentialState]) {
        let mut remaining: Vec<Credential> = self.credentials.drain(..).collect();
        let mut restored = VecDeque::with_capacity(remaining.len());

        for state in states {
            if let Some(pos) = remaining.iter().position(|c| c.id == state.id) {
                let mut credential = remaining.remove(pos);
                credential.apply_state(state);
                restored.push_back(credential);
            }
        }
        for credential in remaining {
            restored.push_back(credential);
        }

        self.credentials = restored;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_entries(count: usize) -> Vec<CredentialEntry> {
        (0..count)
            .map(|i| CredentialEntry {
                id: format!("cred-{}", i),
                api_key: format!("key-{}", i),
                api_secret: format!("secret-{}", i),
                access_token: format!("token-{}", i),
                access_secret: format!("token-secret-{}", i),
            })
            .collect()
    }

    #[test]
    fn test_empty_pool_is_an_error() {
        let result = CredentialPool::from_config(&[]);
        assert!(matches!(result, Err(CrawlError::EmptyPool)));
    }

    #[test]
    fn test_active_is_first_configured() {
        let pool = CredentialPool::from_config(&test_entries(3)).unwrap();
        assert_eq!(pool.active().unwrap().id(), "cred-0");
        assert_eq!(pool.len(), 3);
    }

    #[test]
    fn test_block_sets_full_lockout() {
        let mut pool = CredentialPool::from_config(&test_entries(2)).unwrap();
        let now = Utc::now();

        pool.block_active(now).unwrap();

        let active = pool.active().unwrap();
        assert!(active.is_blocked());
        assert_eq!(active.remaining_cooldown(), RATE_LIMIT_LOCKOUT);
    }

    #[test]
    fn test_update_decays_by_elapsed_time() {
        let mut credential = Credential::new(
            "c".to_string(),
            CredentialKeys {
                api_key: "k".into(),
                api_secret: "s".into(),
                access_token: "t".into(),
                access_secret: "ts".into(),
            },
        );
        let now = Utc::now();
        credential.block(now);

        credential.update(now + chrono::Duration::seconds(300));
        assert_eq!(
            credential.remaining_cooldown(),
            RATE_LIMIT_LOCKOUT - Duration::from_secs(300)
        );

        // A second update at the same instant must not double-subtract.
        credential.update(now + chrono::Duration::seconds(300));
        assert_eq!(
            credential.remaining_cooldown(),
            RATE_LIMIT_LOCKOUT - Duration::from_secs(300)
        );
    }

    #[test]
    fn test_update_never_goes_negative() {
        let mut credential = Credential::new(
            "c".to_string(),
            CredentialKeys {
                api_key: "k".into(),
                api_secret: "s".into(),
                access_token: "t".into(),
                access_secret: "ts".into(),
            },
        );
        let now = Utc::now();
        credential.block(now);

        credential.update(now + chrono::Duration::hours(2));
        assert_eq!(credential.remaining_cooldown(), Duration::ZERO);
        assert!(!credential.is_blocked());
    }

    #[test]
    fn test_update_is_monotonically_non_increasing() {
        let mut credential = Credential::new(
            "c".to_string(),
            CredentialKeys {
                api_key: "k".into(),
                api_secret: "s".into(),
                access_token: "t".into(),
                access_secret: "ts".into(),
            },
        );
        let now = Utc::now();
        credential.block(now);

        let mut last = credential.remaining_cooldown();
        for seconds in [10, 60, 300, 900, 1200] {
            credential.update(now + chrono::Duration::seconds(seconds));
            assert!(credential.remaining_cooldown() <= last);
            last = credential.remaining_cooldown();
        }
    }

    #[test]
    fn test_recycle_rotates_head_to_tail() {
        let mut pool = CredentialPool::from_config(&test_entries(3)).unwrap();
        let now = Utc::now();

        let wait = pool.recycle(now).unwrap();
        assert_eq!(wait, Duration::ZERO);
        assert_eq!(pool.active().unwrap().id(), "cred-1");

        pool.recycle(now).unwrap();
        assert_eq!(pool.active().unwrap().id(), "cred-2");

        pool.recycle(now).unwrap();
        assert_eq!(pool.active().unwrap().id(), "cred-0");
    }

    #[test]
    fn test_recycle_preserves_membership() {
        let mut pool = CredentialPool::from_config(&test_entries(4)).unwrap();
        let now = Utc::now();

        for _ in 0..7 {
            pool.recycle(now).unwrap();
        }

        assert_eq!(pool.len(), 4);
        let mut ids: Vec<String> = pool.snapshot().into_iter().map(|s| s.id).collect();
        ids.sort();
        assert_eq!(ids, vec!["cred-0", "cred-1", "cred-2", "cred-3"]);
    }

    #[test]
    fn test_rotation_fairness_after_full_cycle() {
        // After k block+recycle rounds on a pool of size k, every credential
        // has been blocked exactly once and the active credential is the one
        // least recently blocked.
        let k = 3;
        let mut pool = CredentialPool::from_config(&test_entries(k)).unwrap();
        let mut now = Utc::now();

        for _ in 0..k {
            pool.block_active(now).unwrap();
            pool.recycle(now).unwrap();
            now += chrono::Duration::seconds(1);
        }

        let snapshot = pool.snapshot();
        assert!(snapshot.iter().all(|s| s.blocked_at.is_some()));
        assert_eq!(snapshot[0].id, "cred-0");

        let oldest_block = snapshot
            .iter()
            .map(|s| s.blocked_at.unwrap())
            .min()
            .unwrap();
        assert_eq!(snapshot[0].blocked_at.unwrap(), oldest_block);
    }

    #[test]
    fn test_recycle_reports_wait_when_all_blocked() {
        let mut pool = CredentialPool::from_config(&test_entries(2)).unwrap();
        let now = Utc::now();

        pool.block_active(now).unwrap();
        let wait = pool.recycle(now).unwrap();
        assert_eq!(wait, Duration::ZERO);

        pool.block_active(now).unwrap();
        let wait = pool.recycle(now).unwrap();
        assert!(wait > Duration::ZERO);
        assert!(wait <= RATE_LIMIT_LOCKOUT);
    }

    #[test]
    fn test_snapshot_restore_round_trip() {
        let mut pool = CredentialPool::from_config(&test_entries(3)).unwrap();
        let now = Utc::now();
        pool.block_active(now).unwrap();
        pool.recycle(now).unwrap();

        let snapshot = pool.snapshot();

        let mut fresh = CredentialPool::from_config(&test_entries(3)).unwrap();
        fresh.restore(&snapshot);

        assert_eq!(fresh.snapshot(), snapshot);
        assert_eq!(fresh.active().unwrap().id(), "cred-1");
    }

    #[test]
    fn test_restore_drops_unconfigured_and_keeps_new() {
        let mut pool = CredentialPool::from_config(&test_entries(2)).unwrap();
        let snapshot = vec![CredentialState {
            id: "cred-1".to_string(),
            remaining_cooldown: Duration::from_secs(42),
            blocked_at: Some(Utc::now()),
        }];

        pool.restore(&snapshot);

        assert_eq!(pool.len(), 2);
        assert_eq!(pool.active().unwrap().id(), "cred-1");
        assert_eq!(
            pool.active().unwrap().remaining_cooldown(),
            Duration::from_secs(42)
        );
    }
}
