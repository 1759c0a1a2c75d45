// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! IP block registry.
//!
//! A block is active while its expiry is unset or in the future. Expired
//! records stay in the store until [`BlockRegistry::cleanup_expired`] runs.

use crate::clock::Clock;
use crate::error::Result;
use crate::models::BlockRecord;
use crate::store::BlockStore;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{debug, info};

/// Outcome of a block lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockStatus {
    Clear,
    Blocked {
        reason: String,
        expires_at: Option<DateTime<Utc>>,
    },
}

impl BlockStatus {
    pub fn is_blocked(&self) -> bool {
        matches!(self, BlockStatus::Blocked { .. })
    }
}

/// Registry of blocked identities.
#[derive(Clone)]
pub struct BlockRegistry {
    store: Arc<dyn BlockStore>,
    clock: Arc<dyn Clock>,
}

impl BlockRegistry {
    pub fn new(store: Arc<dyn BlockStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Look up whether `identity` is currently blocked.
    pub async fn is_blocked(&self, identity: &str) -> Result<BlockStatus> {
        let now = self.clock.now();
        match self.store.get_block(identity).await? {
            Some(record) if record.is_active(now) => {
                debug!(identity, reason = %record.reason, "Identity is blocked");
                Ok(BlockStatus::Blocked {
                    reason: record.reason,
                    expires_at: record.expires_at,
                })
            }
            _ => Ok(BlockStatus::Clear),
        }
    }

    /// Block `identity`. `None` duration blocks permanently.
    ///
    /// An active record for the identity is left untouched, so the first
    /// reason and expiry win. An expired record that has not been swept yet
    /// is replaced.
    pub async fn block(
        &self,
        identity: &str,
        reason: &str,
        duration: Option<Duration>,
    ) -> Result<()> {
        let now = self.clock.now();
        let record = BlockRecord {
            identity: identity.to_string(),
            reason: reason.to_string(),
            blocked_at: now,
            expires_at: duration.map(|d| now + d),
        };

        if let Some(existing) = self.store.get_block(identity).await? {
            if !existing.is_active(now) {
                self.store.delete_block(identity).await?;
            }
        }

        if self.store.insert_block_if_absent(&record).await? {
            info!(
                identity,
                reason,
                expires_at = ?record.expires_at,
                "Blocked identity"
            );
        } else {
            debug!(identity, "Identity already has a block record");
        }
        Ok(())
    }

    /// Remove any block for `identity`. Returns whether one existed.
    pub async fn unblock(&self, identity: &str) -> Result<bool> {
        let removed = self.store.delete_block(identity).await?;
        if removed {
            info!(identity, "Unblocked identity");
        }
        Ok(removed)
    }

    /// Delete expired records. Returns how many were removed.
    pub async fn cleanup_expired(&self) -> Result<usize> {
        let removed = self.store.delete_expired_blocks(self.clock.now()).await?;
        if removed > 0 {
            info!(removed, "Removed expired blocks");
        }
        Ok(removed)
    }

    /// Blocks in force right now, most recent first.
    pub async fn list_active(&self) -> Result<Vec<BlockRecord>> {
        let now = self.clock.now();
        let mut active: Vec<BlockRecord> = self
            .store
            .list_blocks()
            .await?
            .into_iter()
            .filter(|record| record.is_active(now))
            .collect();
        active.sort_by(|a, b| b.blocked_at.cmp(&a.blocked_at));
        Ok(active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::store::MemoryStore;

    fn registry() -> (BlockRegistry, ManualClock) {
        let clock = ManualClock::default();
        let registry = BlockRegistry::new(Arc::new(MemoryStore::new()), Arc::new(clock.clone()));
        (registry, clock)
    }

    #[tokio::test]
    async fn test_block_expires() {
        let (registry, clock) = registry();
        registry
            .block("1.2.3.4", "spam", Some(Duration::minutes(30)))
            .await
            .unwrap();
        assert!(registry.is_blocked("1.2.3.4").await.unwrap().is_blocked());

        clock.advance(Duration::minutes(30));
        assert_eq!(
            registry.is_blocked("1.2.3.4").await.unwrap(),
            BlockStatus::Clear
        );
    }

    #[tokio::test]
    async fn test_block_is_idempotent_first_reason_wins() {
        let (registry, _) = registry();
        registry.block("1.2.3.4", "first", None).await.unwrap();
        registry
            .block("1.2.3.4", "second", Some(Duration::minutes(1)))
            .await
            .unwrap();

        match registry.is_blocked("1.2.3.4").await.unwrap() {
            BlockStatus::Blocked { reason, expires_at } => {
                assert_eq!(reason, "first");
                assert_eq!(expires_at, None);
            }
            BlockStatus::Clear => panic!("Should be blocked"),
        }
    }

    #[tokio::test]
    async fn test_unblock() {
        let (registry, _) = registry();
        registry.block("1.2.3.4", "manual", None).await.unwrap();
        assert!(registry.unblock("1.2.3.4").await.unwrap());
        assert!(!registry.unblock("1.2.3.4").await.unwrap());
        assert!(!registry.is_blocked("1.2.3.4").await.unwrap().is_blocked());
    }

    #[tokio::test]
    async fn test_cleanup_leaves_permanent_and_future() {
        let (registry, clock) = registry();
        registry.block("permanent", "manual", None).await.unwrap();
        registry
            .block("short", "burst", Some(Duration::minutes(5)))
            .await
            .unwrap();
        registry
            .block("long", "burst", Some(Duration::hours(24)))
            .await
            .unwrap();

        clock.advance(Duration::minutes(5));
        assert_eq!(registry.cleanup_expired().await.unwrap(), 1);

        let active: Vec<String> = registry
            .list_active()
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.identity)
            .collect();
        assert_eq!(active.len(), 2);
        assert!(active.contains(&"permanent".to_string()));
        assert!(active.contains(&"long".to_string()));
    }

    #[tokio::test]
    async fn test_unswept_expired_record_is_replaced() {
        let (registry, clock) = registry();
        registry
            .block("1.2.3.4", "old", Some(Duration::minutes(1)))
            .await
            .unwrap();
        clock.advance(Duration::minutes(2));

        registry
            .block("1.2.3.4", "new", Some(Duration::minutes(10)))
            .await
            .unwrap();
        match registry.is_blocked("1.2.3.4").await.unwrap() {
            BlockStatus::Blocked { reason, .. } => assert_eq!(reason, "new"),
            BlockStatus::Clear => panic!("Should be blocked again"),
        }
    }
}
