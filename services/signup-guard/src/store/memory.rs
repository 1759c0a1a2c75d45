// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! In-memory store. State is lost on restart.

use super::{BlockStore, RateLimitStore, SubscriberStore};
use crate::error::StoreError;
use crate::models::{BlockRecord, RateLimitRecord, SubmissionRecord};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

type AttemptKey = (String, String);

/// Thread-safe in-memory backend.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    attempts: Arc<RwLock<HashMap<AttemptKey, RateLimitRecord>>>,
    blocks: Arc<RwLock<HashMap<String, BlockRecord>>>,
    subscribers: Arc<RwLock<HashMap<String, SubmissionRecord>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RateLimitStore for MemoryStore {
    async fn get_attempts(
        &self,
        identity: &str,
        action: &str,
    ) -> Result<Option<RateLimitRecord>, StoreError> {
        let attempts = self.attempts.read().await;
        Ok(attempts
            .get(&(identity.to_string(), action.to_string()))
            .cloned())
    }

    async fn put_attempts(&self, record: &RateLimitRecord) -> Result<(), StoreError> {
        let mut attempts = self.attempts.write().await;
        attempts.insert(
            (record.identity.clone(), record.action.clone()),
            record.clone(),
        );
        Ok(())
    }

    async fn delete_attempts(
        &self,
        identity: &str,
        action: Option<&str>,
    ) -> Result<usize, StoreError> {
        let mut attempts = self.attempts.write().await;
        let before = attempts.len();
        attempts.retain(|(id, act), _| {
            !(id == identity && action.map_or(true, |a| a == act))
        });
        Ok(before - attempts.len())
    }

    async fn list_attempts(&self) -> Result<Vec<RateLimitRecord>, StoreError> {
        let attempts = self.attempts.read().await;
        Ok(attempts.values().cloned().collect())
    }
}

#[async_trait]
impl BlockStore for MemoryStore {
    async fn get_block(&self, identity: &str) -> Result<Option<BlockRecord>, StoreError> {
        let blocks = self.blocks.read().await;
        Ok(blocks.get(identity).cloned())
    }

    async fn insert_block_if_absent(&self, record: &BlockRecord) -> Result<bool, StoreError> {
        let mut blocks = self.blocks.write().await;
        if blocks.contains_key(&record.identity) {
            return Ok(false);
        }
        blocks.insert(record.identity.clone(), record.clone());
        Ok(true)
    }

    async fn delete_block(&self, identity: &str) -> Result<bool, StoreError> {
        let mut blocks = self.blocks.write().await;
        Ok(blocks.remove(identity).is_some())
    }

    async fn delete_expired_blocks(&self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        let mut blocks = self.blocks.write().await;
        let before = blocks.len();
        blocks.retain(|_, record| record.expires_at.map_or(true, |at| at > now));
        Ok(before - blocks.len())
    }

    async fn list_blocks(&self) -> Result<Vec<BlockRecord>, StoreError> {
        let blocks = self.blocks.read().await;
        Ok(blocks.values().cloned().collect())
    }
}

#[async_trait]
impl SubscriberStore for MemoryStore {
    async fn insert_subscriber(&self, record: &SubmissionRecord) -> Result<(), StoreError> {
        let mut subscribers = self.subscribers.write().await;
        if subscribers.contains_key(&record.email) {
            return Err(StoreError::Duplicate {
                key: record.email.clone(),
            });
        }
        subscribers.insert(record.email.clone(), record.clone());
        Ok(())
    }

    async fn get_subscriber(&self, email: &str) -> Result<Option<SubmissionRecord>, StoreError> {
        let subscribers = self.subscribers.read().await;
        Ok(subscribers.get(email).cloned())
    }

    async fn count_subscribers(&self) -> Result<usize, StoreError> {
        Ok(self.subscribers.read().await.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tokio_test::{assert_err, assert_ok};

    fn block(identity: &str, expires_at: Option<DateTime<Utc>>) -> BlockRecord {
        BlockRecord {
            identity: identity.to_string(),
            reason: "test".to_string(),
            blocked_at: Utc::now(),
            expires_at,
        }
    }

    #[tokio::test]
    async fn test_attempts_keyed_by_identity_and_action() {
        let store = MemoryStore::new();
        let now = Utc::now();
        store
            .put_attempts(&RateLimitRecord::start("1.2.3.4", "signup", now))
            .await
            .unwrap();
        store
            .put_attempts(&RateLimitRecord::start("1.2.3.4", "contact", now))
            .await
            .unwrap();

        assert!(store.get_attempts("1.2.3.4", "signup").await.unwrap().is_some());
        assert!(store.get_attempts("5.6.7.8", "signup").await.unwrap().is_none());

        assert_eq!(store.delete_attempts("1.2.3.4", Some("signup")).await.unwrap(), 1);
        assert_eq!(store.delete_attempts("1.2.3.4", None).await.unwrap(), 1);
        assert!(store.list_attempts().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_insert_block_if_absent_keeps_first() {
        let store = MemoryStore::new();
        let mut first = block("1.2.3.4", None);
        first.reason = "first".to_string();
        let mut second = block("1.2.3.4", None);
        second.reason = "second".to_string();

        assert!(store.insert_block_if_absent(&first).await.unwrap());
        assert!(!store.insert_block_if_absent(&second).await.unwrap());
        assert_eq!(
            store.get_block("1.2.3.4").await.unwrap().unwrap().reason,
            "first"
        );
    }

    #[tokio::test]
    async fn test_delete_expired_blocks() {
        let store = MemoryStore::new();
        let now = Utc::now();
        store.insert_block_if_absent(&block("permanent", None)).await.unwrap();
        store
            .insert_block_if_absent(&block("expired", Some(now - Duration::minutes(1))))
            .await
            .unwrap();
        store
            .insert_block_if_absent(&block("boundary", Some(now)))
            .await
            .unwrap();
        store
            .insert_block_if_absent(&block("future", Some(now + Duration::minutes(1))))
            .await
            .unwrap();

        assert_eq!(store.delete_expired_blocks(now).await.unwrap(), 2);
        let mut left: Vec<String> = store
            .list_blocks()
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.identity)
            .collect();
        left.sort();
        assert_eq!(left, vec!["future", "permanent"]);
    }

    #[tokio::test]
    async fn test_duplicate_subscriber() {
        let store = MemoryStore::new();
        let record = SubmissionRecord {
            email: "jane.doe@gmail.com".to_string(),
            ip_address: "1.2.3.4".to_string(),
            user_agent: None,
            source: Some("footer".to_string()),
            created_at: Utc::now(),
        };
        assert_ok!(store.insert_subscriber(&record).await);
        let err = assert_err!(store.insert_subscriber(&record).await);
        assert!(matches!(err, StoreError::Duplicate { .. }));
        assert_eq!(store.count_subscribers().await.unwrap(), 1);
    }
}
