// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Storage ports for rate-limit counters, block records and subscribers.
//!
//! The limiter and block registry own their record stores exclusively;
//! the signup handler owns the subscriber store. Backends implement all
//! three traits and are handed out as a [`Stores`] bundle.

use crate::config::{StoreBackend, StoreConfig};
use crate::error::{GuardError, StoreError};
use crate::models::{BlockRecord, RateLimitRecord, SubmissionRecord};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

pub mod memory;
#[cfg(feature = "surreal")]
pub mod surreal;

pub use memory::MemoryStore;

/// Attempt counters keyed by (identity, action).
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    async fn get_attempts(
        &self,
        identity: &str,
        action: &str,
    ) -> Result<Option<RateLimitRecord>, StoreError>;

    /// Insert or overwrite the record for its (identity, action).
    async fn put_attempts(&self, record: &RateLimitRecord) -> Result<(), StoreError>;

    /// Delete records for `identity`, restricted to `action` when given.
    /// Returns how many were removed.
    async fn delete_attempts(
        &self,
        identity: &str,
        action: Option<&str>,
    ) -> Result<usize, StoreError>;

    async fn list_attempts(&self) -> Result<Vec<RateLimitRecord>, StoreError>;
}

/// Block records keyed by identity.
#[async_trait]
pub trait BlockStore: Send + Sync {
    async fn get_block(&self, identity: &str) -> Result<Option<BlockRecord>, StoreError>;

    /// Insert unless a record for the identity exists. Returns whether the
    /// record was inserted.
    async fn insert_block_if_absent(&self, record: &BlockRecord) -> Result<bool, StoreError>;

    async fn delete_block(&self, identity: &str) -> Result<bool, StoreError>;

    /// Delete records whose expiry is set and not after `now`.
    async fn delete_expired_blocks(&self, now: DateTime<Utc>) -> Result<usize, StoreError>;

    async fn list_blocks(&self) -> Result<Vec<BlockRecord>, StoreError>;
}

/// Newsletter subscribers keyed by normalized email.
#[async_trait]
pub trait SubscriberStore: Send + Sync {
    /// Fails with [`StoreError::Duplicate`] when the email already exists.
    async fn insert_subscriber(&self, record: &SubmissionRecord) -> Result<(), StoreError>;

    async fn get_subscriber(&self, email: &str) -> Result<Option<SubmissionRecord>, StoreError>;

    async fn count_subscribers(&self) -> Result<usize, StoreError>;
}

/// One backend viewed through each port.
#[derive(Clone)]
pub struct Stores {
    pub rate_limits: Arc<dyn RateLimitStore>,
    pub blocks: Arc<dyn BlockStore>,
    pub subscribers: Arc<dyn SubscriberStore>,
}

impl Stores {
    /// Share a single backend across all three ports.
    pub fn from_backend<S>(backend: Arc<S>) -> Self
    where
        S: RateLimitStore + BlockStore + SubscriberStore + 'static,
    {
        Self {
            rate_limits: backend.clone(),
            blocks: backend.clone(),
            subscribers: backend,
        }
    }

    /// In-memory backend.
    pub fn memory() -> Self {
        Self::from_backend(Arc::new(MemoryStore::new()))
    }

    /// Open the backend named in `config`.
    pub async fn open(config: &StoreConfig) -> Result<Self, GuardError> {
        match config.backend {
            StoreBackend::Memory => Ok(Self::memory()),
            #[cfg(feature = "surreal")]
            StoreBackend::Surreal => {
                let db = surreal::SurrealStore::connect(&config.path).await?;
                Ok(Self::from_backend(Arc::new(db)))
            }
            #[cfg(not(feature = "surreal"))]
            StoreBackend::Surreal => Err(GuardError::Config(
                "surreal store backend requires the `surreal` feature".to_string(),
            )),
        }
    }
}
