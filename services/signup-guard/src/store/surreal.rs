// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! SurrealDB store. `path == "memory"` uses the in-process engine; any
//! other path needs the `rocksdb` feature.

use super::{BlockStore, RateLimitStore, SubscriberStore};
use crate::error::StoreError;
use crate::models::{BlockRecord, RateLimitRecord, SubmissionRecord};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::{
    engine::local::{Db, Mem},
    Surreal,
};
use tracing::info;

const RATE_LIMITS: &str = "rate_limits";
const BLOCKED_IPS: &str = "blocked_ips";
const SUBSCRIBERS: &str = "newsletter_subscribers";

/// SurrealDB connection wrapper
#[derive(Clone)]
pub struct SurrealStore {
    db: Surreal<Db>,
}

impl SurrealStore {
    /// Connect to SurrealDB
    pub async fn connect(path: &str) -> Result<Self, StoreError> {
        let db = if path == "memory" {
            Surreal::new::<Mem>(()).await?
        } else {
            Self::open_on_disk(path).await?
        };

        db.use_ns("storefront").use_db("signup_guard").await?;
        Self::init_schema(&db).await?;
        info!(path, "Connected to SurrealDB");

        Ok(Self { db })
    }

    #[cfg(feature = "rocksdb")]
    async fn open_on_disk(path: &str) -> Result<Surreal<Db>, StoreError> {
        Ok(Surreal::new::<surrealdb::engine::local::RocksDb>(path).await?)
    }

    #[cfg(not(feature = "rocksdb"))]
    async fn open_on_disk(path: &str) -> Result<Surreal<Db>, StoreError> {
        Err(StoreError::Backend(format!(
            "on-disk store at {path} requires the `rocksdb` feature"
        )))
    }

    /// DEFINE statements overwrite existing definitions, so this is safe to
    /// run against an existing database.
    async fn init_schema(db: &Surreal<Db>) -> Result<(), StoreError> {
        db.query(
            r#"
            DEFINE TABLE rate_limits SCHEMALESS;
            DEFINE INDEX identity_action_idx ON rate_limits COLUMNS identity, action UNIQUE;

            DEFINE TABLE blocked_ips SCHEMALESS;
            DEFINE INDEX identity_idx ON blocked_ips COLUMNS identity UNIQUE;

            DEFINE TABLE newsletter_subscribers SCHEMALESS;
            DEFINE INDEX email_idx ON newsletter_subscribers COLUMNS email UNIQUE;
        "#,
        )
        .await?
        .check()?;
        Ok(())
    }
}

fn to_millis(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

fn from_millis(ms: i64) -> Result<DateTime<Utc>, StoreError> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .ok_or_else(|| StoreError::Backend(format!("timestamp out of range: {ms}")))
}

fn attempt_id(identity: &str, action: &str) -> String {
    format!("{identity}|{action}")
}

#[derive(Debug, Serialize, Deserialize)]
struct AttemptRow {
    identity: String,
    action: String,
    attempt_count: u32,
    first_attempt: i64,
    last_attempt: i64,
}

impl From<&RateLimitRecord> for AttemptRow {
    fn from(r: &RateLimitRecord) -> Self {
        Self {
            identity: r.identity.clone(),
            action: r.action.clone(),
            attempt_count: r.attempt_count,
            first_attempt: to_millis(r.first_attempt),
            last_attempt: to_millis(r.last_attempt),
        }
    }
}

impl TryFrom<AttemptRow> for RateLimitRecord {
    type Error = StoreError;

    fn try_from(row: AttemptRow) -> Result<Self, Self::Error> {
        Ok(Self {
            identity: row.identity,
            action: row.action,
            attempt_count: row.attempt_count,
            first_attempt: from_millis(row.first_attempt)?,
            last_attempt: from_millis(row.last_attempt)?,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct BlockRow {
    identity: String,
    reason: String,
    blocked_at: i64,
    expires_at: Option<i64>,
}

impl From<&BlockRecord> for BlockRow {
    fn from(r: &BlockRecord) -> Self {
        Self {
            identity: r.identity.clone(),
            reason: r.reason.clone(),
            blocked_at: to_millis(r.blocked_at),
            expires_at: r.expires_at.map(to_millis),
        }
    }
}

impl TryFrom<BlockRow> for BlockRecord {
    type Error = StoreError;

    fn try_from(row: BlockRow) -> Result<Self, Self::Error> {
        Ok(Self {
            identity: row.identity,
            reason: row.reason,
            blocked_at: from_millis(row.blocked_at)?,
            expires_at: row.expires_at.map(from_millis).transpose()?,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct SubscriberRow {
    email: String,
    ip_address: String,
    user_agent: Option<String>,
    source: Option<String>,
    created_at: i64,
}

impl From<&SubmissionRecord> for SubscriberRow {
    fn from(r: &SubmissionRecord) -> Self {
        Self {
            email: r.email.clone(),
            ip_address: r.ip_address.clone(),
            user_agent: r.user_agent.clone(),
            source: r.source.clone(),
            created_at: to_millis(r.created_at),
        }
    }
}

impl TryFrom<SubscriberRow> for SubmissionRecord {
    type Error = StoreError;

    fn try_from(row: SubscriberRow) -> Result<Self, Self::Error> {
        Ok(Self {
            email: row.email,
            ip_address: row.ip_address,
            user_agent: row.user_agent,
            source: row.source,
            created_at: from_millis(row.created_at)?,
        })
    }
}

#[async_trait]
impl RateLimitStore for SurrealStore {
    async fn get_attempts(
        &self,
        identity: &str,
        action: &str,
    ) -> Result<Option<RateLimitRecord>, StoreError> {
        let row: Option<AttemptRow> = self
            .db
            .select((RATE_LIMITS, attempt_id(identity, action)))
            .await?;
        row.map(RateLimitRecord::try_from).transpose()
    }

    async fn put_attempts(&self, record: &RateLimitRecord) -> Result<(), StoreError> {
        // UPDATE on a record id creates it when missing.
        let _: Option<AttemptRow> = self
            .db
            .update((RATE_LIMITS, attempt_id(&record.identity, &record.action)))
            .content(AttemptRow::from(record))
            .await?;
        Ok(())
    }

    async fn delete_attempts(
        &self,
        identity: &str,
        action: Option<&str>,
    ) -> Result<usize, StoreError> {
        let mut response = match action {
            Some(action) => {
                self.db
                    .query(
                        "DELETE rate_limits WHERE identity = $identity AND action = $action RETURN BEFORE",
                    )
                    .bind(("identity", identity.to_string()))
                    .bind(("action", action.to_string()))
                    .await?
            }
            None => {
                self.db
                    .query("DELETE rate_limits WHERE identity = $identity RETURN BEFORE")
                    .bind(("identity", identity.to_string()))
                    .await?
            }
        };
        let removed: Vec<AttemptRow> = response.take(0)?;
        Ok(removed.len())
    }

    async fn list_attempts(&self) -> Result<Vec<RateLimitRecord>, StoreError> {
        let rows: Vec<AttemptRow> = self.db.select(RATE_LIMITS).await?;
        rows.into_iter().map(RateLimitRecord::try_from).collect()
    }
}

#[async_trait]
impl BlockStore for SurrealStore {
    async fn get_block(&self, identity: &str) -> Result<Option<BlockRecord>, StoreError> {
        let row: Option<BlockRow> = self.db.select((BLOCKED_IPS, identity.to_string())).await?;
        row.map(BlockRecord::try_from).transpose()
    }

    async fn insert_block_if_absent(&self, record: &BlockRecord) -> Result<bool, StoreError> {
        // Check-then-create; a concurrent create for the same id loses on the
        // unique index and is reported as not inserted.
        if self.get_block(&record.identity).await?.is_some() {
            return Ok(false);
        }
        let created: Result<Option<BlockRow>, surrealdb::Error> = self
            .db
            .create((BLOCKED_IPS, record.identity.clone()))
            .content(BlockRow::from(record))
            .await;
        match created {
            Ok(row) => Ok(row.is_some()),
            Err(_) if self.get_block(&record.identity).await?.is_some() => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_block(&self, identity: &str) -> Result<bool, StoreError> {
        let removed: Option<BlockRow> = self.db.delete((BLOCKED_IPS, identity.to_string())).await?;
        Ok(removed.is_some())
    }

    async fn delete_expired_blocks(&self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        let mut response = self
            .db
            .query(
                "DELETE blocked_ips WHERE expires_at != NONE AND expires_at != NULL AND expires_at <= $now RETURN BEFORE",
            )
            .bind(("now", to_millis(now)))
            .await?;
        let removed: Vec<BlockRow> = response.take(0)?;
        Ok(removed.len())
    }

    async fn list_blocks(&self) -> Result<Vec<BlockRecord>, StoreError> {
        let rows: Vec<BlockRow> = self.db.select(BLOCKED_IPS).await?;
        rows.into_iter().map(BlockRecord::try_from).collect()
    }
}

#[async_trait]
impl SubscriberStore for SurrealStore {
    async fn insert_subscriber(&self, record: &SubmissionRecord) -> Result<(), StoreError> {
        if self.get_subscriber(&record.email).await?.is_some() {
            return Err(StoreError::Duplicate {
                key: record.email.clone(),
            });
        }
        let created: Result<Option<SubscriberRow>, surrealdb::Error> = self
            .db
            .create((SUBSCRIBERS, record.email.clone()))
            .content(SubscriberRow::from(record))
            .await;
        match created {
            Ok(_) => Ok(()),
            Err(_) if self.get_subscriber(&record.email).await?.is_some() => {
                Err(StoreError::Duplicate {
                    key: record.email.clone(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get_subscriber(&self, email: &str) -> Result<Option<SubmissionRecord>, StoreError> {
        let row: Option<SubscriberRow> = self.db.select((SUBSCRIBERS, email.to_string())).await?;
        row.map(SubmissionRecord::try_from).transpose()
    }

    async fn count_subscribers(&self) -> Result<usize, StoreError> {
        let rows: Vec<SubscriberRow> = self.db.select(SUBSCRIBERS).await?;
        Ok(rows.len())
    }
}
