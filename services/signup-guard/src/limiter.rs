// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Fixed-window attempt counter per (identity, action).
//!
//! Exceeding an action's limit blocks the identity in the
//! [`BlockRegistry`] for the action's block duration, on top of rejecting
//! the attempt.
//!
//! Known imprecisions:
//! - The window is fixed, not sliding. A burst straddling a window boundary
//!   can admit up to `2 * max_attempts` attempts in a short span.
//! - Each check is a read followed by a write. Concurrent attempts from one
//!   identity can both read count `N` and both write `N + 1`.

use crate::blocklist::BlockRegistry;
use crate::clock::Clock;
use crate::config::RateLimitConfig;
use crate::error::{GuardError, Result};
use crate::models::RateLimitRecord;
use crate::store::RateLimitStore;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Result of a rate limit check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateLimitDecision {
    /// Attempt recorded and allowed
    Allowed {
        /// Attempts counted in the current window, this one included
        attempts: u32,
        /// Attempts left in the current window
        remaining: u32,
    },
    /// Limit exceeded; the identity has been blocked
    Limited {
        /// Time until the current window closes
        retry_after: Duration,
    },
}

impl RateLimitDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitDecision::Allowed { .. })
    }

    /// Whole seconds to wait, rounded up. `None` when allowed.
    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            RateLimitDecision::Allowed { .. } => None,
            RateLimitDecision::Limited { retry_after } => Some(ceil_secs(*retry_after)),
        }
    }
}

/// Round up to whole seconds, never below one.
pub(crate) fn ceil_secs(d: Duration) -> u64 {
    let secs = d.as_secs() + u64::from(d.subsec_nanos() > 0);
    secs.max(1)
}

/// Rate limiter over a persistent counter store.
#[derive(Clone)]
pub struct RateLimiter {
    config: RateLimitConfig,
    store: Arc<dyn RateLimitStore>,
    blocks: BlockRegistry,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    pub fn new(
        config: RateLimitConfig,
        store: Arc<dyn RateLimitStore>,
        blocks: BlockRegistry,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            store,
            blocks,
            clock,
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Count an attempt by `identity` at `action` and decide whether it is
    /// allowed.
    pub async fn check_and_record(&self, identity: &str, action: &str) -> Result<RateLimitDecision> {
        let limit = *self
            .config
            .limit_for(action)
            .ok_or_else(|| GuardError::UnknownAction(action.to_string()))?;
        let now = self.clock.now();

        let existing = self
            .store
            .get_attempts(identity, action)
            .await
            .map_err(|e| {
                error!(identity, action, at = %now, error = %e, "Failed to read attempts");
                e
            })?;

        let record = match existing {
            None => RateLimitRecord::start(identity, action, now),
            Some(record) if now - record.first_attempt >= limit.window() => {
                debug!(identity, action, "Window elapsed, resetting counter");
                RateLimitRecord::start(identity, action, now)
            }
            Some(mut record) if record.attempt_count < limit.max_attempts => {
                record.attempt_count += 1;
                record.last_attempt = now;
                record
            }
            Some(record) => {
                let retry_after = record.first_attempt + limit.window() - now;
                if let Ok(retry_after) = retry_after.to_std() {
                    if !retry_after.is_zero() {
                        warn!(
                            identity,
                            action,
                            attempts = record.attempt_count,
                            retry_after_secs = retry_after.as_secs(),
                            "Rate limit exceeded, blocking identity"
                        );
                        self.blocks
                            .block(
                                identity,
                                &format!("Rate limit exceeded for action: {action}"),
                                Some(limit.block_duration()),
                            )
                            .await?;
                        return Ok(RateLimitDecision::Limited { retry_after });
                    }
                }
                // Unreachable while the window check above holds; treat as a
                // fresh window rather than reject with a zero wait.
                RateLimitRecord::start(identity, action, now)
            }
        };

        self.store.put_attempts(&record).await.map_err(|e| {
            error!(identity, action, at = %now, error = %e, "Failed to record attempt");
            e
        })?;

        debug!(identity, action, attempts = record.attempt_count, "Attempt allowed");
        Ok(RateLimitDecision::Allowed {
            attempts: record.attempt_count,
            remaining: limit.max_attempts.saturating_sub(record.attempt_count),
        })
    }

    /// Every stored counter, busiest first.
    pub async fn list_records(&self) -> Result<Vec<RateLimitRecord>> {
        let mut records = self.store.list_attempts().await?;
        records.sort_by(|a, b| {
            b.attempt_count
                .cmp(&a.attempt_count)
                .then_with(|| b.last_attempt.cmp(&a.last_attempt))
        });
        Ok(records)
    }

    /// Drop the counters for `identity` (one action, or all of them).
    pub async fn clear(&self, identity: &str, action: Option<&str>) -> Result<usize> {
        Ok(self.store.delete_attempts(identity, action).await?)
    }

    /// Counters with at least `threshold` attempts, busiest first.
    pub async fn offenders(&self, threshold: u32) -> Result<Vec<RateLimitRecord>> {
        Ok(self
            .list_records()
            .await?
            .into_iter()
            .filter(|record| record.attempt_count >= threshold)
            .collect())
    }
}
