// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Submission orchestrator.
//!
//! Runs the checks in a fixed order and stops at the first failure:
//!
//! 1. Honeypot
//! 2. Block registry lookup
//! 3. Rate limit for the `signup` action (may create a block)
//! 4. Email heuristics
//!
//! Spam classifications come back as [`Verdict::Blocked`]. Storage and
//! configuration failures come back as `Err` and must not be reported to the
//! user as spam. Persisting an allowed submission is the caller's job.

use crate::blocklist::{BlockRegistry, BlockStatus};
use crate::clock::Clock;
use crate::config::{Config, SIGNUP_ACTION};
use crate::error::Result;
use crate::honeypot::{self, BOT_DETECTED};
use crate::limiter::{ceil_secs, RateLimitDecision, RateLimiter};
use crate::store::Stores;
use crate::validator::{EmailRejection, EmailValidator, ValidationResult};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const DEFAULT_BLOCK_REASON: &str = "IP address is blocked";

/// An inbound signup.
#[derive(Debug, Clone)]
pub struct Submission {
    pub email: String,
    /// Resolved client identity, possibly `"unknown"`
    pub identity: String,
    pub honeypot: Option<String>,
}

/// Why a submission was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockReason {
    Honeypot,
    IpBlocked { reason: String },
    RateLimited,
    Email(EmailRejection),
}

impl BlockReason {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            BlockReason::Honeypot => "BOT_DETECTED",
            BlockReason::IpBlocked { .. } => "IP_BLOCKED",
            BlockReason::RateLimited => "RATE_LIMITED",
            BlockReason::Email(EmailRejection::InvalidFormat) => "INVALID_EMAIL",
            BlockReason::Email(EmailRejection::SpamPattern) => "SPAM_EMAIL",
            BlockReason::Email(EmailRejection::DisposableDomain { .. }) => "DISPOSABLE_EMAIL",
        }
    }
}

impl std::fmt::Display for BlockReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Honeypot => write!(f, "{BOT_DETECTED}"),
            Self::IpBlocked { reason } => write!(f, "{reason}"),
            Self::RateLimited => write!(f, "Rate limit exceeded, please try again later"),
            Self::Email(rejection) => write!(f, "{rejection}"),
        }
    }
}

/// Outcome of evaluating a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Allowed,
    Blocked {
        reason: BlockReason,
        retry_after: Option<Duration>,
    },
}

impl Verdict {
    pub fn is_blocked(&self) -> bool {
        matches!(self, Verdict::Blocked { .. })
    }

    pub fn reason(&self) -> Option<&BlockReason> {
        match self {
            Verdict::Allowed => None,
            Verdict::Blocked { reason, .. } => Some(reason),
        }
    }

    /// Whole seconds, rounded up.
    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            Verdict::Blocked {
                retry_after: Some(d),
                ..
            } => Some(ceil_secs(*d)),
            _ => None,
        }
    }

    fn blocked(reason: BlockReason) -> Self {
        Verdict::Blocked {
            reason,
            retry_after: None,
        }
    }
}

/// Composes the spam checks into one decision.
#[derive(Clone)]
pub struct SubmissionGuard {
    blocks: BlockRegistry,
    limiter: RateLimiter,
    validator: EmailValidator,
    clock: Arc<dyn Clock>,
}

impl SubmissionGuard {
    pub fn new(
        blocks: BlockRegistry,
        limiter: RateLimiter,
        validator: EmailValidator,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            blocks,
            limiter,
            validator,
            clock,
        }
    }

    /// Wire the registry, limiter and validator over `stores`.
    pub fn from_config(config: &Config, stores: &Stores, clock: Arc<dyn Clock>) -> Result<Self> {
        let blocks = BlockRegistry::new(stores.blocks.clone(), clock.clone());
        let limiter = RateLimiter::new(
            config.rate_limit.clone(),
            stores.rate_limits.clone(),
            blocks.clone(),
            clock.clone(),
        );
        let validator = EmailValidator::new(&config.email)?;
        Ok(Self::new(blocks, limiter, validator, clock))
    }

    pub fn blocks(&self) -> &BlockRegistry {
        &self.blocks
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Decide whether `submission` may proceed.
    pub async fn evaluate(&self, submission: &Submission) -> Result<Verdict> {
        let identity = submission.identity.as_str();

        if honeypot::check(submission.honeypot.as_deref()).is_tripped() {
            warn!(identity, "Submission blocked: honeypot");
            return Ok(Verdict::blocked(BlockReason::Honeypot));
        }

        if let BlockStatus::Blocked { reason, expires_at } = self.blocks.is_blocked(identity).await? {
            warn!(identity, reason = %reason, "Submission blocked: identity blocked");
            let reason = if reason.trim().is_empty() {
                DEFAULT_BLOCK_REASON.to_string()
            } else {
                reason
            };
            let now = self.clock.now();
            let retry_after = expires_at.and_then(|at| (at - now).to_std().ok());
            return Ok(Verdict::Blocked {
                reason: BlockReason::IpBlocked { reason },
                retry_after,
            });
        }

        if let RateLimitDecision::Limited { retry_after } =
            self.limiter.check_and_record(identity, SIGNUP_ACTION).await?
        {
            warn!(
                identity,
                retry_after_secs = retry_after.as_secs(),
                "Submission blocked: rate limited"
            );
            return Ok(Verdict::Blocked {
                reason: BlockReason::RateLimited,
                retry_after: Some(retry_after),
            });
        }

        if let ValidationResult::Invalid(rejection) = self.validator.validate(&submission.email) {
            warn!(identity, reason = %rejection, "Submission blocked: email heuristics");
            return Ok(Verdict::blocked(BlockReason::Email(rejection)));
        }

        debug!(identity, "Submission passed all checks");
        Ok(Verdict::Allowed)
    }
}
