// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Signup Guard
//!
//! Spam prevention and rate limiting for the storefront newsletter signup:
//!
//! - Honeypot trap field
//! - IP block registry with optional expiry
//! - Fixed-window rate limiting per (identity, action), escalating to a block
//! - Email heuristics (format, spam patterns, disposable domains)
//! - Admin endpoints over blocks and counters

pub mod blocklist;
pub mod client_ip;
pub mod clock;
pub mod config;
pub mod error;
pub mod guard;
pub mod handlers;
pub mod honeypot;
pub mod limiter;
pub mod metrics;
pub mod models;
pub mod store;
pub mod validator;

pub use blocklist::{BlockRegistry, BlockStatus};
pub use config::Config;
pub use error::{GuardError, StoreError};
pub use guard::{BlockReason, Submission, SubmissionGuard, Verdict};
pub use limiter::{RateLimitDecision, RateLimiter};
pub use validator::{EmailValidator, ValidationResult};
