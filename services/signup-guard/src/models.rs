// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Persisted record types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Attempt counter for one (identity, action) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitRecord {
    pub identity: String,
    pub action: String,
    pub attempt_count: u32,
    pub first_attempt: DateTime<Utc>,
    pub last_attempt: DateTime<Utc>,
}

impl RateLimitRecord {
    /// A fresh window starting at `now`.
    pub fn start(identity: &str, action: &str, now: DateTime<Utc>) -> Self {
        Self {
            identity: identity.to_string(),
            action: action.to_string(),
            attempt_count: 1,
            first_attempt: now,
            last_attempt: now,
        }
    }
}

/// A blocked identity. `expires_at == None` is a permanent block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRecord {
    pub identity: String,
    pub reason: String,
    pub blocked_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl BlockRecord {
    /// Whether the block is in force at `now`.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            None => true,
            Some(expires_at) => expires_at > now,
        }
    }
}

/// A stored newsletter signup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    /// Trimmed, lowercased address. Unique.
    pub email: String,
    pub ip_address: String,
    pub user_agent: Option<String>,
    pub source: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Canonical form used for uniqueness.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_block_activity() {
        let now = Utc::now();
        let mut record = BlockRecord {
            identity: "1.2.3.4".into(),
            reason: "manual".into(),
            blocked_at: now,
            expires_at: None,
        };
        assert!(record.is_active(now + Duration::days(365)));

        record.expires_at = Some(now + Duration::minutes(5));
        assert!(record.is_active(now));
        assert!(!record.is_active(now + Duration::minutes(5)));
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Jane.Doe@Gmail.COM "), "jane.doe@gmail.com");
    }
}
