// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Email heuristic validator.
//!
//! Best-effort spam classification for newsletter signups:
//! - Email shape check
//! - Ordered spam local-part patterns
//! - Disposable-domain lookup
//!
//! False positives are tolerated; this gates a newsletter, not a payment.

use crate::config::EmailRulesConfig;
use crate::error::GuardError;
use regex::{Regex, RegexBuilder};
use std::collections::HashSet;
use thiserror::Error;
use tracing::debug;

/// Reason an address was rejected. The messages are shown to end users.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EmailRejection {
    #[error("Invalid email format")]
    InvalidFormat,

    #[error("Email pattern indicates spam")]
    SpamPattern,

    #[error("Disposable email addresses are not allowed")]
    DisposableDomain { domain: String },
}

/// Result of validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    Valid,
    Invalid(EmailRejection),
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }

    pub fn error(&self) -> Option<&EmailRejection> {
        match self {
            ValidationResult::Valid => None,
            ValidationResult::Invalid(e) => Some(e),
        }
    }
}

/// Stateless email classifier.
#[derive(Debug, Clone)]
pub struct EmailValidator {
    format: Regex,
    spam_patterns: Vec<Regex>,
    disposable_domains: HashSet<String>,
}

impl EmailValidator {
    /// Compile the configured rules.
    pub fn new(config: &EmailRulesConfig) -> Result<Self, GuardError> {
        let format = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$")
            .map_err(|e| GuardError::Config(format!("email format regex: {e}")))?;

        let spam_patterns = config
            .spam_patterns
            .iter()
            .map(|pattern| {
                RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| GuardError::Config(format!("spam pattern {pattern:?}: {e}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let disposable_domains = config
            .disposable_domains
            .iter()
            .map(|d| d.trim().to_lowercase())
            .filter(|d| !d.is_empty())
            .collect();

        Ok(Self {
            format,
            spam_patterns,
            disposable_domains,
        })
    }

    /// Classify `email`.
    pub fn validate(&self, email: &str) -> ValidationResult {
        if !self.format.is_match(email) {
            debug!(email, "Invalid email format");
            return ValidationResult::Invalid(EmailRejection::InvalidFormat);
        }

        if let Some(pattern) = self.spam_patterns.iter().find(|p| p.is_match(email)) {
            debug!(email, pattern = pattern.as_str(), "Spam pattern matched");
            return ValidationResult::Invalid(EmailRejection::SpamPattern);
        }

        if let Some(domain) = email_domain(email) {
            if self.disposable_domains.contains(&domain) {
                debug!(email, domain = %domain, "Disposable domain");
                return ValidationResult::Invalid(EmailRejection::DisposableDomain { domain });
            }
        }

        ValidationResult::Valid
    }
}

/// Lowercased text after the last `@`.
fn email_domain(email: &str) -> Option<String> {
    email
        .rsplit_once('@')
        .map(|(_, domain)| domain.trim().to_lowercase())
        .filter(|d| !d.is_empty())
}
