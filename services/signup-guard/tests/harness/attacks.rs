// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Abuse patterns for security testing.

/// Kind of address an attack submits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailKind {
    Clean,
    Pattern,
    Disposable,
}

/// Attack pattern configuration.
#[derive(Debug, Clone)]
pub struct AttackConfig {
    /// Total number of submissions
    pub total_requests: usize,
    /// Simulated seconds between submissions
    pub interval_secs: i64,
    /// Number of unique client addresses
    pub unique_ips: usize,
    /// Addresses submitted
    pub email_kind: EmailKind,
    /// Whether the honeypot field is filled
    pub fill_honeypot: bool,
}

impl Default for AttackConfig {
    fn default() -> Self {
        Self {
            total_requests: 100,
            interval_secs: 1,
            unique_ips: 1,
            email_kind: EmailKind::Clean,
            fill_honeypot: false,
        }
    }
}

/// Predefined attack patterns.
impl AttackConfig {
    /// Single client flooding the signup form.
    pub fn single_ip_flood() -> Self {
        Self {
            total_requests: 200,
            interval_secs: 1,
            unique_ips: 1,
            ..Default::default()
        }
    }

    /// Many clients, a few signups each.
    pub fn distributed_attack() -> Self {
        Self {
            total_requests: 500,
            interval_secs: 1,
            unique_ips: 100,
            ..Default::default()
        }
    }

    /// Naive bot that fills every field.
    pub fn honeypot_bot() -> Self {
        Self {
            total_requests: 50,
            unique_ips: 10,
            fill_honeypot: true,
            ..Default::default()
        }
    }

    /// Generated role/short addresses from many clients.
    pub fn pattern_wave() -> Self {
        Self {
            total_requests: 60,
            unique_ips: 30,
            email_kind: EmailKind::Pattern,
            ..Default::default()
        }
    }

    /// Throwaway mailboxes from many clients.
    pub fn disposable_wave() -> Self {
        Self {
            total_requests: 60,
            unique_ips: 30,
            email_kind: EmailKind::Disposable,
            ..Default::default()
        }
    }

    /// One client staying under the hourly limit.
    pub fn slow_drip() -> Self {
        Self {
            total_requests: 20,
            interval_secs: 15 * 60,
            unique_ips: 1,
            ..Default::default()
        }
    }
}
