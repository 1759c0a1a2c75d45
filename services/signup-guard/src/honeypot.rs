// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Honeypot trap-field check. The form renders the field hidden, so only
//! automated submitters fill it in.

use tracing::debug;

pub const BOT_DETECTED: &str = "Bot detected";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoneypotResult {
    Pass,
    Tripped,
}

impl HoneypotResult {
    pub fn is_tripped(self) -> bool {
        self == HoneypotResult::Tripped
    }
}

/// Any non-blank value trips the trap.
pub fn check(value: Option<&str>) -> HoneypotResult {
    match value {
        Some(v) if !v.trim().is_empty() => {
            debug!(len = v.len(), "Honeypot field filled");
            HoneypotResult::Tripped
        }
        _ => HoneypotResult::Pass,
    }
}
