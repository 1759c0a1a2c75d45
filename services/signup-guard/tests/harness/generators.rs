// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Test data generators for abuse simulation.

use std::net::{IpAddr, Ipv4Addr};

/// Generate a pool of client addresses.
pub fn generate_ips(count: usize) -> Vec<IpAddr> {
    (0..count)
        .map(|i| {
            // Use 10.x.x.x private range
            let a = ((i >> 16) & 0xFF) as u8;
            let b = ((i >> 8) & 0xFF) as u8;
            let c = (i & 0xFF) as u8;
            IpAddr::V4(Ipv4Addr::new(10, a, b, c))
        })
        .collect()
}

/// Plausible personal addresses that pass every heuristic.
pub fn generate_clean_emails(count: usize) -> Vec<String> {
    const FIRST: &[&str] = &["jane", "john", "maria", "ahmed", "li", "olga", "pierre", "sofia"];
    const LAST: &[&str] = &["doe", "smith", "garcia", "khan", "wei", "petrova", "martin", "rossi"];
    (0..count)
        .map(|i| {
            format!(
                "{}.{}{}@gmail.com",
                FIRST[i % FIRST.len()],
                LAST[(i / FIRST.len()) % LAST.len()],
                i
            )
        })
        .collect()
}

/// Addresses matching the role-account or short-local-part patterns.
pub fn generate_pattern_emails(count: usize) -> Vec<String> {
    const PREFIXES: &[&str] = &["admin", "test", "support", "info", "bot", "noreply"];
    (0..count)
        .map(|i| {
            if i % 3 == 0 {
                format!("x{}@example.com", i % 100)
            } else {
                format!("{}{}@example.com", PREFIXES[i % PREFIXES.len()], i)
            }
        })
        .collect()
}

/// Personal-looking addresses at throwaway providers.
pub fn generate_disposable_emails(count: usize) -> Vec<String> {
    const DOMAINS: &[&str] = &["mailinator.com", "yopmail.com", "guerrillamail.com", "tempmail.com"];
    (0..count)
        .map(|i| format!("jane.doe{}@{}", i, DOMAINS[i % DOMAINS.len()]))
        .collect()
}

/// Malformed address variations. All should be rejected as invalid format.
pub fn generate_malformed_emails() -> Vec<&'static str> {
    vec![
        "",
        "   ",
        "plainaddress",
        "@missing-local.com",
        "missing-domain@",
        "missing-tld@example",
        "two@@example.com",
        "spaces in@example.com",
        "jane.doe@exa mple.com",
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_ips() {
        let ips = generate_ips(256);
        assert_eq!(ips.len(), 256);
        let unique: std::collections::HashSet<_> = ips.iter().collect();
        assert_eq!(unique.len(), 256);
    }

    #[test]
    fn test_clean_emails_unique() {
        let emails = generate_clean_emails(100);
        let unique: std::collections::HashSet<_> = emails.iter().collect();
        assert_eq!(unique.len(), 100);
    }
}
