// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Best-effort client identity resolution.

use axum::http::HeaderMap;
use std::net::{IpAddr, SocketAddr};

/// Identity used when no client address can be resolved. All such clients
/// share one rate-limit bucket.
pub const UNKNOWN_IDENTITY: &str = "unknown";

/// Resolve the client identity: first `X-Forwarded-For` entry, then
/// `X-Real-IP`, then the socket peer, else [`UNKNOWN_IDENTITY`].
pub fn resolve(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(parse_ip);

    let real_ip = || {
        headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .and_then(parse_ip)
    };

    forwarded
        .or_else(real_ip)
        .or_else(|| peer.map(|addr| addr.ip()))
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| UNKNOWN_IDENTITY.to_string())
}

fn parse_ip(raw: &str) -> Option<IpAddr> {
    raw.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(*k, HeaderValue::from_static(v));
        }
        map
    }

    #[test]
    fn test_forwarded_for_first_entry() {
        let h = headers(&[
            ("x-forwarded-for", "203.0.113.7, 10.0.0.1"),
            ("x-real-ip", "198.51.100.2"),
        ]);
        assert_eq!(resolve(&h, None), "203.0.113.7");
    }

    #[test]
    fn test_real_ip_when_forwarded_garbage() {
        let h = headers(&[("x-forwarded-for", "nonsense"), ("x-real-ip", "198.51.100.2")]);
        assert_eq!(resolve(&h, None), "198.51.100.2");
    }

    #[test]
    fn test_peer_fallback_and_unknown() {
        let peer: SocketAddr = "192.0.2.1:55555".parse().unwrap();
        assert_eq!(resolve(&HeaderMap::new(), Some(peer)), "192.0.2.1");
        assert_eq!(resolve(&HeaderMap::new(), None), UNKNOWN_IDENTITY);
    }

    #[test]
    fn test_ipv6() {
        let h = headers(&[("x-forwarded-for", "2001:db8::1")]);
        assert_eq!(resolve(&h, None), "2001:db8::1");
    }
}
