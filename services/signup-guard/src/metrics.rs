// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Prometheus counters for signup decisions.

use crate::guard::Verdict;
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

#[derive(Clone, Debug)]
pub struct GuardMetrics {
    registry: Registry,
    verdicts: IntCounterVec,
    subscriptions: IntCounterVec,
    expired_blocks_removed: IntCounter,
    subscribers: IntGauge,
}

impl GuardMetrics {
    /// Register counters into a fresh registry.
    ///
    /// # Errors
    /// Returns an error if a metric cannot be registered.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let verdicts = IntCounterVec::new(
            Opts::new("signup_guard_verdicts_total", "Signup verdicts by outcome"),
            &["outcome"],
        )?;
        let subscriptions = IntCounterVec::new(
            Opts::new(
                "signup_guard_subscriptions_total",
                "Signup persistence results",
            ),
            &["result"],
        )?;
        let expired_blocks_removed = IntCounter::new(
            "signup_guard_expired_blocks_removed_total",
            "Expired block records removed by cleanup",
        )?;

        let subscribers = IntGauge::new(
            "signup_guard_subscribers",
            "Stored newsletter subscribers at last scrape",
        )?;

        registry.register(Box::new(verdicts.clone()))?;
        registry.register(Box::new(subscriptions.clone()))?;
        registry.register(Box::new(expired_blocks_removed.clone()))?;
        registry.register(Box::new(subscribers.clone()))?;

        Ok(Self {
            registry,
            verdicts,
            subscriptions,
            expired_blocks_removed,
            subscribers,
        })
    }

    pub fn record_verdict(&self, verdict: &Verdict) {
        let outcome = match verdict.reason() {
            None => "allowed",
            Some(reason) => reason.code(),
        };
        self.verdicts.with_label_values(&[outcome]).inc();
    }

    /// `result` is one of `subscribed`, `duplicate`, `error`.
    pub fn record_subscription(&self, result: &str) {
        self.subscriptions.with_label_values(&[result]).inc();
    }

    pub fn record_cleanup(&self, removed: usize) {
        self.expired_blocks_removed.inc_by(removed as u64);
    }

    pub fn set_subscribers(&self, count: usize) {
        self.subscribers.set(i64::try_from(count).unwrap_or(i64::MAX));
    }

    /// Text exposition format for scraping.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
