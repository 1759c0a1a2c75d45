// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Configuration for the signup guard.
//!
//! Defaults match the production newsletter policy: five signups per hour
//! per client, escalating to a 24 hour block.

use crate::error::GuardError;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

/// Rate-limit action used by the newsletter signup form.
pub const SIGNUP_ACTION: &str = "signup";

/// Configuration for the signup guard service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address (default: 0.0.0.0:8080)
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Origins allowed to post the signup form cross-origin
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,

    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    #[serde(default)]
    pub email: EmailRulesConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub cleanup: CleanupConfig,

    #[serde(default)]
    pub admin: AdminConfig,

    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Limits for one action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionLimit {
    /// Attempts allowed inside one window
    pub max_attempts: u32,
    /// Window length in minutes
    pub window_minutes: u32,
    /// Block applied once the limit is exceeded, in minutes
    pub block_duration_minutes: u32,
}

impl ActionLimit {
    pub fn window(&self) -> Duration {
        Duration::minutes(i64::from(self.window_minutes))
    }

    pub fn block_duration(&self) -> Duration {
        Duration::minutes(i64::from(self.block_duration_minutes))
    }
}

/// Per-action rate limiting table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_actions")]
    pub actions: HashMap<String, ActionLimit>,
}

impl RateLimitConfig {
    /// Limits for `action`, if configured.
    pub fn limit_for(&self, action: &str) -> Option<&ActionLimit> {
        self.actions.get(action)
    }

    /// Replace the limits for `action`.
    pub fn with_action(mut self, action: impl Into<String>, limit: ActionLimit) -> Self {
        self.actions.insert(action.into(), limit);
        self
    }
}

/// Email heuristic data. Patterns are tried in order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailRulesConfig {
    #[serde(default = "default_spam_patterns")]
    pub spam_patterns: Vec<String>,

    #[serde(default = "default_disposable_domains")]
    pub disposable_domains: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    Surreal,
}

impl std::str::FromStr for StoreBackend {
    type Err = GuardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "surreal" | "surrealdb" => Ok(Self::Surreal),
            other => Err(GuardError::Config(format!("unknown store backend: {other}"))),
        }
    }
}

/// Storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_backend")]
    pub backend: StoreBackend,

    /// SurrealDB path, or "memory" (default: memory)
    #[serde(default = "default_store_path")]
    pub path: String,
}

/// Expired-block sweep configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_cleanup_interval")]
    pub interval_secs: u64,
}

/// Admin endpoint configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdminConfig {
    /// Bearer token for /admin routes. Admin routes are not mounted without one.
    #[serde(default)]
    pub token: Option<String>,
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Enable Prometheus metrics endpoint (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Metrics endpoint path (default: /metrics)
    #[serde(default = "default_metrics_path")]
    pub path: String,
}

// Default value functions
fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_allowed_origins() -> Vec<String> {
    vec!["https://localhost".to_string()]
}

fn default_actions() -> HashMap<String, ActionLimit> {
    HashMap::from([(
        SIGNUP_ACTION.to_string(),
        ActionLimit {
            max_attempts: 5,
            window_minutes: 60,
            block_duration_minutes: 24 * 60,
        },
    )])
}

fn default_spam_patterns() -> Vec<String> {
    vec![
        // Very short alphanumeric local parts (ab1@, x9@)
        r"^[a-z0-9]{1,3}@".to_string(),
        // Role accounts, optionally numbered (admin5@, test@)
        r"^(admin|test|support|info|bot|noreply|no-reply|webmaster|postmaster)\d*@".to_string(),
    ]
}

fn default_disposable_domains() -> Vec<String> {
    [
        "10minutemail.com",
        "dispostable.com",
        "fakeinbox.com",
        "getnada.com",
        "guerrillamail.com",
        "maildrop.cc",
        "mailinator.com",
        "sharklasers.com",
        "temp-mail.org",
        "tempmail.com",
        "throwaway.email",
        "trashmail.com",
        "yopmail.com",
    ]
    .iter()
    .map(|d| d.to_string())
    .collect()
}

fn default_backend() -> StoreBackend {
    StoreBackend::Memory
}

fn default_store_path() -> String {
    "memory".to_string()
}

fn default_cleanup_interval() -> u64 {
    300
}

fn default_true() -> bool {
    true
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            allowed_origins: default_allowed_origins(),
            rate_limit: RateLimitConfig::default(),
            email: EmailRulesConfig::default(),
            store: StoreConfig::default(),
            cleanup: CleanupConfig::default(),
            admin: AdminConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            actions: default_actions(),
        }
    }
}

impl Default for EmailRulesConfig {
    fn default() -> Self {
        Self {
            spam_patterns: default_spam_patterns(),
            disposable_domains: default_disposable_domains(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            path: default_store_path(),
        }
    }
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            interval_secs: default_cleanup_interval(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            path: default_metrics_path(),
        }
    }
}

impl Config {
    /// Load configuration: `.env`, then an optional JSON file named by
    /// `CONFIG_FILE`, then individual environment overrides.
    pub fn load() -> Result<Self, GuardError> {
        dotenvy::dotenv().ok();

        let mut config = match std::env::var("CONFIG_FILE") {
            Ok(path) => Self::from_file(&path)?,
            Err(_) => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON config file. Missing sections fall back to defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, GuardError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| GuardError::Config(format!("{}: {e}", path.display())))?;
        info!(path = %path.display(), "Loaded config file");
        serde_json::from_str(&raw)
            .map_err(|e| GuardError::Config(format!("{}: {e}", path.display())))
    }

    /// Apply overrides from a variable lookup (the process environment in
    /// production).
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), GuardError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup("BIND_ADDR") {
            self.bind_addr = addr;
        }
        if let Some(origins) = lookup("ALLOWED_ORIGINS") {
            self.allowed_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string)
                .collect();
        }

        let signup = self
            .rate_limit
            .actions
            .entry(SIGNUP_ACTION.to_string())
            .or_insert_with(|| default_actions()[SIGNUP_ACTION]);
        if let Some(v) = parse_var(&lookup, "SIGNUP_MAX_ATTEMPTS")? {
            signup.max_attempts = v;
        }
        if let Some(v) = parse_var(&lookup, "SIGNUP_WINDOW_MINUTES")? {
            signup.window_minutes = v;
        }
        if let Some(v) = parse_var(&lookup, "SIGNUP_BLOCK_MINUTES")? {
            signup.block_duration_minutes = v;
        }

        if let Some(backend) = lookup("STORE_BACKEND") {
            self.store.backend = backend.parse()?;
        }
        if let Some(path) = lookup("STORE_PATH") {
            self.store.path = path;
        }
        if let Some(v) = parse_var(&lookup, "CLEANUP_INTERVAL_SECS")? {
            self.cleanup.interval_secs = v;
        }
        if let Some(token) = lookup("ADMIN_TOKEN").filter(|t| !t.trim().is_empty()) {
            self.admin.token = Some(token);
        }
        Ok(())
    }

    /// Reject limits that can never admit a request.
    pub fn validate(&self) -> Result<(), GuardError> {
        for (action, limit) in &self.rate_limit.actions {
            if limit.max_attempts == 0 || limit.window_minutes == 0 {
                return Err(GuardError::Config(format!(
                    "action {action}: max_attempts and window_minutes must be positive"
                )));
            }
        }
        if self.cleanup.enabled && self.cleanup.interval_secs == 0 {
            return Err(GuardError::Config(
                "cleanup.interval_secs must be positive".to_string(),
            ));
        }
        if self.admin.token.is_none() {
            warn!("ADMIN_TOKEN not set, admin endpoints disabled");
        }
        Ok(())
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Result<Option<T>, GuardError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| GuardError::Config(format!("{key}={raw}: {e}"))),
    }
}
