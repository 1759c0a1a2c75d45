// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Signup Guard Service
//!
//! Newsletter signup endpoint with spam prevention, plus admin endpoints for
//! the block registry and rate-limit counters.
//!
//! ## Configuration
//!
//! Configuration is loaded from `.env`, an optional JSON file named by
//! `CONFIG_FILE`, and environment variables:
//!
//! - `BIND_ADDR`: Server bind address (default: 0.0.0.0:8080)
//! - `ALLOWED_ORIGINS`: Comma-separated storefront origins for CORS
//! - `SIGNUP_MAX_ATTEMPTS`: Signups per window per client (default: 5)
//! - `SIGNUP_WINDOW_MINUTES`: Window length (default: 60)
//! - `SIGNUP_BLOCK_MINUTES`: Block applied when exceeded (default: 1440)
//! - `STORE_BACKEND`: `memory` or `surreal` (default: memory)
//! - `STORE_PATH`: SurrealDB path, or `memory`
//! - `CLEANUP_INTERVAL_SECS`: Expired-block sweep interval (default: 300)
//! - `ADMIN_TOKEN`: Bearer token enabling `/admin` routes

use axum::http::{header, HeaderValue, Method};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use signup_guard::{
    clock::{Clock, SystemClock},
    config::{Config, SIGNUP_ACTION},
    handlers::{router, AppState},
    metrics::GuardMetrics,
    store::Stores,
    SubmissionGuard,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let config = Config::load()?;
    let signup = config.rate_limit.limit_for(SIGNUP_ACTION);
    info!(
        bind_addr = %config.bind_addr,
        max_attempts = signup.map(|l| l.max_attempts),
        window_minutes = signup.map(|l| l.window_minutes),
        block_minutes = signup.map(|l| l.block_duration_minutes),
        store = ?config.store.backend,
        "Starting signup guard"
    );

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let stores = Stores::open(&config.store).await?;
    let guard = SubmissionGuard::from_config(&config, &stores, clock.clone())?;

    let state = Arc::new(AppState {
        guard,
        subscribers: stores.subscribers.clone(),
        metrics: GuardMetrics::new()?,
        config: config.clone(),
        clock,
    });

    // Spawn expired-block sweep
    if config.cleanup.enabled {
        let cleanup_state = state.clone();
        let period = Duration::from_secs(config.cleanup.interval_secs);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                match cleanup_state.guard.blocks().cleanup_expired().await {
                    Ok(removed) => cleanup_state.metrics.record_cleanup(removed),
                    Err(e) => error!(error = %e, "Expired block cleanup failed"),
                }
            }
        });
    }

    // Only the storefront may post the form from a browser
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    let app = router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr: SocketAddr = config.bind_addr.parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %addr, "Server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
