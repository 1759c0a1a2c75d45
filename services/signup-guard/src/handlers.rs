// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! HTTP handlers for the signup guard service.
//!
//! `/api/newsletter` is the form handler: it runs the guard and, when the
//! submission passes, stores the subscriber. Admin routes expose the block
//! registry and rate-limit counters.

use crate::clock::Clock;
use crate::client_ip;
use crate::config::{Config, SIGNUP_ACTION};
use crate::error::{AppError, StoreError};
use crate::guard::{BlockReason, Submission, SubmissionGuard, Verdict};
use crate::metrics::GuardMetrics;
use crate::models::{normalize_email, BlockRecord, RateLimitRecord, SubmissionRecord};
use crate::store::SubscriberStore;
use axum::{
    extract::{rejection::JsonRejection, ConnectInfo, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Shared application state.
pub struct AppState {
    pub guard: SubmissionGuard,
    pub subscribers: Arc<dyn SubscriberStore>,
    pub metrics: GuardMetrics,
    pub config: Config,
    pub clock: Arc<dyn Clock>,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_secs: Option<u64>,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Newsletter signup form body.
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    #[serde(default)]
    pub honeypot: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub status: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct BlockRequest {
    pub identity: String,
    pub reason: String,
    /// Omit for a permanent block
    #[serde(default)]
    pub duration_minutes: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct ClearQuery {
    pub action: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct OffendersQuery {
    pub threshold: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct UnblockResponse {
    pub removed: bool,
}

#[derive(Debug, Serialize)]
pub struct RemovedResponse {
    pub removed: usize,
}

/// Build the router. Admin routes are mounted only when a token is set.
pub fn router(state: Arc<AppState>) -> Router {
    let mut router = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/api/newsletter", post(subscribe));

    if state.config.metrics.enabled {
        router = router.route(&state.config.metrics.path, get(metrics));
    }

    if state.config.admin.token.is_some() {
        router = router
            .route("/admin/blocks", get(list_blocks).post(create_block))
            .route("/admin/blocks/:identity", delete(remove_block))
            .route("/admin/rate-limits", get(list_rate_limits))
            .route("/admin/rate-limits/:identity", delete(clear_rate_limits))
            .route("/admin/offenders", get(offenders))
            .route("/admin/cleanup", post(cleanup));
    }

    router.with_state(state)
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "signup-guard",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Prometheus scrape endpoint.
pub async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    match state.subscribers.count_subscribers().await {
        Ok(count) => state.metrics.set_subscribers(count),
        Err(e) => error!(error = %e, "Failed to count subscribers"),
    }

    match state.metrics.render() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to render metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Newsletter signup.
pub async fn subscribe(
    State(state): State<Arc<AppState>>,
    connect: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(req) = payload?;
    let identity = client_ip::resolve(&headers, connect.map(|ConnectInfo(addr)| addr));
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    debug!(identity = %identity, source = ?req.source, "Processing signup");

    let submission = Submission {
        email: req.email.trim().to_string(),
        identity: identity.clone(),
        honeypot: req.honeypot,
    };

    let verdict = state.guard.evaluate(&submission).await.map_err(|e| {
        error!(
            identity = %identity,
            action = SIGNUP_ACTION,
            at = %state.clock.now(),
            error = %e,
            "Signup check failed"
        );
        AppError::from(e)
    })?;
    state.metrics.record_verdict(&verdict);

    if let Verdict::Blocked { reason, .. } = &verdict {
        return Ok(blocked_response(reason, verdict.retry_after_secs()));
    }

    let record = SubmissionRecord {
        email: normalize_email(&submission.email),
        ip_address: identity.clone(),
        user_agent,
        source: req.source,
        created_at: state.clock.now(),
    };

    match state.subscribers.insert_subscriber(&record).await {
        Ok(()) => {
            state.metrics.record_subscription("subscribed");
            info!(identity = %identity, source = ?record.source, "New subscriber");
            Ok((
                StatusCode::CREATED,
                Json(SignupResponse {
                    status: "subscribed",
                }),
            )
                .into_response())
        }
        Err(StoreError::Duplicate { .. }) => {
            state.metrics.record_subscription("duplicate");
            debug!(identity = %identity, "Already subscribed");
            Err(AppError::AlreadySubscribed)
        }
        Err(e) => {
            state.metrics.record_subscription("error");
            error!(
                identity = %identity,
                at = %record.created_at,
                error = %e,
                "Failed to store subscriber"
            );
            Err(e.into())
        }
    }
}

fn blocked_response(reason: &BlockReason, retry_after_secs: Option<u64>) -> Response {
    let status = match reason {
        BlockReason::RateLimited | BlockReason::IpBlocked { .. } => StatusCode::TOO_MANY_REQUESTS,
        BlockReason::Honeypot | BlockReason::Email(_) => StatusCode::BAD_REQUEST,
    };
    let body = Json(ErrorResponse {
        error: reason.to_string(),
        code: reason.code(),
        retry_after_secs,
    });

    match retry_after_secs {
        Some(secs) => (status, [(header::RETRY_AFTER, secs.to_string())], body).into_response(),
        None => (status, body).into_response(),
    }
}

fn require_admin(state: &AppState, headers: &HeaderMap) -> Result<(), AppError> {
    let expected = state.config.admin.token.as_deref().ok_or(AppError::Unauthorized)?;
    let presented = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match presented {
        Some(token) if token == expected => Ok(()),
        _ => Err(AppError::Unauthorized),
    }
}

pub async fn list_blocks(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<BlockRecord>>, AppError> {
    require_admin(&state, &headers)?;
    Ok(Json(state.guard.blocks().list_active().await?))
}

pub async fn create_block(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<BlockRequest>, JsonRejection>,
) -> Result<StatusCode, AppError> {
    require_admin(&state, &headers)?;
    let Json(req) = payload?;
    if req.identity.trim().is_empty() {
        return Err(AppError::MalformedPayload("identity is required".to_string()));
    }
    let duration = req
        .duration_minutes
        .map(|m| Duration::minutes(i64::from(m)));
    state
        .guard
        .blocks()
        .block(req.identity.trim(), &req.reason, duration)
        .await?;
    Ok(StatusCode::CREATED)
}

pub async fn remove_block(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(identity): Path<String>,
) -> Result<Json<UnblockResponse>, AppError> {
    require_admin(&state, &headers)?;
    let removed = state.guard.blocks().unblock(&identity).await?;
    Ok(Json(UnblockResponse { removed }))
}

pub async fn list_rate_limits(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<RateLimitRecord>>, AppError> {
    require_admin(&state, &headers)?;
    Ok(Json(state.guard.limiter().list_records().await?))
}

pub async fn clear_rate_limits(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(identity): Path<String>,
    Query(query): Query<ClearQuery>,
) -> Result<Json<RemovedResponse>, AppError> {
    require_admin(&state, &headers)?;
    let removed = state
        .guard
        .limiter()
        .clear(&identity, query.action.as_deref())
        .await?;
    Ok(Json(RemovedResponse { removed }))
}

pub async fn offenders(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<OffendersQuery>,
) -> Result<Json<Vec<RateLimitRecord>>, AppError> {
    require_admin(&state, &headers)?;
    let limiter = state.guard.limiter();
    let threshold = query.threshold.unwrap_or_else(|| {
        limiter
            .config()
            .limit_for(SIGNUP_ACTION)
            .map_or(1, |limit| limit.max_attempts)
    });
    Ok(Json(limiter.offenders(threshold).await?))
}

pub async fn cleanup(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<RemovedResponse>, AppError> {
    require_admin(&state, &headers)?;
    let removed = state.guard.blocks().cleanup_expired().await?;
    state.metrics.record_cleanup(removed);
    Ok(Json(RemovedResponse { removed }))
}
