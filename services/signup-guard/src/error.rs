// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Error types for the signup guard.
//!
//! Spam classifications are not errors; they are returned as
//! [`Verdict`](crate::guard::Verdict) values. The types here cover storage
//! and configuration failures, plus the duplicate-subscriber case which the
//! HTTP layer surfaces on its own.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Storage backend errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique key already exists.
    #[error("Duplicate record: {key}")]
    Duplicate { key: String },

    #[error("Storage backend error: {0}")]
    Backend(String),
}

#[cfg(feature = "surreal")]
impl From<surrealdb::Error> for StoreError {
    fn from(err: surrealdb::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

/// Operational failures raised while evaluating a submission.
#[derive(Debug, Error)]
pub enum GuardError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("No rate limit configured for action: {0}")]
    UnknownAction(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, GuardError>;

/// HTTP-facing error.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Email is already subscribed")]
    AlreadySubscribed,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error(transparent)]
    Guard(#[from] GuardError),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate { .. } => AppError::AlreadySubscribed,
            other => AppError::Guard(GuardError::Store(other)),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::MalformedPayload(rejection.body_text())
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    code: &'static str,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::AlreadySubscribed => (
                StatusCode::CONFLICT,
                "ALREADY_SUBSCRIBED",
                self.to_string(),
            ),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", self.to_string()),
            AppError::MalformedPayload(_) => {
                (StatusCode::BAD_REQUEST, "MALFORMED_PAYLOAD", self.to_string())
            }
            AppError::Guard(err) => {
                // Details stay in the logs.
                error!(error = %err, "Operational failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Something went wrong, please try again later".to_string(),
                )
            }
        };

        (
            status,
            Json(ErrorBody {
                error: message,
                code,
            }),
        )
            .into_response()
    }
}
