// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// The token endpoint rejected an authorization code or refresh token.
    #[error("Whoop token exchange failed with status {status}: {body}")]
    AuthExchange { status: u16, body: String },

    #[error("No refresh token stored")]
    NoRefreshToken,

    #[error("Not connected to Whoop")]
    NotAuthenticated,

    #[error("Whoop authorization was cancelled")]
    AuthorizationCancelled,

    #[error("Whoop authorization denied: {0}")]
    AuthorizationDenied(String),

    /// One of the recovery/sleep/workout fetches failed; nothing was persisted.
    #[error("Whoop data sync failed: {0}")]
    Sync(#[source] Box<AppError>),

    /// Non-2xx response from a bearer-authenticated call.
    #[error("Whoop API request failed with status {status}: {body}")]
    ApiRequest { status: u16, body: String },

    /// Transport or decoding failure talking to Whoop.
    #[error("Whoop API error: {0}")]
    WhoopApi(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Returns true if the error means the stored credentials are unusable
    /// and the user has to connect again.
    pub fn is_token_error(&self) -> bool {
        match self {
            AppError::AuthExchange { .. }
            | AppError::NoRefreshToken
            | AppError::NotAuthenticated => true,
            AppError::ApiRequest { status, .. } => *status == 401,
            AppError::Sync(inner) => inner.is_token_error(),
            _ => false,
        }
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::NotAuthenticated | AppError::NoRefreshToken => {
                (StatusCode::UNAUTHORIZED, "not_connected", None)
            }
            AppError::AuthExchange { .. } => (
                StatusCode::BAD_GATEWAY,
                "auth_exchange_failed",
                Some(self.to_string()),
            ),
            AppError::AuthorizationCancelled => {
                (StatusCode::BAD_REQUEST, "authorization_cancelled", None)
            }
            AppError::AuthorizationDenied(msg) => (
                StatusCode::BAD_REQUEST,
                "authorization_denied",
                Some(msg.clone()),
            ),
            AppError::Sync(inner) => (
                StatusCode::BAD_GATEWAY,
                "sync_failed",
                Some(inner.to_string()),
            ),
            AppError::ApiRequest { .. } | AppError::WhoopApi(_) => {
                (StatusCode::BAD_GATEWAY, "whoop_error", Some(self.to_string()))
            }
            AppError::Storage(msg) => {
                tracing::error!(error = %msg, "Storage error");
                (StatusCode::INTERNAL_SERVER_ERROR, "storage_error", None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers and services
pub type Result<T> = std::result::Result<T, AppError>;
