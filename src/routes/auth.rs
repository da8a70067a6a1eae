// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Whoop OAuth authentication routes.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::error::Result;
use crate::services::AuthMessage;
use crate::WhoopIntegration;

pub fn routes() -> Router<Arc<WhoopIntegration>> {
    Router::new()
        .route("/auth/whoop", get(auth_start))
        .route("/auth/whoop/callback", get(auth_callback))
        .route("/auth/whoop/message", post(auth_message))
        .route("/auth/logout", post(logout))
}

/// Start OAuth flow - redirect to Whoop authorization.
///
/// The handshake finishes in the background once the callback delivers a
/// code; the first sync runs right after the token exchange.
async fn auth_start(State(state): State<Arc<WhoopIntegration>>) -> Redirect {
    let pending = state.start_authorization();
    let authorize_url = pending.authorize_url().to_string();

    let integration = state.clone();
    tokio::spawn(async move {
        match integration.connect(pending).await {
            Ok(sync) => tracing::info!(
                days = sync.latest_aggregate.daily.len(),
                "Whoop connected and synced"
            ),
            Err(e) => tracing::warn!(error = %e, "Whoop connection did not complete"),
        }
    });

    tracing::info!("Starting OAuth flow, redirecting to Whoop");
    Redirect::temporary(&authorize_url)
}

#[derive(Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

/// OAuth redirect target - hand the code to the waiting handshake.
async fn auth_callback(
    State(state): State<Arc<WhoopIntegration>>,
    Query(params): Query<CallbackParams>,
) -> Response {
    let delivered = match (params.code.as_deref(), params.error.as_deref()) {
        (_, Some(error)) => {
            let reason = params
                .error_description
                .map(|d| format!("{}: {}", error, d))
                .unwrap_or_else(|| error.to_string());
            tracing::warn!(error = %reason, "OAuth error from Whoop");
            state.deny_authorization(&reason)
        }
        (Some(code), None) if code.trim().is_empty() => {
            return (
                StatusCode::BAD_REQUEST,
                Html("<p>Whoop did not return an authorization code.</p>"),
            )
                .into_response();
        }
        (Some(code), None) => state.deliver_auth_code(code),
        (None, None) => false,
    };

    if !delivered {
        return (
            StatusCode::CONFLICT,
            Html("<p>No Whoop authorization is in progress.</p>"),
        )
            .into_response();
    }

    Html("<p>Whoop authorization received. You can close this window.</p>").into_response()
}

/// Popup message relay: `{"type": "WHOOP_AUTH_CODE", "code": "..."}`.
async fn auth_message(
    State(state): State<Arc<WhoopIntegration>>,
    Json(message): Json<AuthMessage>,
) -> StatusCode {
    if !message.is_auth_code() {
        return StatusCode::ACCEPTED;
    }
    if state.deliver_auth_message(&message) {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::CONFLICT
    }
}

/// Forget tokens and synced data.
async fn logout(State(state): State<Arc<WhoopIntegration>>) -> Result<StatusCode> {
    state.disconnect()?;
    Ok(StatusCode::NO_CONTENT)
}
