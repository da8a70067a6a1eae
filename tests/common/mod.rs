// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared test helpers: a local stand-in for the Whoop API.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use whoop_recovery::config::Config;
use whoop_recovery::db::{MemoryStore, TokenStore};
use whoop_recovery::models::TokenRecord;
use whoop_recovery::WhoopIntegration;

/// Recorded state of the fake Whoop server.
#[derive(Default)]
pub struct MockWhoop {
    /// Every request, of any kind
    pub requests: AtomicUsize,
    /// JSON bodies posted to the token endpoint
    pub token_requests: Mutex<Vec<Value>>,
    /// (resource, query) of every data request
    pub data_requests: Mutex<Vec<(String, HashMap<String, String>)>>,
    /// Access tokens the server accepts
    pub valid_tokens: Mutex<HashSet<String>>,
    issued: AtomicUsize,
    /// Reject every token exchange with 400
    pub reject_tokens: AtomicBool,
    /// Leave `refresh_token` out of token responses
    pub omit_refresh_token: AtomicBool,
    /// Data resource that answers 500
    pub failing_resource: Mutex<Option<String>>,
    /// Recovery fixture served from `/v1/recovery`
    pub recovery: Mutex<Value>,
}

#[allow(dead_code)]
impl MockWhoop {
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn token_request_count(&self) -> usize {
        self.token_requests.lock().unwrap().len()
    }

    pub fn accept_token(&self, token: &str) {
        self.valid_tokens.lock().unwrap().insert(token.to_string());
    }

    pub fn fail_resource(&self, resource: &str) {
        *self.failing_resource.lock().unwrap() = Some(resource.to_string());
    }

    pub fn set_recovery(&self, records: Value) {
        *self.recovery.lock().unwrap() = records;
    }

    fn authorized(&self, headers: &HeaderMap) -> bool {
        headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .is_some_and(|token| self.valid_tokens.lock().unwrap().contains(token))
    }
}

async fn token(State(mock): State<Arc<MockWhoop>>, Json(body): Json<Value>) -> Response {
    mock.requests.fetch_add(1, Ordering::SeqCst);
    mock.token_requests.lock().unwrap().push(body);

    if mock.reject_tokens.load(Ordering::SeqCst) {
        return (
            StatusCode::BAD_REQUEST,
            r#"{"error":"invalid_grant"}"#.to_string(),
        )
            .into_response();
    }

    let n = mock.issued.fetch_add(1, Ordering::SeqCst) + 1;
    let access_token = format!("access-{}", n);
    mock.accept_token(&access_token);

    let mut response = json!({
        "access_token": access_token,
        "expires_in": 3600,
    });
    if !mock.omit_refresh_token.load(Ordering::SeqCst) {
        response["refresh_token"] = json!(format!("refresh-{}", n));
    }
    Json(response).into_response()
}

async fn profile(State(mock): State<Arc<MockWhoop>>, headers: HeaderMap) -> Response {
    mock.requests.fetch_add(1, Ordering::SeqCst);
    if !mock.authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(json!({
        "user_id": 42,
        "email": "athlete@example.com",
        "first_name": "Alex",
        "last_name": "Rivera"
    }))
    .into_response()
}

async fn data(
    State(mock): State<Arc<MockWhoop>>,
    Path(resource): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    mock.requests.fetch_add(1, Ordering::SeqCst);
    mock.data_requests
        .lock()
        .unwrap()
        .push((resource.clone(), query));

    if !mock.authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if mock.failing_resource.lock().unwrap().as_deref() == Some(resource.as_str()) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded").into_response();
    }

    let body = match resource.as_str() {
        "recovery" => mock.recovery.lock().unwrap().clone(),
        "sleep" => json!([
            {"date": "2024-01-14", "sleep_score": 78, "sleep_duration": 7.5},
            {"date": "2024-01-15", "sleep_score": 81, "sleep_duration": 8.0}
        ]),
        "workout" => json!([
            {"date": "2024-01-15", "type": "Resistance Training", "duration": 65, "strain": 12.8},
            {"date": "2024-01-15", "type": "Walk", "duration": 30, "strain": 3.2}
        ]),
        _ => return StatusCode::NOT_FOUND.into_response(),
    };
    Json(body).into_response()
}

/// Recovery records for `days` consecutive days ending 2024-01-15.
#[allow(dead_code)]
pub fn recovery_fixture(days: i64) -> Value {
    let last = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
    let records: Vec<Value> = (0..days)
        .map(|i| {
            let date = last - Duration::days(days - 1 - i);
            json!({
                "date": date.format("%Y-%m-%d").to_string(),
                "recovery_score": 50 + i,
                "resting_heart_rate": 55,
                "hrv": 80 + i
            })
        })
        .collect();
    Value::Array(records)
}

/// Start the fake Whoop API on a random local port.
pub async fn spawn_mock_whoop() -> (String, Arc<MockWhoop>) {
    let mock = Arc::new(MockWhoop::default());
    mock.set_recovery(recovery_fixture(14));

    let app = Router::new()
        .route("/oauth/token", post(token))
        .route("/v1/user/profile", get(profile))
        .route("/v1/{resource}", get(data))
        .with_state(mock.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock Whoop server");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), mock)
}

/// Integration wired to the fake server and an in-memory store.
pub fn test_integration(base_url: &str) -> (Arc<WhoopIntegration>, Arc<MemoryStore>) {
    let config = Config {
        api_base_url: base_url.to_string(),
        ..Config::default()
    };
    let store = Arc::new(MemoryStore::new());
    let integration = WhoopIntegration::new(config, store.clone());
    (Arc::new(integration), store)
}

/// Store a token record directly, bypassing the exchange.
#[allow(dead_code)]
pub fn seed_tokens(
    store: &Arc<MemoryStore>,
    access_token: &str,
    refresh_token: Option<&str>,
    expires_at: DateTime<Utc>,
) {
    TokenStore::new(store.clone())
        .save(&TokenRecord {
            access_token: access_token.to_string(),
            refresh_token: refresh_token.map(str::to_string),
            expires_at,
        })
        .unwrap();
}

/// A connected session: a token the mock accepts, valid for an hour.
#[allow(dead_code)]
pub fn seed_valid_session(store: &Arc<MemoryStore>, mock: &MockWhoop) {
    mock.accept_token("seeded-access");
    seed_tokens(
        store,
        "seeded-access",
        Some("seeded-refresh"),
        Utc::now() + Duration::hours(1),
    );
}
