// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP surface tests.
//!
//! These tests verify that:
//! 1. The recovery summary is served from persisted data only
//! 2. The OAuth routes drive the handshake end to end
//! 3. Logout and manual sync report errors as JSON

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use chrono::{DateTime, NaiveDate};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use tower::ServiceExt;
use whoop_recovery::models::{DailyMetric, ProcessedAggregate, SyncState};
use whoop_recovery::routes::create_router;

mod common;
use common::{seed_valid_session, spawn_mock_whoop, test_integration};

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, json: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health() {
    let (app, _store) = test_integration("http://127.0.0.1:9");
    let response = create_router(app).oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "ok");
}

#[tokio::test]
async fn test_recovery_summary_without_data() {
    let (app, _store) = test_integration("http://127.0.0.1:9");
    let response = create_router(app)
        .oneshot(get("/api/recovery"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["connected"], false);
    assert!(json["latest"].is_null());
    assert!(json["recommendation"].is_null());
    assert_eq!(json["last_7_days"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_recovery_summary_from_persisted_state() {
    let (app, _store) = test_integration("http://127.0.0.1:9");
    let day = |n: u32, score: f64, rhr: f64| DailyMetric {
        score: Some(score),
        resting_heart_rate: Some(rhr),
        ..DailyMetric::empty(NaiveDate::from_ymd_opt(2024, 2, n).unwrap())
    };
    app.syncer
        .persist(&SyncState {
            last_synced_at: DateTime::from_timestamp(1_707_000_000, 0).unwrap(),
            latest_aggregate: ProcessedAggregate {
                window_start: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
                window_end: NaiveDate::from_ymd_opt(2024, 2, 9).unwrap(),
                daily: vec![day(8, 60.0, 56.0), day(9, 88.0, 52.0)],
                weekly: Vec::new(),
                trends: BTreeMap::new(),
            },
        })
        .unwrap();

    let response = create_router(app)
        .oneshot(get("/api/recovery"))
        .await
        .unwrap();
    let json = body_json(response).await;

    assert_eq!(json["latest"]["date"], "2024-02-09");
    assert_eq!(json["zone"], "green");
    assert_eq!(json["recommendation"]["tier"], "excellent");
    assert_eq!(json["day_over_day"]["score"]["delta"], 28.0);
    assert_eq!(json["day_over_day"]["resting_heart_rate"]["direction"], "better");
    assert_eq!(json["last_synced_at"], "2024-02-03T22:40:00Z");
}

#[tokio::test]
async fn test_auth_start_redirects_to_whoop() {
    let (base_url, _mock) = spawn_mock_whoop().await;
    let (app, _store) = test_integration(&base_url);

    let response = create_router(app)
        .oneshot(get("/auth/whoop"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    let location = response.headers()[header::LOCATION].to_str().unwrap();
    assert!(location.starts_with(&format!("{}/oauth/authorize?", base_url)));
    assert!(location.contains("scope=read%3Arecovery"));
}

#[tokio::test]
async fn test_callback_without_pending_authorization() {
    let (app, _store) = test_integration("http://127.0.0.1:9");
    let response = create_router(app)
        .oneshot(get("/auth/whoop/callback?code=abc"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_unrelated_message_is_ignored() {
    let (app, _store) = test_integration("http://127.0.0.1:9");
    let pending = app.start_authorization();
    let router = create_router(app.clone());

    let response = router
        .oneshot(post_json("/auth/whoop/message", r#"{"type":"RESIZE"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    // Handshake is still waiting for its code
    assert!(app.deliver_auth_code("late-code"));
    assert_eq!(pending.wait().await.unwrap(), "late-code");
}

#[tokio::test]
async fn test_message_flow_connects_and_syncs() {
    let (base_url, _mock) = spawn_mock_whoop().await;
    let (app, _store) = test_integration(&base_url);
    let router = create_router(app.clone());
    let mut updates = app.syncer.subscribe();

    let response = router.clone().oneshot(get("/auth/whoop")).await.unwrap();
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);

    let response = router
        .oneshot(post_json(
            "/auth/whoop/message",
            r#"{"type":"WHOOP_AUTH_CODE","code":"from-popup"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // Exchange and first sync run in the background
    tokio::time::timeout(Duration::from_secs(5), updates.recv())
        .await
        .expect("no sync within timeout")
        .unwrap();

    assert!(app.authenticator.tokens().load().unwrap().is_some());
    assert_eq!(
        app.authenticator.tokens().profile().unwrap().unwrap().user_id,
        42
    );
    assert!(app.syncer.latest_recovery_score().unwrap().is_some());
}

#[tokio::test]
async fn test_callback_error_denies_authorization() {
    let (app, _store) = test_integration("http://127.0.0.1:9");
    let pending = app.start_authorization();

    let response = create_router(app.clone())
        .oneshot(get(
            "/auth/whoop/callback?error=access_denied&error_description=user%20said%20no",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let err = pending.wait().await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Whoop authorization denied: access_denied: user said no"
    );
}

#[tokio::test]
async fn test_logout_clears_store() {
    let (base_url, mock) = spawn_mock_whoop().await;
    let (app, store) = test_integration(&base_url);
    seed_valid_session(&store, &mock);

    let response = create_router(app)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/logout")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_sync_now_requires_connection() {
    let (app, _store) = test_integration("http://127.0.0.1:9");
    let response = create_router(app)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/sync")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"], "not_connected");
}

#[tokio::test]
async fn test_sync_now_reports_counts() {
    let (base_url, mock) = spawn_mock_whoop().await;
    let (app, store) = test_integration(&base_url);
    seed_valid_session(&store, &mock);

    let response = create_router(app)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/sync")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["days"], 14);
    assert_eq!(json["weeks"], 3);
}

#[tokio::test]
async fn test_callback_with_blank_code_keeps_handshake() {
    let (app, _store) = test_integration("http://127.0.0.1:9");
    let pending = app.start_authorization();
    let router = create_router(app.clone());

    let response = router
        .clone()
        .oneshot(get("/auth/whoop/callback?code="))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = router
        .oneshot(get("/auth/whoop/callback?code=good-code"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(pending.wait().await.unwrap(), "good-code");
}

#[tokio::test]
async fn test_recovery_summary_ignores_trailing_workout_day() {
    let (app, _store) = test_integration("http://127.0.0.1:9");
    let day = |n: u32| DailyMetric::empty(NaiveDate::from_ymd_opt(2024, 2, n).unwrap());
    app.syncer
        .persist(&SyncState {
            last_synced_at: DateTime::from_timestamp(1_707_000_000, 0).unwrap(),
            latest_aggregate: ProcessedAggregate {
                window_start: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
                window_end: NaiveDate::from_ymd_opt(2024, 2, 9).unwrap(),
                daily: vec![
                    DailyMetric {
                        score: Some(50.0),
                        ..day(6)
                    },
                    DailyMetric {
                        score: Some(72.0),
                        ..day(7)
                    },
                    DailyMetric {
                        strain: Some(15.0),
                        workout_minutes: Some(80.0),
                        ..day(8)
                    },
                ],
                weekly: Vec::new(),
                trends: BTreeMap::new(),
            },
        })
        .unwrap();

    let response = create_router(app)
        .oneshot(get("/api/recovery"))
        .await
        .unwrap();
    let json = body_json(response).await;

    assert_eq!(json["latest"]["date"], "2024-02-07");
    assert_eq!(json["zone"], "green");
    assert_eq!(json["recommendation"]["tier"], "good");
    assert_eq!(json["day_over_day"]["score"]["delta"], 22.0);
    assert_eq!(json["last_7_days"].as_array().unwrap().len(), 2);
}
