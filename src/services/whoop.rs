// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Whoop API client.
//!
//! Handles:
//! - Authorization URL construction
//! - Authorization-code and refresh-token exchanges
//! - Profile and recovery/sleep/workout fetches

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::{RecoveryRecord, SleepRecord, UserProfile, WorkoutRecord};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Scopes requested during authorization.
pub const WHOOP_SCOPES: &str = "read:recovery read:sleep read:workout read:profile";

/// Whoop API client.
#[derive(Clone)]
pub struct WhoopClient {
    http: reqwest::Client,
    base_url: String,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
}

impl WhoopClient {
    /// Create a new Whoop client with OAuth credentials.
    pub fn new(
        base_url: impl Into<String>,
        client_id: String,
        client_secret: String,
        redirect_uri: String,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client_id,
            client_secret,
            redirect_uri,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.api_base_url.clone(),
            config.whoop_client_id.clone(),
            config.whoop_client_secret.clone(),
            config.redirect_uri.clone(),
        )
    }

    /// URL the user opens to grant access.
    pub fn authorize_url(&self) -> String {
        format!(
            "{}/oauth/authorize?\
             response_type=code&\
             client_id={}&\
             redirect_uri={}&\
             scope={}",
            self.base_url,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode(WHOOP_SCOPES)
        )
    }

    /// Exchange an authorization code for tokens.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenResponse> {
        self.token_request(TokenRequest {
            client_id: &self.client_id,
            client_secret: &self.client_secret,
            grant_type: "authorization_code",
            code: Some(code),
            refresh_token: None,
            redirect_uri: &self.redirect_uri,
        })
        .await
    }

    /// Refresh an expired access token.
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<TokenResponse> {
        self.token_request(TokenRequest {
            client_id: &self.client_id,
            client_secret: &self.client_secret,
            grant_type: "refresh_token",
            code: None,
            refresh_token: Some(refresh_token),
            redirect_uri: &self.redirect_uri,
        })
        .await
    }

    async fn token_request(&self, request: TokenRequest<'_>) -> Result<TokenResponse> {
        let grant_type = request.grant_type;
        let response = self
            .http
            .post(format!("{}/oauth/token", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::WhoopApi(format!("Token request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, grant_type, body = %body, "Whoop token exchange failed");
            return Err(AppError::AuthExchange {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| AppError::WhoopApi(format!("Failed to parse token response: {}", e)))
    }

    /// Get the authenticated user's profile.
    pub async fn get_profile(&self, access_token: &str) -> Result<UserProfile> {
        let url = format!("{}/v1/user/profile", self.base_url);
        self.get_json(&url, access_token, &[]).await
    }

    /// Recovery records between `start` and `end` (inclusive).
    pub async fn get_recovery(
        &self,
        access_token: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<RecoveryRecord>> {
        self.get_collection("recovery", access_token, start, end)
            .await
    }

    pub async fn get_sleep(
        &self,
        access_token: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<SleepRecord>> {
        self.get_collection("sleep", access_token, start, end).await
    }

    pub async fn get_workouts(
        &self,
        access_token: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<WorkoutRecord>> {
        self.get_collection("workout", access_token, start, end)
            .await
    }

    async fn get_collection<T: for<'de> Deserialize<'de>>(
        &self,
        resource: &str,
        access_token: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<T>> {
        let url = format!("{}/v1/{}", self.base_url, resource);
        let query = [
            ("start_date", start.format("%Y-%m-%d").to_string()),
            ("end_date", end.format("%Y-%m-%d").to_string()),
        ];
        let records: Vec<T> = self.get_json(&url, access_token, &query).await?;
        tracing::debug!(resource, count = records.len(), "Fetched Whoop records");
        Ok(records)
    }

    /// Generic GET request with JSON response.
    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        access_token: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let response = self
            .http
            .get(url)
            .bearer_auth(access_token)
            .query(query)
            .send()
            .await
            .map_err(|e| AppError::WhoopApi(e.to_string()))?;

        self.check_response_json(response).await
    }

    /// Check response and parse JSON body.
    async fn check_response_json<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            if status.as_u16() == 429 {
                tracing::warn!("Whoop rate limit hit (429)");
            }

            return Err(AppError::ApiRequest {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| AppError::WhoopApi(format!("JSON parse error: {}", e)))
    }
}

/// JSON body posted to the token endpoint.
#[derive(Serialize)]
struct TokenRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    grant_type: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    refresh_token: Option<&'a str>,
    redirect_uri: &'a str,
}

/// Token endpoint response.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Lifetime of the access token in seconds
    pub expires_in: i64,
}
