// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Whoop token lifecycle.
//!
//! Unauthenticated → code exchange → Authenticated → expiry →
//! refresh → Authenticated. A rejected refresh drops back to
//! Unauthenticated; logout does so from any state.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::db::{keys, SharedStore, TokenStore};
use crate::error::{AppError, Result};
use crate::models::token::is_expired_at;
use crate::models::{TokenRecord, UserProfile};
use crate::services::authorization::{authorization_channel, AuthCallback, PendingAuthorization};
use crate::services::WhoopClient;

/// Owns every write to the token record.
#[derive(Clone)]
pub struct Authenticator {
    client: WhoopClient,
    tokens: TokenStore,
    store: SharedStore,
    /// Serializes refresh exchanges so a refresh token is only spent once.
    refresh_lock: Arc<Mutex<()>>,
}

impl Authenticator {
    pub fn new(client: WhoopClient, store: SharedStore) -> Self {
        Self {
            client,
            tokens: TokenStore::new(store.clone()),
            store,
            refresh_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    pub fn authorize_url(&self) -> String {
        self.client.authorize_url()
    }

    // ─── Authorization Handshake ─────────────────────────────────────────────

    /// Start a handshake for the authorize URL.
    pub fn begin_authorization(&self) -> (PendingAuthorization, AuthCallback) {
        authorization_channel(self.authorize_url())
    }

    /// Wait for the handshake to produce a code and exchange it.
    pub async fn complete_authorization(
        &self,
        pending: PendingAuthorization,
    ) -> Result<TokenRecord> {
        let code = pending.wait().await?;
        self.exchange_code_for_token(&code).await
    }

    // ─── Token State ─────────────────────────────────────────────────────────

    /// True if no expiry is stored or at most 5 minutes remain.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.tokens.expires_at() {
            Ok(expires_at) => is_expired_at(expires_at, now),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read token expiry, treating as expired");
                true
            }
        }
    }

    /// True if an access token is stored and not expired.
    pub fn has_valid_token(&self, now: DateTime<Utc>) -> bool {
        match self.tokens.load() {
            Ok(Some(record)) => !record.is_expired(now),
            Ok(None) => false,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read tokens");
                false
            }
        }
    }

    /// Check the stored connection against Whoop.
    ///
    /// Returns true iff a usable token exists and a profile fetch with it
    /// succeeds. At most one refresh exchange is attempted. Never errors:
    /// every failure is logged and reported as `false`.
    pub async fn initialize(&self) -> bool {
        let record = match self.tokens.load() {
            Ok(Some(record)) => record,
            Ok(None) => {
                tracing::debug!("No Whoop tokens stored");
                return false;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read Whoop tokens");
                return false;
            }
        };

        let mut access_token = record.access_token.clone();
        let mut refreshed = false;

        if record.is_expired(Utc::now()) {
            if record.refresh_token.is_none() {
                tracing::info!("Whoop access token expired and no refresh token stored");
                return false;
            }
            match self.refresh_access_token().await {
                Ok(fresh) => {
                    access_token = fresh.access_token;
                    refreshed = true;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Whoop token refresh failed during initialize");
                    return false;
                }
            }
        }

        match self.fetch_profile(&access_token).await {
            Ok(_) => return true,
            Err(e) if refreshed => {
                tracing::warn!(error = %e, "Whoop profile fetch failed after refresh");
                return false;
            }
            Err(e) => {
                tracing::info!(error = %e, "Whoop profile fetch failed, trying token refresh");
            }
        }

        let fresh = match self.refresh_access_token().await {
            Ok(fresh) => fresh,
            Err(e) => {
                tracing::warn!(error = %e, "Whoop token refresh failed during initialize");
                return false;
            }
        };

        match self.fetch_profile(&fresh.access_token).await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Whoop profile fetch failed after refresh");
                false
            }
        }
    }

    /// Fetch the profile and keep a copy in the store.
    pub async fn fetch_profile(&self, access_token: &str) -> Result<UserProfile> {
        let profile = self.client.get_profile(access_token).await?;
        self.tokens.set_profile(&profile)?;
        tracing::debug!(user_id = profile.user_id, "Whoop profile stored");
        Ok(profile)
    }

    // ─── Token Exchange ──────────────────────────────────────────────────────

    /// Exchange an authorization code and persist the resulting tokens.
    pub async fn exchange_code_for_token(&self, code: &str) -> Result<TokenRecord> {
        let response = self.client.exchange_code(code).await?;
        let record = TokenRecord::from_expires_in(
            response.access_token,
            response.refresh_token,
            response.expires_in,
            Utc::now(),
        );

        self.tokens.save(&record)?;
        tracing::info!(expires_at = %record.expires_at, "Whoop authorization complete, tokens stored");
        Ok(record)
    }

    /// Exchange the stored refresh token for a new access token.
    pub async fn refresh_access_token(&self) -> Result<TokenRecord> {
        let _guard = self.refresh_lock.lock().await;
        self.refresh_locked().await
    }

    /// Return a non-expired access token, refreshing once if needed.
    pub async fn valid_access_token(&self) -> Result<String> {
        // Fast path - no lock
        match self.tokens.load()? {
            Some(record) if !record.is_expired(Utc::now()) => return Ok(record.access_token),
            Some(_) => {}
            None => return Err(AppError::NotAuthenticated),
        }

        let _guard = self.refresh_lock.lock().await;

        // Another task may have refreshed while we were waiting.
        match self.tokens.load()? {
            Some(record) if !record.is_expired(Utc::now()) => return Ok(record.access_token),
            Some(_) => {}
            None => return Err(AppError::NotAuthenticated),
        }

        tracing::info!("Whoop access token expired, refreshing");
        Ok(self.refresh_locked().await?.access_token)
    }

    /// Caller must hold `refresh_lock`.
    async fn refresh_locked(&self) -> Result<TokenRecord> {
        let refresh_token = self
            .tokens
            .refresh_token()?
            .ok_or(AppError::NoRefreshToken)?;

        let response = match self.client.refresh_token(&refresh_token).await {
            Ok(response) => response,
            Err(e @ AppError::AuthExchange { .. }) => {
                tracing::warn!(error = %e, "Whoop rejected refresh token, clearing stored tokens");
                if let Err(clear_err) = self.tokens.clear() {
                    tracing::error!(error = %clear_err, "Failed to clear rejected tokens");
                }
                return Err(e);
            }
            Err(e) => return Err(e),
        };

        let record = TokenRecord::from_expires_in(
            response.access_token,
            response.refresh_token.or(Some(refresh_token)),
            response.expires_in,
            Utc::now(),
        );

        self.tokens.save(&record)?;
        tracing::info!(expires_at = %record.expires_at, "Whoop token refreshed");
        Ok(record)
    }

    // ─── Logout ──────────────────────────────────────────────────────────────

    /// Delete all persisted tokens and synced data. Safe to call repeatedly.
    pub fn logout(&self) -> Result<()> {
        let mut first_error = None;
        for key in keys::ALL {
            if let Err(e) = self.store.delete(key) {
                tracing::error!(key, error = %e, "Failed to delete key during logout");
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => {
                tracing::info!("Disconnected from Whoop");
                Ok(())
            }
        }
    }
}
