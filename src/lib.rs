// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Whoop recovery sync for the training dashboard.
//!
//! This crate connects to Whoop over OAuth, keeps the tokens fresh, pulls
//! recovery/sleep/workout data and reduces it to the daily, weekly and trend
//! summaries the dashboard reads.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::SharedStore;
use error::Result;
use models::SyncState;
use services::{
    AuthCallback, AuthMessage, Authenticator, DataSyncer, PendingAuthorization, WhoopClient,
};
use std::sync::{Arc, Mutex};

/// Everything the host needs, built once and shared by handle.
pub struct WhoopIntegration {
    pub config: Config,
    pub store: SharedStore,
    pub authenticator: Authenticator,
    pub syncer: Arc<DataSyncer>,
    /// Callback of the handshake currently in progress, if any.
    auth_callback: Mutex<Option<AuthCallback>>,
}

impl WhoopIntegration {
    pub fn new(config: Config, store: SharedStore) -> Self {
        let client = WhoopClient::from_config(&config);
        let authenticator = Authenticator::new(client.clone(), store.clone());
        let syncer = DataSyncer::new(client, authenticator.clone(), store.clone(), config.week_start)
            .with_window_days(config.sync_window_days);

        Self {
            config,
            store,
            authenticator,
            syncer: Arc::new(syncer),
            auth_callback: Mutex::new(None),
        }
    }

    /// Begin a new handshake. Any handshake still in progress is cancelled.
    pub fn start_authorization(&self) -> PendingAuthorization {
        let (pending, callback) = self.authenticator.begin_authorization();
        match self.auth_callback.lock() {
            Ok(mut slot) => {
                if slot.replace(callback).is_some() {
                    tracing::info!("Replacing unfinished Whoop authorization");
                }
            }
            Err(_) => tracing::error!("Authorization slot lock poisoned"),
        }
        pending
    }

    /// Deliver a redirect code to the handshake in progress.
    pub fn deliver_auth_code(&self, code: &str) -> bool {
        self.deliver_with(|callback| callback.deliver_code(code))
    }

    /// Deliver a refusal to the handshake in progress.
    pub fn deny_authorization(&self, reason: &str) -> bool {
        self.deliver_with(|callback| callback.deny(reason))
    }

    /// Forward a popup message. Unrelated message types leave the handshake waiting.
    pub fn deliver_auth_message(&self, message: &AuthMessage) -> bool {
        if !message.is_auth_code() {
            return false;
        }
        self.deliver_with(|callback| callback.deliver_message(message))
    }

    /// Run `deliver` on the callback in progress. The slot is only cleared
    /// once something was actually delivered; a rejected input (an empty
    /// code, say) leaves the handshake waiting.
    fn deliver_with(&self, deliver: impl FnOnce(&AuthCallback) -> bool) -> bool {
        let Ok(mut slot) = self.auth_callback.lock() else {
            tracing::error!("Authorization slot lock poisoned");
            return false;
        };
        let delivered = slot.as_ref().is_some_and(deliver);
        if delivered {
            slot.take();
        }
        delivered
    }

    fn take_callback(&self) -> Option<AuthCallback> {
        self.auth_callback.lock().ok().and_then(|mut slot| slot.take())
    }

    /// Finish a handshake and run the first sync.
    pub async fn connect(&self, pending: PendingAuthorization) -> Result<SyncState> {
        self.authenticator.complete_authorization(pending).await?;
        let access_token = self.authenticator.valid_access_token().await?;
        if let Err(e) = self.authenticator.fetch_profile(&access_token).await {
            tracing::warn!(error = %e, "Connected to Whoop but profile fetch failed");
        }
        self.syncer.sync().await
    }

    /// Forget tokens and synced data.
    pub fn disconnect(&self) -> Result<()> {
        if let Some(callback) = self.take_callback() {
            callback.cancel();
        }
        self.authenticator.logout()
    }
}
