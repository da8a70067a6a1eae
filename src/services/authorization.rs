//! OAuth authorization handshake as an async operation.
//!
//! Whoever receives the redirect (an HTTP callback, a window message, a CLI
//! prompt) holds the [`AuthCallback`] and pushes the outcome into it; the
//! [`PendingAuthorization`] resolves with the code, a denial, or a
//! cancellation once the callback is dropped.

use serde::Deserialize;
use std::sync::Mutex;
use tokio::sync::oneshot;

use crate::error::{AppError, Result};

/// `type` of the message carrying an authorization code.
pub const AUTH_CODE_MESSAGE_TYPE: &str = "WHOOP_AUTH_CODE";

/// Message posted back by the authorization popup.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthMessage {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub code: Option<String>,
}

impl AuthMessage {
    pub fn is_auth_code(&self) -> bool {
        self.kind == AUTH_CODE_MESSAGE_TYPE
    }
}

#[derive(Debug)]
enum AuthOutcome {
    Code(String),
    Denied(String),
}

/// Create a linked pending authorization and its callback.
pub fn authorization_channel(authorize_url: String) -> (PendingAuthorization, AuthCallback) {
    let (sender, receiver) = oneshot::channel();
    (
        PendingAuthorization {
            authorize_url,
            receiver,
        },
        AuthCallback {
            sender: Mutex::new(Some(sender)),
        },
    )
}

/// Waiting side of the handshake.
#[derive(Debug)]
pub struct PendingAuthorization {
    authorize_url: String,
    receiver: oneshot::Receiver<AuthOutcome>,
}

impl PendingAuthorization {
    /// URL the user must open to grant access.
    pub fn authorize_url(&self) -> &str {
        &self.authorize_url
    }

    /// Wait for the authorization code.
    pub async fn wait(self) -> Result<String> {
        match self.receiver.await {
            Ok(AuthOutcome::Code(code)) => Ok(code),
            Ok(AuthOutcome::Denied(reason)) => Err(AppError::AuthorizationDenied(reason)),
            Err(_) => Err(AppError::AuthorizationCancelled),
        }
    }
}

/// Delivering side of the handshake. Only the first outcome is used.
#[derive(Debug)]
pub struct AuthCallback {
    sender: Mutex<Option<oneshot::Sender<AuthOutcome>>>,
}

impl AuthCallback {
    /// Hand over the code. Returns false if nothing was waiting for it.
    pub fn deliver_code(&self, code: &str) -> bool {
        let code = code.trim();
        if code.is_empty() {
            tracing::warn!("Ignoring empty Whoop authorization code");
            return false;
        }
        self.send(AuthOutcome::Code(code.to_string()))
    }

    /// Forward a popup message; messages of any other type are ignored.
    pub fn deliver_message(&self, message: &AuthMessage) -> bool {
        if !message.is_auth_code() {
            tracing::debug!(kind = %message.kind, "Ignoring unrelated auth message");
            return false;
        }
        match message.code.as_deref() {
            Some(code) => self.deliver_code(code),
            None => self.deny("authorization message without code"),
        }
    }

    /// Report that the user (or Whoop) refused access.
    pub fn deny(&self, reason: &str) -> bool {
        self.send(AuthOutcome::Denied(reason.to_string()))
    }

    /// Abandon the handshake; the pending side resolves as cancelled.
    pub fn cancel(&self) {
        if let Ok(mut sender) = self.sender.lock() {
            sender.take();
        }
    }

    /// True while the pending side is still waiting.
    pub fn is_pending(&self) -> bool {
        self.sender
            .lock()
            .map(|sender| sender.as_ref().is_some_and(|s| !s.is_closed()))
            .unwrap_or(false)
    }

    fn send(&self, outcome: AuthOutcome) -> bool {
        let Ok(mut sender) = self.sender.lock() else {
            return false;
        };
        match sender.take() {
            Some(sender) => sender.send(outcome).is_ok(),
            None => false,
        }
    }
}
