//! OAuth token record held by the token store.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Margin before token expiration when we treat the token as expired (5 minutes).
pub const TOKEN_EXPIRY_MARGIN_SECS: i64 = 5 * 60;

/// Whoop OAuth tokens as persisted in the key-value store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    /// Bearer token for data endpoints
    pub access_token: String,
    /// Refresh token (Whoop only returns one when `offline` access was granted)
    pub refresh_token: Option<String>,
    /// When the access token expires
    pub expires_at: DateTime<Utc>,
}

impl TokenRecord {
    /// Build a record from a token endpoint response received at `now`.
    pub fn from_expires_in(
        access_token: String,
        refresh_token: Option<String>,
        expires_in_secs: i64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            access_token,
            refresh_token,
            expires_at: now + Duration::seconds(expires_in_secs),
        }
    }

    /// True once `now` is within the safety margin of the expiry, inclusive.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        is_expired_at(Some(self.expires_at), now)
    }
}

/// Expiry check shared by the store and the authenticator.
///
/// A missing expiry counts as expired.
pub fn is_expired_at(expires_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    match expires_at {
        Some(expires_at) => now >= expires_at - Duration::seconds(TOKEN_EXPIRY_MARGIN_SECS),
        None => true,
    }
}
