//! Typed access to the token and profile keys.

use super::{get_json, keys, set_json, SharedStore};
use crate::error::Result;
use crate::models::{TokenRecord, UserProfile};
use crate::time_utils::{format_utc_rfc3339, parse_utc_rfc3339};
use chrono::{DateTime, Utc};

/// Owns the persisted [`TokenRecord`]. Only the authenticator writes to it.
#[derive(Clone)]
pub struct TokenStore {
    store: SharedStore,
}

impl TokenStore {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub fn access_token(&self) -> Result<Option<String>> {
        self.store.get(keys::ACCESS_TOKEN)
    }

    pub fn refresh_token(&self) -> Result<Option<String>> {
        Ok(self
            .store
            .get(keys::REFRESH_TOKEN)?
            .filter(|token| !token.is_empty()))
    }

    /// Stored expiry. An unparseable value is treated as missing.
    pub fn expires_at(&self) -> Result<Option<DateTime<Utc>>> {
        let Some(raw) = self.store.get(keys::TOKEN_EXPIRES_AT)? else {
            return Ok(None);
        };
        let parsed = parse_utc_rfc3339(&raw);
        if parsed.is_none() {
            tracing::warn!(value = %raw, "Ignoring malformed token expiry");
        }
        Ok(parsed)
    }

    /// Full record, or `None` unless both an access token and an expiry are stored.
    pub fn load(&self) -> Result<Option<TokenRecord>> {
        let Some(access_token) = self.access_token()?.filter(|t| !t.is_empty()) else {
            return Ok(None);
        };
        let Some(expires_at) = self.expires_at()? else {
            return Ok(None);
        };

        Ok(Some(TokenRecord {
            access_token,
            refresh_token: self.refresh_token()?,
            expires_at,
        }))
    }

    /// Overwrite the stored record.
    pub fn save(&self, record: &TokenRecord) -> Result<()> {
        self.store.set(keys::ACCESS_TOKEN, &record.access_token)?;
        match &record.refresh_token {
            Some(refresh_token) => self.store.set(keys::REFRESH_TOKEN, refresh_token)?,
            None => self.store.delete(keys::REFRESH_TOKEN)?,
        }
        self.store
            .set(keys::TOKEN_EXPIRES_AT, &format_utc_rfc3339(record.expires_at))
    }

    /// Remove the token keys, leaving profile and sync data alone.
    pub fn clear(&self) -> Result<()> {
        for key in [keys::ACCESS_TOKEN, keys::REFRESH_TOKEN, keys::TOKEN_EXPIRES_AT] {
            self.store.delete(key)?;
        }
        Ok(())
    }

    pub fn profile(&self) -> Result<Option<UserProfile>> {
        get_json(self.store.as_ref(), keys::PROFILE)
    }

    pub fn set_profile(&self, profile: &UserProfile) -> Result<()> {
        set_json(self.store.as_ref(), keys::PROFILE, profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{KeyValueStore, MemoryStore};
    use chrono::Duration;
    use std::sync::Arc;

    fn token_store() -> (TokenStore, Arc<MemoryStore>) {
        let memory = Arc::new(MemoryStore::new());
        (TokenStore::new(memory.clone()), memory)
    }

    #[test]
    fn test_save_then_load() {
        let (tokens, _) = token_store();
        let record = TokenRecord {
            access_token: "access".to_string(),
            refresh_token: Some("refresh".to_string()),
            // Whole seconds so the RFC3339 round trip is exact
            expires_at: DateTime::from_timestamp(1_900_000_000, 0).unwrap(),
        };

        tokens.save(&record).unwrap();
        assert_eq!(tokens.load().unwrap(), Some(record));
    }

    #[test]
    fn test_save_without_refresh_token_removes_old_one() {
        let (tokens, memory) = token_store();
        memory.set(keys::REFRESH_TOKEN, "stale").unwrap();

        tokens
            .save(&TokenRecord {
                access_token: "access".to_string(),
                refresh_token: None,
                expires_at: Utc::now() + Duration::hours(1),
            })
            .unwrap();

        assert_eq!(tokens.refresh_token().unwrap(), None);
    }

    #[test]
    fn test_load_requires_expiry() {
        let (tokens, memory) = token_store();
        memory.set(keys::ACCESS_TOKEN, "access").unwrap();
        assert_eq!(tokens.load().unwrap(), None);

        memory.set(keys::TOKEN_EXPIRES_AT, "not a date").unwrap();
        assert_eq!(tokens.load().unwrap(), None);
    }

    #[test]
    fn test_clear_keeps_profile() {
        let (tokens, memory) = token_store();
        tokens
            .save(&TokenRecord {
                access_token: "access".to_string(),
                refresh_token: Some("refresh".to_string()),
                expires_at: Utc::now(),
            })
            .unwrap();
        tokens
            .set_profile(&UserProfile {
                user_id: 7,
                email: None,
                first_name: "Sam".to_string(),
                last_name: "Lee".to_string(),
            })
            .unwrap();

        tokens.clear().unwrap();

        assert_eq!(tokens.load().unwrap(), None);
        assert_eq!(tokens.profile().unwrap().map(|p| p.user_id), Some(7));
        assert_eq!(memory.len(), 1);
    }
}
