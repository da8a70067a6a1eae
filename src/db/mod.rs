//! Storage layer: an injected key-value store plus typed helpers on top.
//!
//! Every persisted value lives under its own key and can be read or written
//! independently of the others.

pub mod file;
pub mod memory;
pub mod tokens;

pub use file::JsonFileStore;
pub use memory::MemoryStore;
pub use tokens::TokenStore;

use crate::error::{AppError, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;

/// Key names as constants.
pub mod keys {
    pub const ACCESS_TOKEN: &str = "whoop.access_token";
    pub const REFRESH_TOKEN: &str = "whoop.refresh_token";
    pub const TOKEN_EXPIRES_AT: &str = "whoop.token_expires_at";
    pub const PROFILE: &str = "whoop.profile";
    pub const LAST_SYNC: &str = "whoop.last_sync";
    /// Serialized `ProcessedAggregate` from the last sync
    pub const PROCESSED_DATA: &str = "whoop.processed_data";

    /// Everything owned by the Whoop integration, cleared on logout.
    pub const ALL: [&str; 6] = [
        ACCESS_TOKEN,
        REFRESH_TOKEN,
        TOKEN_EXPIRES_AT,
        PROFILE,
        LAST_SYNC,
        PROCESSED_DATA,
    ];
}

/// String key-value storage capability.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    /// Deleting a missing key is not an error.
    fn delete(&self, key: &str) -> Result<()>;
}

/// Shared handle to the store used by every component.
pub type SharedStore = Arc<dyn KeyValueStore>;

/// Read and decode a JSON value.
pub fn get_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Result<Option<T>> {
    match store.get(key)? {
        Some(raw) => serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| AppError::Storage(format!("Malformed value under {}: {}", key, e))),
        None => Ok(None),
    }
}

/// Encode and write a JSON value.
pub fn set_json<T: Serialize>(store: &dyn KeyValueStore, key: &str, value: &T) -> Result<()> {
    let raw = serde_json::to_string(value)
        .map_err(|e| AppError::Storage(format!("Failed to encode {}: {}", key, e)))?;
    store.set(key, &raw)
}
