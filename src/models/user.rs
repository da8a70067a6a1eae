//! Whoop user profile.

use serde::{Deserialize, Serialize};

/// Basic profile returned by `GET /v1/user/profile`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Whoop user ID
    pub user_id: u64,
    /// Email address (may be None if not shared)
    #[serde(default)]
    pub email: Option<String>,
    /// First name
    #[serde(default)]
    pub first_name: String,
    /// Last name
    #[serde(default)]
    pub last_name: String,
}
