// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod aggregate;
pub mod auth;
pub mod authorization;
pub mod recommendation;
pub mod sync;
pub mod whoop;

pub use auth::Authenticator;
pub use authorization::{AuthCallback, AuthMessage, PendingAuthorization};
pub use sync::{DataSyncer, DataUpdated};
pub use whoop::{TokenResponse, WhoopClient};
