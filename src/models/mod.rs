// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod metrics;
pub mod stats;
pub mod token;
pub mod user;

pub use metrics::{DailyMetric, MetricField, RecoveryRecord, SleepRecord, WorkoutRecord};
pub use stats::{ProcessedAggregate, SyncState, TrendLabel, WeeklyAggregate};
pub use token::TokenRecord;
pub use user::UserProfile;
