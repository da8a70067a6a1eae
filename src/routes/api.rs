// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Dashboard API routes.

use crate::error::Result;
use crate::models::{DailyMetric, MetricField, TrendLabel};
use crate::services::recommendation::{
    day_over_day, DayOverDay, RecoveryZone, TrainingRecommendation,
};
use crate::time_utils::format_utc_rfc3339;
use crate::WhoopIntegration;
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

pub fn routes() -> Router<Arc<WhoopIntegration>> {
    Router::new()
        .route("/api/recovery", get(get_recovery))
        .route("/api/sync", post(sync_now))
}

// ─── Recovery Summary ────────────────────────────────────────

/// Recommendation tier with its guidance text.
#[derive(Debug, Serialize)]
pub struct RecommendationView {
    pub tier: TrainingRecommendation,
    pub guidance: &'static str,
}

/// Everything the recovery widget shows.
#[derive(Debug, Serialize)]
pub struct RecoverySummary {
    pub connected: bool,
    pub last_synced_at: Option<String>,
    pub latest: Option<DailyMetric>,
    pub last_7_days: Vec<DailyMetric>,
    pub day_over_day: Option<DayOverDay>,
    pub zone: Option<RecoveryZone>,
    pub recommendation: Option<RecommendationView>,
    pub trends: BTreeMap<MetricField, TrendLabel>,
}

impl RecoverySummary {
    /// Assemble from persisted data only; never calls Whoop.
    pub fn load(state: &WhoopIntegration) -> Result<Self> {
        let syncer = &state.syncer;
        let latest = syncer.latest_recovery_score()?;
        let last_7_days = syncer.last_7_days_recovery()?;
        let trends = syncer
            .load_aggregate()?
            .map(|aggregate| aggregate.trends)
            .unwrap_or_default();
        let score = latest.as_ref().and_then(|day| day.score);

        Ok(Self {
            connected: state.authenticator.has_valid_token(Utc::now()),
            last_synced_at: syncer.last_synced_at()?.map(format_utc_rfc3339),
            day_over_day: day_over_day(&last_7_days),
            zone: score.map(RecoveryZone::from_score),
            recommendation: score.map(|score| {
                let tier = TrainingRecommendation::from_score(score);
                RecommendationView {
                    tier,
                    guidance: tier.guidance(),
                }
            }),
            latest,
            last_7_days,
            trends,
        })
    }
}

async fn get_recovery(State(state): State<Arc<WhoopIntegration>>) -> Result<Json<RecoverySummary>> {
    Ok(Json(RecoverySummary::load(&state)?))
}

// ─── Manual Sync ─────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct SyncResponse {
    pub last_synced_at: String,
    pub days: usize,
    pub weeks: usize,
}

/// "Sync now" - same path as the scheduled sync, but errors are returned.
async fn sync_now(State(state): State<Arc<WhoopIntegration>>) -> Result<Json<SyncResponse>> {
    let sync = state.syncer.sync().await?;
    Ok(Json(SyncResponse {
        last_synced_at: format_utc_rfc3339(sync.last_synced_at),
        days: sync.latest_aggregate.daily.len(),
        weeks: sync.latest_aggregate.weekly.len(),
    }))
}
