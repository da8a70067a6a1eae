//! Sync aggregates persisted for the dashboard.
//!
//! The whole [`SyncState`] is recomputed on every sync and overwrites the
//! previous blob; no history is kept beyond the fetch window.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::{DailyMetric, MetricField};

/// Per-field averages for one calendar week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyAggregate {
    /// First day of the week
    pub week_start: NaiveDate,
    /// Average per field; `None` when the week has no samples for it
    pub averages: BTreeMap<MetricField, Option<f64>>,
}

impl WeeklyAggregate {
    pub fn average(&self, field: MetricField) -> Option<f64> {
        self.averages.get(&field).copied().flatten()
    }
}

/// Direction of the last week compared with the week before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendLabel {
    Improving,
    Declining,
    Stable,
    InsufficientData,
}

/// Everything derived from one fetch window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedAggregate {
    pub window_start: NaiveDate,
    pub window_end: NaiveDate,
    /// Daily metrics, ascending by date
    #[serde(default)]
    pub daily: Vec<DailyMetric>,
    /// Weekly averages, ascending by week start
    #[serde(default)]
    pub weekly: Vec<WeeklyAggregate>,
    #[serde(default)]
    pub trends: BTreeMap<MetricField, TrendLabel>,
}

/// Result of the last successful sync.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncState {
    pub last_synced_at: DateTime<Utc>,
    pub latest_aggregate: ProcessedAggregate,
}
