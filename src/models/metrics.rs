//! Raw Whoop records and the per-day metrics derived from them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One recovery record from `GET /v1/recovery`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoveryRecord {
    pub date: NaiveDate,
    /// Recovery score, 0–100
    #[serde(default)]
    pub recovery_score: Option<f64>,
    /// Resting heart rate (bpm)
    #[serde(default)]
    pub resting_heart_rate: Option<f64>,
    /// Heart-rate variability (ms)
    #[serde(default)]
    pub hrv: Option<f64>,
}

/// One sleep record from `GET /v1/sleep`. Durations are in hours.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepRecord {
    pub date: NaiveDate,
    #[serde(default)]
    pub sleep_score: Option<f64>,
    #[serde(default)]
    pub sleep_duration: Option<f64>,
    #[serde(default)]
    pub deep_sleep: Option<f64>,
    #[serde(default)]
    pub rem_sleep: Option<f64>,
    #[serde(default)]
    pub light_sleep: Option<f64>,
}

/// One workout session from `GET /v1/workout`. Duration is in minutes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutRecord {
    pub date: NaiveDate,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub strain: Option<f64>,
    #[serde(default)]
    pub average_heart_rate: Option<f64>,
    #[serde(default)]
    pub max_heart_rate: Option<f64>,
    #[serde(default)]
    pub calories: Option<f64>,
}

/// Per-day summary; one per calendar date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyMetric {
    pub date: NaiveDate,
    /// Recovery score, 0–100
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub resting_heart_rate: Option<f64>,
    #[serde(default)]
    pub hrv: Option<f64>,
    #[serde(default)]
    pub sleep_score: Option<f64>,
    #[serde(default)]
    pub sleep_hours: Option<f64>,
    /// Sum of the day's workout strain
    #[serde(default)]
    pub strain: Option<f64>,
    /// Sum of the day's workout durations
    #[serde(default)]
    pub workout_minutes: Option<f64>,
}

impl DailyMetric {
    /// An entry for `date` with no samples.
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            score: None,
            resting_heart_rate: None,
            hrv: None,
            sleep_score: None,
            sleep_hours: None,
            strain: None,
            workout_minutes: None,
        }
    }

    /// Value of `field`, if sampled.
    pub fn value(&self, field: MetricField) -> Option<f64> {
        match field {
            MetricField::Score => self.score,
            MetricField::RestingHeartRate => self.resting_heart_rate,
            MetricField::Hrv => self.hrv,
            MetricField::SleepScore => self.sleep_score,
            MetricField::SleepHours => self.sleep_hours,
            MetricField::Strain => self.strain,
        }
    }
}

/// Aggregatable fields of [`DailyMetric`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricField {
    Score,
    RestingHeartRate,
    Hrv,
    SleepScore,
    SleepHours,
    Strain,
}

impl MetricField {
    pub const ALL: [MetricField; 6] = [
        MetricField::Score,
        MetricField::RestingHeartRate,
        MetricField::Hrv,
        MetricField::SleepScore,
        MetricField::SleepHours,
        MetricField::Strain,
    ];
}
