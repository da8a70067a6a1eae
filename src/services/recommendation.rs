//! Training guidance derived from recovery data.

use serde::Serialize;

use crate::models::DailyMetric;

/// Color band for a recovery score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryZone {
    Red,
    Yellow,
    Green,
}

impl RecoveryZone {
    pub fn from_score(score: f64) -> Self {
        if score < 33.0 {
            RecoveryZone::Red
        } else if score < 66.0 {
            RecoveryZone::Yellow
        } else {
            RecoveryZone::Green
        }
    }
}

/// How hard to train today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrainingRecommendation {
    Excellent,
    Good,
    Moderate,
    Poor,
}

impl TrainingRecommendation {
    pub fn from_score(score: f64) -> Self {
        if score >= 85.0 {
            TrainingRecommendation::Excellent
        } else if score >= 70.0 {
            TrainingRecommendation::Good
        } else if score >= 55.0 {
            TrainingRecommendation::Moderate
        } else {
            TrainingRecommendation::Poor
        }
    }

    pub fn guidance(&self) -> &'static str {
        match self {
            TrainingRecommendation::Excellent => {
                "Excellent recovery. Push for PRs and higher intensity. Aim for 0-1 RIR on main lifts."
            }
            TrainingRecommendation::Good => {
                "Good recovery. Proceed with normal training as planned. Follow your regular intensity and volume."
            }
            TrainingRecommendation::Moderate => {
                "Moderate recovery. Consider reducing weight by 5-10% or decreasing total sets. Focus on quality over quantity."
            }
            TrainingRecommendation::Poor => {
                "Poor recovery. Focus on technique and mobility. Reduce weight by 20-30% or consider an active recovery day instead."
            }
        }
    }
}

/// Whether a change is good news for the athlete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeDirection {
    Better,
    Worse,
    Same,
}

/// Change of one metric against the previous day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricChange {
    pub delta: f64,
    pub direction: ChangeDirection,
}

impl MetricChange {
    fn new(latest: Option<f64>, previous: Option<f64>, higher_is_better: bool) -> Option<Self> {
        let delta = latest? - previous?;
        let direction = if delta == 0.0 {
            ChangeDirection::Same
        } else if (delta > 0.0) == higher_is_better {
            ChangeDirection::Better
        } else {
            ChangeDirection::Worse
        };
        Some(Self { delta, direction })
    }
}

/// Latest day compared with the one before it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DayOverDay {
    pub score: Option<MetricChange>,
    /// Lower resting heart rate is better.
    pub resting_heart_rate: Option<MetricChange>,
    pub hrv: Option<MetricChange>,
}

/// Compare the last two entries of an ascending series.
pub fn day_over_day(series: &[DailyMetric]) -> Option<DayOverDay> {
    let [.., previous, latest] = series else {
        return None;
    };

    Some(DayOverDay {
        score: MetricChange::new(latest.score, previous.score, true),
        resting_heart_rate: MetricChange::new(
            latest.resting_heart_rate,
            previous.resting_heart_rate,
            false,
        ),
        hrv: MetricChange::new(latest.hrv, previous.hrv, true),
    })
}
