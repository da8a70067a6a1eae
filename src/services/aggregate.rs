//! Pure reductions from raw Whoop records to dashboard aggregates.
//!
//! Nothing in here touches the network or the store.

use chrono::{NaiveDate, Weekday};
use std::collections::BTreeMap;

use crate::models::{
    DailyMetric, MetricField, ProcessedAggregate, RecoveryRecord, SleepRecord, TrendLabel,
    WeeklyAggregate, WorkoutRecord,
};
use crate::time_utils::week_start;

/// Samples needed before a trend is reported.
pub const TREND_MIN_SAMPLES: usize = 14;
/// Size of each comparison window.
const TREND_WINDOW: usize = 7;
/// Relative change that counts as a real move (5%).
const TREND_THRESHOLD: f64 = 0.05;

/// Reduce one fetch window to the persisted aggregate.
pub fn process_window(
    window_start: NaiveDate,
    window_end: NaiveDate,
    recovery: &[RecoveryRecord],
    sleep: &[SleepRecord],
    workouts: &[WorkoutRecord],
    first_day: Weekday,
) -> ProcessedAggregate {
    let daily = daily_metrics(recovery, sleep, workouts);
    let weekly = weekly_averages(&daily, &MetricField::ALL, first_day);
    let trends = field_trends(&daily, &MetricField::ALL);

    ProcessedAggregate {
        window_start,
        window_end,
        daily,
        weekly,
        trends,
    }
}

/// Merge raw records into one [`DailyMetric`] per date, ascending.
///
/// Recovery and sleep are one-per-day; if Whoop returns two for the same
/// date the later one in the response wins. Workouts are summed per day.
pub fn daily_metrics(
    recovery: &[RecoveryRecord],
    sleep: &[SleepRecord],
    workouts: &[WorkoutRecord],
) -> Vec<DailyMetric> {
    let mut days: BTreeMap<NaiveDate, DailyMetric> = BTreeMap::new();

    for record in recovery {
        let day = days
            .entry(record.date)
            .or_insert_with(|| DailyMetric::empty(record.date));
        day.score = finite(record.recovery_score);
        day.resting_heart_rate = finite(record.resting_heart_rate);
        day.hrv = finite(record.hrv);
    }

    for record in sleep {
        let day = days
            .entry(record.date)
            .or_insert_with(|| DailyMetric::empty(record.date));
        day.sleep_score = finite(record.sleep_score);
        day.sleep_hours = finite(record.sleep_duration);
    }

    for workout in workouts {
        let day = days
            .entry(workout.date)
            .or_insert_with(|| DailyMetric::empty(workout.date));
        if let Some(strain) = finite(workout.strain) {
            *day.strain.get_or_insert(0.0) += strain;
        }
        if let Some(minutes) = finite(workout.duration) {
            *day.workout_minutes.get_or_insert(0.0) += minutes;
        }
    }

    days.into_values().collect()
}

/// Average each field per calendar week, ascending by week start.
///
/// Weeks begin on `first_day`. A field with no finite samples in a week
/// averages to `None`. The result does not depend on input order.
pub fn weekly_averages(
    daily: &[DailyMetric],
    fields: &[MetricField],
    first_day: Weekday,
) -> Vec<WeeklyAggregate> {
    let mut weeks: BTreeMap<NaiveDate, BTreeMap<MetricField, Vec<f64>>> = BTreeMap::new();

    for day in daily {
        let samples = weeks.entry(week_start(day.date, first_day)).or_default();
        for &field in fields {
            let bucket = samples.entry(field).or_default();
            if let Some(value) = finite(day.value(field)) {
                bucket.push(value);
            }
        }
    }

    weeks
        .into_iter()
        .map(|(week_start, mut samples)| WeeklyAggregate {
            week_start,
            averages: fields
                .iter()
                .map(|&field| {
                    let values = samples.remove(&field).unwrap_or_default();
                    (field, sorted_mean(values))
                })
                .collect(),
        })
        .collect()
}

/// Classify the last 7 values against the 7 before them.
///
/// With a zero baseline the sign of the recent mean decides.
pub fn trend(values: &[f64]) -> TrendLabel {
    if values.len() < TREND_MIN_SAMPLES {
        return TrendLabel::InsufficientData;
    }

    let recent = &values[values.len() - TREND_WINDOW..];
    let older = &values[values.len() - 2 * TREND_WINDOW..values.len() - TREND_WINDOW];
    let recent_mean = mean(recent);
    let older_mean = mean(older);

    if older_mean == 0.0 {
        return if recent_mean > 0.0 {
            TrendLabel::Improving
        } else if recent_mean < 0.0 {
            TrendLabel::Declining
        } else {
            TrendLabel::Stable
        };
    }

    let change = (recent_mean - older_mean) / older_mean.abs();
    if change > TREND_THRESHOLD {
        TrendLabel::Improving
    } else if change < -TREND_THRESHOLD {
        TrendLabel::Declining
    } else {
        TrendLabel::Stable
    }
}

/// Trend per field over the sampled days, in date order.
pub fn field_trends(
    daily: &[DailyMetric],
    fields: &[MetricField],
) -> BTreeMap<MetricField, TrendLabel> {
    let mut ordered: Vec<&DailyMetric> = daily.iter().collect();
    ordered.sort_by_key(|day| day.date);

    fields
        .iter()
        .map(|&field| {
            let values: Vec<f64> = ordered
                .iter()
                .filter_map(|day| finite(day.value(field)))
                .collect();
            (field, trend(&values))
        })
        .collect()
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Mean summed in sorted order so permuted input gives identical bits.
fn sorted_mean(mut values: Vec<f64>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    Some(mean(&values))
}
