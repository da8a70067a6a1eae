// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Whoop data sync.
//!
//! Handles the core workflow:
//! 1. Obtain a valid access token
//! 2. Fetch recovery, sleep and workouts for the window (concurrently)
//! 3. Aggregate into daily/weekly summaries and trends
//! 4. Persist the aggregate blob and last-sync time
//! 5. Notify subscribers

use chrono::{DateTime, Duration, SubsecRound, Utc, Weekday};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::db::{get_json, keys, set_json, SharedStore};
use crate::error::{AppError, Result};
use crate::models::{DailyMetric, ProcessedAggregate, SyncState};
use crate::services::aggregate::process_window;
use crate::services::{Authenticator, WhoopClient};
use crate::time_utils::{format_utc_rfc3339, parse_utc_rfc3339};

/// Days fetched by a default sync.
pub const DEFAULT_SYNC_WINDOW_DAYS: u32 = 30;

/// Entries returned by [`DataSyncer::last_7_days_recovery`].
const RECENT_DAYS: usize = 7;

/// Zero-payload signal sent after every successful sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataUpdated;

/// Fetches, aggregates and persists Whoop data.
pub struct DataSyncer {
    client: WhoopClient,
    auth: Authenticator,
    store: SharedStore,
    events: broadcast::Sender<DataUpdated>,
    week_start: Weekday,
    window_days: u32,
    /// Overlapping syncs run one after the other.
    sync_lock: Mutex<()>,
}

impl DataSyncer {
    pub fn new(
        client: WhoopClient,
        auth: Authenticator,
        store: SharedStore,
        week_start: Weekday,
    ) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            client,
            auth,
            store,
            events,
            week_start,
            window_days: DEFAULT_SYNC_WINDOW_DAYS,
            sync_lock: Mutex::new(()),
        }
    }

    /// Override the default 30-day window used by [`sync`](Self::sync).
    pub fn with_window_days(mut self, days: u32) -> Self {
        self.window_days = days;
        self
    }

    /// Receive a [`DataUpdated`] after each successful sync.
    pub fn subscribe(&self) -> broadcast::Receiver<DataUpdated> {
        self.events.subscribe()
    }

    /// Sync the configured window.
    pub async fn sync(&self) -> Result<SyncState> {
        self.sync_window(self.window_days).await
    }

    /// Fetch `[today - days, today]`, aggregate, persist and notify.
    ///
    /// All-or-nothing: if any fetch fails the error is wrapped in
    /// [`AppError::Sync`] and the previous state is left untouched.
    pub async fn sync_window(&self, days: u32) -> Result<SyncState> {
        let _guard = self.sync_lock.lock().await;

        let access_token = self.auth.valid_access_token().await?;

        let end = Utc::now().date_naive();
        let start = end
            .checked_sub_signed(Duration::days(i64::from(days)))
            .ok_or_else(|| anyhow::anyhow!("sync window of {} days is out of range", days))?;
        tracing::info!(%start, %end, "Syncing Whoop data");

        let (recovery, sleep, workouts) = tokio::try_join!(
            self.client.get_recovery(&access_token, start, end),
            self.client.get_sleep(&access_token, start, end),
            self.client.get_workouts(&access_token, start, end),
        )
        .map_err(|e| {
            tracing::error!(error = %e, "Whoop fetch failed, sync aborted");
            AppError::Sync(Box::new(e))
        })?;

        let aggregate = process_window(start, end, &recovery, &sleep, &workouts, self.week_start);
        let state = SyncState {
            last_synced_at: Utc::now().trunc_subsecs(0),
            latest_aggregate: aggregate,
        };

        self.persist(&state)?;
        // No subscribers is fine
        let _ = self.events.send(DataUpdated);

        tracing::info!(
            days = state.latest_aggregate.daily.len(),
            weeks = state.latest_aggregate.weekly.len(),
            recovery = recovery.len(),
            sleep = sleep.len(),
            workouts = workouts.len(),
            "Whoop sync complete"
        );
        Ok(state)
    }

    /// Overwrite the persisted state.
    pub fn persist(&self, state: &SyncState) -> Result<()> {
        set_json(self.store.as_ref(), keys::PROCESSED_DATA, &state.latest_aggregate)?;
        self.store
            .set(keys::LAST_SYNC, &format_utc_rfc3339(state.last_synced_at))
    }

    pub fn load_aggregate(&self) -> Result<Option<ProcessedAggregate>> {
        get_json(self.store.as_ref(), keys::PROCESSED_DATA)
    }

    pub fn last_synced_at(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(self
            .store
            .get(keys::LAST_SYNC)?
            .and_then(|raw| parse_utc_rfc3339(&raw)))
    }

    /// Persisted state, if both the aggregate and the sync time are present.
    pub fn load_state(&self) -> Result<Option<SyncState>> {
        let (Some(latest_aggregate), Some(last_synced_at)) =
            (self.load_aggregate()?, self.last_synced_at()?)
        else {
            return Ok(None);
        };
        Ok(Some(SyncState {
            last_synced_at,
            latest_aggregate,
        }))
    }

    /// Persisted days that carry a recovery score.
    ///
    /// Days holding only sleep or workouts are left out.
    fn recovery_days(&self) -> Result<Vec<DailyMetric>> {
        let Some(aggregate) = self.load_aggregate()? else {
            return Ok(Vec::new());
        };
        Ok(aggregate
            .daily
            .into_iter()
            .filter(|day| day.score.is_some())
            .collect())
    }

    /// Most recent scored day in the persisted aggregate.
    pub fn latest_recovery_score(&self) -> Result<Option<DailyMetric>> {
        Ok(self
            .recovery_days()?
            .into_iter()
            .max_by_key(|day| day.date))
    }

    /// Up to the last 7 scored days, ascending by date.
    pub fn last_7_days_recovery(&self) -> Result<Vec<DailyMetric>> {
        let mut daily = self.recovery_days()?;
        daily.sort_by_key(|day| day.date);
        let skip = daily.len().saturating_sub(RECENT_DAYS);
        Ok(daily.split_off(skip))
    }

    // ─── Background Sync ─────────────────────────────────────────────────────

    /// One scheduler tick: sync if connected, log failures.
    ///
    /// Returns whether a sync was attempted.
    pub async fn run_scheduled_sync(&self) -> bool {
        if !self.auth.has_valid_token(Utc::now()) {
            tracing::debug!("Skipping scheduled Whoop sync, no valid token");
            return false;
        }

        if let Err(e) = self.sync().await {
            tracing::warn!(error = %e, "Scheduled Whoop sync failed");
        }
        true
    }

    /// Run [`run_scheduled_sync`](Self::run_scheduled_sync) every `period`,
    /// first tick one period from now. Abort the handle to stop.
    pub fn spawn_periodic_sync(self: &Arc<Self>, period: std::time::Duration) -> JoinHandle<()> {
        let syncer = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                syncer.run_scheduled_sync().await;
            }
        })
    }
}
