// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Whoop recovery sync server
//!
//! Keeps the dashboard's Whoop data fresh: restores or establishes the OAuth
//! connection, syncs on a schedule, and serves the callback and summary API.

use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use whoop_recovery::{
    config::Config,
    db::JsonFileStore,
    models::DailyMetric,
    services::recommendation::{RecoveryZone, TrainingRecommendation},
    WhoopIntegration,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(
        port = config.port,
        data_path = %config.data_path.display(),
        "Starting Whoop recovery sync"
    );

    let store = Arc::new(JsonFileStore::open(&config.data_path)?);
    let integration = Arc::new(WhoopIntegration::new(config.clone(), store));

    // Log a short summary whenever new data lands
    let mut updates = integration.syncer.subscribe();
    let listener = integration.clone();
    tokio::spawn(async move {
        loop {
            match updates.recv().await {
                Ok(_) => log_latest_recovery(&listener),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Missed data update notifications")
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    if integration.authenticator.initialize().await {
        tracing::info!("Whoop connection restored");
        if let Err(e) = integration.syncer.sync().await {
            tracing::warn!(error = %e, "Initial Whoop sync failed");
        }
    } else {
        let pending = integration.start_authorization();
        tracing::info!(
            url = %pending.authorize_url(),
            "Not connected to Whoop, open this URL to authorize"
        );
        let connector = integration.clone();
        tokio::spawn(async move {
            if let Err(e) = connector.connect(pending).await {
                tracing::warn!(error = %e, "Whoop connection did not complete");
            }
        });
    }

    let scheduler = integration
        .syncer
        .spawn_periodic_sync(config.sync_interval);
    tracing::info!(
        interval_secs = config.sync_interval.as_secs(),
        "Background sync scheduled"
    );

    // Build router
    let app = whoop_recovery::routes::create_router(integration);

    // Start server
    let addr = format!("127.0.0.1:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("Shutting down");
        })
        .await?;

    scheduler.abort();
    Ok(())
}

fn log_latest_recovery(integration: &WhoopIntegration) {
    match integration.syncer.latest_recovery_score() {
        Ok(Some(DailyMetric {
            date,
            score: Some(score),
            ..
        })) => tracing::info!(
            %date,
            score,
            zone = ?RecoveryZone::from_score(score),
            recommendation = TrainingRecommendation::from_score(score).guidance(),
            "Whoop data updated"
        ),
        Ok(_) => tracing::info!("Whoop data updated, no recovery days in window"),
        Err(e) => tracing::warn!(error = %e, "Failed to read synced Whoop data"),
    }
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("whoop_recovery=debug,info")),
        )
        .with(format)
        .init();
}
