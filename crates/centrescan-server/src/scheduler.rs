//! Background job scheduler.
//!
//! Initialises a [`JobScheduler`] at server startup and registers the
//! recurring snapshot refresh and the nightly duplicate scan.

use std::sync::Arc;

use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use centrescan_engine::{CancelFlag, DedupeConfig};

use crate::api::AppState;

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive
/// for the lifetime of the process — dropping it shuts down all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// a job cannot be registered, or the scheduler fails to start.
pub async fn build_scheduler(state: AppState) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    register_snapshot_refresh_job(&scheduler, state.clone()).await?;
    register_dedupe_scan_job(&scheduler, state).await?;

    scheduler.start().await?;
    Ok(scheduler)
}

/// Register the periodic snapshot refresh.
///
/// Default schedule is every 15 minutes; `CENTRESCAN_SNAPSHOT_CRON`
/// overrides it through [`centrescan_core::AppConfig`].
async fn register_snapshot_refresh_job(
    scheduler: &JobScheduler,
    state: AppState,
) -> Result<(), JobSchedulerError> {
    let schedule = state.config.snapshot_refresh_cron.clone();

    let job = Job::new_async(schedule.as_str(), move |_uuid, _lock| {
        let state = state.clone();
        Box::pin(async move {
            refresh_snapshot(&state).await;
        })
    })?;

    scheduler.add(job).await?;
    Ok(())
}

/// Reload the corpus and swap the shared snapshot handle.
pub async fn refresh_snapshot(state: &AppState) {
    match centrescan_db::load_snapshot(&state.pool, &state.aliases).await {
        Ok(snapshot) => {
            let locations = snapshot.len();
            *state.snapshot.write().await = Arc::new(snapshot);
            tracing::info!(locations, "scheduler: snapshot refreshed");
        }
        Err(e) => {
            // Keep serving the previous snapshot rather than dropping to
            // an empty corpus.
            tracing::error!(error = %e, "scheduler: snapshot refresh failed");
        }
    }
}

/// Register the nightly duplicate scan.
///
/// Default schedule is 03:00 UTC; `CENTRESCAN_DEDUPE_CRON` overrides it.
/// The scanner is single-flight, so a run that collides with a manually
/// triggered scan is skipped with a log line.
async fn register_dedupe_scan_job(
    scheduler: &JobScheduler,
    state: AppState,
) -> Result<(), JobSchedulerError> {
    let schedule = state.config.dedupe_scan_cron.clone();

    let job = Job::new_async(schedule.as_str(), move |_uuid, _lock| {
        let state = state.clone();
        Box::pin(async move {
            run_dedupe_scan(&state).await;
        })
    })?;

    scheduler.add(job).await?;
    Ok(())
}

async fn run_dedupe_scan(state: &AppState) {
    if state.scanner.is_running() {
        tracing::info!("scheduler: duplicate scan already running; skipping nightly run");
        return;
    }

    let snapshot = state.snapshot().await;
    let scanner = state.scanner.clone();
    let config = DedupeConfig::from_app_config(&state.config);

    let result = tokio::task::spawn_blocking(move || {
        scanner.scan(snapshot.as_ref(), &config, &CancelFlag::new())
    })
    .await;

    match result {
        Ok(Ok(report)) => {
            tracing::info!(
                duplicates = report.pairs.len(),
                compared = report.compared_pairs,
                "scheduler: nightly duplicate scan complete"
            );
            *state.latest_scan.write().await = Some(report);
        }
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "scheduler: nightly duplicate scan not run");
        }
        Err(e) => {
            tracing::error!(error = %e, "scheduler: duplicate scan task failed");
        }
    }
}
