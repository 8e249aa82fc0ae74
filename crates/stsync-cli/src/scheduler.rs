//! Periodic sync trigger.
//!
//! Registers one cron job that runs a full sync pass. A tick that fires while
//! the previous pass is still running is skipped, so two passes never write
//! the table at the same time.

use std::sync::Arc;

use stsync_core::AppConfig;
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use crate::run::{execute, RunOptions};

/// Builds and starts the scheduler with the sync job on `cron`.
///
/// The returned [`JobScheduler`] must be kept alive; dropping it stops the
/// job.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised, the
/// cron expression is rejected, or the scheduler fails to start.
pub(crate) async fn build_scheduler(
    config: Arc<AppConfig>,
    cron: &str,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;
    register_sync_job(&scheduler, config, cron).await?;
    scheduler.start().await?;
    Ok(scheduler)
}

async fn register_sync_job(
    scheduler: &JobScheduler,
    config: Arc<AppConfig>,
    cron: &str,
) -> Result<(), JobSchedulerError> {
    let in_flight = Arc::new(Mutex::new(()));

    let job = Job::new_async(cron, move |_uuid, _lock| {
        let config = Arc::clone(&config);
        let in_flight = Arc::clone(&in_flight);

        Box::pin(async move {
            let Ok(_guard) = in_flight.try_lock() else {
                tracing::warn!("scheduler: previous sync still running, skipping this tick");
                return;
            };

            tracing::info!("scheduler: starting sync run");
            let options = RunOptions::from_config(&config, false, None);
            match execute(&config, options).await {
                Ok(summary) if summary.is_success() => {
                    tracing::info!("scheduler: sync run complete");
                }
                Ok(_) => tracing::warn!("scheduler: sync run finished with failures"),
                Err(e) => tracing::error!(error = %e, "scheduler: sync run could not start"),
            }
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(cron, "scheduler: sync job registered");
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
pub(crate) async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, stopping scheduler");
}
