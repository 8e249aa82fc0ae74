//! The `run` command: one full sync pass under a deadline.

use std::time::{Duration, Instant};

use anyhow::Context;
use stsync_core::AppConfig;
use stsync_db::{ContactTable, PoolConfig};
use stsync_servicetitan::{ClientSettings, CustomerStream, ServiceTitanClient};

use crate::pipeline::{run_pipeline, ContactSink, PipelineOptions, RunStatus, RunSummary};
use crate::sinks::{JsonLinesSink, PgSink};

#[derive(Debug, Clone, Copy)]
pub(crate) struct RunOptions {
    pub dry_run: bool,
    pub max_runtime: Duration,
}

impl RunOptions {
    pub(crate) fn from_config(
        config: &AppConfig,
        dry_run: bool,
        max_runtime_secs: Option<u64>,
    ) -> Self {
        Self {
            dry_run,
            max_runtime: Duration::from_secs(
                max_runtime_secs.unwrap_or(config.max_runtime_secs),
            ),
        }
    }
}

pub(crate) fn pipeline_options(config: &AppConfig) -> PipelineOptions {
    PipelineOptions {
        normalize: config.normalize_options(),
        sink_max_attempts: config.sink_max_attempts,
        sink_retry_delay: Duration::from_millis(config.sink_retry_delay_ms),
    }
}

/// Runs one sync pass and returns its summary, already logged.
///
/// Setup failures (bad client settings, unreachable database) are returned
/// as errors. Failures during the pass are reflected in the summary status.
pub(crate) async fn execute(
    config: &AppConfig,
    options: RunOptions,
) -> anyhow::Result<RunSummary> {
    let client = ServiceTitanClient::new(ClientSettings::from_app_config(config))
        .context("failed to build ServiceTitan client")?;

    let summary = if options.dry_run {
        tracing::info!("dry run: rows are printed to stdout, database is not touched");
        sync_into(&client, &JsonLinesSink, config, options.max_runtime).await
    } else {
        let table = ContactTable::new(&config.table_name)?;
        let pool = stsync_db::connect_pool(
            &config.database_url,
            PoolConfig::from_app_config(config),
        )
        .await
        .context("failed to connect to database")?;
        stsync_db::health_check(&pool, &table)
            .await
            .with_context(|| format!("destination table {table} is not reachable"))?;

        let sink = PgSink::new(pool.clone(), table);
        let summary = sync_into(&client, &sink, config, options.max_runtime).await;
        pool.close().await;
        summary
    };

    summary.log();
    Ok(summary)
}

async fn sync_into<K: ContactSink>(
    client: &ServiceTitanClient,
    sink: &K,
    config: &AppConfig,
    max_runtime: Duration,
) -> RunSummary {
    let started = Instant::now();
    let started_at = chrono::Utc::now();
    let pipeline = pipeline_options(config);
    let mut summary = RunSummary::default();

    tracing::info!(
        started_at = %started_at.to_rfc3339(),
        table = %config.table_name,
        max_runtime_secs = max_runtime.as_secs(),
        "sync run started"
    );

    let pass = async {
        let mut source = CustomerStream::open(client).await;
        run_pipeline(&mut source, sink, &pipeline, &mut summary).await
    };

    let outcome = tokio::time::timeout(max_runtime, pass).await;
    summary.status = match outcome {
        Ok(Ok(())) => RunStatus::Completed,
        Ok(Err(e)) => {
            tracing::error!(error = %e, "customer source failed, ending run early");
            RunStatus::SourceFailed
        }
        Err(_) => {
            tracing::error!(
                max_runtime_secs = max_runtime.as_secs(),
                "run deadline exceeded, ending run early"
            );
            RunStatus::DeadlineExceeded
        }
    };
    summary.elapsed = started.elapsed();
    summary
}
