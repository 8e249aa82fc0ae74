//! Single-pass sync loop: pull, normalize, write, record.
//!
//! Customers are processed strictly one at a time. A bad record is skipped
//! and a row that cannot be written is counted as failed; neither stops the
//! run. Only a source failure ends the loop early.

use std::collections::BTreeMap;
use std::time::Duration;

use stsync_core::{normalize, FlatContactRow, NormalizeError, NormalizeOptions, RawCustomer};

/// Skip reason recorded for customers without a `customer_id`.
pub(crate) const SKIP_MISSING_CUSTOMER_ID: &str = "missing_customer_id";

/// Yields assembled customers until exhausted.
pub(crate) trait CustomerSource {
    async fn next_customer(&mut self) -> anyhow::Result<Option<RawCustomer>>;
}

/// Accepts flattened rows.
pub(crate) trait ContactSink {
    async fn write(&self, row: &FlatContactRow) -> anyhow::Result<WriteOutcome>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WriteOutcome {
    Inserted,
    Updated,
    /// Emitted without touching the database.
    Printed,
}

#[derive(Debug, Clone)]
pub(crate) struct PipelineOptions {
    pub normalize: NormalizeOptions,
    pub sink_max_attempts: u32,
    pub sink_retry_delay: Duration,
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RunStatus {
    Completed,
    SourceFailed,
    DeadlineExceeded,
}

impl RunStatus {
    fn as_str(self) -> &'static str {
        match self {
            RunStatus::Completed => "completed",
            RunStatus::SourceFailed => "source_failed",
            RunStatus::DeadlineExceeded => "deadline_exceeded",
        }
    }
}

/// Counters for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RunSummary {
    pub fetched: u64,
    pub normalized: u64,
    pub skipped: BTreeMap<&'static str, u64>,
    pub inserted: u64,
    pub updated: u64,
    pub printed: u64,
    pub failed: u64,
    pub elapsed: Duration,
    pub status: RunStatus,
}

impl Default for RunSummary {
    fn default() -> Self {
        Self {
            fetched: 0,
            normalized: 0,
            skipped: BTreeMap::new(),
            inserted: 0,
            updated: 0,
            printed: 0,
            failed: 0,
            elapsed: Duration::ZERO,
            status: RunStatus::Completed,
        }
    }
}

impl RunSummary {
    fn record_skip(&mut self, reason: &'static str) {
        *self.skipped.entry(reason).or_default() += 1;
    }

    fn record_write(&mut self, outcome: WriteOutcome) {
        match outcome {
            WriteOutcome::Inserted => self.inserted += 1,
            WriteOutcome::Updated => self.updated += 1,
            WriteOutcome::Printed => self.printed += 1,
        }
    }

    pub(crate) fn skipped_total(&self) -> u64 {
        self.skipped.values().sum()
    }

    /// A run succeeds only if it reached the end of the source before the
    /// deadline and wrote every normalized row.
    pub(crate) fn is_success(&self) -> bool {
        self.status == RunStatus::Completed && self.failed == 0
    }

    pub(crate) fn log(&self) {
        let skipped = self
            .skipped
            .iter()
            .map(|(reason, count)| format!("{reason}={count}"))
            .collect::<Vec<_>>()
            .join(",");
        #[allow(clippy::cast_possible_truncation)]
        let elapsed_ms = self.elapsed.as_millis() as u64;
        if self.is_success() {
            tracing::info!(
                status = self.status.as_str(),
                fetched = self.fetched,
                normalized = self.normalized,
                skipped = self.skipped_total(),
                skipped_by_reason = %skipped,
                inserted = self.inserted,
                updated = self.updated,
                printed = self.printed,
                failed = self.failed,
                elapsed_ms,
                "sync run summary"
            );
        } else {
            tracing::error!(
                status = self.status.as_str(),
                fetched = self.fetched,
                normalized = self.normalized,
                skipped = self.skipped_total(),
                skipped_by_reason = %skipped,
                inserted = self.inserted,
                updated = self.updated,
                printed = self.printed,
                failed = self.failed,
                elapsed_ms,
                "sync run summary"
            );
        }
    }
}

/// Drains `source` into `sink`, updating `summary` as it goes.
///
/// `summary` is borrowed rather than returned so the counts survive when the
/// caller cancels this future at a deadline.
///
/// # Errors
///
/// Returns the source's error if pulling the next customer fails. Normalize
/// and sink failures are recorded in `summary` and do not end the run.
pub(crate) async fn run_pipeline<S, K>(
    source: &mut S,
    sink: &K,
    options: &PipelineOptions,
    summary: &mut RunSummary,
) -> anyhow::Result<()>
where
    S: CustomerSource,
    K: ContactSink,
{
    while let Some(raw) = source.next_customer().await? {
        summary.fetched += 1;

        let row = match normalize(raw, &options.normalize) {
            Ok(row) => row,
            Err(NormalizeError::MissingKey { name }) => {
                tracing::warn!(
                    name = name.as_deref().unwrap_or("<none>"),
                    "skipping customer without customer_id"
                );
                summary.record_skip(SKIP_MISSING_CUSTOMER_ID);
                continue;
            }
        };
        summary.normalized += 1;

        match write_with_retry(sink, &row, options).await {
            Ok(outcome) => summary.record_write(outcome),
            Err(e) => {
                tracing::error!(
                    customer_id = row.customer_id,
                    attempts = options.sink_max_attempts,
                    error = %e,
                    "giving up on contact row"
                );
                summary.failed += 1;
            }
        }
    }

    Ok(())
}

/// Writes one row, retrying with a fixed delay up to `sink_max_attempts`
/// total attempts.
async fn write_with_retry<K: ContactSink>(
    sink: &K,
    row: &FlatContactRow,
    options: &PipelineOptions,
) -> anyhow::Result<WriteOutcome> {
    let max_attempts = options.sink_max_attempts.max(1);
    let mut attempt = 1u32;
    loop {
        match sink.write(row).await {
            Ok(outcome) => return Ok(outcome),
            Err(e) if attempt < max_attempts => {
                tracing::warn!(
                    customer_id = row.customer_id,
                    attempt,
                    max_attempts,
                    error = %e,
                    "contact row write failed, retrying"
                );
                tokio::time::sleep(options.sink_retry_delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod tests;
