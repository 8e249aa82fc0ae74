//! Concrete source and sink adapters for the sync pipeline.

use std::io::Write;

use sqlx::PgPool;
use stsync_core::{FlatContactRow, RawCustomer};
use stsync_db::{ContactTable, UpsertOutcome};
use stsync_servicetitan::CustomerStream;

use crate::pipeline::{ContactSink, CustomerSource, WriteOutcome};

impl CustomerSource for CustomerStream<'_> {
    async fn next_customer(&mut self) -> anyhow::Result<Option<RawCustomer>> {
        Ok(CustomerStream::next_customer(self).await?)
    }
}

/// Upserts rows into the destination table.
pub(crate) struct PgSink {
    pool: PgPool,
    table: ContactTable,
}

impl PgSink {
    pub(crate) fn new(pool: PgPool, table: ContactTable) -> Self {
        Self { pool, table }
    }
}

impl ContactSink for PgSink {
    async fn write(&self, row: &FlatContactRow) -> anyhow::Result<WriteOutcome> {
        let outcome = stsync_db::upsert_contact_row(&self.pool, &self.table, row).await?;
        Ok(match outcome {
            UpsertOutcome::Inserted => WriteOutcome::Inserted,
            UpsertOutcome::Updated => WriteOutcome::Updated,
        })
    }
}

/// Prints each row as one JSON object per line on stdout.
pub(crate) struct JsonLinesSink;

impl ContactSink for JsonLinesSink {
    async fn write(&self, row: &FlatContactRow) -> anyhow::Result<WriteOutcome> {
        let line = serde_json::to_string(row)?;
        let mut out = std::io::stdout().lock();
        writeln!(out, "{line}")?;
        Ok(WriteOutcome::Printed)
    }
}
