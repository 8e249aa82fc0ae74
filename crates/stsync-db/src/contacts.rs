//! Database operations for the destination contacts table.
//!
//! The table name is configurable, so statements are built at runtime from a
//! [`ContactTable`], which only ever holds a validated identifier.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use stsync_core::config::is_valid_table_name;
use stsync_core::FlatContactRow;

use crate::DbError;

/// Column list shared by every statement, in bind order.
const COLUMNS: &str = "customer_id, contact_name, all_phone_numbers, all_emails, \
     all_streets, all_cities, all_zips, all_addresses, \
     primary_street, primary_city, primary_zip, primary_address, \
     is_vip, business_unit_name, billingname, billingline1";

// ---------------------------------------------------------------------------
// Table identifier
// ---------------------------------------------------------------------------

/// A validated, quoted destination table name (`contacts` or
/// `schema.contacts`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactTable {
    raw: String,
    quoted: String,
}

impl ContactTable {
    /// # Errors
    ///
    /// Returns [`DbError::InvalidTableName`] unless `name` is a plain or
    /// schema-qualified SQL identifier.
    pub fn new(name: &str) -> Result<Self, DbError> {
        if !is_valid_table_name(name) {
            return Err(DbError::InvalidTableName(name.to_owned()));
        }
        let quoted = name
            .split('.')
            .map(|part| format!("\"{part}\""))
            .collect::<Vec<_>>()
            .join(".");
        Ok(Self {
            raw: name.to_owned(),
            quoted,
        })
    }

    /// The identifier as written in SQL, each part double-quoted.
    #[must_use]
    pub fn quoted(&self) -> &str {
        &self.quoted
    }
}

impl std::fmt::Display for ContactTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A stored contact row, with the bookkeeping timestamp.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ContactRow {
    pub customer_id: i64,
    pub contact_name: String,
    pub all_phone_numbers: String,
    pub all_emails: String,
    pub all_streets: String,
    pub all_cities: String,
    pub all_zips: String,
    pub all_addresses: String,
    pub primary_street: String,
    pub primary_city: String,
    pub primary_zip: String,
    pub primary_address: String,
    pub is_vip: String,
    pub business_unit_name: String,
    pub billingname: String,
    pub billingline1: String,
    pub updated_at: DateTime<Utc>,
}

/// Whether an upsert created the row or overwrote an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

pub(crate) fn upsert_sql(table: &ContactTable) -> String {
    format!(
        "INSERT INTO {table} ({COLUMNS}, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, NOW()) \
         ON CONFLICT (customer_id) DO UPDATE SET \
             contact_name = EXCLUDED.contact_name, \
             all_phone_numbers = EXCLUDED.all_phone_numbers, \
             all_emails = EXCLUDED.all_emails, \
             all_streets = EXCLUDED.all_streets, \
             all_cities = EXCLUDED.all_cities, \
             all_zips = EXCLUDED.all_zips, \
             all_addresses = EXCLUDED.all_addresses, \
             primary_street = EXCLUDED.primary_street, \
             primary_city = EXCLUDED.primary_city, \
             primary_zip = EXCLUDED.primary_zip, \
             primary_address = EXCLUDED.primary_address, \
             is_vip = EXCLUDED.is_vip, \
             business_unit_name = EXCLUDED.business_unit_name, \
             billingname = EXCLUDED.billingname, \
             billingline1 = EXCLUDED.billingline1, \
             updated_at = NOW() \
         RETURNING (xmax = 0)",
        table = table.quoted()
    )
}

/// Upserts one contact row keyed on `customer_id`.
///
/// Conflicts overwrite every column and refresh `updated_at`, so writing
/// the same row twice leaves exactly one row with the latest values.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_contact_row(
    pool: &PgPool,
    table: &ContactTable,
    row: &FlatContactRow,
) -> Result<UpsertOutcome, DbError> {
    // xmax is 0 only for a tuple created by this statement.
    let inserted: bool = sqlx::query_scalar::<_, bool>(&upsert_sql(table))
        .bind(row.customer_id)
        .bind(&row.contact_name)
        .bind(&row.all_phone_numbers)
        .bind(&row.all_emails)
        .bind(&row.all_streets)
        .bind(&row.all_cities)
        .bind(&row.all_zips)
        .bind(&row.all_addresses)
        .bind(&row.primary_street)
        .bind(&row.primary_city)
        .bind(&row.primary_zip)
        .bind(&row.primary_address)
        .bind(&row.is_vip)
        .bind(&row.business_unit_name)
        .bind(&row.billingname)
        .bind(&row.billingline1)
        .fetch_one(pool)
        .await?;

    Ok(if inserted {
        UpsertOutcome::Inserted
    } else {
        UpsertOutcome::Updated
    })
}

/// Returns the stored row for `customer_id`, or `None` if absent.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_contact_row(
    pool: &PgPool,
    table: &ContactTable,
    customer_id: i64,
) -> Result<Option<ContactRow>, DbError> {
    let sql = format!(
        "SELECT {COLUMNS}, updated_at FROM {table} WHERE customer_id = $1",
        table = table.quoted()
    );
    let row = sqlx::query_as::<_, ContactRow>(&sql)
        .bind(customer_id)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

/// Counts rows in the destination table.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails (including a missing table).
pub async fn count_contact_rows(pool: &PgPool, table: &ContactTable) -> Result<i64, DbError> {
    let sql = format!("SELECT COUNT(*) FROM {table}", table = table.quoted());
    let count = sqlx::query_scalar::<_, i64>(&sql).fetch_one(pool).await?;
    Ok(count)
}
