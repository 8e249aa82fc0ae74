//! Live integration tests for stsync-db using `#[sqlx::test]`.
//!
//! Each test gets a fresh Postgres database from the sqlx test harness
//! (`DATABASE_URL` must point at a server the harness can create databases
//! on). The destination table is not managed by this crate, so each test
//! creates its own. Run with `cargo test -p stsync-db -- --ignored`.

use stsync_core::FlatContactRow;
use stsync_db::{
    count_contact_rows, get_contact_row, health_check, ping, upsert_contact_row, ContactTable,
    UpsertOutcome,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn create_table(pool: &sqlx::PgPool, table: &ContactTable) {
    let ddl = format!(
        "CREATE TABLE {} ( \
             customer_id BIGINT PRIMARY KEY, \
             contact_name TEXT NOT NULL, \
             all_phone_numbers TEXT NOT NULL, \
             all_emails TEXT NOT NULL, \
             all_streets TEXT NOT NULL, \
             all_cities TEXT NOT NULL, \
             all_zips TEXT NOT NULL, \
             all_addresses TEXT NOT NULL, \
             primary_street TEXT NOT NULL, \
             primary_city TEXT NOT NULL, \
             primary_zip TEXT NOT NULL, \
             primary_address TEXT NOT NULL, \
             is_vip TEXT NOT NULL, \
             business_unit_name TEXT NOT NULL, \
             billingname TEXT NOT NULL, \
             billingline1 TEXT NOT NULL, \
             updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW() \
         )",
        table.quoted()
    );
    sqlx::query(&ddl)
        .execute(pool)
        .await
        .unwrap_or_else(|e| panic!("create table {table} failed: {e}"));
}

fn make_row(customer_id: i64, primary_street: &str) -> FlatContactRow {
    FlatContactRow {
        customer_id,
        contact_name: "Ada Lovelace".to_string(),
        all_phone_numbers: "555-1234".to_string(),
        all_emails: "ada@example.com".to_string(),
        all_streets: format!("A St;{primary_street}"),
        all_cities: "Austin;Boston".to_string(),
        all_zips: "78701;02108".to_string(),
        all_addresses: "Home;Office".to_string(),
        primary_street: primary_street.to_string(),
        primary_city: "Boston".to_string(),
        primary_zip: "02108".to_string(),
        primary_address: "Office".to_string(),
        is_vip: "YES".to_string(),
        business_unit_name: "HVAC".to_string(),
        billingname: "INV-1".to_string(),
        billingline1: "2024-01-02".to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[ignore = "requires a live Postgres via DATABASE_URL"]
#[sqlx::test(migrations = false)]
async fn ping_and_health_check_succeed(pool: sqlx::PgPool) {
    let table = ContactTable::new("test_contacts").unwrap();
    create_table(&pool, &table).await;

    ping(&pool).await.expect("ping");
    health_check(&pool, &table).await.expect("health check");
}

#[ignore = "requires a live Postgres via DATABASE_URL"]
#[sqlx::test(migrations = false)]
async fn health_check_fails_without_table(pool: sqlx::PgPool) {
    let table = ContactTable::new("missing_contacts").unwrap();
    assert!(health_check(&pool, &table).await.is_err());
}

#[ignore = "requires a live Postgres via DATABASE_URL"]
#[sqlx::test(migrations = false)]
async fn upsert_twice_leaves_one_row_with_latest_values(pool: sqlx::PgPool) {
    let table = ContactTable::new("test_contacts").unwrap();
    create_table(&pool, &table).await;

    let first = upsert_contact_row(&pool, &table, &make_row(1, "B Ave"))
        .await
        .expect("first upsert");
    let before = get_contact_row(&pool, &table, 1)
        .await
        .expect("select")
        .expect("row exists");

    let second = upsert_contact_row(&pool, &table, &make_row(1, "C Rd"))
        .await
        .expect("second upsert");
    let after = get_contact_row(&pool, &table, 1)
        .await
        .expect("select")
        .expect("row exists");

    assert_eq!(first, UpsertOutcome::Inserted);
    assert_eq!(second, UpsertOutcome::Updated);
    assert_eq!(count_contact_rows(&pool, &table).await.unwrap(), 1);
    assert_eq!(after.primary_street, "C Rd");
    assert_eq!(after.all_streets, "A St;C Rd");
    assert!(after.updated_at >= before.updated_at);
}

#[ignore = "requires a live Postgres via DATABASE_URL"]
#[sqlx::test(migrations = false)]
async fn schema_qualified_table_is_written(pool: sqlx::PgPool) {
    sqlx::query("CREATE SCHEMA crm").execute(&pool).await.unwrap();
    let table = ContactTable::new("crm.contacts").unwrap();
    create_table(&pool, &table).await;

    upsert_contact_row(&pool, &table, &make_row(7, "B Ave"))
        .await
        .expect("upsert");

    let row = get_contact_row(&pool, &table, 7).await.unwrap().unwrap();
    assert_eq!(row.contact_name, "Ada Lovelace");
    assert!(get_contact_row(&pool, &table, 8).await.unwrap().is_none());
}
