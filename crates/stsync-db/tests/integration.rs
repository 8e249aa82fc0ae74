//! Offline tests for stsync-db pool configuration and table handling.
//! These tests do not require a live database connection.

use std::collections::BTreeSet;

use stsync_core::{AppConfig, Environment, VipPolicy};
use stsync_db::{ContactTable, DbError, PoolConfig, UpsertOutcome};

fn app_config() -> AppConfig {
    AppConfig {
        database_url: "postgres://example".to_string(),
        env: Environment::Test,
        log_level: "info".to_string(),
        tenant_id: "1".to_string(),
        client_id: "cid".to_string(),
        client_secret: "secret".to_string(),
        app_key: "key".to_string(),
        api_base_url: "https://api.servicetitan.io".to_string(),
        auth_url: "https://auth.servicetitan.io/connect/token".to_string(),
        api_page_size: 100,
        api_max_pages: 10,
        api_request_timeout_secs: 30,
        api_max_retries: 2,
        api_retry_backoff_base_ms: 500,
        table_name: "test_contacts".to_string(),
        field_delimiter: ";".to_string(),
        vip_policy: VipPolicy::TypeIds(BTreeSet::from([1])),
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
        sink_max_attempts: 3,
        sink_retry_delay_ms: 1000,
        max_runtime_secs: 7200,
        schedule_cron: "0 0 6 * * *".to_string(),
    }
}

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let pool_config = PoolConfig::from_app_config(&app_config());
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

#[test]
fn configured_table_name_is_accepted() {
    let table = ContactTable::new(&app_config().table_name).expect("valid name");
    assert_eq!(table.to_string(), "test_contacts");
}

#[test]
fn table_name_with_too_many_parts_is_rejected() {
    let result = ContactTable::new("db.schema.contacts");
    assert!(
        matches!(result, Err(DbError::InvalidTableName(ref n)) if n == "db.schema.contacts"),
        "got: {result:?}"
    );
}

#[test]
fn upsert_outcome_is_comparable() {
    assert_ne!(UpsertOutcome::Inserted, UpsertOutcome::Updated);
}
