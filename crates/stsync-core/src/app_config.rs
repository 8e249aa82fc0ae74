use crate::normalize::VipPolicy;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub log_level: String,

    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
    pub app_key: String,
    pub api_base_url: String,
    pub auth_url: String,
    pub api_page_size: u32,
    pub api_max_pages: u32,
    pub api_request_timeout_secs: u64,
    pub api_max_retries: u32,
    pub api_retry_backoff_base_ms: u64,

    /// Destination table, already validated as a (optionally schema-qualified)
    /// SQL identifier.
    pub table_name: String,
    pub field_delimiter: String,
    pub vip_policy: VipPolicy,

    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub sink_max_attempts: u32,
    pub sink_retry_delay_ms: u64,

    pub max_runtime_secs: u64,
    pub schedule_cron: String,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[redacted]")
            .field("app_key", &"[redacted]")
            .field("api_base_url", &self.api_base_url)
            .field("auth_url", &self.auth_url)
            .field("api_page_size", &self.api_page_size)
            .field("api_max_pages", &self.api_max_pages)
            .field("api_request_timeout_secs", &self.api_request_timeout_secs)
            .field("api_max_retries", &self.api_max_retries)
            .field(
                "api_retry_backoff_base_ms",
                &self.api_retry_backoff_base_ms,
            )
            .field("table_name", &self.table_name)
            .field("field_delimiter", &self.field_delimiter)
            .field("vip_policy", &self.vip_policy)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("sink_max_attempts", &self.sink_max_attempts)
            .field("sink_retry_delay_ms", &self.sink_retry_delay_ms)
            .field("max_runtime_secs", &self.max_runtime_secs)
            .field("schedule_cron", &self.schedule_cron)
            .finish()
    }
}

impl AppConfig {
    /// Options handed to [`crate::normalize`] for every record of a run.
    #[must_use]
    pub fn normalize_options(&self) -> crate::NormalizeOptions {
        crate::NormalizeOptions {
            delimiter: self.field_delimiter.clone(),
            vip: self.vip_policy.clone(),
        }
    }
}
