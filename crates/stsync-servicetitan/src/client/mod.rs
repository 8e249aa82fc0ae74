//! HTTP client for the `ServiceTitan` v2 REST API.
//!
//! Wraps `reqwest` with client-credentials authentication, the `ST-App-Key`
//! header, retry on transient failures, and typed page deserialization.

mod auth;
mod endpoints;

use std::time::{Duration, Instant};

use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use stsync_core::AppConfig;
use tokio::sync::Mutex;

use crate::error::ServiceTitanError;
use crate::pagination::stop_after_page;
use crate::retry::retry_with_backoff;
use crate::types::{PageEnvelope, TokenResponse};

use self::auth::CachedToken;

pub const DEFAULT_API_BASE_URL: &str = "https://api.servicetitan.io";
pub const DEFAULT_AUTH_URL: &str = "https://auth.servicetitan.io/connect/token";

const APP_KEY_HEADER: &str = "ST-App-Key";

/// Connection and paging parameters for [`ServiceTitanClient`].
#[derive(Clone)]
pub struct ClientSettings {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
    pub app_key: String,
    pub api_base_url: String,
    pub auth_url: String,
    pub timeout_secs: u64,
    pub page_size: u32,
    pub max_pages: u32,
    pub max_retries: u32,
    pub backoff_base_ms: u64,
}

impl ClientSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            tenant_id: config.tenant_id.clone(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            app_key: config.app_key.clone(),
            api_base_url: config.api_base_url.clone(),
            auth_url: config.auth_url.clone(),
            timeout_secs: config.api_request_timeout_secs,
            page_size: config.api_page_size,
            max_pages: config.api_max_pages,
            max_retries: config.api_max_retries,
            backoff_base_ms: config.api_retry_backoff_base_ms,
        }
    }
}

impl std::fmt::Debug for ClientSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientSettings")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[redacted]")
            .field("app_key", &"[redacted]")
            .field("api_base_url", &self.api_base_url)
            .field("auth_url", &self.auth_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("page_size", &self.page_size)
            .field("max_pages", &self.max_pages)
            .field("max_retries", &self.max_retries)
            .field("backoff_base_ms", &self.backoff_base_ms)
            .finish()
    }
}

/// Client for the `ServiceTitan` REST API.
///
/// Holds one cached access token shared by all requests. The token is
/// fetched lazily, refreshed shortly before it expires, and dropped and
/// re-fetched once when a request comes back 401.
pub struct ServiceTitanClient {
    client: Client,
    settings: ClientSettings,
    api_base: Url,
    auth_url: Url,
    token: Mutex<Option<CachedToken>>,
}

impl ServiceTitanClient {
    /// Creates a client from `settings`.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceTitanError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`ServiceTitanError::InvalidUrl`] if either
    /// base URL does not parse.
    pub fn new(settings: ClientSettings) -> Result<Self, ServiceTitanError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("stsync/0.1 (customer-sync)")
            .build()?;

        // Trailing slash so Url::join appends to the path instead of
        // replacing its last segment.
        let api_base = parse_url(&format!(
            "{}/",
            settings.api_base_url.trim_end_matches('/')
        ))?;
        let auth_url = parse_url(&settings.auth_url)?;

        Ok(Self {
            client,
            settings,
            api_base,
            auth_url,
            token: Mutex::new(None),
        })
    }

    #[must_use]
    pub fn page_size(&self) -> u32 {
        self.settings.page_size
    }

    #[must_use]
    pub fn max_pages(&self) -> u32 {
        self.settings.max_pages
    }

    /// Tenant-scoped path for an API family, e.g. `crm/v2/tenant/42/customers`.
    pub(crate) fn tenant_path(&self, family: &str, resource: &str) -> String {
        format!("{family}/tenant/{}/{resource}", self.settings.tenant_id)
    }

    pub(crate) fn build_url(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<Url, ServiceTitanError> {
        let mut url = self
            .api_base
            .join(path)
            .map_err(|e| ServiceTitanError::InvalidUrl {
                url: path.to_owned(),
                reason: e.to_string(),
            })?;
        if !params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in params {
                pairs.append_pair(k, v);
            }
        }
        Ok(url)
    }

    /// Returns a usable access token, fetching a new one when the cache is
    /// empty or inside the refresh margin.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceTitanError::Auth`] if the token endpoint rejects the
    /// credentials, or any transport/deserialization error from the request.
    pub async fn access_token(&self) -> Result<String, ServiceTitanError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.is_fresh(Instant::now()) {
                return Ok(token.access_token.clone());
            }
        }

        let token = self.fetch_token().await?;
        let access_token = token.access_token.clone();
        *cached = Some(token);
        Ok(access_token)
    }

    async fn invalidate_token(&self) {
        *self.token.lock().await = None;
    }

    async fn fetch_token(&self) -> Result<CachedToken, ServiceTitanError> {
        tracing::debug!(auth_url = %self.auth_url, "requesting ServiceTitan access token");
        let response = self
            .client
            .post(self.auth_url.clone())
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.settings.client_id.as_str()),
                ("client_secret", self.settings.client_secret.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ServiceTitanError::Auth {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        let parsed: TokenResponse =
            serde_json::from_str(&body).map_err(|e| ServiceTitanError::Deserialize {
                context: "token response".to_owned(),
                source: e,
            })?;
        tracing::info!(
            expires_in = parsed.expires_in,
            "ServiceTitan access token acquired"
        );
        Ok(CachedToken::new(
            parsed.access_token,
            parsed.expires_in,
            Instant::now(),
        ))
    }

    /// Sends an authorized GET, replacing the token once on 401.
    async fn send_authorized(&self, url: &Url) -> Result<reqwest::Response, ServiceTitanError> {
        let token = self.access_token().await?;
        let response = self.send_get(url, &token).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        tracing::warn!(url = %url, "ServiceTitan returned 401, refreshing token");
        self.invalidate_token().await;
        let token = self.access_token().await?;
        let response = self.send_get(url, &token).await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(ServiceTitanError::Unauthorized {
                url: url.to_string(),
            });
        }
        Ok(response)
    }

    async fn send_get(&self, url: &Url, token: &str) -> Result<reqwest::Response, ServiceTitanError> {
        Ok(self
            .client
            .get(url.clone())
            .bearer_auth(token)
            .header(APP_KEY_HEADER, &self.settings.app_key)
            .send()
            .await?)
    }

    /// Fetches and decodes one page of a list endpoint, retrying transient
    /// failures.
    ///
    /// # Errors
    ///
    /// - [`ServiceTitanError::RateLimited`]: HTTP 429 after all retries.
    /// - [`ServiceTitanError::NotFound`]: HTTP 404 (not retried).
    /// - [`ServiceTitanError::UnexpectedStatus`]: any other non-2xx status.
    /// - [`ServiceTitanError::Unauthorized`]: 401 even with a fresh token.
    /// - [`ServiceTitanError::Deserialize`]: body does not match the envelope.
    pub async fn fetch_page<T: DeserializeOwned>(
        &self,
        path: &str,
        page: u32,
        extra: &[(&str, String)],
    ) -> Result<PageEnvelope<T>, ServiceTitanError> {
        let mut params = vec![
            ("page", page.to_string()),
            ("pageSize", self.settings.page_size.to_string()),
        ];
        params.extend(extra.iter().map(|(k, v)| (*k, v.clone())));
        let url = self.build_url(path, &params)?;

        retry_with_backoff(
            self.settings.max_retries,
            self.settings.backoff_base_ms,
            || {
                let url = url.clone();
                async move {
                    let response = self.send_authorized(&url).await?;
                    let status = response.status();

                    if status == StatusCode::TOO_MANY_REQUESTS {
                        let retry_after_secs = response
                            .headers()
                            .get(reqwest::header::RETRY_AFTER)
                            .and_then(|v| v.to_str().ok())
                            .and_then(|s| s.parse::<u64>().ok())
                            .unwrap_or(0);
                        return Err(ServiceTitanError::RateLimited { retry_after_secs });
                    }

                    if status == StatusCode::NOT_FOUND {
                        return Err(ServiceTitanError::NotFound {
                            url: url.to_string(),
                        });
                    }

                    if !status.is_success() {
                        return Err(ServiceTitanError::UnexpectedStatus {
                            status: status.as_u16(),
                            url: url.to_string(),
                        });
                    }

                    let body = response.text().await?;
                    serde_json::from_str::<PageEnvelope<T>>(&body).map_err(|e| {
                        ServiceTitanError::Deserialize {
                            context: format!("{path} page {page}"),
                            source: e,
                        }
                    })
                }
            },
        )
        .await
    }

    /// Fetches every page of a list endpoint, up to the configured page cap.
    ///
    /// Stops on an empty page, a partial page, `hasMore: false` or a 404.
    /// Reaching the cap is logged and the rows gathered so far are returned.
    ///
    /// # Errors
    ///
    /// Propagates any error from [`Self::fetch_page`] other than 404.
    pub async fn fetch_all<T: DeserializeOwned>(
        &self,
        path: &str,
        extra: &[(&str, String)],
    ) -> Result<Vec<T>, ServiceTitanError> {
        let mut rows = Vec::new();

        for page in 1..=self.settings.max_pages {
            let envelope = match self.fetch_page::<T>(path, page, extra).await {
                Ok(envelope) => envelope,
                Err(ServiceTitanError::NotFound { .. }) => {
                    tracing::debug!(path, page, "page not found, treating as end of data");
                    return Ok(rows);
                }
                Err(e) => return Err(e),
            };

            let has_more = envelope.has_more();
            let count = envelope.data.len();
            rows.extend(envelope.data);

            if let Some(stop) = stop_after_page(count, self.settings.page_size, has_more) {
                tracing::debug!(path, page, total = rows.len(), ?stop, "pagination complete");
                return Ok(rows);
            }
        }

        tracing::warn!(
            path,
            max_pages = self.settings.max_pages,
            total = rows.len(),
            "page limit reached, remaining pages were not fetched"
        );
        Ok(rows)
    }
}

fn parse_url(raw: &str) -> Result<Url, ServiceTitanError> {
    Url::parse(raw).map_err(|e| ServiceTitanError::InvalidUrl {
        url: raw.to_owned(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
