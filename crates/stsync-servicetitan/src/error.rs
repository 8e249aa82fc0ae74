use thiserror::Error;

/// Errors returned by the `ServiceTitan` API client.
#[derive(Debug, Error)]
pub enum ServiceTitanError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The token endpoint rejected the client credentials.
    #[error("authentication failed with HTTP {status}: {body}")]
    Auth { status: u16, body: String },

    /// A request was still rejected with 401 after a fresh token was fetched.
    #[error("unauthorized request to {url} after token refresh")]
    Unauthorized { url: String },

    #[error("rate limited by ServiceTitan (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("endpoint not found: {url}")]
    NotFound { url: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },
}
