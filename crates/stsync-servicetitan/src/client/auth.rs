//! OAuth2 client-credentials token cache.

use std::time::{Duration, Instant};

/// Tokens are refreshed this long before the server-side expiry.
pub(crate) const REFRESH_MARGIN: Duration = Duration::from_secs(120);

/// Lifetime assumed when the token endpoint omits `expires_in`.
pub(crate) const DEFAULT_EXPIRES_IN_SECS: u64 = 3600;

#[derive(Debug, Clone)]
pub(crate) struct CachedToken {
    pub(crate) access_token: String,
    pub(crate) expires_at: Instant,
}

impl CachedToken {
    pub(crate) fn new(access_token: String, expires_in_secs: Option<u64>, now: Instant) -> Self {
        let lifetime = Duration::from_secs(expires_in_secs.unwrap_or(DEFAULT_EXPIRES_IN_SECS));
        Self {
            access_token,
            expires_at: now + lifetime,
        }
    }

    /// `true` while the token has more than [`REFRESH_MARGIN`] left.
    pub(crate) fn is_fresh(&self, now: Instant) -> bool {
        now + REFRESH_MARGIN < self.expires_at
    }
}
