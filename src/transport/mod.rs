//! Platform transport: the two calls the messenger needs from the network.
//!
//! The messenger only depends on [`DirectMessageTransport`]; the X API client
//! in [`x`] is the production implementation, tests plug in their own.

pub mod oauth;
pub mod x;

use std::fmt;
use std::time::Duration;

use thiserror::Error;

pub use oauth::OAuthSigner;
pub use x::XClient;

/// Platform-internal account identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AccountId(pub String);

impl AccountId {
    pub fn new<S: Into<String>>(id: S) -> Self {
        AccountId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Failure at the transport boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("request timed out")]
    Timeout,

    #[error("API returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("rate limited (retry after {}s)", retry_after.as_secs())]
    RateLimited { retry_after: Duration },

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("unexpected response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else if err.is_decode() {
            TransportError::Decode(err.to_string())
        } else {
            TransportError::Http(err.to_string())
        }
    }
}

/// Capabilities the bulk messenger needs from the platform.
#[allow(async_fn_in_trait)]
pub trait DirectMessageTransport {
    /// Check that the configured credentials are accepted; returns the
    /// authenticated account.
    async fn verify_credentials(&self) -> Result<AccountId, TransportError>;

    /// Look up the account for a username (without `@`). `Ok(None)` means the
    /// platform has no such user.
    async fn resolve_account(&self, username: &str) -> Result<Option<AccountId>, TransportError>;

    /// Send `text` as a direct message to `account`.
    async fn send_direct_message(
        &self,
        account: &AccountId,
        text: &str,
    ) -> Result<(), TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limited_display_includes_seconds() {
        let err = TransportError::RateLimited {
            retry_after: Duration::from_secs(42),
        };
        assert_eq!(err.to_string(), "rate limited (retry after 42s)");
    }

    #[test]
    fn api_error_display_includes_status_and_body() {
        let err = TransportError::Api {
            status: 403,
            body: "You cannot send messages to this user".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("HTTP 403"));
        assert!(msg.contains("cannot send messages"));
    }

    #[test]
    fn account_id_display_is_raw_id() {
        let id = AccountId::new("2244994945");
        assert_eq!(id.to_string(), "2244994945");
        assert_eq!(id.as_str(), "2244994945");
    }
}
