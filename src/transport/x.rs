//! X (Twitter) API v2 client: user lookup and direct messages.

use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::{Client, Method, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::oauth::{encode, OAuthSigner};
use super::{AccountId, DirectMessageTransport, TransportError};
use crate::config::{Credentials, TransportConfig};
use crate::error::{Error, Result};

/// Longest single wait for a rate-limit window to reset.
const MAX_RATE_LIMIT_WAIT: Duration = Duration::from_secs(15 * 60);
/// Wait used when a 429 carries no reset hint.
const DEFAULT_RATE_LIMIT_WAIT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct XClient {
    http: Client,
    signer: OAuthSigner,
    base_url: String,
    wait_on_rate_limit: bool,
    max_rate_limit_waits: u32,
    shutdown: Option<watch::Receiver<bool>>,
}

impl XClient {
    /// Create client from credentials and transport settings.
    pub fn new(credentials: &Credentials, transport: &TransportConfig) -> Result<Self> {
        credentials.validate()?;

        let http = Client::builder()
            .user_agent(format!("dm_sender/{}", env!("CARGO_PKG_VERSION")))
            .timeout(transport.timeout)
            .build()
            .map_err(|e| Error::Config(format!("HTTP client error: {}", e)))?;

        Ok(Self {
            http,
            signer: OAuthSigner::new(credentials),
            base_url: transport.base_url.trim_end_matches('/').to_string(),
            wait_on_rate_limit: transport.wait_on_rate_limit,
            max_rate_limit_waits: transport.max_rate_limit_waits,
            shutdown: None,
        })
    }

    /// Abandon rate-limit waits once `shutdown` flips to `true`.
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Create client from the four credential strings with default transport settings.
    pub fn from_credentials(
        api_key: &str,
        api_secret: &str,
        access_token: &str,
        access_token_secret: &str,
    ) -> Result<Self> {
        let credentials = Credentials::new(api_key, api_secret, access_token, access_token_secret);
        Self::new(&credentials, &TransportConfig::default())
    }

    /// Create client with custom base url (primarily for tests).
    pub fn with_base_url<S: Into<String>>(credentials: &Credentials, base_url: S) -> Result<Self> {
        let transport = TransportConfig {
            base_url: base_url.into(),
            ..TransportConfig::default()
        };
        Self::new(credentials, &transport)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send a signed request, waiting out rate-limit windows when enabled.
    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> std::result::Result<(StatusCode, String), TransportError> {
        let url = format!("{}{}", self.base_url, path);
        let mut waits = 0;

        loop {
            let auth = self
                .signer
                .authorization_header(method.as_str(), &url, &[]);
            let mut request = self
                .http
                .request(method.clone(), &url)
                .header("Authorization", auth);
            if let Some(body) = body {
                request = request.json(body);
            }

            let response = request.send().await?;
            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS {
                let wait = rate_limit_wait(response.headers(), chrono::Utc::now().timestamp());
                if self.wait_on_rate_limit && waits < self.max_rate_limit_waits {
                    waits += 1;
                    warn!(
                        path,
                        wait_secs = wait.as_secs(),
                        attempt = waits,
                        "Rate limit reached, sleeping until reset"
                    );
                    if self.wait_for_reset(wait).await {
                        continue;
                    }
                    info!(path, "Shutdown requested, abandoning rate-limit wait");
                }
                return Err(TransportError::RateLimited { retry_after: wait });
            }

            let text = response.text().await?;
            debug!(%method, path, status = status.as_u16(), "X API response");
            return Ok((status, text));
        }
    }

    /// Sleep for `wait`; `false` if shutdown fired first.
    async fn wait_for_reset(&self, wait: Duration) -> bool {
        let Some(shutdown) = &self.shutdown else {
            tokio::time::sleep(wait).await;
            return true;
        };
        let mut shutdown = shutdown.clone();
        let sleep = tokio::time::sleep(wait);
        tokio::pin!(sleep);

        tokio::select! {
            _ = &mut sleep => return true,
            stopped = shutdown.wait_for(|stop| *stop) => {
                if stopped.is_ok() {
                    return false;
                }
            }
        }
        // Sender dropped: nobody can request shutdown any more.
        sleep.await;
        true
    }
}

/// Wait derived from `x-rate-limit-reset` (epoch seconds) or `retry-after`.
fn rate_limit_wait(headers: &HeaderMap, now: i64) -> Duration {
    let header_num = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<i64>().ok())
    };

    let wait = if let Some(reset) = header_num("x-rate-limit-reset") {
        Duration::from_secs(reset.saturating_sub(now).max(1) as u64)
    } else if let Some(secs) = header_num("retry-after") {
        Duration::from_secs(secs.max(1) as u64)
    } else {
        DEFAULT_RATE_LIMIT_WAIT
    };
    wait.min(MAX_RATE_LIMIT_WAIT)
}

fn error_for(status: StatusCode, body: String) -> TransportError {
    match status {
        StatusCode::UNAUTHORIZED => TransportError::Unauthorized(body),
        _ => TransportError::Api {
            status: status.as_u16(),
            body,
        },
    }
}

#[derive(Debug, Deserialize)]
struct UserEnvelope {
    data: Option<UserData>,
}

#[derive(Debug, Deserialize)]
struct UserData {
    id: String,
}

fn parse_user(text: &str) -> std::result::Result<Option<AccountId>, TransportError> {
    let envelope: UserEnvelope = serde_json::from_str(text)
        .map_err(|e| TransportError::Decode(format!("{} ({})", e, text)))?;
    Ok(envelope.data.map(|u| AccountId::new(u.id)))
}

impl DirectMessageTransport for XClient {
    async fn verify_credentials(&self) -> std::result::Result<AccountId, TransportError> {
        let (status, text) = self.execute(Method::GET, "/2/users/me", None).await?;
        if !status.is_success() {
            return Err(error_for(status, text));
        }
        parse_user(&text)?
            .ok_or_else(|| TransportError::Decode("users/me returned no data".to_string()))
    }

    async fn resolve_account(
        &self,
        username: &str,
    ) -> std::result::Result<Option<AccountId>, TransportError> {
        let path = format!("/2/users/by/username/{}", encode(username));
        let (status, text) = self.execute(Method::GET, &path, None).await?;
        match status {
            StatusCode::NOT_FOUND => Ok(None),
            s if s.is_success() => parse_user(&text),
            s => Err(error_for(s, text)),
        }
    }

    async fn send_direct_message(
        &self,
        account: &AccountId,
        text: &str,
    ) -> std::result::Result<(), TransportError> {
        let path = format!(
            "/2/dm_conversations/with/{}/messages",
            encode(account.as_str())
        );
        let body = json!({ "text": text });
        let (status, response) = self.execute(Method::POST, &path, Some(&body)).await?;
        if status.is_success() {
            Ok(())
        } else {
            Err(error_for(status, response))
        }
    }
}
