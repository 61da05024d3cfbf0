//! Bulk messenger: resolve, personalize, send, pause, repeat.
//!
//! Every recipient is processed in input order. A failure for one recipient
//! is counted and logged but never stops the run.

use std::fmt;
use std::future::Future;

use futures::FutureExt;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};

use crate::config::{Credentials, TransportConfig};
use crate::error::{Error, Result};
use crate::metrics;
use crate::pacing::{Pause, RunConfig, Sleeper, TokioSleeper};
use crate::recipient::{normalize_username, Recipient};
use crate::template::{personalize, unresolved_placeholders};
use crate::transport::{AccountId, DirectMessageTransport, TransportError, XClient};

/// Outcome for a single recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendResult {
    Sent,
    UserNotFound,
    SendError(String),
    /// Recipient had no usable `username` field; nothing was sent
    MissingUsername,
}

impl SendResult {
    pub fn is_success(&self) -> bool {
        matches!(self, SendResult::Sent)
    }

    /// Label used for metrics and log fields.
    pub fn label(&self) -> &'static str {
        match self {
            SendResult::Sent => "sent",
            SendResult::UserNotFound => "not_found",
            SendResult::SendError(_) => "error",
            SendResult::MissingUsername => "missing_username",
        }
    }
}

/// Aggregated counts for one bulk run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    pub total: usize,
    pub processed: usize,
    pub successful: usize,
    pub failed: usize,
    pub not_found: usize,
    pub send_errors: usize,
    pub invalid: usize,
    pub interrupted: bool,
}

impl Summary {
    fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    fn record(&mut self, result: &SendResult) {
        self.processed += 1;
        match result {
            SendResult::Sent => self.successful += 1,
            SendResult::UserNotFound => {
                self.failed += 1;
                self.not_found += 1;
            }
            SendResult::SendError(_) => {
                self.failed += 1;
                self.send_errors += 1;
            }
            SendResult::MissingUsername => {
                self.failed += 1;
                self.invalid += 1;
            }
        }
    }

    /// `(total, successful, failed)`
    pub fn counts(&self) -> (usize, usize, usize) {
        (self.total, self.successful, self.failed)
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(50);
        writeln!(f, "{}", rule)?;
        writeln!(f, "SUMMARY")?;
        writeln!(
            f,
            "Total: {} | Successful: {} | Failed: {}",
            self.total, self.successful, self.failed
        )?;
        if self.failed > 0 {
            writeln!(
                f,
                "  not found: {} | send errors: {} | missing username: {}",
                self.not_found, self.send_errors, self.invalid
            )?;
        }
        if self.interrupted {
            writeln!(
                f,
                "Interrupted after {} of {} recipients",
                self.processed, self.total
            )?;
        }
        write!(f, "{}", rule)
    }
}

/// Sends personalized DMs one recipient at a time.
pub struct BulkMessenger<T, S = TokioSleeper> {
    transport: T,
    sleeper: S,
    rng: StdRng,
    account: Option<AccountId>,
}

impl BulkMessenger<XClient> {
    /// Build an X client from the four credentials and verify them.
    pub async fn from_credentials(
        api_key: &str,
        api_secret: &str,
        access_token: &str,
        access_token_secret: &str,
    ) -> Result<Self> {
        let client = XClient::from_credentials(api_key, api_secret, access_token, access_token_secret)?;
        Self::connect(client).await
    }

    /// Build an X client from loaded configuration and verify it.
    pub async fn from_config(credentials: &Credentials, transport: &TransportConfig) -> Result<Self> {
        let client = XClient::new(credentials, transport)?;
        Self::connect(client).await
    }
}

impl<T: DirectMessageTransport> BulkMessenger<T> {
    /// Verify credentials, then return a messenger that sleeps on the tokio timer.
    pub async fn connect(transport: T) -> Result<Self> {
        Self::connect_with_sleeper(transport, TokioSleeper).await
    }
}

impl<T: DirectMessageTransport, S: Sleeper> BulkMessenger<T, S> {
    /// Messenger without the credential check. Sends will still fail soft if
    /// the transport rejects them.
    pub fn new(transport: T, sleeper: S) -> Self {
        Self {
            transport,
            sleeper,
            rng: StdRng::from_entropy(),
            account: None,
        }
    }

    /// Verify credentials before any send; an auth failure aborts here.
    pub async fn connect_with_sleeper(transport: T, sleeper: S) -> Result<Self> {
        let account = transport.verify_credentials().await.map_err(|e| match e {
            TransportError::Unauthorized(body) => Error::AuthenticationFailed(body),
            TransportError::Api { status, body } if status == 403 => {
                Error::AuthenticationFailed(format!("HTTP 403: {}", body))
            }
            other => Error::Transport(other),
        })?;
        info!(account = %account, "Authenticated with platform");

        let mut messenger = Self::new(transport, sleeper);
        messenger.account = Some(account);
        Ok(messenger)
    }

    /// Deterministic jitter, for reproducible runs.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Account the credentials belong to, once verified.
    pub fn account(&self) -> Option<&AccountId> {
        self.account.as_ref()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Resolve `username` and send `message`. Never returns an error: every
    /// failure is folded into the result.
    pub async fn send_one(&self, username: &str, message: &str) -> SendResult {
        let account = match self.transport.resolve_account(username).await {
            Ok(Some(account)) => account,
            Ok(None) => {
                println!("✗ User @{} not found", username);
                warn!(username, "User not found");
                return SendResult::UserNotFound;
            }
            Err(e) => {
                println!("✗ Error sending to @{}: {}", username, e);
                warn!(username, error = %e, "User lookup failed");
                return SendResult::SendError(e.to_string());
            }
        };

        match self.transport.send_direct_message(&account, message).await {
            Ok(()) => {
                println!("✓ Sent DM to @{}", username);
                debug!(username, account = %account, "DM sent");
                SendResult::Sent
            }
            Err(e) => {
                println!("✗ Error sending to @{}: {}", username, e);
                warn!(username, account = %account, error = %e, "DM failed");
                SendResult::SendError(e.to_string())
            }
        }
    }

    /// Send to every recipient, pacing as configured.
    pub async fn send_bulk(
        &mut self,
        recipients: &[Recipient],
        template: &str,
        config: &RunConfig,
    ) -> Result<Summary> {
        self.send_bulk_until(recipients, template, config, std::future::pending())
            .await
    }

    /// Like [`send_bulk`](Self::send_bulk), stopping early once `shutdown`
    /// completes. Shutdown is checked before each send and during pauses; a
    /// send already in flight is allowed to finish.
    pub async fn send_bulk_until<F>(
        &mut self,
        recipients: &[Recipient],
        template: &str,
        config: &RunConfig,
        shutdown: F,
    ) -> Result<Summary>
    where
        F: Future<Output = ()>,
    {
        config.validate()?;

        let total = recipients.len();
        let mut summary = Summary::new(total);

        println!("\nStarting to send {} DMs...", total);
        println!(
            "Rate limiting: {}-{}s between messages",
            config.delay_min, config.delay_max
        );
        println!(
            "Batch: {} messages, then {}s pause\n",
            config.batch_size, config.batch_delay
        );

        tokio::pin!(shutdown);

        for (idx, recipient) in recipients.iter().enumerate() {
            let position = idx + 1;

            if shutdown.as_mut().now_or_never().is_some() {
                summary.interrupted = true;
                break;
            }

            let result = self.process(recipient, template, position, total).await;
            metrics::record_send_outcome(result.label());
            summary.record(&result);

            let Some(pause) = config.pause_after(position, total, &mut self.rng) else {
                continue;
            };
            announce_pause(&pause);
            metrics::record_pause(pause.kind(), pause.duration());

            tokio::select! {
                _ = self.sleeper.sleep(pause.duration()) => {}
                _ = &mut shutdown => {
                    summary.interrupted = true;
                    break;
                }
            }
        }

        if summary.interrupted {
            warn!(
                processed = summary.processed,
                total, "Run interrupted, remaining recipients skipped"
            );
        }
        info!(
            total = summary.total,
            successful = summary.successful,
            failed = summary.failed,
            "Bulk send finished"
        );
        println!("\n{}", summary);

        Ok(summary)
    }

    async fn process(
        &self,
        recipient: &Recipient,
        template: &str,
        position: usize,
        total: usize,
    ) -> SendResult {
        let username = match recipient.username().map(normalize_username) {
            Some(u) if !u.is_empty() => u,
            _ => {
                println!(
                    "[{}/{}] ✗ Recipient has no username, skipping",
                    position, total
                );
                warn!(position, "Recipient is missing the username field");
                return SendResult::MissingUsername;
            }
        };

        let message = personalize(template, username, recipient.custom_fields());
        let unresolved = unresolved_placeholders(&message);
        if !unresolved.is_empty() {
            warn!(
                username,
                placeholders = ?unresolved,
                "Message still contains placeholders without a matching field"
            );
        }

        println!("[{}/{}] Sending to @{}...", position, total, username);
        self.send_one(username, &message).await
    }
}

fn announce_pause(pause: &Pause) {
    match pause {
        Pause::BatchCooldown(d) => {
            println!("\n⏸  Batch complete. Pausing for {}s...\n", d.as_secs());
            info!(pause_secs = d.as_secs(), "Batch cooldown");
        }
        Pause::Jitter(d) => {
            println!("   Waiting {}s...\n", d.as_secs());
            debug!(pause_secs = d.as_secs(), "Waiting before next send");
        }
    }
}

/// Rendered message for one recipient, without sending anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
    pub position: usize,
    pub username: Option<String>,
    pub message: String,
    pub unresolved: Vec<String>,
}

/// Render every recipient's message. No network access, no pauses.
pub fn preview(recipients: &[Recipient], template: &str) -> Vec<Preview> {
    recipients
        .iter()
        .enumerate()
        .map(|(idx, recipient)| {
            let username = recipient
                .username()
                .map(normalize_username)
                .filter(|u| !u.is_empty());
            let message = personalize(
                template,
                username.unwrap_or_default(),
                recipient.custom_fields(),
            );
            let unresolved = unresolved_placeholders(&message)
                .into_iter()
                .map(str::to_string)
                .collect();
            Preview {
                position: idx + 1,
                username: username.map(str::to_string),
                message,
                unresolved,
            }
        })
        .collect()
}
