//! Verify command: check that the configured credentials authenticate.

use crate::config::{Credentials, TransportConfig};
use crate::error::Result;
use crate::transport::{AccountId, DirectMessageTransport, TransportError, XClient};
use crate::Error;

/// CLI entry point
pub async fn run(credentials: &Credentials, transport: &TransportConfig) -> Result<AccountId> {
    let client = XClient::new(credentials, transport)?;
    let account = client
        .verify_credentials()
        .await
        .map_err(|e| verify_error(e, client.base_url()))?;
    println!("✓ Credentials valid, authenticated as account {}", account);
    Ok(account)
}

/// Only a rejected login is an authentication failure; anything else is a transport problem.
fn verify_error(err: TransportError, base_url: &str) -> Error {
    match err {
        TransportError::Unauthorized(_) | TransportError::Api { status: 403, .. } => {
            Error::AuthenticationFailed(format!("{} ({})", err, base_url))
        }
        other => Error::Transport(other),
    }
}
