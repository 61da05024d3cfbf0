//! Send command: paced bulk DMs to every recipient.

use tokio::signal;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::config::{Credentials, TransportConfig};
use crate::error::Result;
use crate::messenger::{BulkMessenger, Summary};
use crate::transport::XClient;
use crate::pacing::RunConfig;
use crate::recipient::Recipient;

/// Everything one bulk run needs.
#[derive(Debug, Clone)]
pub struct SendArgs {
    pub recipients: Vec<Recipient>,
    pub template: String,
    pub pacing: RunConfig,
    pub credentials: Credentials,
    pub transport: TransportConfig,
}

/// Resolves on the first Ctrl-C; never resolves if the handler can't be installed.
async fn ctrl_c() {
    match signal::ctrl_c().await {
        Ok(()) => {
            println!("\n⏹  Ctrl-C received, stopping after the current recipient...");
            info!("Shutdown requested");
        }
        Err(err) => {
            warn!("Failed to listen for Ctrl-C: {}", err);
            std::future::pending::<()>().await;
        }
    }
}

/// CLI entry point
pub async fn run(args: SendArgs) -> Result<Summary> {
    args.pacing.validate()?;

    if args.recipients.is_empty() {
        let summary = Summary::default();
        println!("Nothing to do: no recipients.");
        println!("\n{}", summary);
        return Ok(summary);
    }

    let (stop_tx, stop_rx) = watch::channel(false);
    let client = XClient::new(&args.credentials, &args.transport)?.with_shutdown(stop_rx.clone());
    tokio::spawn(async move {
        ctrl_c().await;
        let _ = stop_tx.send(true);
    });

    let mut messenger = BulkMessenger::connect(client).await?;
    if let Some(account) = messenger.account() {
        println!("✓ Authenticated as account {}", account);
    }

    messenger
        .send_bulk_until(
            &args.recipients,
            &args.template,
            &args.pacing,
            stopped(stop_rx),
        )
        .await
}

/// Resolves once `true` is published; never resolves if the sender goes away.
async fn stopped(mut rx: watch::Receiver<bool>) {
    let sender_gone = rx.wait_for(|stop| *stop).await.is_err();
    if sender_gone {
        std::future::pending::<()>().await;
    }
}
