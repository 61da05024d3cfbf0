//! DM Sender CLI - main entry point

use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

use dm_sender::config::Config;
use dm_sender::recipient::parse_delimiter;
use dm_sender::{commands, metrics};
use tracing::warn;

#[derive(Parser)]
#[command(name = "dm_sender")]
#[command(about = "Send paced, personalized direct messages on X", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to config file; without it, ./config.yml or ../config.yml is used if present
    #[arg(long, env = "DM_SENDER_CONFIG")]
    config: Option<PathBuf>,

    /// Address to expose Prometheus metrics (e.g., 0.0.0.0:9898)
    #[arg(long, env = "METRICS_ADDR")]
    metrics_addr: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct MessageInput {
    /// Delimited recipients file with a header row containing `username`
    #[arg(short, long)]
    recipients: Option<PathBuf>,

    /// Field delimiter for the recipients file (single character or `tab`)
    #[arg(long, default_value = ",")]
    delimiter: String,

    /// Extra recipients by username (repeatable, comma separated)
    #[arg(long, num_args = 1..)]
    to: Vec<String>,

    /// Message template, e.g. "Hi {username}, {name}!"
    #[arg(short, long)]
    template: Option<String>,

    /// File containing the message template
    #[arg(long)]
    template_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Send DMs to all recipients with rate limiting
    Send {
        #[command(flatten)]
        input: MessageInput,

        /// Minimum delay between messages (seconds)
        #[arg(long)]
        delay_min: Option<u64>,

        /// Maximum delay between messages (seconds)
        #[arg(long)]
        delay_max: Option<u64>,

        /// Number of messages before taking a longer break
        #[arg(long)]
        batch_size: Option<usize>,

        /// Delay after each batch (seconds)
        #[arg(long)]
        batch_delay: Option<u64>,

        /// Per-request timeout (seconds)
        #[arg(long)]
        timeout_secs: Option<u64>,
    },

    /// Render messages for every recipient without sending
    Preview {
        #[command(flatten)]
        input: MessageInput,

        /// Show only the first N messages
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Check that the configured credentials authenticate
    Verify,
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Send { .. } => "send",
            Commands::Preview { .. } => "preview",
            Commands::Verify => "verify",
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env for local development
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("dm_sender=info".parse()?))
        .init();

    let cli = Cli::parse();

    if let Some(addr) = cli.metrics_addr.as_deref() {
        match addr.parse::<SocketAddr>() {
            Ok(socket) => metrics::spawn_metrics_server(socket),
            Err(err) => warn!(%addr, "Invalid metrics address: {}", err),
        }
    }

    let config = Config::load(cli.config.as_deref())?;

    let command_name = cli.command.name();
    metrics::record_command_start(command_name);
    let start = Instant::now();

    let result = execute_command(cli.command, config).await;

    metrics::record_command_result(command_name, start.elapsed(), result.is_ok());

    result
}

async fn execute_command(command: Commands, config: Config) -> anyhow::Result<()> {
    match command {
        Commands::Send {
            input,
            delay_min,
            delay_max,
            batch_size,
            batch_delay,
            timeout_secs,
        } => {
            let (recipients, template) = read_input(&input)?;

            let mut pacing = config.pacing;
            pacing.delay_min = delay_min.unwrap_or(pacing.delay_min);
            pacing.delay_max = delay_max.unwrap_or(pacing.delay_max);
            pacing.batch_size = batch_size.unwrap_or(pacing.batch_size);
            pacing.batch_delay = batch_delay.unwrap_or(pacing.batch_delay);

            let mut transport = config.transport;
            if let Some(secs) = timeout_secs {
                transport.timeout = Duration::from_secs(secs);
            }

            let summary = commands::send::run(commands::SendArgs {
                recipients,
                template,
                pacing,
                credentials: config.credentials,
                transport,
            })
            .await?;

            if summary.interrupted {
                anyhow::bail!(
                    "interrupted after {} of {} recipients",
                    summary.processed,
                    summary.total
                );
            }
        }
        Commands::Preview { input, limit } => {
            let (recipients, template) = read_input(&input)?;
            commands::preview::run(&recipients, &template, limit);
        }
        Commands::Verify => {
            commands::verify::run(&config.credentials, &config.transport).await?;
        }
    }

    Ok(())
}

fn read_input(input: &MessageInput) -> anyhow::Result<(Vec<dm_sender::Recipient>, String)> {
    let delimiter = parse_delimiter(&input.delimiter)?;
    let template =
        commands::resolve_template(input.template.as_deref(), input.template_file.as_deref())?;
    let recipients =
        commands::collect_recipients(input.recipients.as_deref(), delimiter, &input.to)?;

    if recipients.is_empty() {
        warn!("No recipients given; use --recipients FILE or --to USERNAME");
    }
    Ok((recipients, template))
}
