//! Bulk Direct Message Sender Library
//!
//! This library provides tools to:
//! - Load recipients from delimited files with arbitrary template fields
//! - Personalize a message template per recipient
//! - Send direct messages through the X API v2 with OAuth 1.0a signing
//! - Pace sends with randomized gaps and batch cooldowns
//! - Report per-recipient outcomes and a run summary

pub mod config;
pub mod error;
pub mod messenger;
pub mod metrics;
pub mod pacing;
pub mod recipient;
pub mod template;
pub mod transport;

// Re-export common types
pub use config::{Config, Credentials, TransportConfig};
pub use error::{Error, Result};
pub use messenger::{preview, BulkMessenger, Preview, SendResult, Summary};
pub use pacing::{Pause, RunConfig, Sleeper, TokioSleeper};
pub use recipient::{load_recipients, Recipient};
pub use template::personalize;
pub use transport::{AccountId, DirectMessageTransport, TransportError, XClient};

// Commands module uses re-exported types, so it must be declared after the re-exports
pub mod commands;
