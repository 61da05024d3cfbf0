//! Command implementations
//!
//! Each module corresponds to a subcommand in the CLI.

pub mod preview;
pub mod send;
pub mod verify;

use std::path::Path;

use crate::error::{Error, Result};
use crate::recipient::{load_recipients, Recipient};
use crate::template::load_template;

pub use preview::run as preview_run;
pub use send::{run as send_run, SendArgs};
pub use verify::run as verify_run;

/// Recipients from an optional file followed by any `--to` usernames.
pub fn collect_recipients(
    file: Option<&Path>,
    delimiter: u8,
    usernames: &[String],
) -> Result<Vec<Recipient>> {
    let mut recipients = match file {
        Some(path) => load_recipients(path, delimiter)?,
        None => Vec::new(),
    };

    for raw in usernames {
        for part in raw.split(|c: char| c == ',' || c.is_whitespace()) {
            let part = part.trim();
            if !part.is_empty() {
                recipients.push(Recipient::with_username(part));
            }
        }
    }

    Ok(recipients)
}

/// Template text from `--template` or `--template-file` (exactly one).
pub fn resolve_template(text: Option<&str>, file: Option<&Path>) -> Result<String> {
    match (text, file) {
        (Some(_), Some(_)) => Err(Error::InvalidArgument(
            "use either --template or --template-file, not both".to_string(),
        )),
        (Some(text), None) if !text.trim().is_empty() => Ok(text.replace("\\n", "\n")),
        (Some(_), None) => Err(Error::InvalidArgument("template is empty".to_string())),
        (None, Some(path)) => load_template(path),
        (None, None) => Err(Error::InvalidArgument(
            "provide a message with --template or --template-file".to_string(),
        )),
    }
}
