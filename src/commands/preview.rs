//! Preview command: render messages without sending.

use crate::messenger::{preview, Preview};
use crate::recipient::Recipient;

/// CLI entry point
pub fn run(recipients: &[Recipient], template: &str, limit: Option<usize>) -> Vec<Preview> {
    let mut previews = preview(recipients, template);
    if let Some(limit) = limit {
        previews.truncate(limit);
    }

    println!("Dry run: no messages will be sent.\n");
    for p in &previews {
        match &p.username {
            Some(username) => println!("── [{}/{}] @{}", p.position, recipients.len(), username),
            None => println!(
                "── [{}/{}] ✗ missing username (would be skipped)",
                p.position,
                recipients.len()
            ),
        }
        println!("{}", p.message);
        if !p.unresolved.is_empty() {
            println!("   ⚠ unresolved placeholders: {}", p.unresolved.join(", "));
        }
        println!();
    }
    println!("Rendered {} of {} messages.", previews.len(), recipients.len());

    previews
}
