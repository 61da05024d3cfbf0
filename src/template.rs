//! Message templates with `{field}` placeholders.
//!
//! Substitution is literal: `{username}` first, then each custom field in
//! recipient order. Placeholders with no matching field are left untouched.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Error, Result};
use crate::recipient::{normalize_username, Recipient};

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("valid placeholder regex"));

/// Render `template` for one recipient.
pub fn personalize<'a, I>(template: &str, username: &str, custom_fields: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut message = template.replace("{username}", normalize_username(username));
    for (key, value) in custom_fields {
        message = message.replace(&format!("{{{}}}", key), value);
    }
    message
}

/// Render `template` using every field of `recipient`.
pub fn personalize_recipient(template: &str, recipient: &Recipient) -> String {
    personalize(
        template,
        recipient.username().unwrap_or_default(),
        recipient.custom_fields(),
    )
}

/// Placeholder names still present in a rendered message, in order of appearance.
pub fn unresolved_placeholders(message: &str) -> Vec<&str> {
    PLACEHOLDER_RE
        .captures_iter(message)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str())
        .collect()
}

/// Read a template from a file; trailing newlines are dropped.
pub fn load_template<P: AsRef<Path>>(path: P) -> Result<String> {
    let content = std::fs::read_to_string(path.as_ref())?;
    let template = content.trim_end_matches(['\r', '\n']).to_string();
    if template.trim().is_empty() {
        return Err(Error::InvalidArgument(format!(
            "template file {} is empty",
            path.as_ref().display()
        )));
    }
    Ok(template)
}
