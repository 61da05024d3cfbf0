//! Recipients and the delimited-file loader.

use std::path::Path;

use tracing::debug;

use crate::error::{Error, Result};

pub const USERNAME_FIELD: &str = "username";

/// One row of the mailing list: field name → value, in header order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Recipient {
    fields: Vec<(String, String)>,
}

impl Recipient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for a recipient with only a username.
    pub fn with_username(username: impl Into<String>) -> Self {
        Self::new().field(USERNAME_FIELD, username)
    }

    /// Builder-style insert; replaces the value if the field already exists.
    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Raw `username` value as supplied, if present.
    pub fn username(&self) -> Option<&str> {
        self.get(USERNAME_FIELD)
    }

    /// All fields except `username`, in order.
    pub fn custom_fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .filter(|(k, _)| k != USERNAME_FIELD)
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }
}

impl<K, V> FromIterator<(K, V)> for Recipient
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut recipient = Recipient::new();
        for (k, v) in iter {
            recipient.insert(k, v);
        }
        recipient
    }
}

/// Strip whitespace and any leading `@` from a raw username.
pub fn normalize_username(raw: &str) -> &str {
    raw.trim().trim_start_matches('@')
}

/// Load recipients from a delimited text file with a header row.
pub fn load_recipients<P: AsRef<Path>>(path: P, delimiter: u8) -> Result<Vec<Recipient>> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)?;
    let recipients = read_recipients(file, delimiter)?;
    debug!(path = %path.display(), count = recipients.len(), "Loaded recipients");
    Ok(recipients)
}

/// Parse recipients from any reader; the first row names the fields.
pub fn read_recipients<R: std::io::Read>(reader: R, delimiter: u8) -> Result<Vec<Recipient>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();

    if !headers.iter().any(|h| h == USERNAME_FIELD) {
        return Err(Error::Parse(format!(
            "header row must contain a '{}' column (found: {})",
            USERNAME_FIELD,
            headers.join(", ")
        )));
    }

    let mut recipients = Vec::new();
    for record in reader.records() {
        let record = record?;
        let recipient: Recipient = headers
            .iter()
            .zip(record.iter())
            .map(|(h, v)| (h.as_str(), v))
            .collect();
        recipients.push(recipient);
    }
    Ok(recipients)
}

/// Parse a delimiter argument: a single byte, or the word `tab`.
pub fn parse_delimiter(raw: &str) -> Result<u8> {
    match raw {
        "tab" | "\\t" | "\t" => Ok(b'\t'),
        s if s.len() == 1 => Ok(s.as_bytes()[0]),
        other => Err(Error::InvalidArgument(format!(
            "delimiter must be a single character, got '{}'",
            other
        ))),
    }
}
