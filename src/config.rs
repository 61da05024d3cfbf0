//! Configuration for the X API credentials, transport and pacing
//!
//! Loads configuration from config.yml file

use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::pacing::RunConfig;

/// Default constants (fallback if config.yml not found)
pub const CONFIG_FILE: &str = "config.yml";
pub const DEFAULT_BASE_URL: &str = "https://api.x.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_RATE_LIMIT_WAITS: u32 = 3;

/// The four user-context credentials of an X developer app.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub api_key: String,
    pub api_secret: String,
    pub access_token: String,
    pub access_token_secret: String,
}

impl Credentials {
    pub fn new(
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
        access_token: impl Into<String>,
        access_token_secret: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            access_token: access_token.into(),
            access_token_secret: access_token_secret.into(),
        }
    }

    /// Names of credentials that are blank.
    pub fn missing(&self) -> Vec<&'static str> {
        [
            ("api_key", &self.api_key),
            ("api_secret", &self.api_secret),
            ("access_token", &self.access_token),
            ("access_token_secret", &self.access_token_secret),
        ]
        .into_iter()
        .filter(|(_, v)| v.trim().is_empty())
        .map(|(k, _)| k)
        .collect()
    }

    pub fn validate(&self) -> Result<()> {
        let missing = self.missing();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::Config(format!(
                "missing X credentials: {}",
                missing.join(", ")
            )))
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn redact(value: &str) -> &'static str {
            if value.is_empty() {
                "<empty>"
            } else {
                "<redacted>"
            }
        }
        f.debug_struct("Credentials")
            .field("api_key", &redact(&self.api_key))
            .field("api_secret", &redact(&self.api_secret))
            .field("access_token", &redact(&self.access_token))
            .field("access_token_secret", &redact(&self.access_token_secret))
            .finish()
    }
}

/// HTTP-level settings for the X client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub wait_on_rate_limit: bool,
    pub max_rate_limit_waits: u32,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            wait_on_rate_limit: true,
            max_rate_limit_waits: DEFAULT_MAX_RATE_LIMIT_WAITS,
        }
    }
}

/// YAML config structures
#[derive(Debug, Default, Deserialize)]
struct YamlConfig {
    x: Option<XSection>,
    pacing: Option<PacingSection>,
}

#[derive(Debug, Default, Deserialize)]
struct XSection {
    api_key: Option<String>,
    api_secret: Option<String>,
    access_token: Option<String>,
    access_token_secret: Option<String>,
    base_url: Option<String>,
    timeout_secs: Option<u64>,
    wait_on_rate_limit: Option<bool>,
    max_rate_limit_waits: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct PacingSection {
    delay_min: Option<u64>,
    delay_max: Option<u64>,
    batch_size: Option<usize>,
    batch_delay: Option<u64>,
}

/// Main configuration struct
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub credentials: Credentials,
    pub transport: TransportConfig,
    pub pacing: RunConfig,
}

impl Config {
    /// Load configuration from config.yml or use defaults
    /// Environment variables take precedence over config.yml values
    pub fn new() -> Self {
        Self::load_from_file(CONFIG_FILE)
            .or_else(|_| Self::load_from_file(format!("../{}", CONFIG_FILE)))
            .unwrap_or_else(|_| Self::from_yaml(YamlConfig::default()))
    }

    /// Load from `path` when one was given, otherwise fall back to [`Config::new`].
    /// An explicit path that does not exist is a configuration error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            None => Ok(Self::new()),
            Some(path) if !path.exists() => Err(Error::Config(format!(
                "config file not found: {}",
                path.display()
            ))),
            Some(path) => Self::load_from_file(path),
        }
    }

    /// Load from an explicit path; a missing file is an error here.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::load_dotenv();

        let content = fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let yaml: YamlConfig = if content.trim().is_empty() {
            YamlConfig::default()
        } else {
            serde_yaml::from_str(content)?
        };
        Ok(Self::from_yaml(yaml))
    }

    fn from_yaml(yaml: YamlConfig) -> Self {
        let x = yaml.x.unwrap_or_default();
        let pacing = yaml.pacing.unwrap_or_default();
        let defaults = RunConfig::default();

        let credentials = Credentials {
            api_key: Self::resolve_env_string(x.api_key, "X_API_KEY"),
            api_secret: Self::resolve_env_string(x.api_secret, "X_API_SECRET"),
            access_token: Self::resolve_env_string(x.access_token, "X_ACCESS_TOKEN"),
            access_token_secret: Self::resolve_env_string(
                x.access_token_secret,
                "X_ACCESS_TOKEN_SECRET",
            ),
        };

        let base_url = Self::resolve_env_string(x.base_url, "X_API_BASE_URL");
        let transport = TransportConfig {
            base_url: if base_url.is_empty() {
                DEFAULT_BASE_URL.to_string()
            } else {
                base_url.trim_end_matches('/').to_string()
            },
            timeout: Duration::from_secs(x.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
            wait_on_rate_limit: x.wait_on_rate_limit.unwrap_or(true),
            max_rate_limit_waits: x
                .max_rate_limit_waits
                .unwrap_or(DEFAULT_MAX_RATE_LIMIT_WAITS),
        };

        let pacing = RunConfig {
            delay_min: pacing.delay_min.unwrap_or(defaults.delay_min),
            delay_max: pacing.delay_max.unwrap_or(defaults.delay_max),
            batch_size: pacing.batch_size.unwrap_or(defaults.batch_size),
            batch_delay: pacing.batch_delay.unwrap_or(defaults.batch_delay),
        };

        Self {
            credentials,
            transport,
            pacing,
        }
    }

    /// Resolve a value: explicit env var wins, then `${VAR}` references, then the literal
    fn resolve_env_string(value: Option<String>, env_key: &str) -> String {
        if let Ok(env_val) = std::env::var(env_key) {
            if !env_val.is_empty() {
                return env_val;
            }
        }
        match value {
            Some(v) if v.starts_with("${") && v.ends_with('}') => {
                let var_name = &v[2..v.len() - 1];
                std::env::var(var_name).unwrap_or_default()
            }
            Some(v) => v,
            None => String::new(),
        }
    }

    /// Load .env file into environment variables using dotenvy
    fn load_dotenv() {
        if dotenvy::dotenv().is_err() {
            let _ = dotenvy::from_filename("../.env");
        }
    }
}
