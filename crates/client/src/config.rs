use std::path::PathBuf;
use std::str::FromStr;

/// Default catalog API base URL.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:4000/api";

/// Default file backing the durable session storage.
pub const DEFAULT_SESSION_FILE: &str = ".musicly-session.json";

/// Client configuration, loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the catalog API, without a trailing slash.
    pub api_base_url: String,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Where the session (access token and profile) is persisted.
    pub session_file: PathBuf,
    /// Page size for list queries. `None` disables pagination.
    pub page_size: Option<u32>,
}

/// A configuration variable holds a value that cannot be parsed.
#[derive(Debug, thiserror::Error)]
#[error("{var} must be {expected}, got '{value}'")]
pub struct ConfigError {
    pub var: &'static str,
    pub expected: &'static str,
    pub value: String,
}

impl ClientConfig {
    /// Configuration with defaults for everything except the base URL.
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into().trim_end_matches('/').to_string(),
            request_timeout_secs: 30,
            session_file: PathBuf::from(DEFAULT_SESSION_FILE),
            page_size: None,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// | Env var                | Default                        |
    /// |------------------------|--------------------------------|
    /// | `API_BASE_URL`         | `http://localhost:4000/api`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                           |
    /// | `SESSION_FILE`         | `.musicly-session.json`        |
    /// | `PAGE_SIZE`            | unset                          |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base = lookup("API_BASE_URL").unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        let mut config = Self::new(base);

        if let Some(value) = lookup("REQUEST_TIMEOUT_SECS") {
            config.request_timeout_secs =
                parse_var("REQUEST_TIMEOUT_SECS", "a whole number of seconds", &value)?;
        }

        if let Some(value) = lookup("SESSION_FILE") {
            config.session_file = PathBuf::from(value);
        }

        if let Some(value) = lookup("PAGE_SIZE").filter(|v| !v.trim().is_empty()) {
            let size: u32 = parse_var("PAGE_SIZE", "a positive integer", &value)?;
            if size == 0 {
                return Err(ConfigError {
                    var: "PAGE_SIZE",
                    expected: "a positive integer",
                    value,
                });
            }
            config.page_size = Some(size);
        }

        Ok(config)
    }
}

fn parse_var<T: FromStr>(var: &'static str, expected: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError {
        var,
        expected,
        value: value.to_string(),
    })
}
