//! Client configuration structs
//!
//! Loads configuration from environment variables (and a `.env` file if present).

use chat_core::RetryPolicy;
use serde::Deserialize;
use std::env;
use std::time::Duration;

/// Main client configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    pub app: AppSettings,
    pub server: ServerConfig,
    pub session: SessionConfig,
    pub api: ApiConfig,
    pub credentials: CredentialsConfig,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default = "default_env")]
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "production" => Some(Self::Production),
            "staging" => Some(Self::Staging),
            "development" => Some(Self::Development),
            _ => None,
        }
    }
}

/// Where the chat server lives
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// HTTP base URL, e.g. `http://127.0.0.1:5000`
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Real-time endpoint; derived from `base_url` when unset
    #[serde(default)]
    pub ws_url: Option<String>,
}

impl ServerConfig {
    /// HTTP base URL without a trailing slash
    #[must_use]
    pub fn http_base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Real-time endpoint URL
    ///
    /// Defaults to the base URL with its scheme switched to `ws`/`wss` and the
    /// default socket path appended.
    #[must_use]
    pub fn ws_url(&self) -> String {
        if let Some(url) = &self.ws_url {
            return url.clone();
        }

        let base = self.http_base();
        let switched = if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            base.to_string()
        };
        format!("{switched}{}", default_ws_path())
    }
}

/// Connection session tuning
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// Minimum gap between two outgoing typing notifications
    #[serde(default = "default_typing_throttle_ms")]
    pub typing_throttle_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            typing_throttle_ms: default_typing_throttle_ms(),
        }
    }
}

impl SessionConfig {
    /// Reconnect policy for the session
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, Duration::from_millis(self.retry_delay_ms))
    }

    #[must_use]
    pub fn typing_throttle(&self) -> Duration {
        Duration::from_millis(self.typing_throttle_ms)
    }
}

/// HTTP API client tuning
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Attempts for authenticated requests
    #[serde(default = "default_api_attempts")]
    pub attempts: u32,
    #[serde(default = "default_api_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// Attempts for login/registration (retried on HTTP 500 only)
    #[serde(default = "default_auth_attempts")]
    pub auth_attempts: u32,
    #[serde(default = "default_auth_retry_delay_ms")]
    pub auth_retry_delay_ms: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            attempts: default_api_attempts(),
            retry_delay_ms: default_api_retry_delay_ms(),
            auth_attempts: default_auth_attempts(),
            auth_retry_delay_ms: default_auth_retry_delay_ms(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ApiConfig {
    /// Retry policy for authenticated requests
    #[must_use]
    pub fn request_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.attempts, Duration::from_millis(self.retry_delay_ms))
    }

    /// Retry policy for login and registration
    #[must_use]
    pub fn auth_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.auth_attempts, Duration::from_millis(self.auth_retry_delay_ms))
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Optional login credentials or a pre-issued token
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CredentialsConfig {
    pub email: Option<String>,
    pub password: Option<String>,
    pub token: Option<String>,
}

impl CredentialsConfig {
    /// Email and password, if both are set
    #[must_use]
    pub fn login(&self) -> Option<(&str, &str)> {
        match (&self.email, &self.password) {
            (Some(email), Some(password)) => Some((email.as_str(), password.as_str())),
            _ => None,
        }
    }
}

// Default value functions
fn default_app_name() -> String {
    "chat-client".to_string()
}

fn default_env() -> Environment {
    Environment::Development
}

fn default_base_url() -> String {
    "http://127.0.0.1:5000".to_string()
}

fn default_ws_path() -> &'static str {
    "/ws"
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    300
}

fn default_typing_throttle_ms() -> u64 {
    2000
}

fn default_api_attempts() -> u32 {
    3
}

fn default_api_retry_delay_ms() -> u64 {
    200
}

fn default_auth_attempts() -> u32 {
    4 // first try plus three retries on HTTP 500
}

fn default_auth_retry_delay_ms() -> u64 {
    3
}

fn default_timeout_secs() -> u64 {
    10
}

impl ClientConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if a variable is malformed or a login is half-configured
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let parsed = |key: &'static str| -> Result<Option<u64>, ConfigError> {
            lookup(key)
                .map(|s| {
                    s.trim()
                        .parse::<u64>()
                        .map_err(|_| ConfigError::InvalidValue(key, s.clone()))
                })
                .transpose()
        };
        let parsed_u32 = |key: &'static str| -> Result<Option<u32>, ConfigError> {
            parsed(key)?
                .map(|v| u32::try_from(v).map_err(|_| ConfigError::InvalidValue(key, v.to_string())))
                .transpose()
        };

        let base_url = lookup("CHAT_SERVER_URL").unwrap_or_else(default_base_url);
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue("CHAT_SERVER_URL", base_url));
        }

        let credentials = CredentialsConfig {
            email: lookup("CHAT_EMAIL"),
            password: lookup("CHAT_PASSWORD"),
            token: lookup("CHAT_TOKEN").filter(|t| !t.is_empty()),
        };
        if credentials.email.is_some() && credentials.password.is_none() {
            return Err(ConfigError::MissingVar("CHAT_PASSWORD"));
        }

        Ok(Self {
            app: AppSettings {
                name: lookup("APP_NAME").unwrap_or_else(default_app_name),
                env: lookup("CHAT_ENV")
                    .and_then(|s| Environment::parse(&s))
                    .unwrap_or_default(),
            },
            server: ServerConfig {
                base_url,
                ws_url: lookup("CHAT_WS_URL"),
            },
            session: SessionConfig {
                max_retries: parsed_u32("CHAT_MAX_RETRIES")?.unwrap_or_else(default_max_retries),
                retry_delay_ms: parsed("CHAT_RETRY_DELAY_MS")?
                    .unwrap_or_else(default_retry_delay_ms),
                typing_throttle_ms: parsed("CHAT_TYPING_THROTTLE_MS")?
                    .unwrap_or_else(default_typing_throttle_ms),
            },
            api: ApiConfig {
                attempts: parsed_u32("CHAT_API_ATTEMPTS")?.unwrap_or_else(default_api_attempts),
                retry_delay_ms: parsed("CHAT_API_RETRY_DELAY_MS")?
                    .unwrap_or_else(default_api_retry_delay_ms),
                auth_attempts: default_auth_attempts(),
                auth_retry_delay_ms: default_auth_retry_delay_ms(),
                timeout_secs: parsed("CHAT_API_TIMEOUT_SECS")?.unwrap_or_else(default_timeout_secs),
            },
            credentials,
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
