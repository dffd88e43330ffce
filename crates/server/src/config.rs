//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional.
//!
//! ## Server
//! - `CRM_HOST` - Bind address (default: 0.0.0.0)
//! - `PORT` - Listen port (default: 3000)
//! - `CRM_DATA_FILE` - JSON data file (default: data/crm.json)
//! - `CRM_STATIC_DIR` - Front-end files served as fallback (default: public)
//! - `CRM_LOG_JSON` - Emit JSON logs when set to anything but `0`/`false`
//!
//! ## Authentication
//! - `CRM_ADMIN_PASSWORD` - Password for the seeded `admin` user (default: admin123)
//! - `CRM_SESSION_TTL_HOURS` - Login session lifetime (default: 168)
//!
//! ## LLM
//! - `LLM_API_URL` - Chat-completion endpoint (default: Moonshot)
//! - `LLM_MODEL` - Model ID (default: moonshot-v1-32k)
//! - `LLM_MAX_TOKENS` - Max tokens per completion (default: 2000)
//! - `LLM_TEMPERATURE` - Sampling temperature (default: 0.7)
//!
//! The LLM API key is not configured here; callers send it with each request.
//!
//! ## Error tracking
//! - `SENTRY_DSN` - Sentry DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Traces sample rate (default: 0.1)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

/// Default chat-completion endpoint.
pub const DEFAULT_LLM_API_URL: &str = "https://api.moonshot.cn/v1/chat/completions";
/// Default model ID.
pub const DEFAULT_LLM_MODEL: &str = "moonshot-v1-32k";
const DEFAULT_LLM_MAX_TOKENS: &str = "2000";
const DEFAULT_LLM_TEMPERATURE: &str = "0.7";

/// Password of the seeded admin user when `CRM_ADMIN_PASSWORD` is unset.
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";
const DEFAULT_SESSION_TTL_HOURS: &str = "168";

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.0;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "admin",
    "changeme",
    "password",
    "secret",
    "123456",
    "qwerty",
    "letmein",
    "your-",
    "example",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct CrmConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// JSON data file
    pub data_file: PathBuf,
    /// Directory of static front-end files
    pub static_dir: PathBuf,
    /// Authentication settings
    pub auth: AuthConfig,
    /// Chat-completion settings
    pub llm: LlmConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
    /// Emit logs as JSON
    pub log_json: bool,
}

/// Authentication configuration.
///
/// Implements `Debug` manually to redact the admin password.
#[derive(Clone)]
pub struct AuthConfig {
    /// Password for the seeded `admin` user
    pub admin_password: SecretString,
    /// Whether `admin_password` is the built-in default
    pub admin_password_is_default: bool,
    /// Login session lifetime
    pub session_ttl: Duration,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("admin_password", &"[REDACTED]")
            .field("admin_password_is_default", &self.admin_password_is_default)
            .field("session_ttl", &self.session_ttl)
            .finish()
    }
}

/// Chat-completion API configuration.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Chat-completion endpoint
    pub api_url: Url,
    /// Model ID
    pub model: String,
    /// Max tokens per completion
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
}

impl CrmConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup` instead of the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let vars = Vars(&lookup);

        let host: IpAddr = vars.parsed("CRM_HOST", "0.0.0.0")?;
        let port: u16 = vars.parsed("PORT", "3000")?;
        let data_file = PathBuf::from(vars.or_default("CRM_DATA_FILE", "data/crm.json"));
        let static_dir = PathBuf::from(vars.or_default("CRM_STATIC_DIR", "public"));

        let auth = AuthConfig::from_vars(&vars)?;
        let llm = LlmConfig::from_vars(&vars)?;

        let sentry_dsn = vars.optional("SENTRY_DSN");
        let sentry_environment = vars.optional("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = vars
            .optional("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = vars
            .optional("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(0.1);
        let log_json = vars
            .optional("CRM_LOG_JSON")
            .is_some_and(|v| !matches!(v.as_str(), "0" | "false"));

        Ok(Self {
            host,
            port,
            data_file,
            static_dir,
            auth,
            llm,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
            log_json,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl AuthConfig {
    fn from_vars(vars: &Vars<'_>) -> Result<Self, ConfigError> {
        let (admin_password, admin_password_is_default) = match vars.optional("CRM_ADMIN_PASSWORD")
        {
            Some(password) => {
                if let Err(e) = validate_secret_strength(&password, "CRM_ADMIN_PASSWORD") {
                    tracing::warn!("CRM_ADMIN_PASSWORD validation warning: {e}");
                }
                (SecretString::from(password), false)
            }
            None => (SecretString::from(DEFAULT_ADMIN_PASSWORD), true),
        };

        let hours: u64 = vars.parsed("CRM_SESSION_TTL_HOURS", DEFAULT_SESSION_TTL_HOURS)?;
        if hours == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "CRM_SESSION_TTL_HOURS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            admin_password,
            admin_password_is_default,
            session_ttl: Duration::from_secs(hours * 3600),
        })
    }
}

impl LlmConfig {
    fn from_vars(vars: &Vars<'_>) -> Result<Self, ConfigError> {
        let api_url = Url::parse(&vars.or_default("LLM_API_URL", DEFAULT_LLM_API_URL))
            .map_err(|e| ConfigError::InvalidEnvVar("LLM_API_URL".to_string(), e.to_string()))?;
        if !matches!(api_url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidEnvVar(
                "LLM_API_URL".to_string(),
                format!("unsupported scheme '{}'", api_url.scheme()),
            ));
        }

        let max_tokens: u32 = vars.parsed("LLM_MAX_TOKENS", DEFAULT_LLM_MAX_TOKENS)?;
        let temperature: f32 = vars.parsed("LLM_TEMPERATURE", DEFAULT_LLM_TEMPERATURE)?;
        if !(0.0..=2.0).contains(&temperature) {
            return Err(ConfigError::InvalidEnvVar(
                "LLM_TEMPERATURE".to_string(),
                "must be between 0 and 2".to_string(),
            ));
        }

        Ok(Self {
            api_url,
            model: vars.or_default("LLM_MODEL", DEFAULT_LLM_MODEL),
            max_tokens,
            temperature,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Variable lookup shared by the config sections.
struct Vars<'a>(&'a dyn Fn(&str) -> Option<String>);

impl Vars<'_> {
    /// Get an optional variable, treating an empty value as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    /// Get a variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    /// Parse a variable, falling back to parsing `default` when unset.
    fn parsed<T>(&self, key: &str, default: &str) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        self.or_default(key, default)
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    }
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a common password (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1})"
            ),
        ));
    }

    Ok(())
}
