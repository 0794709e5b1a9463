//! Application configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `TOKOKU_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `TOKOKU_BASE_URL` - Public URL of the site; `https` enables secure cookies
//!
//! ## Optional
//! - `TOKOKU_HOST` - Bind address (default: 127.0.0.1)
//! - `TOKOKU_PORT` - Listen port (default: 3000)
//! - `TOKOKU_UPLOAD_DIR` - Directory for uploaded images (default: storage/public)
//! - `TOKOKU_STATIC_DIR` - Directory with CSS/JS assets (default: crates/web/static)
//! - `TOKOKU_LOG_JSON` - Emit JSON logs when set to anything but `0`/`false`
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Traces sample rate (default: 0.1)
//!
//! ## Optional (TLS)
//! - `TOKOKU_TLS_CERT` - PEM-encoded certificate chain
//! - `TOKOKU_TLS_KEY` - PEM-encoded private key

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Web application configuration.
#[derive(Debug, Clone)]
pub struct WebConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL
    pub base_url: Url,
    /// Root directory for uploaded files, served under `/storage`
    pub upload_dir: PathBuf,
    /// Directory with static assets, served under `/static`
    pub static_dir: PathBuf,
    /// Structured JSON logs instead of text
    pub log_json: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    pub sentry_environment: Option<String>,
    pub sentry_sample_rate: f32,
    pub sentry_traces_sample_rate: f32,
    /// TLS configuration for HTTPS (optional)
    pub tls: Option<TlsConfig>,
}

/// TLS configuration for HTTPS.
#[derive(Clone)]
pub struct TlsConfig {
    /// PEM-encoded certificate chain
    pub cert_pem: String,
    /// PEM-encoded private key
    pub key_pem: SecretString,
}

impl std::fmt::Debug for TlsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsConfig")
            .field("cert_pem", &"[CERTIFICATE]")
            .field("key_pem", &"[REDACTED]")
            .finish()
    }
}

/// Source of configuration values, keyed by variable name.
trait Source {
    fn get(&self, key: &str) -> Option<String>;
}

struct ProcessEnv;

impl Source for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

impl Source for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|v| !v.is_empty())
    }
}

impl WebConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::load(&ProcessEnv)
    }

    /// Load configuration from explicit key/value pairs instead of the
    /// process environment. Used by tools and tests that build the app.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_vars<'a>(
        vars: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<Self, ConfigError> {
        let vars: HashMap<String, String> = vars
            .into_iter()
            .filter(|(_, v)| !v.is_empty())
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self::load(&vars)
    }

    fn load(env: &impl Source) -> Result<Self, ConfigError> {
        let database_url = env
            .get("TOKOKU_DATABASE_URL")
            .or_else(|| env.get("DATABASE_URL"))
            .map(SecretString::from)
            .ok_or_else(|| ConfigError::MissingEnvVar("TOKOKU_DATABASE_URL".to_string()))?;

        let host = parse_or_default(env, "TOKOKU_HOST", "127.0.0.1", str::parse::<IpAddr>)?;
        let port = parse_or_default(env, "TOKOKU_PORT", "3000", str::parse::<u16>)?;

        let base_url = env
            .get("TOKOKU_BASE_URL")
            .ok_or_else(|| ConfigError::MissingEnvVar("TOKOKU_BASE_URL".to_string()))?;
        let base_url = Url::parse(&base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("TOKOKU_BASE_URL".to_string(), e.to_string())
        })?;

        let upload_dir = PathBuf::from(
            env.get("TOKOKU_UPLOAD_DIR")
                .unwrap_or_else(|| "storage/public".to_string()),
        );
        let static_dir = PathBuf::from(
            env.get("TOKOKU_STATIC_DIR")
                .unwrap_or_else(|| "crates/web/static".to_string()),
        );
        let log_json = env
            .get("TOKOKU_LOG_JSON")
            .is_some_and(|v| !matches!(v.as_str(), "0" | "false"));

        let sentry_sample_rate = env
            .get("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = env
            .get("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(0.1);

        let tls = match (env.get("TOKOKU_TLS_CERT"), env.get("TOKOKU_TLS_KEY")) {
            (Some(cert), Some(key)) => Some(TlsConfig {
                cert_pem: cert,
                key_pem: SecretString::from(key),
            }),
            (None, None) => None,
            _ => {
                return Err(ConfigError::InvalidEnvVar(
                    "TOKOKU_TLS_*".to_string(),
                    "Both TOKOKU_TLS_CERT and TOKOKU_TLS_KEY must be set together".to_string(),
                ));
            }
        };

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            upload_dir,
            static_dir,
            log_json,
            sentry_dsn: env.get("SENTRY_DSN"),
            sentry_environment: env.get("SENTRY_ENVIRONMENT"),
            sentry_sample_rate,
            sentry_traces_sample_rate,
            tls,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether session cookies must carry the `Secure` flag.
    #[must_use]
    pub fn secure_cookies(&self) -> bool {
        self.base_url.scheme() == "https"
    }
}

fn parse_or_default<T, E: std::fmt::Display>(
    env: &impl Source,
    key: &str,
    default: &str,
    parse: impl Fn(&str) -> Result<T, E>,
) -> Result<T, ConfigError> {
    let raw = env.get(key).unwrap_or_else(|| default.to_string());
    parse(&raw).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}
