use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::info;
use validator::Validate;

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const CONFIG_DIR: &str = "config";
const DEFAULT_API_URL: &str = "https://cybqa.pesapal.com/pesapalv3";
const DEFAULT_CURRENCY: &str = "RWF";
const DEFAULT_GATEWAY_TIMEOUT_SECS: u64 = 10;
const DEFAULT_GATEWAY_RETRY_ATTEMPTS: u32 = 3;
const DEFAULT_GATEWAY_RETRY_BASE_DELAY_MS: u64 = 200;
const DEFAULT_TOKEN_TTL_SECS: u64 = 240;

#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid configuration: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("{0}")]
    Missing(String),
}

/// Application configuration with validation. All fields can be provided via
/// `config/{default,<env>}.toml` files or `APP__`-prefixed environment
/// variables (e.g. `APP__CONSUMER_KEY`).
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Application environment
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// Pesapal API base URL, e.g. "https://pay.pesapal.com/v3"
    #[serde(default = "default_api_url")]
    pub pesapal_api_url: String,

    /// Pesapal consumer key (required)
    #[validate(length(min = 1))]
    pub consumer_key: String,

    /// Pesapal consumer secret (required). Also keys the HMAC used for
    /// request signing and IPN verification unless `ipn_secret` is set.
    #[validate(length(min = 1))]
    pub consumer_secret: String,

    /// Callback URL the gateway redirects the customer back to
    #[serde(default)]
    pub callback_url: String,

    /// Registered IPN notification identifier
    #[serde(default)]
    pub notification_id: String,

    /// Currency code submitted with every order (KES, UGX, TZS, RWF, USD, ...)
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Shared secret for verifying inbound IPN signatures; falls back to the
    /// consumer secret when unset
    #[serde(default)]
    pub ipn_secret: Option<String>,

    /// Per-request timeout for outbound gateway calls (seconds)
    #[serde(default = "default_gateway_timeout_secs")]
    pub gateway_timeout_secs: u64,

    /// Attempts per gateway call; transport errors and 5xx responses are
    /// retried, 4xx responses are not
    #[serde(default = "default_gateway_retry_attempts")]
    pub gateway_retry_attempts: u32,

    /// Base delay for exponential retry backoff (milliseconds)
    #[serde(default = "default_gateway_retry_base_delay_ms")]
    pub gateway_retry_base_delay_ms: u64,

    /// How long a bearer token is reused before re-fetching (seconds)
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: u64,
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_environment() -> String {
    DEFAULT_ENV.to_string()
}
fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}
fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}
fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}
fn default_gateway_timeout_secs() -> u64 {
    DEFAULT_GATEWAY_TIMEOUT_SECS
}
fn default_gateway_retry_attempts() -> u32 {
    DEFAULT_GATEWAY_RETRY_ATTEMPTS
}
fn default_gateway_retry_base_delay_ms() -> u64 {
    DEFAULT_GATEWAY_RETRY_BASE_DELAY_MS
}
fn default_token_ttl_secs() -> u64 {
    DEFAULT_TOKEN_TTL_SECS
}

impl AppConfig {
    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
    }

    /// Secret used to verify inbound IPN signatures.
    pub fn ipn_secret(&self) -> &str {
        self.ipn_secret.as_deref().unwrap_or(&self.consumer_secret)
    }
}

/// Loads configuration from files and environment.
///
/// Profile selection follows RUN_ENV (or APP_ENV); environment variables with
/// the `APP__` prefix override file values. The consumer key and secret have
/// no defaults and must be provided explicitly.
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    if !Path::new(CONFIG_DIR).exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            CONFIG_DIR
        );
    }

    let config = Config::builder()
        .set_default("environment", DEFAULT_ENV)?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, run_env)).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    // Check for credentials before deserialization to produce a clear error
    // message instead of a generic missing-field failure.
    if config.get_string("consumer_key").is_err() || config.get_string("consumer_secret").is_err() {
        return Err(AppConfigError::Missing(
            "Pesapal credentials not configured: set APP__CONSUMER_KEY and APP__CONSUMER_SECRET"
                .to_string(),
        ));
    }

    let app_config: AppConfig = config.try_deserialize()?;
    app_config.validate()?;
    Ok(app_config)
}

/// Initializes the global tracing subscriber. RUST_LOG overrides the
/// configured level when set.
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let default_directive = format!("pesapal_checkout={},tower_http=debug", level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);
    let filter = EnvFilter::new(filter_directive);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .init();
    }
}
