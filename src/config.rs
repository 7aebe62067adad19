use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::{error, info, warn};
use url::Url;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::services::cart_validator::UnknownProductPolicy;

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 4000;
const CONFIG_DIR: &str = "config";
const DEFAULT_STRIPE_API_BASE: &str = "https://api.stripe.com";
const DEFAULT_WEBHOOK_TOLERANCE_SECS: u64 = 300;
const DEFAULT_STRIPE_TIMEOUT_MS: u64 = 15_000;
const DEFAULT_SUCCESS_PATH: &str = "success.html";
const DEFAULT_CANCEL_PATH: &str = "cancel.html";

/// Variables used by earlier deployments, honoured as defaults so that an
/// existing `.env` keeps working. `APP__*` variables take precedence.
const LEGACY_ENV_KEYS: [(&str, &str); 5] = [
    ("PORT", "port"),
    ("DATABASE_URL", "database_url"),
    ("PUBLIC_BASE_URL", "public_base_url"),
    ("STRIPE_SECRET_KEY", "stripe_secret_key"),
    ("STRIPE_WEBHOOK_SECRET", "stripe_webhook_secret"),
];

/// Application configuration, built once at startup and shared read-only.
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Server host address
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Application environment
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    #[validate(custom = "validate_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// Product database URL (SQLite or Postgres). Absent means in-memory catalog.
    #[serde(default)]
    pub database_url: Option<String>,

    /// Seed the demonstration catalog into an empty store on startup
    #[serde(default = "default_true_bool")]
    pub seed_catalog: bool,

    /// Externally visible base URL used for payment callback URLs
    #[serde(default)]
    #[validate(custom = "validate_absolute_url")]
    pub public_base_url: Option<String>,

    /// Path (relative to the base URL) the processor redirects to after payment
    #[serde(default = "default_success_path")]
    pub success_path: String,

    /// Path (relative to the base URL) the processor redirects to on abandon
    #[serde(default = "default_cancel_path")]
    pub cancel_path: String,

    /// Stripe secret API key
    #[serde(default)]
    pub stripe_secret_key: Option<String>,

    /// Stripe webhook signing secret
    #[serde(default)]
    pub stripe_webhook_secret: Option<String>,

    /// Stripe API base URL (overridable for tests and mocks)
    #[serde(default = "default_stripe_api_base")]
    #[validate(custom = "validate_absolute_url")]
    pub stripe_api_base: String,

    /// Maximum age of a webhook signature timestamp (seconds)
    #[serde(default = "default_webhook_tolerance_secs")]
    pub stripe_webhook_tolerance_secs: u64,

    /// Stripe HTTP timeout (milliseconds)
    #[serde(default = "default_stripe_timeout_ms")]
    #[validate(range(min = 1))]
    pub stripe_timeout_ms: u64,

    /// What to do with cart lines naming products the store does not know
    #[serde(default)]
    pub unknown_product_policy: UnknownProductPolicy,

    /// CORS: comma-separated list of allowed origins
    #[serde(default)]
    pub cors_allowed_origins: Option<String>,

    /// Allow permissive CORS outside development
    #[serde(default)]
    pub cors_allow_any_origin: bool,

    /// Maximum request body size in bytes
    #[serde(default = "default_max_body_size")]
    #[validate(range(min = 1))]
    pub max_body_size: usize,
}

impl AppConfig {
    /// Creates a configuration with defaults for everything but the listener.
    pub fn new(host: impl Into<String>, port: u16, environment: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            environment: environment.into(),
            log_level: default_log_level(),
            log_json: false,
            database_url: None,
            seed_catalog: true,
            public_base_url: None,
            success_path: default_success_path(),
            cancel_path: default_cancel_path(),
            stripe_secret_key: None,
            stripe_webhook_secret: None,
            stripe_api_base: default_stripe_api_base(),
            stripe_webhook_tolerance_secs: default_webhook_tolerance_secs(),
            stripe_timeout_ms: default_stripe_timeout_ms(),
            unknown_product_policy: UnknownProductPolicy::default(),
            cors_allowed_origins: None,
            cors_allow_any_origin: false,
            max_body_size: default_max_body_size(),
        }
    }

    /// Checks if running in development environment
    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
    }

    /// Gets log level reference
    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    /// Stripe secret key, ignoring blank values
    pub fn stripe_secret_key(&self) -> Option<&str> {
        non_blank(self.stripe_secret_key.as_deref())
    }

    /// Stripe webhook secret, ignoring blank values
    pub fn stripe_webhook_secret(&self) -> Option<&str> {
        non_blank(self.stripe_webhook_secret.as_deref())
    }

    /// Explicit CORS origins, if any are configured
    pub fn cors_origins(&self) -> Vec<String> {
        self.cors_allowed_origins
            .as_deref()
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|origin| !origin.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Whether we should fall back to permissive CORS
    pub fn should_allow_permissive_cors(&self) -> bool {
        self.is_development() || self.cors_allow_any_origin
    }

    fn validate_additional_constraints(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if !self.should_allow_permissive_cors() && self.cors_origins().is_empty() {
            let mut err = ValidationError::new("cors_allowed_origins_required");
            err.message = Some(
                "Set APP__CORS_ALLOWED_ORIGINS for non-development environments or explicitly opt-in via APP__CORS_ALLOW_ANY_ORIGIN=true".into(),
            );
            errors.add("cors_allowed_origins", err);
        }

        for (field, path) in [
            ("success_path", &self.success_path),
            ("cancel_path", &self.cancel_path),
        ] {
            if path.contains("://") {
                let mut err = ValidationError::new("relative_path");
                err.message = Some("Callback paths must be relative to the base URL".into());
                errors.add(field, err);
            }
        }

        if errors.errors().is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Logs deployment gaps that only surface per request.
    pub fn warn_on_missing_secrets(&self) {
        if self.stripe_secret_key().is_none() {
            warn!("Stripe secret key not configured; checkout requests will fail until APP__STRIPE_SECRET_KEY is set");
        }
        if self.stripe_webhook_secret().is_none() {
            warn!("Stripe webhook secret not configured; payment notifications will be refused until APP__STRIPE_WEBHOOK_SECRET is set");
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new(DEFAULT_HOST, DEFAULT_PORT, DEFAULT_ENV)
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Configuration loading failed: {0}")]
    Load(#[from] ConfigError),

    #[error("Configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Default value functions
fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_true_bool() -> bool {
    true
}

fn default_success_path() -> String {
    DEFAULT_SUCCESS_PATH.to_string()
}

fn default_cancel_path() -> String {
    DEFAULT_CANCEL_PATH.to_string()
}

fn default_stripe_api_base() -> String {
    DEFAULT_STRIPE_API_BASE.to_string()
}

fn default_webhook_tolerance_secs() -> u64 {
    DEFAULT_WEBHOOK_TOLERANCE_SECS
}

fn default_stripe_timeout_ms() -> u64 {
    DEFAULT_STRIPE_TIMEOUT_MS
}

fn default_max_body_size() -> usize {
    1024 * 1024 // 1MB
}

/// Validates log level values
fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if valid_levels.contains(&level.to_lowercase().as_str()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("log_level");
        err.message = Some("Must be one of: trace, debug, info, warn, error".into());
        Err(err)
    }
}

fn validate_absolute_url(value: &str) -> Result<(), ValidationError> {
    match Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
        _ => {
            let mut err = ValidationError::new("url");
            err.message = Some("Must be an absolute http(s) URL".into());
            Err(err)
        }
    }
}

/// Initializes tracing using the provided log level as the default filter
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_directive = format!("storefront_checkout={},tower_http=debug", level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    let filter = EnvFilter::new(filter_directive);
    if json {
        let _ = fmt().with_env_filter(filter).json().try_init();
    } else {
        let _ = fmt().with_env_filter(filter).try_init();
    }
}

/// Loads application configuration
///
/// Layers configuration sources in this order:
/// 1. Built-in defaults
/// 2. Legacy deployment variables (`PORT`, `STRIPE_SECRET_KEY`, ...)
/// 3. Default config (config/default.toml)
/// 4. Environment-specific config (config/{env}.toml)
/// 5. Environment variables (APP__*)
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

    let mut builder = Config::builder()
        .set_default("host", DEFAULT_HOST)?
        .set_default("port", i64::from(DEFAULT_PORT))?
        .set_default("environment", run_env.as_str())?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?;
    for (legacy, key) in LEGACY_ENV_KEYS {
        if let Some(value) = env::var(legacy).ok().filter(|v| !v.trim().is_empty()) {
            builder = builder.set_default(key, value)?;
        }
    }

    let config = builder
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, run_env)).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    let app_config: AppConfig = config.try_deserialize()?;

    app_config.validate().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    app_config.validate_additional_constraints().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    info!("Configuration loaded successfully");
    Ok(app_config)
}
