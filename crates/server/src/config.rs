use crate::phone::DefaultCountry;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration build error: {0}")]
    Build(#[from] config::ConfigError),
    #[error("Invalid configuration: {0}")]
    Validation(String),
}

/// Twilio credentials. All three values are needed to send anything; when one
/// is missing the alert dispatcher still starts but every send fails.
#[derive(Clone, Debug, Deserialize)]
pub struct TwilioConfig {
    #[serde(default)]
    pub account_sid: Option<String>,
    #[serde(default)]
    pub auth_token: Option<String>,
    /// Sending number in E.164 form.
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default = "default_twilio_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_twilio_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for TwilioConfig {
    fn default() -> Self {
        Self {
            account_sid: None,
            auth_token: None,
            phone_number: None,
            api_base_url: default_twilio_api_base_url(),
            timeout_secs: default_twilio_timeout_secs(),
        }
    }
}

impl TwilioConfig {
    /// Names of the credentials that are absent or blank.
    pub fn missing_credentials(&self) -> Vec<&'static str> {
        let blank = |v: &Option<String>| v.as_deref().is_none_or(|s| s.trim().is_empty());
        let mut missing = Vec::new();
        if blank(&self.account_sid) {
            missing.push("twilio.account_sid");
        }
        if blank(&self.auth_token) {
            missing.push("twilio.auth_token");
        }
        if blank(&self.phone_number) {
            missing.push("twilio.phone_number");
        }
        missing
    }
}

fn default_twilio_api_base_url() -> String {
    "https://api.twilio.com".to_string()
}

fn default_twilio_timeout_secs() -> u64 {
    10
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct PhoneConfig {
    /// Country assumed for short numbers with no recognisable prefix.
    #[serde(default)]
    pub default_country: DefaultCountry,
}

#[derive(Clone, Debug, Deserialize)]
pub struct AlertsConfig {
    /// How many contacts are messaged at once. 1 sends strictly one after another.
    #[serde(default = "default_dispatch_concurrency")]
    pub dispatch_concurrency: usize,
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            dispatch_concurrency: default_dispatch_concurrency(),
        }
    }
}

fn default_dispatch_concurrency() -> usize {
    1
}

/// A fixed-window limit: at most `max_requests` per `window_secs` per client and route.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct RateLimitRule {
    pub window_secs: u64,
    pub max_requests: u32,
    pub message: String,
}

impl RateLimitRule {
    pub fn new(window_secs: u64, max_requests: u32, message: &str) -> Self {
        Self {
            window_secs,
            max_requests,
            message: message.to_string(),
        }
    }

    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct RateLimitsConfig {
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
    #[serde(default = "default_auth_limit")]
    pub auth: RateLimitRule,
    #[serde(default = "default_alert_limit")]
    pub alert: RateLimitRule,
    #[serde(default = "default_public_page_limit")]
    pub public_page: RateLimitRule,
    #[serde(default = "default_general_api_limit")]
    pub general_api: RateLimitRule,
}

impl RateLimitsConfig {
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

impl Default for RateLimitsConfig {
    fn default() -> Self {
        Self {
            sweep_interval_secs: default_sweep_interval_secs(),
            auth: default_auth_limit(),
            alert: default_alert_limit(),
            public_page: default_public_page_limit(),
            general_api: default_general_api_limit(),
        }
    }
}

fn default_sweep_interval_secs() -> u64 {
    60
}

fn default_auth_limit() -> RateLimitRule {
    RateLimitRule::new(
        15 * 60,
        5,
        "Too many authentication attempts. Please try again in 15 minutes.",
    )
}

fn default_alert_limit() -> RateLimitRule {
    RateLimitRule::new(
        15 * 60,
        10,
        "Too many alert requests. Please try again in 15 minutes.",
    )
}

fn default_public_page_limit() -> RateLimitRule {
    RateLimitRule::new(
        60,
        60,
        "Too many requests to public pages. Please slow down.",
    )
}

fn default_general_api_limit() -> RateLimitRule {
    RateLimitRule::new(
        15 * 60,
        100,
        "API rate limit exceeded. Please try again later.",
    )
}

#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    /// Origin used to build links to public profile pages.
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
    /// HS256 secret used to sign session tokens.
    pub jwt_secret: String,
    #[serde(default)]
    pub twilio: TwilioConfig,
    #[serde(default)]
    pub phone: PhoneConfig,
    #[serde(default)]
    pub alerts: AlertsConfig,
    #[serde(default)]
    pub rate_limits: RateLimitsConfig,
}

fn default_listen_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_public_base_url() -> String {
    "http://localhost:8080".to_string()
}

impl AppConfig {
    /// Link to the public page for a profile token.
    pub fn public_url(&self, public_token: &str) -> String {
        format!(
            "{}/public/{public_token}",
            self.public_base_url.trim_end_matches('/')
        )
    }

    /// Checks invariants `serde` cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.len() < 32 {
            return Err(ConfigError::Validation(
                "jwt_secret must be at least 32 characters".into(),
            ));
        }
        if self.alerts.dispatch_concurrency == 0 {
            return Err(ConfigError::Validation(
                "alerts.dispatch_concurrency must be > 0".into(),
            ));
        }
        if self.rate_limits.sweep_interval_secs == 0 {
            return Err(ConfigError::Validation(
                "rate_limits.sweep_interval_secs must be > 0".into(),
            ));
        }
        for (name, rule) in [
            ("auth", &self.rate_limits.auth),
            ("alert", &self.rate_limits.alert),
            ("public_page", &self.rate_limits.public_page),
            ("general_api", &self.rate_limits.general_api),
        ] {
            if rule.window_secs == 0 || rule.max_requests == 0 {
                return Err(ConfigError::Validation(format!(
                    "rate_limits.{name} needs a non-zero window and request budget"
                )));
            }
        }
        Ok(())
    }
}

/// Load application configuration from `config.yaml` + environment overrides.
///
/// Environment variables override file values using the key path separated by
/// double underscores, e.g. `TWILIO__AUTH_TOKEN` or `RATE_LIMITS__ALERT__MAX_REQUESTS`.
/// A `.env` file in the working directory is loaded first if present.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from("config.yaml")
}

/// Same as [`load_config`] with an explicit file path. The file may be absent
/// when everything comes from the environment.
pub fn load_config_from(path: &str) -> Result<AppConfig, ConfigError> {
    use config::{Config, Environment, File};

    let _ = dotenvy::dotenv();

    let cfg = Config::builder()
        .add_source(File::with_name(path).required(false))
        .add_source(Environment::default().separator("__"))
        .build()?;

    let app: AppConfig = cfg.try_deserialize()?;
    app.validate()?;
    Ok(app)
}

/// Convenience helper for binaries wanting panic-on-error behaviour.
pub fn load_config_or_panic() -> AppConfig {
    match load_config() {
        Ok(c) => c,
        Err(e) => panic!("Failed to load configuration: {e}"),
    }
}
