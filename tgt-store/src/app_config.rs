use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub redis: RedisConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    pub flights: FlightsConfig,
    pub stripe: StripeConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
    #[serde(default)]
    pub business_rules: BusinessRules,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

/// Without a URL the service runs on the in-process store.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct RedisConfig {
    pub url: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    #[serde(default = "default_flight_search_ttl")]
    pub flight_search_ttl_seconds: u64,
    #[serde(default = "default_idempotency_ttl")]
    pub idempotency_ttl_seconds: u64,
    #[serde(default = "default_booking_ttl")]
    pub booking_ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            flight_search_ttl_seconds: default_flight_search_ttl(),
            idempotency_ttl_seconds: default_idempotency_ttl(),
            booking_ttl_seconds: default_booking_ttl(),
        }
    }
}

fn default_flight_search_ttl() -> u64 { 300 }
fn default_idempotency_ttl() -> u64 { 86_400 }
fn default_booking_ttl() -> u64 { 90 * 86_400 }

#[derive(Debug, Deserialize, Clone)]
pub struct FlightsConfig {
    pub provider: String,
    pub duffel_api_key: Option<String>,
    pub duffel_base_url: Option<String>,
    pub travelpayouts_token: Option<String>,
    pub travelpayouts_base_url: Option<String>,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    #[serde(default = "default_max_offers")]
    pub max_offers: usize,
    #[serde(default = "default_breaker_threshold")]
    pub circuit_breaker_threshold: usize,
    #[serde(default = "default_breaker_reset")]
    pub circuit_breaker_reset_seconds: u64,
}

fn default_timeout() -> u64 { 15 }
fn default_max_offers() -> usize { 20 }
fn default_breaker_threshold() -> usize { 5 }
fn default_breaker_reset() -> u64 { 30 }

#[derive(Debug, Deserialize, Clone)]
pub struct StripeConfig {
    pub webhook_secret: String,
    #[serde(default = "default_tolerance")]
    pub tolerance_seconds: i64,
}

fn default_tolerance() -> i64 { 300 }

#[derive(Debug, Deserialize, Clone, Default)]
pub struct NotificationConfig {
    pub slack_webhook_url: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BusinessRules {
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Offset of the operating region's wall clock from UTC.
    #[serde(default = "default_utc_offset")]
    pub utc_offset_hours: i32,
}

impl Default for BusinessRules {
    fn default() -> Self {
        Self {
            currency: default_currency(),
            utc_offset_hours: default_utc_offset(),
        }
    }
}

fn default_currency() -> String { "EUR".to_string() }
fn default_utc_offset() -> i32 { 1 }

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Per-environment overrides, optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Untracked local overrides
            .add_source(config::File::with_name("config/local").required(false))
            // TGT_FLIGHTS__PROVIDER=duffel sets flights.provider
            .add_source(config::Environment::with_prefix("TGT").prefix_separator("_").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
