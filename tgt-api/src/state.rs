use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDateTime, Utc};
use tgt_core::payment::WebhookVerifier;
use tgt_core::provider::FlightProvider;
use tgt_store::app_config::{BusinessRules, CacheConfig};
use tgt_store::KeyValueStore;
use tgt_transfers::TransferCatalog;

use crate::middleware::resiliency::CircuitBreaker;
use crate::notify::Notifier;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn KeyValueStore>,
    pub flights: Arc<dyn FlightProvider>,
    pub flight_breaker: Arc<CircuitBreaker>,
    pub verifier: Arc<WebhookVerifier>,
    pub notifier: Arc<dyn Notifier>,
    pub catalog: &'static TransferCatalog,
    pub cache: CacheConfig,
    pub business_rules: BusinessRules,
    pub allowed_origins: Vec<String>,
}

impl AppState {
    /// Wall-clock time in the operating region.
    pub fn local_now(&self) -> NaiveDateTime {
        Utc::now().naive_utc() + chrono::Duration::hours(self.business_rules.utc_offset_hours as i64)
    }

    pub fn flight_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.flight_search_ttl_seconds)
    }

    pub fn idempotency_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.idempotency_ttl_seconds)
    }

    pub fn booking_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.booking_ttl_seconds)
    }
}
