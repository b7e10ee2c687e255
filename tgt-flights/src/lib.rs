pub mod duffel;
pub mod mock;
pub mod travelpayouts;

use std::sync::Arc;
use std::time::Duration;

use tgt_core::provider::{FlightProvider, ProviderError};
use tgt_store::app_config::FlightsConfig;

pub use duffel::DuffelProvider;
pub use mock::MockFlightProvider;
pub use travelpayouts::TravelpayoutsProvider;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Mock,
    Duffel,
    Travelpayouts,
}

impl std::str::FromStr for ProviderKind {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mock" => Ok(ProviderKind::Mock),
            "duffel" => Ok(ProviderKind::Duffel),
            "travelpayouts" => Ok(ProviderKind::Travelpayouts),
            other => Err(ProviderError::NotConfigured {
                provider: other.to_string(),
                reason: "unknown provider".to_string(),
            }),
        }
    }
}

/// Builds the provider named in `flights.provider`.
pub fn build_provider(config: &FlightsConfig) -> Result<Arc<dyn FlightProvider>, ProviderError> {
    let kind: ProviderKind = config.provider.parse()?;
    let timeout = Duration::from_secs(config.timeout_seconds);

    let provider: Arc<dyn FlightProvider> = match kind {
        ProviderKind::Mock => Arc::new(MockFlightProvider::new(config.max_offers.min(10))),
        ProviderKind::Duffel => Arc::new(DuffelProvider::new(
            config.duffel_api_key.as_deref().unwrap_or_default(),
            config.duffel_base_url.as_deref(),
            timeout,
            config.max_offers,
        )?),
        ProviderKind::Travelpayouts => Arc::new(TravelpayoutsProvider::new(
            config.travelpayouts_token.as_deref().unwrap_or_default(),
            config.travelpayouts_base_url.as_deref(),
            timeout,
            config.max_offers,
        )?),
    };

    tracing::info!("Flight search provider: {}", provider.name());
    Ok(provider)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(provider: &str) -> FlightsConfig {
        FlightsConfig {
            provider: provider.to_string(),
            duffel_api_key: None,
            duffel_base_url: None,
            travelpayouts_token: None,
            travelpayouts_base_url: None,
            timeout_seconds: 10,
            max_offers: 20,
            circuit_breaker_threshold: 5,
            circuit_breaker_reset_seconds: 30,
        }
    }

    #[test]
    fn test_build_mock_provider() {
        let provider = build_provider(&config("Mock")).unwrap();
        assert_eq!(provider.name(), "mock");
        assert!(!provider.is_live());
    }

    #[test]
    fn test_live_provider_requires_credentials() {
        assert!(build_provider(&config("duffel")).is_err());
        assert!(build_provider(&config("travelpayouts")).is_err());

        let mut cfg = config("duffel");
        cfg.duffel_api_key = Some("duffel_test_abc".to_string());
        assert_eq!(build_provider(&cfg).unwrap().name(), "duffel");
    }

    #[test]
    fn test_unknown_provider() {
        assert!(build_provider(&config("amadeus")).is_err());
    }
}
