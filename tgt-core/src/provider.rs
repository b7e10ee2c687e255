use async_trait::async_trait;

use crate::search::{FlightOffer, FlightSearchRequest};

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Provider {provider} is not configured: {reason}")]
    NotConfigured { provider: String, reason: String },

    #[error("Upstream request failed: {0}")]
    Transport(String),

    #[error("Upstream returned status {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Unexpected upstream payload: {0}")]
    Decode(String),
}

/// Flight search backend (mock, Duffel, Travelpayouts, ...).
#[async_trait]
pub trait FlightProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether calls leave the process; live providers sit behind a circuit breaker.
    fn is_live(&self) -> bool {
        true
    }

    async fn search(&self, request: &FlightSearchRequest) -> Result<Vec<FlightOffer>, ProviderError>;
}
