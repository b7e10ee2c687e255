pub mod payment;
pub mod provider;
pub mod search;

pub use provider::{FlightProvider, ProviderError};
pub use search::{FlightOffer, FlightSearchRequest, FlightSearchResponse};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
