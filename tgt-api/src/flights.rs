use axum::{extract::State, routing::post, Json, Router};
use tgt_core::provider::ProviderError;
use tgt_core::search::{FlightOffer, FlightSearchRequest, FlightSearchResponse};
use tgt_store::{get_json, set_json};
use tracing::{debug, warn};

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/flights/search", post(search_flights))
}

fn provider_error(err: ProviderError) -> AppError {
    match &err {
        ProviderError::NotConfigured { .. } => AppError::ServiceUnavailable(err.to_string()),
        _ => AppError::UpstreamError(err.to_string()),
    }
}

/// POST /v1/flights/search
pub async fn search_flights(
    State(state): State<AppState>,
    Json(req): Json<FlightSearchRequest>,
) -> Result<Json<FlightSearchResponse>, AppError> {
    let req = req.normalize();
    req.validate(state.local_now().date())
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    let provider = state.flights.name();
    let cache_key = req.cache_key(provider);

    match get_json::<Vec<FlightOffer>>(state.store.as_ref(), &cache_key).await {
        Ok(Some(offers)) => {
            debug!("Flight cache hit {}", cache_key);
            return Ok(Json(FlightSearchResponse {
                provider: provider.to_string(),
                cached: true,
                offers,
            }));
        }
        Ok(None) => {}
        Err(e) => warn!("Flight cache read failed for {}: {}", cache_key, e),
    }

    let live = state.flights.is_live();
    if live && !state.flight_breaker.check().await {
        return Err(AppError::ServiceUnavailable(
            "Flight search is temporarily unavailable".to_string(),
        ));
    }

    let result = state.flights.search(&req).await;
    if live {
        match &result {
            Ok(_) => state.flight_breaker.record_success().await,
            Err(_) => state.flight_breaker.record_failure().await,
        }
    }
    let offers = result.map_err(provider_error)?;

    if let Err(e) = set_json(state.store.as_ref(), &cache_key, &offers, state.flight_cache_ttl()).await {
        warn!("Flight cache write failed for {}: {}", cache_key, e);
    }

    Ok(Json(FlightSearchResponse {
        provider: provider.to_string(),
        cached: false,
        offers,
    }))
}
