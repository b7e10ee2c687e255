use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tgt_store::set_json;
use tgt_transfers::quote::QUOTE_VALIDITY_MINUTES;
use tgt_transfers::service::Amenities;
use tgt_transfers::{is_public_holiday, QuoteRequest, TransferError, TransferQuote, TransferRoute, TransferZone};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/transfers/zones", get(list_zones))
        .route("/v1/transfers/zones/nearest", get(nearest_zone))
        .route("/v1/transfers/routes", get(list_routes))
        .route("/v1/transfers/routes/{id}/services", get(route_services))
        .route("/v1/transfers/quote", post(create_quote))
}

pub(crate) fn quote_key(id: Uuid) -> String {
    format!("quote:{}", id)
}

pub(crate) fn transfer_error(err: TransferError) -> AppError {
    match &err {
        TransferError::RouteNotFound(_) => AppError::NotFoundError(err.to_string()),
        _ => AppError::ValidationError(err.to_string()),
    }
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct NearestQuery {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Deserialize)]
pub struct RoutesQuery {
    pub from: Option<String>,
    pub to: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ServiceOption {
    pub service_type: tgt_transfers::ServiceType,
    pub name: String,
    pub vehicle_type: String,
    pub amenities: Amenities,
    pub languages: Vec<String>,
    pub cancellation_policy: String,
    pub min_booking_hours: u32,
    pub max_passengers: u32,
    pub max_luggage: u32,
    pub base_price_cents: i32,
    pub currency: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /v1/transfers/zones
pub async fn list_zones(State(state): State<AppState>) -> Json<Vec<TransferZone>> {
    Json(state.catalog.list_zones().to_vec())
}

/// GET /v1/transfers/zones/nearest?lat=&lng=
pub async fn nearest_zone(
    State(state): State<AppState>,
    Query(query): Query<NearestQuery>,
) -> Result<Json<TransferZone>, AppError> {
    if !(-90.0..=90.0).contains(&query.lat) || !(-180.0..=180.0).contains(&query.lng) {
        return Err(AppError::ValidationError("Coordinates out of range".to_string()));
    }

    state
        .catalog
        .find_nearest_zone(query.lat, query.lng)
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::NotFoundError("No transfer zone covers this location".to_string()))
}

/// GET /v1/transfers/routes?from=&to=
pub async fn list_routes(
    State(state): State<AppState>,
    Query(query): Query<RoutesQuery>,
) -> Result<Json<Vec<TransferRoute>>, AppError> {
    let catalog = state.catalog;
    for zone_id in query.from.iter().chain(query.to.iter()) {
        if catalog.find_zone(zone_id).is_none() {
            return Err(AppError::NotFoundError(format!("Unknown zone: {}", zone_id)));
        }
    }

    let routes = match (query.from.as_deref(), query.to.as_deref()) {
        (Some(from), Some(to)) => catalog.routes_between(from, to),
        (Some(from), None) => catalog.routes_from(from),
        (None, Some(to)) => catalog
            .active_routes()
            .into_iter()
            .filter(|r| r.destination_zone_id == to)
            .collect(),
        (None, None) => catalog.active_routes(),
    };

    Ok(Json(routes.into_iter().cloned().collect()))
}

/// GET /v1/transfers/routes/{id}/services
pub async fn route_services(
    State(state): State<AppState>,
    Path(route_id): Path<String>,
) -> Result<Json<Vec<ServiceOption>>, AppError> {
    let route = state
        .catalog
        .find_route(&route_id)
        .ok_or_else(|| transfer_error(TransferError::RouteNotFound(route_id.clone())))?;
    if !route.active {
        return Err(transfer_error(TransferError::RouteInactive(route.id.clone())));
    }

    let options = state
        .catalog
        .available_services(route)
        .into_iter()
        .map(|(service, pricing)| ServiceOption {
            service_type: service.service_type,
            name: service.name.clone(),
            vehicle_type: service.vehicle_type.clone(),
            amenities: service.amenities,
            languages: service.languages.clone(),
            cancellation_policy: service.cancellation_policy.clone(),
            min_booking_hours: service.min_booking_hours,
            max_passengers: pricing.max_passengers.min(service.max_passengers),
            max_luggage: pricing.max_luggage.min(service.max_luggage),
            base_price_cents: pricing.base_price_cents,
            currency: pricing.currency.clone(),
        })
        .collect();

    Ok(Json(options))
}

/// POST /v1/transfers/quote
/// Validates, prices and stores a quote for its validity window.
pub async fn create_quote(
    State(state): State<AppState>,
    Json(mut req): Json<QuoteRequest>,
) -> Result<Json<TransferQuote>, AppError> {
    // Movable feasts come in through the request flag
    req.is_public_holiday |= is_public_holiday(req.date);

    state
        .catalog
        .validate_request(&req, state.local_now())
        .map_err(transfer_error)?;

    let quote = state.catalog.quote(&req, Utc::now()).ok_or_else(|| {
        transfer_error(TransferError::PricingNotFound {
            route: req.route_id.clone(),
            service: req.service_type,
        })
    })?;

    set_json(
        state.store.as_ref(),
        &quote_key(quote.id),
        &quote,
        Duration::from_secs(QUOTE_VALIDITY_MINUTES as u64 * 60),
    )
    .await?;

    tracing::info!(
        "Quote {} for {} {}: {} {}",
        quote.id,
        quote.service_type,
        quote.route_id,
        quote.total_cents,
        quote.currency
    );
    Ok(Json(quote))
}
