use axum::{
    extract::State,
    http::{header, HeaderName, HeaderValue, Method},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod bookings;
pub mod error;
pub mod flights;
pub mod middleware;
pub mod notify;
pub mod state;
pub mod transfers;
pub mod webhooks;
pub mod worker;

use middleware::idempotency::{IDEMPOTENCY_HEADER, REPLAYED_HEADER};
pub use state::AppState;

pub fn app(state: AppState) -> Router {
    let cors = cors_layer(&state.allowed_origins);

    Router::new()
        .route("/health", get(health))
        .merge(transfers::routes())
        .merge(bookings::routes())
        .merge(flights::routes())
        .merge(webhooks::routes())
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::idempotency_middleware,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static(IDEMPOTENCY_HEADER)])
        .expose_headers([HeaderName::from_static(REPLAYED_HEADER)]);

    if origins.is_empty() {
        cors.allow_origin(Any)
    } else {
        cors.allow_origin(AllowOrigin::list(
            origins.iter().filter_map(|o| o.parse::<HeaderValue>().ok()),
        ))
    }
}

/// GET /health
async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "store": state.store.backend(),
        "flight_provider": state.flights.name(),
        "flight_circuit": state.flight_breaker.state().await,
    }))
}
