use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use chrono::Utc;
use serde_json::{json, Value};
use tgt_api::middleware::CircuitBreaker;
use tgt_api::notify::Notifier;
use tgt_api::{app, AppState};
use tgt_core::payment::WebhookVerifier;
use tgt_core::provider::{FlightProvider, ProviderError};
use tgt_core::search::{FlightOffer, FlightSearchRequest};
use tgt_flights::MockFlightProvider;
use tgt_shared::models::events::{BookingCreatedEvent, BookingPaidEvent, PaymentFailedEvent};
use tgt_store::app_config::{BusinessRules, CacheConfig};
use tgt_store::{KeyValueStore, MemoryStore};
use tgt_transfers::TransferCatalog;
use tower::ServiceExt;

const WEBHOOK_SECRET: &str = "whsec_integration";

#[derive(Default)]
struct RecordingNotifier {
    events: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn booking_created(&self, event: &BookingCreatedEvent) {
        self.events.lock().unwrap().push(format!("created:{}", event.booking_id));
    }

    async fn booking_paid(&self, event: &BookingPaidEvent) {
        self.events.lock().unwrap().push(format!("paid:{}", event.booking_id));
    }

    async fn payment_failed(&self, event: &PaymentFailedEvent) {
        self.events.lock().unwrap().push(format!("failed:{}", event.booking_id));
    }
}

/// Live provider that always fails at the transport level.
struct UnreachableProvider;

#[async_trait]
impl FlightProvider for UnreachableProvider {
    fn name(&self) -> &'static str {
        "unreachable"
    }

    async fn search(&self, _request: &FlightSearchRequest) -> Result<Vec<FlightOffer>, ProviderError> {
        Err(ProviderError::Transport("connection refused".to_string()))
    }
}

/// Live provider whose credentials are missing.
struct UnconfiguredProvider;

#[async_trait]
impl FlightProvider for UnconfiguredProvider {
    fn name(&self) -> &'static str {
        "unconfigured"
    }

    async fn search(&self, _request: &FlightSearchRequest) -> Result<Vec<FlightOffer>, ProviderError> {
        Err(ProviderError::NotConfigured {
            provider: "unconfigured".to_string(),
            reason: "missing token".to_string(),
        })
    }
}

struct Harness {
    app: Router,
    store: Arc<MemoryStore>,
    notifier: Arc<RecordingNotifier>,
}

fn harness_with(flights: Arc<dyn FlightProvider>) -> Harness {
    let store = Arc::new(MemoryStore::new());
    let notifier = Arc::new(RecordingNotifier::default());
    let state = AppState {
        store: store.clone(),
        flights,
        flight_breaker: Arc::new(CircuitBreaker::new("flights", 1, Duration::from_secs(60))),
        verifier: Arc::new(WebhookVerifier::new(WEBHOOK_SECRET, 300)),
        notifier: notifier.clone(),
        catalog: TransferCatalog::standard(),
        cache: CacheConfig::default(),
        business_rules: BusinessRules::default(),
        allowed_origins: Vec::new(),
    };
    Harness {
        app: app(state),
        store,
        notifier,
    }
}

fn harness() -> Harness {
    harness_with(Arc::new(MockFlightProvider::default()))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, headers, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: &Value, idempotency_key: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(key) = idempotency_key {
        builder = builder.header("Idempotency-Key", key);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn quote_body() -> Value {
    json!({
        "route_id": "tiv-airport-kotor",
        "service_type": "private",
        "passengers": 2,
        "luggage": 2,
        "date": "2030-06-10",
        "time": "14:00:00"
    })
}

async fn create_quote(app: &Router) -> Value {
    let (status, _, quote) = send(app, post_json("/v1/transfers/quote", &quote_body(), None)).await;
    assert_eq!(status, StatusCode::OK, "{}", quote);
    quote
}

fn booking_body(quote_id: &Value) -> Value {
    json!({
        "quote_id": quote_id,
        "customer_name": "Ana Petrovic",
        "customer_email": "ana@example.me",
        "customer_phone": "+382 67 123 456",
        "flight_number": "ju 680"
    })
}

async fn create_booking(app: &Router) -> Value {
    let quote = create_quote(app).await;
    let (status, _, booking) = send(app, post_json("/v1/transfers/bookings", &booking_body(&quote["id"]), None)).await;
    assert_eq!(status, StatusCode::CREATED, "{}", booking);
    booking
}

fn signed_webhook(payload: &Value, secret: &str, timestamp: i64) -> Request<Body> {
    let raw = payload.to_string();
    let header = WebhookVerifier::new(secret, 300).sign(raw.as_bytes(), timestamp).unwrap();
    Request::builder()
        .method("POST")
        .uri("/v1/webhooks/stripe")
        .header("Stripe-Signature", header)
        .body(Body::from(raw))
        .unwrap()
}

fn payment_event(event_id: &str, event_type: &str, booking_id: &Value) -> Value {
    json!({
        "id": event_id,
        "type": event_type,
        "data": { "object": {
            "id": "pi_test_1",
            "amount_received": 3000,
            "currency": "eur",
            "metadata": { "booking_id": booking_id }
        }}
    })
}

#[tokio::test]
async fn test_health() {
    let h = harness();
    let (status, _, body) = send(&h.app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["store"], "memory");
    assert_eq!(body["flight_provider"], "mock");
    assert_eq!(body["flight_circuit"], "closed");
}

#[tokio::test]
async fn test_zone_and_route_lookup() {
    let h = harness();

    let (status, _, zones) = send(&h.app, get("/v1/transfers/zones")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(zones.as_array().unwrap().iter().any(|z| z["id"] == "tiv-airport"));

    let (status, _, zone) = send(&h.app, get("/v1/transfers/zones/nearest?lat=42.4047&lng=18.7233")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(zone["id"], "tiv-airport");

    let (status, _, _) = send(&h.app, get("/v1/transfers/zones/nearest?lat=0&lng=0")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _, routes) = send(&h.app, get("/v1/transfers/routes?from=tiv-airport&to=kotor")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(routes.as_array().unwrap().len(), 1);
    assert_eq!(routes[0]["id"], "tiv-airport-kotor");

    let (status, _, _) = send(&h.app, get("/v1/transfers/routes?from=atlantis")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _, services) = send(&h.app, get("/v1/transfers/routes/tiv-airport-tivat/services")).await;
    assert_eq!(status, StatusCode::OK);
    let tiers: Vec<_> = services.as_array().unwrap().iter().map(|s| s["service_type"].clone()).collect();
    assert_eq!(tiers, vec![json!("private"), json!("shared")]);
}

#[tokio::test]
async fn test_quote_is_priced_and_stored() {
    let h = harness();
    let quote = create_quote(&h.app).await;

    assert_eq!(quote["base_price_cents"], 3000);
    assert_eq!(quote["total_cents"], 3000);
    assert_eq!(quote["currency"], "EUR");

    let key = format!("quote:{}", quote["id"].as_str().unwrap());
    assert!(h.store.get(&key).await.unwrap().is_some());
}

#[tokio::test]
async fn test_quote_applies_calendar_holidays() {
    let h = harness();
    let mut body = quote_body();
    body["date"] = json!("2030-07-13");
    let (status, _, quote) = send(&h.app, post_json("/v1/transfers/quote", &body, None)).await;
    assert_eq!(status, StatusCode::OK);
    // Private holiday surcharge is 10.00
    assert_eq!(quote["total_cents"], 4000);
}

#[tokio::test]
async fn test_quote_validation_errors() {
    let h = harness();

    let mut body = quote_body();
    body["route_id"] = json!("kotor-mars");
    let (status, _, _) = send(&h.app, post_json("/v1/transfers/quote", &body, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let mut body = quote_body();
    body["passengers"] = json!(12);
    let (status, _, err) = send(&h.app, post_json("/v1/transfers/quote", &body, None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(err["error"].is_string());

    let mut body = quote_body();
    body["date"] = json!("2020-01-10");
    let (status, _, _) = send(&h.app, post_json("/v1/transfers/quote", &body, None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_booking_lifecycle() {
    let h = harness();
    let booking = create_booking(&h.app).await;

    assert_eq!(booking["status"], "PENDING_PAYMENT");
    assert_eq!(booking["total_cents"], 3000);
    assert_eq!(booking["flight_number"], "JU 680");
    assert_eq!(booking["customer_email"], "ana@example.me");

    let uri = format!("/v1/transfers/bookings/{}", booking["id"].as_str().unwrap());
    let (status, _, fetched) = send(&h.app, get(&uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["id"], booking["id"]);

    assert_eq!(h.notifier.events(), vec![format!("created:{}", booking["id"].as_str().unwrap())]);
}

#[tokio::test]
async fn test_booking_unknown_quote_is_gone() {
    let h = harness();
    let body = booking_body(&json!(uuid::Uuid::new_v4()));
    let (status, _, _) = send(&h.app, post_json("/v1/transfers/bookings", &body, None)).await;
    assert_eq!(status, StatusCode::GONE);
}

#[tokio::test]
async fn test_booking_expired_quote_is_gone() {
    let h = harness();
    let quote = create_quote(&h.app).await;
    let key = format!("quote:{}", quote["id"].as_str().unwrap());

    // Still in the store, but past its validity window
    let raw = h.store.get(&key).await.unwrap().unwrap();
    let mut stored: Value = serde_json::from_str(&raw).unwrap();
    stored["created_at"] = json!((Utc::now() - chrono::Duration::minutes(40)).to_rfc3339());
    stored["valid_until"] = json!((Utc::now() - chrono::Duration::minutes(10)).to_rfc3339());
    h.store.set(&key, &stored.to_string(), Duration::from_secs(600)).await.unwrap();

    let (status, _, _) = send(&h.app, post_json("/v1/transfers/bookings", &booking_body(&quote["id"]), None)).await;
    assert_eq!(status, StatusCode::GONE);
    assert!(h.notifier.events().is_empty());
}

#[tokio::test]
async fn test_quote_can_only_be_booked_once() {
    let h = harness();
    let quote = create_quote(&h.app).await;
    let body = booking_body(&quote["id"]);

    let (status, _, _) = send(&h.app, post_json("/v1/transfers/bookings", &body, None)).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _, _) = send(&h.app, post_json("/v1/transfers/bookings", &body, None)).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_unknown_booking_is_not_found() {
    let h = harness();
    let uri = format!("/v1/transfers/bookings/{}", uuid::Uuid::new_v4());
    let (status, _, _) = send(&h.app, get(&uri)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_idempotent_booking_is_replayed() {
    let h = harness();
    let quote = create_quote(&h.app).await;
    let body = booking_body(&quote["id"]);

    let (status, headers, first) = send(&h.app, post_json("/v1/transfers/bookings", &body, Some("book-1"))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(headers.get("idempotent-replayed").is_none());

    let (status, headers, second) = send(&h.app, post_json("/v1/transfers/bookings", &body, Some("book-1"))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(headers["idempotent-replayed"], "true");
    assert_eq!(first["id"], second["id"]);

    // The handler ran once
    assert_eq!(h.notifier.events().len(), 1);
}

#[tokio::test]
async fn test_idempotency_client_errors_are_recorded() {
    let h = harness();
    let body = booking_body(&json!(uuid::Uuid::new_v4()));

    let (status, _, _) = send(&h.app, post_json("/v1/transfers/bookings", &body, Some("gone-1"))).await;
    assert_eq!(status, StatusCode::GONE);
    let (status, headers, _) = send(&h.app, post_json("/v1/transfers/bookings", &body, Some("gone-1"))).await;
    assert_eq!(status, StatusCode::GONE);
    assert_eq!(headers["idempotent-replayed"], "true");
}

#[tokio::test]
async fn test_idempotency_in_flight_key_conflicts() {
    let h = harness();
    h.store
        .set("idem:POST:/v1/transfers/quote:busy", "IN_FLIGHT", Duration::from_secs(60))
        .await
        .unwrap();

    let (status, _, _) = send(&h.app, post_json("/v1/transfers/quote", &quote_body(), Some("busy"))).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_idempotency_server_errors_release_the_key() {
    let h = harness_with(Arc::new(UnreachableProvider));
    let body = json!({ "origin": "TIV", "destination": "BEG", "departure_date": "2030-06-10" });

    let (status, _, _) = send(&h.app, post_json("/v1/flights/search", &body, Some("search-1"))).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(h
        .store
        .get("idem:POST:/v1/flights/search:search-1")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_flight_search_is_cached() {
    let h = harness();
    let body = json!({ "origin": "tiv", "destination": "beg", "departure_date": "2030-06-10", "adults": 2 });

    let (status, _, first) = send(&h.app, post_json("/v1/flights/search", &body, None)).await;
    assert_eq!(status, StatusCode::OK, "{}", first);
    assert_eq!(first["provider"], "mock");
    assert_eq!(first["cached"], false);
    assert!(!first["offers"].as_array().unwrap().is_empty());
    assert_eq!(first["offers"][0]["origin"], "TIV");

    let (status, _, second) = send(&h.app, post_json("/v1/flights/search", &body, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["cached"], true);
    assert_eq!(first["offers"], second["offers"]);
}

#[tokio::test]
async fn test_flight_search_validation() {
    let h = harness();
    let body = json!({ "origin": "TIV", "destination": "TIV", "departure_date": "2030-06-10" });
    let (status, _, _) = send(&h.app, post_json("/v1/flights/search", &body, None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_open_circuit_fails_fast() {
    let h = harness_with(Arc::new(UnreachableProvider));
    let body = json!({ "origin": "TIV", "destination": "BEG", "departure_date": "2030-06-10" });

    let (status, _, _) = send(&h.app, post_json("/v1/flights/search", &body, None)).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);

    let (status, _, _) = send(&h.app, post_json("/v1/flights/search", &body, None)).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_unconfigured_provider_trips_circuit() {
    let h = harness_with(Arc::new(UnconfiguredProvider));
    let body = json!({ "origin": "TIV", "destination": "BEG", "departure_date": "2030-06-10" });

    let (status, _, _) = send(&h.app, post_json("/v1/flights/search", &body, None)).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let (_, _, health) = send(&h.app, get("/health")).await;
    assert_eq!(health["flight_circuit"], "open");
}

#[tokio::test]
async fn test_webhook_marks_booking_paid_once() {
    let h = harness();
    let booking = create_booking(&h.app).await;
    let booking_id = booking["id"].as_str().unwrap().to_string();
    let event = payment_event("evt_paid_1", "payment_intent.succeeded", &booking["id"]);

    let (status, _, ack) = send(&h.app, signed_webhook(&event, WEBHOOK_SECRET, Utc::now().timestamp())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["received"], true);

    let (_, _, fetched) = send(&h.app, get(&format!("/v1/transfers/bookings/{}", booking_id))).await;
    assert_eq!(fetched["status"], "PAID");
    assert_eq!(fetched["payment_reference"], "pi_test_1");

    let (status, _, ack) = send(&h.app, signed_webhook(&event, WEBHOOK_SECRET, Utc::now().timestamp())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["duplicate"], true);

    let paid: Vec<_> = h.notifier.events().into_iter().filter(|e| e.starts_with("paid:")).collect();
    assert_eq!(paid, vec![format!("paid:{}", booking_id)]);
}

#[tokio::test]
async fn test_webhook_payment_failure() {
    let h = harness();
    let booking = create_booking(&h.app).await;
    let event = payment_event("evt_failed_1", "payment_intent.payment_failed", &booking["id"]);

    let (status, _, _) = send(&h.app, signed_webhook(&event, WEBHOOK_SECRET, Utc::now().timestamp())).await;
    assert_eq!(status, StatusCode::OK);

    let uri = format!("/v1/transfers/bookings/{}", booking["id"].as_str().unwrap());
    let (_, _, fetched) = send(&h.app, get(&uri)).await;
    assert_eq!(fetched["status"], "PAYMENT_FAILED");
}

#[tokio::test]
async fn test_webhook_rejects_bad_signatures() {
    let h = harness();
    let event = payment_event("evt_x", "payment_intent.succeeded", &json!(uuid::Uuid::new_v4()));

    let (status, _, _) = send(&h.app, signed_webhook(&event, "whsec_wrong", Utc::now().timestamp())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let stale = Utc::now().timestamp() - 3600;
    let (status, _, _) = send(&h.app, signed_webhook(&event, WEBHOOK_SECRET, stale)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let unsigned = Request::builder()
        .method("POST")
        .uri("/v1/webhooks/stripe")
        .body(Body::from(event.to_string()))
        .unwrap();
    let (status, _, _) = send(&h.app, unsigned).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_webhook_ignores_unrelated_events() {
    let h = harness();
    let event = json!({ "id": "evt_cust", "type": "customer.created", "data": { "object": { "id": "cus_1" } } });
    let (status, _, ack) = send(&h.app, signed_webhook(&event, WEBHOOK_SECRET, Utc::now().timestamp())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["received"], true);
    assert!(h.notifier.events().is_empty());
}
