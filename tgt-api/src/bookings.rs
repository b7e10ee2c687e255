use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use tgt_core::payment::PaymentStatus;
use tgt_shared::models::events::BookingCreatedEvent;
use tgt_shared::Masked;
use tgt_store::{get_json, set_json};
use tgt_transfers::{ServiceType, TransferQuote};
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::idempotency::release;
use crate::state::AppState;
use crate::transfers::quote_key;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/transfers/bookings", post(create_booking))
        .route("/v1/transfers/bookings/{id}", get(get_booking))
}

fn booking_key(id: Uuid) -> String {
    format!("booking:{}", id)
}

fn quote_claim_key(quote_id: Uuid) -> String {
    format!("quote:{}:booked", quote_id)
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub quote_id: Uuid,
    pub customer_name: String,
    pub customer_email: Masked<String>,
    pub customer_phone: Option<Masked<String>>,
    pub flight_number: Option<String>,
    pub pickup_address: Option<String>,
    pub notes: Option<String>,
}

impl CreateBookingRequest {
    fn validate(&self) -> Result<(), AppError> {
        if self.customer_name.trim().is_empty() {
            return Err(AppError::ValidationError("Customer name is required".to_string()));
        }
        let email = self.customer_email.expose();
        let valid_email = email
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
        if !valid_email {
            return Err(AppError::ValidationError("A valid customer email is required".to_string()));
        }
        if let Some(phone) = &self.customer_phone {
            let digits = phone.expose().chars().filter(|c| c.is_ascii_digit()).count();
            if digits < 6 {
                return Err(AppError::ValidationError("Customer phone number is too short".to_string()));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub quote_id: Uuid,
    pub status: PaymentStatus,
    pub route_id: String,
    pub service_type: ServiceType,
    pub pickup_date: NaiveDate,
    pub pickup_time: NaiveTime,
    pub passengers: u32,
    pub luggage: u32,
    pub child_seats: u32,
    pub total_cents: i32,
    pub currency: String,
    pub customer_name: String,
    pub customer_email: Masked<String>,
    pub customer_phone: Option<Masked<String>>,
    pub flight_number: Option<String>,
    pub pickup_address: Option<String>,
    pub notes: Option<String>,
    pub payment_reference: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    fn from_quote(quote: &TransferQuote, req: CreateBookingRequest, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            quote_id: quote.id,
            status: PaymentStatus::PendingPayment,
            route_id: quote.route_id.clone(),
            service_type: quote.service_type,
            pickup_date: quote.pickup_date,
            pickup_time: quote.pickup_time,
            passengers: quote.passengers,
            luggage: quote.luggage,
            child_seats: quote.child_seats,
            total_cents: quote.total_cents,
            currency: quote.currency.clone(),
            customer_name: req.customer_name.trim().to_string(),
            customer_email: req.customer_email,
            customer_phone: req.customer_phone,
            flight_number: req.flight_number.map(|f| f.trim().to_ascii_uppercase()),
            pickup_address: req.pickup_address,
            notes: req.notes,
            payment_reference: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn created_event(&self) -> BookingCreatedEvent {
        BookingCreatedEvent {
            booking_id: self.id,
            quote_id: self.quote_id,
            route_id: self.route_id.clone(),
            service_type: self.service_type.to_string(),
            customer_name: self.customer_name.clone(),
            customer_email: self.customer_email.clone(),
            pickup_at: format!("{} {}", self.pickup_date, self.pickup_time.format("%H:%M")),
            total_cents: self.total_cents,
            currency: self.currency.clone(),
            timestamp: self.created_at.timestamp(),
        }
    }
}

pub(crate) async fn load_booking(state: &AppState, id: Uuid) -> Result<Option<Booking>, AppError> {
    Ok(get_json(state.store.as_ref(), &booking_key(id)).await?)
}

pub(crate) async fn save_booking(state: &AppState, booking: &Booking) -> Result<(), AppError> {
    set_json(state.store.as_ref(), &booking_key(booking.id), booking, state.booking_ttl()).await?;
    Ok(())
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /v1/transfers/bookings
/// Turns a live quote into a booking awaiting payment.
pub async fn create_booking(
    State(state): State<AppState>,
    Json(req): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    req.validate()?;

    let now = Utc::now();
    let quote: TransferQuote = get_json(state.store.as_ref(), &quote_key(req.quote_id))
        .await?
        .filter(|q: &TransferQuote| !q.is_expired(now))
        .ok_or_else(|| AppError::GoneError(format!("Quote {} is unknown or has expired", req.quote_id)))?;

    let claim = quote_claim_key(quote.id);
    if !state.store.set_if_absent(&claim, "1", state.booking_ttl()).await? {
        return Err(AppError::ConflictError(format!("Quote {} has already been booked", quote.id)));
    }

    let booking = Booking::from_quote(&quote, req, now);
    if let Err(e) = save_booking(&state, &booking).await {
        release(state.store.as_ref(), &claim).await;
        return Err(e);
    }

    tracing::info!(
        "Booking {} created from quote {} for {}",
        booking.id,
        booking.quote_id,
        booking.customer_email.hint()
    );
    state.notifier.booking_created(&booking.created_event()).await;

    Ok((StatusCode::CREATED, Json(booking)))
}

/// GET /v1/transfers/bookings/{id}
pub async fn get_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>, AppError> {
    load_booking(&state, id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFoundError(format!("Booking {} not found", id)))
}
