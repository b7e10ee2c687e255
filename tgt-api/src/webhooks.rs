use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    routing::post,
    Json, Router,
};
use chrono::Utc;
use serde_json::{json, Value};
use tgt_core::payment::{PaymentEventKind, PaymentStatus, SignatureError, StripeEvent, SIGNATURE_HEADER};
use tgt_shared::models::events::{BookingPaidEvent, PaymentFailedEvent};
use tracing::{debug, info, warn};

use crate::bookings::{load_booking, save_booking};
use crate::error::AppError;
use crate::middleware::idempotency::release;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/webhooks/stripe", post(handle_stripe_webhook))
}

/// POST /v1/webhooks/stripe
/// Verifies the signature over the raw body before anything is parsed.
pub async fn handle_stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::SignatureError(SignatureError::MissingHeader.to_string()))?;

    state
        .verifier
        .verify(&body, signature, Utc::now().timestamp())
        .map_err(|e| AppError::SignatureError(e.to_string()))?;

    let event: StripeEvent = serde_json::from_slice(&body)
        .map_err(|e| AppError::ValidationError(format!("Invalid event payload: {}", e)))?;

    info!("Received webhook: {} ({})", event.event_type, event.id);

    let kind = event.kind();
    if kind == PaymentEventKind::Ignored {
        debug!("Ignoring webhook type {}", event.event_type);
        return Ok(Json(json!({ "received": true })));
    }

    let event_key = format!("stripe:event:{}", event.id);
    if !state
        .store
        .set_if_absent(&event_key, &event.event_type, state.idempotency_ttl())
        .await?
    {
        info!("Duplicate webhook {} acknowledged", event.id);
        return Ok(Json(json!({ "received": true, "duplicate": true })));
    }

    // Let Stripe redeliver if the booking update did not land.
    if let Err(e) = apply_payment_event(&state, &event, kind).await {
        release(state.store.as_ref(), &event_key).await;
        return Err(e);
    }

    Ok(Json(json!({ "received": true })))
}

async fn apply_payment_event(state: &AppState, event: &StripeEvent, kind: PaymentEventKind) -> Result<(), AppError> {
    let Some(booking_id) = event.booking_id() else {
        warn!("Webhook {} carries no booking reference", event.id);
        return Ok(());
    };
    let Some(mut booking) = load_booking(state, booking_id).await? else {
        warn!("Webhook {} references unknown booking {}", event.id, booking_id);
        return Ok(());
    };

    let now = Utc::now();
    match kind {
        PaymentEventKind::Succeeded => {
            if booking.status == PaymentStatus::Paid {
                return Ok(());
            }
            booking.status = PaymentStatus::Paid;
            booking.payment_reference = Some(event.payment_reference());
            booking.updated_at = now;
            save_booking(state, &booking).await?;

            info!("Booking {} marked as PAID via webhook", booking.id);
            state
                .notifier
                .booking_paid(&BookingPaidEvent {
                    booking_id: booking.id,
                    payment_reference: event.payment_reference(),
                    amount_cents: event.amount_cents(),
                    currency: event.currency(),
                    timestamp: now.timestamp(),
                })
                .await;
        }
        PaymentEventKind::Failed => {
            // A late failure for an earlier attempt must not undo a payment.
            if booking.status == PaymentStatus::Paid {
                warn!("Ignoring payment failure for already paid booking {}", booking.id);
                return Ok(());
            }
            booking.status = PaymentStatus::PaymentFailed;
            booking.payment_reference = Some(event.payment_reference());
            booking.updated_at = now;
            save_booking(state, &booking).await?;

            info!("Booking {} marked as PAYMENT_FAILED via webhook", booking.id);
            state
                .notifier
                .payment_failed(&PaymentFailedEvent {
                    booking_id: booking.id,
                    payment_reference: event.payment_reference(),
                    reason: event.failure_reason(),
                    timestamp: now.timestamp(),
                })
                .await;
        }
        PaymentEventKind::Ignored => {}
    }

    Ok(())
}
