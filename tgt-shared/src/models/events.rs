use uuid::Uuid;

use crate::pii::Masked;

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct BookingCreatedEvent {
    pub booking_id: Uuid,
    pub quote_id: Uuid,
    pub route_id: String,
    pub service_type: String,
    pub customer_name: String,
    pub customer_email: Masked<String>,
    pub pickup_at: String,
    pub total_cents: i32,
    pub currency: String,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct BookingPaidEvent {
    pub booking_id: Uuid,
    pub payment_reference: String,
    pub amount_cents: Option<i64>,
    pub currency: Option<String>,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct PaymentFailedEvent {
    pub booking_id: Uuid,
    pub payment_reference: String,
    pub reason: Option<String>,
    pub timestamp: i64,
}
